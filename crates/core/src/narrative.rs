//! Canned trend sentences.

use crate::classify::{Classification, Direction};
use crate::metric::Metric;

/// Fixed sentence for every (metric, direction) pair.
pub fn direction_sentence(metric: Metric, direction: Direction) -> &'static str {
    use Direction::*;
    use Metric::*;

    match (metric, direction) {
        (Temperature, Increasing) => "Temperature is steadily rising, indicating heat accumulation.",
        (Temperature, Decreasing) => {
            "Temperature is declining, suggesting cooling or external climate influences."
        }
        (Temperature, Stable) => "Temperature remains relatively constant.",

        (Humidity, Increasing) => {
            "Humidity is gradually increasing, potentially indicating higher moisture content."
        }
        (Humidity, Decreasing) => "Humidity is decreasing, making the environment drier.",
        (Humidity, Stable) => "Humidity remains consistent.",

        (SoilMoisture, Increasing) => {
            "Soil moisture is increasing, possibly due to irrigation or environmental changes."
        }
        (SoilMoisture, Decreasing) => {
            "Soil moisture is decreasing, which might require attention to plant hydration."
        }
        (SoilMoisture, Stable) => "Soil moisture remains steady.",

        (LightLevel, Increasing) => {
            "Light intensity is continuously increasing, reflecting changing daylight."
        }
        (LightLevel, Decreasing) => {
            "Light intensity is diminishing, possibly due to cloud cover or time of day."
        }
        (LightLevel, Stable) => "Light intensity remains constant.",

        (Co2Level, Increasing) => {
            "CO2 concentration is rising, potentially indicating ventilation issues."
        }
        (Co2Level, Decreasing) => {
            "CO2 concentration is dropping, suggesting good ventilation or plant photosynthesis."
        }
        (Co2Level, Stable) => "CO2 levels remain relatively stable.",
    }
}

/// `"{sentence} {confidence phrase}, statistical fit R² = {r²:.2}."`
pub fn compose(metric: Metric, classification: Classification, r_squared: f64) -> String {
    format!(
        "{} {}, statistical fit R² = {r_squared:.2}.",
        direction_sentence(metric, classification.direction),
        classification.confidence.phrase(),
    )
}
