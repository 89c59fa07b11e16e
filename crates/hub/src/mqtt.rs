use anyhow::{Context, Result};
use greenhouse_core::{Reading, ReadingRecord};

/// Subscription filter for node telemetry.
pub(crate) const TELEMETRY_FILTER: &str = "tele/+/reading";

// ---------------------------------------------------------------------------
// Topic / payload helpers
// ---------------------------------------------------------------------------

/// Extract node_id from "tele/<node_id>/reading".
pub(crate) fn extract_node_id(topic: &str) -> Option<&str> {
    let parts: Vec<&str> = topic.split('/').collect();
    if parts.len() == 3 && parts[0] == "tele" && parts[2] == "reading" && !parts[1].is_empty() {
        Some(parts[1])
    } else {
        None
    }
}

/// Decode a JSON reading record and rebuild the reading.
pub(crate) fn parse_reading(payload: &[u8]) -> Result<Reading> {
    let record: ReadingRecord =
        serde_json::from_slice(payload).context("bad telemetry json")?;
    record
        .to_reading()
        .context("bad telemetry timestamp")
}

// ===========================================================================
// Tests
// ===========================================================================
