mod sim;

use anyhow::{bail, Context, Result};
use greenhouse_core::Series;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{sleep, timeout};
use tracing_subscriber::EnvFilter;

use sim::NodeConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = NodeConfig::from_env()?;
    let series = cfg.sim.build_series()?;
    tracing::info!(
        node_id = %cfg.node_id,
        readings = series.len(),
        seed = ?cfg.sim.seed,
        "simulated series ready"
    );

    if cfg.dry_run {
        for line in record_lines(&series)? {
            println!("{line}");
        }
        return Ok(());
    }

    publish(&cfg, &series, CONNECT_TIMEOUT).await
}

/// One JSON document per reading.
fn record_lines(series: &Series) -> Result<Vec<String>> {
    series
        .iter()
        .map(|r| serde_json::to_string(&r.to_record()).context("failed to encode reading"))
        .collect()
}

/// How long to wait for the broker to accept the connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// How long one publish may wait for room in the client queue.
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

async fn publish(cfg: &NodeConfig, series: &Series, connect_timeout: Duration) -> Result<()> {
    let client_id = format!("greenhouse-node-{}", cfg.node_id);

    let mut mqttoptions = MqttOptions::new(client_id, cfg.mqtt_host.clone(), cfg.mqtt_port);
    mqttoptions.set_keep_alive(Duration::from_secs(30));

    let (client, mut eventloop) = AsyncClient::new(mqttoptions, 10);
    let (connected_tx, connected_rx) = oneshot::channel();

    // We only publish, but the event loop must run to carry the traffic.
    let driver = tokio::spawn(async move {
        let mut connected_tx = Some(connected_tx);
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!("node connected to mqtt");
                    if let Some(tx) = connected_tx.take() {
                        let _ = tx.send(());
                    }
                }
                Ok(Event::Outgoing(rumqttc::Outgoing::Disconnect)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "mqtt error, retrying");
                    sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });

    if !matches!(timeout(connect_timeout, connected_rx).await, Ok(Ok(()))) {
        driver.abort();
        bail!(
            "no connection to mqtt broker {}:{} within {}s",
            cfg.mqtt_host,
            cfg.mqtt_port,
            connect_timeout.as_secs_f64()
        );
    }

    let topic = cfg.telemetry_topic();
    let delay = Duration::from_millis(cfg.publish_delay_ms);
    tracing::info!(%topic, text_topic = %cfg.text_topic, "publishing");

    let mut published = 0usize;
    for reading in series {
        let record = reading.to_record();
        let payload = serde_json::to_vec(&record).context("failed to encode reading")?;

        match send(&client, &topic, payload).await {
            Ok(()) => {
                published += 1;
                tracing::info!("{}", record.formatted_data);
            }
            Err(e) => tracing::error!(error = %format!("{e:#}"), ts = %record.timestamp, "publish failed"),
        }

        if let Err(e) = send(&client, &cfg.text_topic, record.formatted_data.into_bytes()).await {
            tracing::error!(error = %format!("{e:#}"), topic = %cfg.text_topic, "text publish failed");
        }

        sleep(delay).await;
    }

    tracing::info!(published, total = series.len(), "simulation complete");

    if let Err(e) = client.try_disconnect() {
        tracing::warn!(error = %e, "mqtt disconnect failed");
    }
    // Give queued publishes a moment to flush.
    if timeout(Duration::from_secs(5), driver).await.is_err() {
        tracing::warn!("mqtt event loop did not finish before shutdown");
    }
    Ok(())
}

/// Queue one QoS 1 publish.  A queue that stays full counts as a failure.
async fn send(client: &AsyncClient, topic: &str, payload: Vec<u8>) -> Result<()> {
    timeout(PUBLISH_TIMEOUT, client.publish(topic, QoS::AtLeastOnce, false, payload))
        .await
        .context("mqtt client queue full")?
        .with_context(|| format!("publish to {topic} failed"))
}

// ===========================================================================
// Tests
// ===========================================================================
