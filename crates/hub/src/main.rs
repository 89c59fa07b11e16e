mod config;
mod db;
mod mqtt;
mod state;
mod trends;
mod web;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::{sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

use config::{Config, ConnectionSettings};
use db::Db;
use mqtt::{extract_node_id, parse_reading, TELEMETRY_FILTER};
use state::{SharedState, SystemState};
use trends::{analyze_node, TrendOutcome, TrendRequest};

#[derive(Parser)]
#[command(name = "greenhouse-hub", about = "Collects greenhouse readings and reports their trends")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest telemetry over MQTT and serve the JSON API (default).
    Serve,
    /// Print the trend analysis of one node's stored readings.
    Report {
        #[arg(long)]
        node: String,
        /// Moving-average window; defaults to the configured one.
        #[arg(long)]
        window: Option<usize>,
        /// Start of a time-of-day span, HH:MM.
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// End of a time-of-day span, HH:MM.
        #[arg(long, requires = "from")]
        to: Option<String>,
        /// Print the full report as JSON instead of the summary.
        #[arg(long)]
        json: bool,
    },
    /// Delete every stored reading of one node.
    Clear {
        #[arg(long)]
        node: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // ── Env + config file ───────────────────────────────────────────
    let settings = ConnectionSettings::from_env()?;
    let cfg = config::load(&settings.config_path)?;

    // ── Database ────────────────────────────────────────────────────
    let db = Db::connect(&settings.db_url).await?;
    db.migrate().await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(settings, cfg, db).await,
        Commands::Report {
            node,
            window,
            from,
            to,
            json,
        } => {
            let request = TrendRequest::parse(window, from.as_deref(), to.as_deref())?;
            report(&db, &cfg, &node, &request, json).await
        }
        Commands::Clear { node } => {
            let removed = db.clear_node(&node).await?;
            println!("Removed {removed} reading(s) for node '{node}'");
            Ok(())
        }
    }
}

async fn report(
    db: &Db,
    cfg: &Config,
    node_id: &str,
    request: &TrendRequest,
    json: bool,
) -> Result<()> {
    match analyze_node(db, node_id, &cfg.analysis, request).await? {
        TrendOutcome::NoData => println!("No data found to analyse"),
        TrendOutcome::TooFewPoints { points, min_points } => {
            println!("Not enough data to analyse: {points} reading(s), at least {min_points} needed")
        }
        TrendOutcome::Rejected(e) => anyhow::bail!("analysis failed for node '{node_id}': {e}"),
        TrendOutcome::Analysed(view) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                if let Some(name) = cfg.node_name(node_id) {
                    println!("{name} ({node_id})");
                }
                print!("{}", view.report.summary());
            }
        }
    }
    Ok(())
}

async fn serve(settings: ConnectionSettings, cfg: Config, db: Db) -> Result<()> {
    if cfg.nodes.is_empty() {
        tracing::warn!("no nodes configured; readings from any node will be accepted");
    }

    // ── Shared state (ephemeral, for the API) ───────────────────────
    let shared: SharedState = Arc::new(RwLock::new(SystemState::new()));
    shared.write().await.record_system("hub started".to_string());

    // ── Web server ──────────────────────────────────────────────────
    let app = web::AppState {
        shared: Arc::clone(&shared),
        db: db.clone(),
        analysis: cfg.analysis,
    };
    let web_port = settings.web_port;
    tokio::spawn(async move {
        if let Err(e) = web::serve(app, web_port).await {
            tracing::error!(error = %format!("{e:#}"), "web server stopped");
        }
    });

    // ── MQTT ────────────────────────────────────────────────────────
    let mut mqttoptions = MqttOptions::new("greenhouse-hub", settings.mqtt_host, settings.mqtt_port);
    mqttoptions.set_keep_alive(Duration::from_secs(30));

    let (client, mut eventloop) = AsyncClient::new(mqttoptions, 20);

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(p))) => {
                let Some(node_id) = extract_node_id(&p.topic) else {
                    tracing::debug!(topic = %p.topic, "unhandled topic");
                    continue;
                };

                match parse_reading(&p.payload) {
                    Ok(reading) => {
                        let name = cfg.node_name(node_id);
                        if name.is_none() && !cfg.nodes.is_empty() {
                            tracing::warn!(node_id, "reading from unregistered node");
                        }

                        // Persisting is best-effort; the live state still updates.
                        if let Err(e) = db.upsert_reading(node_id, &reading).await {
                            tracing::error!(node_id, error = %format!("{e:#}"), "db write failed");
                            shared
                                .write()
                                .await
                                .record_error(format!("db write failed for {node_id}: {e}"));
                        }

                        tracing::info!(node_id, "{}", reading.formatted_data());
                        shared
                            .write()
                            .await
                            .record_reading(node_id, name, reading.to_record());
                    }
                    Err(e) => {
                        tracing::warn!(topic = %p.topic, error = %format!("{e:#}"), "rejected telemetry");
                        shared.write().await.record_error(format!("{e:#}"));
                    }
                }
            }
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!("mqtt connected");
                // Subscriptions do not survive a clean-session reconnect.
                match client.try_subscribe(TELEMETRY_FILTER, QoS::AtLeastOnce) {
                    Ok(()) => tracing::info!(filter = TELEMETRY_FILTER, "hub subscribed"),
                    Err(e) => tracing::error!(error = %e, "subscribe failed"),
                }
                let mut st = shared.write().await;
                st.mqtt_connected = true;
                st.record_system("mqtt connected".to_string());
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::warn!("mqtt disconnected");
                let mut st = shared.write().await;
                st.mqtt_connected = false;
                st.record_system("mqtt disconnected".to_string());
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "mqtt error, reconnecting");

                let mut st = shared.write().await;
                st.mqtt_connected = false;
                st.record_error(format!("mqtt error: {e}"));
                drop(st);

                sleep(Duration::from_secs(2)).await;
            }
        }
    }
}
