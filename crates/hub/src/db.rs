use anyhow::{Context, Result};
use greenhouse_core::series::{format_timestamp, parse_timestamp};
use greenhouse_core::{Reading, SensorData};
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use time::OffsetDateTime;

#[derive(Clone)]
pub struct Db {
    pool: Pool<Sqlite>,
}

/// Stored-reading counts and time span for one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSummary {
    pub node_id: String,
    pub readings: i64,
    pub first_ts: String,
    pub last_ts: String,
}

fn reading_from_row(row: &SqliteRow) -> Result<Reading> {
    let ts: String = row.try_get("ts")?;
    let timestamp =
        parse_timestamp(&ts).with_context(|| format!("corrupt timestamp in store: {ts}"))?;
    Ok(Reading::new(
        timestamp,
        SensorData {
            temperature: row.try_get("temperature")?,
            humidity: row.try_get("humidity")?,
            soil_moisture: row.try_get("soil_moisture")?,
            light_level: row.try_get("light_level")?,
            co2_level: row.try_get("co2_level")?,
        },
    ))
}

impl Db {
    /// db_url examples:
    /// - "sqlite:/home/pi/greenhouse/greenhouse.db"
    /// - "sqlite::memory:" (tests)
    pub async fn connect(db_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(db_url)
            .with_context(|| format!("invalid sqlite connection string: {db_url}"))?
            .journal_mode(SqliteJournalMode::Wal);

        // Every connection to an in-memory database sees its own empty db.
        let max_connections = if db_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("failed to connect to sqlite db: {db_url}"))?;

        Ok(Self { pool })
    }

    /// Runs SQLx migrations from ./migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("failed to run migrations")?;
        Ok(())
    }

    // ----------------------------
    // Readings
    // ----------------------------

    /// Insert a reading, replacing any earlier one from the same node with
    /// the same timestamp.
    pub async fn upsert_reading(&self, node_id: &str, reading: &Reading) -> Result<()> {
        let data = reading.data();
        let received_at = OffsetDateTime::now_utc().unix_timestamp();
        sqlx::query(
            r#"
            INSERT INTO readings (
              node_id, ts,
              temperature, humidity, soil_moisture, light_level, co2_level,
              formatted_data, received_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(node_id, ts) DO UPDATE SET
              temperature=excluded.temperature,
              humidity=excluded.humidity,
              soil_moisture=excluded.soil_moisture,
              light_level=excluded.light_level,
              co2_level=excluded.co2_level,
              formatted_data=excluded.formatted_data,
              received_at=excluded.received_at
            "#,
        )
        .bind(node_id)
        .bind(format_timestamp(reading.timestamp()))
        .bind(data.temperature)
        .bind(data.humidity)
        .bind(data.soil_moisture)
        .bind(data.light_level)
        .bind(data.co2_level)
        .bind(reading.formatted_data())
        .bind(received_at)
        .execute(&self.pool)
        .await
        .context("upsert_reading failed")?;
        Ok(())
    }

    /// All readings for a node, oldest first.  Empty when nothing is stored.
    pub async fn load_readings(&self, node_id: &str) -> Result<Vec<Reading>> {
        let rows = sqlx::query(
            r#"
            SELECT ts, temperature, humidity, soil_moisture, light_level, co2_level
            FROM readings
            WHERE node_id = ?
            ORDER BY ts
            "#,
        )
        .bind(node_id)
        .fetch_all(&self.pool)
        .await
        .context("load_readings failed")?;

        rows.iter().map(reading_from_row).collect()
    }

    pub async fn list_nodes(&self) -> Result<Vec<NodeSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT node_id, COUNT(*) AS readings, MIN(ts) AS first_ts, MAX(ts) AS last_ts
            FROM readings
            GROUP BY node_id
            ORDER BY node_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("list_nodes failed")?;

        rows.iter()
            .map(|r| -> Result<NodeSummary> {
                Ok(NodeSummary {
                    node_id: r.try_get("node_id")?,
                    readings: r.try_get("readings")?,
                    first_ts: r.try_get("first_ts")?,
                    last_ts: r.try_get("last_ts")?,
                })
            })
            .collect()
    }

    /// Delete every reading stored for a node.  Returns the number removed.
    pub async fn clear_node(&self, node_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM readings WHERE node_id = ?")
            .bind(node_id)
            .execute(&self.pool)
            .await
            .context("clear_node failed")?;
        Ok(result.rows_affected())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use greenhouse_core::SeriesGenerator;
    use time::macros::datetime;
    use time::Duration;

    async fn memory_db() -> Db {
        let db = Db::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn day(seed: u64) -> Vec<Reading> {
        SeriesGenerator::default()
            .generate(
                datetime!(2025-01-21 00:00:00),
                48,
                Duration::minutes(30),
                &mut fastrand::Rng::with_seed(seed),
            )
            .unwrap()
            .readings()
            .to_vec()
    }

    #[tokio::test]
    async fn round_trip_preserves_order_and_values() {
        let db = memory_db().await;
        let readings = day(3);
        // insert out of order; load must sort by timestamp
        for r in readings.iter().rev() {
            db.upsert_reading("gh-1", r).await.unwrap();
        }
        let loaded = db.load_readings("gh-1").await.unwrap();
        assert_eq!(loaded, readings);
    }

    #[tokio::test]
    async fn upsert_replaces_same_timestamp() {
        let db = memory_db().await;
        let first = day(1);
        let second = day(2);
        for r in first.iter().chain(&second) {
            db.upsert_reading("gh-1", r).await.unwrap();
        }
        let loaded = db.load_readings("gh-1").await.unwrap();
        assert_eq!(loaded, second);
    }

    #[tokio::test]
    async fn unknown_node_is_empty() {
        let db = memory_db().await;
        assert!(db.load_readings("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn nodes_are_listed_and_cleared_separately() {
        let db = memory_db().await;
        let readings = day(4);
        for r in &readings {
            db.upsert_reading("gh-1", r).await.unwrap();
        }
        for r in &readings[..10] {
            db.upsert_reading("gh-2", r).await.unwrap();
        }

        let nodes = db.list_nodes().await.unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].node_id, "gh-1");
        assert_eq!(nodes[0].readings, 48);
        assert_eq!(nodes[0].first_ts, "2025-01-21T00:00:00");
        assert_eq!(nodes[0].last_ts, "2025-01-21T23:30:00");
        assert_eq!(nodes[1].readings, 10);

        assert_eq!(db.clear_node("gh-2").await.unwrap(), 10);
        assert!(db.load_readings("gh-2").await.unwrap().is_empty());
        assert_eq!(db.load_readings("gh-1").await.unwrap().len(), 48);
    }
}
