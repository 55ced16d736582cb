//! Database module
//!
//! Attack storage is dictionary-encoded: every categorical field lives in
//! its own `_dict_*` table and the `_attacks` fact table references the
//! surrogate ids. A view named `attacks` reconstitutes human-readable rows.

pub mod migrations;
mod schema;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite, Transaction};
use tokio::sync::Mutex;

use crate::timestamp::FlexibleTime;

/// One attack submission as reported by a sensor.
#[derive(Debug, Clone, Deserialize)]
pub struct Attack {
    #[serde(default)]
    pub source_ip: String,
    #[serde(default)]
    pub destination_ip: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub attack_timestamp: FlexibleTime,
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub attack_type: String,
    #[serde(default)]
    pub test_mode: bool,
}

/// Result of a submission attempt. Duplicates are expected under sensor
/// retry behavior and are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Inserted,
    Duplicate,
}

const DICT_SOURCE_IPS: &str = "_dict_source_ips";
const DICT_DESTINATION_IPS: &str = "_dict_destination_ips";
const DICT_USERNAMES: &str = "_dict_usernames";
const DICT_PASSWORDS: &str = "_dict_passwords";
const DICT_ATTACK_TYPES: &str = "_dict_attack_types";
const DICT_EVIDENCES: &str = "_dict_evidences";

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
    // SQLite transactions alone cannot stop two writers from both seeing
    // "no such row" before either commits, so every check-then-insert runs
    // under this lock. The unique index remains the authoritative guard.
    write_lock: Arc<Mutex<()>>,
}

impl Database {
    pub async fn new(database_path: &str) -> Result<Self> {
        if let Some(dir) = Path::new(database_path).parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("could not create data directory {:?}", dir))?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .connect(&format!("sqlite:{}?mode=rwc", database_path))
            .await
            .with_context(|| format!("could not open database {}", database_path))?;

        // WAL mode for better concurrency between ingestion and reads.
        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
        sqlx::query("PRAGMA synchronous=NORMAL").execute(&pool).await?;

        Ok(Self::from_pool(pool))
    }

    fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Bring the schema up to date. Must complete before the server starts
    /// accepting connections.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run(&self.pool).await
    }

    pub async fn schema_version(&self) -> Result<i64> {
        migrations::current_version(&self.pool).await
    }

    /// Look up `value` in a dictionary table, inserting it on first sight.
    /// Ids are stable for the lifetime of the datastore and never reused.
    ///
    /// `table` must be one of the `DICT_*` constants; it is interpolated
    /// into the statement because SQLite cannot bind identifiers.
    async fn resolve_dict_id(
        tx: &mut Transaction<'_, Sqlite>,
        table: &str,
        value: &str,
    ) -> Result<i64> {
        let sql = format!(
            r#"INSERT INTO "{}" ("value") VALUES (?)
               ON CONFLICT("value") DO UPDATE SET "value" = excluded."value"
               RETURNING "id""#,
            table
        );
        let row: (i64,) = sqlx::query_as(&sql).bind(value).fetch_one(&mut **tx).await?;
        Ok(row.0)
    }

    /// Store an attack unless an identical one already exists.
    ///
    /// Dictionary resolution, the duplicate check, and the fact insert all
    /// happen inside one serialized transaction, so the 7-tuple uniqueness
    /// invariant holds under concurrent submissions.
    pub async fn submit_if_new(&self, attack: &Attack) -> Result<SubmitOutcome> {
        let _guard = self.write_lock.lock().await;

        let mut tx = self
            .pool
            .begin()
            .await
            .context("could not begin transaction")?;

        let timestamp = attack.attack_timestamp.timestamp_millis();
        let evidence = attack.evidence.trim();

        let source_ip_id = Self::resolve_dict_id(&mut tx, DICT_SOURCE_IPS, &attack.source_ip).await?;
        let destination_ip_id =
            Self::resolve_dict_id(&mut tx, DICT_DESTINATION_IPS, &attack.destination_ip).await?;
        let username_id = Self::resolve_dict_id(&mut tx, DICT_USERNAMES, &attack.username).await?;
        let password_id = Self::resolve_dict_id(&mut tx, DICT_PASSWORDS, &attack.password).await?;
        let attack_type_id =
            Self::resolve_dict_id(&mut tx, DICT_ATTACK_TYPES, &attack.attack_type).await?;
        let evidence_id = Self::resolve_dict_id(&mut tx, DICT_EVIDENCES, evidence).await?;

        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM _attacks WHERE
                timestamp = ? AND
                source_ip = ? AND
                destination_ip = ? AND
                username = ? AND
                password = ? AND
                attack_type = ? AND
                evidence = ?
            "#,
        )
        .bind(timestamp)
        .bind(source_ip_id)
        .bind(destination_ip_id)
        .bind(username_id)
        .bind(password_id)
        .bind(attack_type_id)
        .bind(evidence_id)
        .fetch_one(&mut *tx)
        .await
        .context("could not check for duplicate attack")?;

        if row.0 > 0 {
            tx.rollback().await.ok();
            return Ok(SubmitOutcome::Duplicate);
        }

        let insert = sqlx::query(
            r#"
            INSERT INTO _attacks (timestamp, source_ip, destination_ip, username, password, attack_type, evidence)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(timestamp)
        .bind(source_ip_id)
        .bind(destination_ip_id)
        .bind(username_id)
        .bind(password_id)
        .bind(attack_type_id)
        .bind(evidence_id)
        .execute(&mut *tx)
        .await;

        match insert {
            Ok(_) => {
                tx.commit().await.context("could not commit transaction")?;
                Ok(SubmitOutcome::Inserted)
            }
            // The unique index is the authoritative duplicate guard; a
            // constraint violation here is the same expected outcome.
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                tx.rollback().await.ok();
                Ok(SubmitOutcome::Duplicate)
            }
            Err(e) => Err(e).context("could not execute insert statement"),
        }
    }

    pub async fn get_total_attacks(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attacks")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// Reconstituted rows, newest first.
    pub async fn get_recent_attacks(&self, limit: i32) -> Result<Vec<AttackRow>> {
        let rows: Vec<(i64, i64, String, String, String, String, String, String)> =
            sqlx::query_as(
                r#"
                SELECT id, timestamp, source_ip, destination_ip, username, password, attack_type, evidence
                FROM attacks
                ORDER BY timestamp DESC, id DESC
                LIMIT ?
                "#,
            )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, timestamp, source_ip, destination_ip, username, password, attack_type, evidence)| {
                    AttackRow {
                        id,
                        timestamp,
                        source_ip,
                        destination_ip,
                        username,
                        password,
                        attack_type,
                        evidence,
                    }
                },
            )
            .collect())
    }

    pub async fn get_top_logins(&self, limit: i32) -> Result<Vec<LoginStat>> {
        let rows: Vec<(String, String, i64)> =
            sqlx::query_as("SELECT username, password, count FROM view_logins LIMIT ?")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(username, password, count)| LoginStat {
                username,
                password,
                count,
            })
            .collect())
    }

    pub async fn get_top_attackers_last_24_hours(&self) -> Result<Vec<SourceStat>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT source_ip, count FROM report_top_attackers_last_24_hours")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(source_ip, count)| SourceStat { source_ip, count })
            .collect())
    }

    pub async fn get_daily_attacks(&self, limit: i32) -> Result<Vec<DailyStat>> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT date, count FROM view_daily_attacks LIMIT ?")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(date, count)| DailyStat { date, count })
            .collect())
    }

    /// Credential fingerprints: pairs seen from a single source IP point at
    /// targeted attacks or private wordlists.
    pub async fn get_credential_fingerprints(&self, limit: i32) -> Result<Vec<FingerprintStat>> {
        let rows: Vec<(String, String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT username, password, total_uses, distinct_source_ips
            FROM view_credential_fingerprints
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(username, password, total_uses, distinct_source_ips)| FingerprintStat {
                    username,
                    password,
                    total_uses,
                    distinct_source_ips,
                },
            )
            .collect())
    }
}

/// One row of the reconstituted `attacks` view.
#[derive(Debug, Clone, Serialize)]
pub struct AttackRow {
    pub id: i64,
    pub timestamp: i64,
    pub source_ip: String,
    pub destination_ip: String,
    pub username: String,
    pub password: String,
    pub attack_type: String,
    pub evidence: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginStat {
    pub username: String,
    pub password: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceStat {
    pub source_ip: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyStat {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FingerprintStat {
    pub username: String,
    pub password: String,
    pub total_uses: i64,
    pub distinct_source_ips: i64,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Single-connection in-memory pool; with more than one connection each
    /// would get its own empty memory database.
    pub(crate) async fn memory_pool() -> Pool<Sqlite> {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool")
    }

    pub(crate) async fn test_db() -> Database {
        let db = Database::from_pool(memory_pool().await);
        db.run_migrations().await.expect("migrations");
        db
    }

    pub(crate) fn sample_attack() -> Attack {
        Attack {
            source_ip: "1.2.3.4".to_string(),
            destination_ip: "5.6.7.8".to_string(),
            username: "root".to_string(),
            password: "123456".to_string(),
            attack_timestamp: FlexibleTime::parse("2024-01-01T10:00:00Z").unwrap(),
            evidence: "SSH-2.0-test".to_string(),
            attack_type: "ssh-bruteforce".to_string(),
            test_mode: false,
        }
    }

    #[tokio::test]
    async fn repeated_submission_stores_one_row() {
        let db = test_db().await;
        let attack = sample_attack();

        assert_eq!(db.submit_if_new(&attack).await.unwrap(), SubmitOutcome::Inserted);
        for _ in 0..4 {
            assert_eq!(
                db.submit_if_new(&attack).await.unwrap(),
                SubmitOutcome::Duplicate
            );
        }
        assert_eq!(db.get_total_attacks().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn submission_payload_decodes_and_round_trips() {
        let db = test_db().await;
        let payload = r#"{"source_ip":"1.2.3.4","destination_ip":"5.6.7.8","username":"root","password":"123456","attack_timestamp":"2024-01-01T10:00:00Z","evidence":"SSH-2.0-test","attack_type":"ssh-bruteforce","test_mode":false}"#;
        let attack: Attack = serde_json::from_str(payload).unwrap();

        assert_eq!(db.submit_if_new(&attack).await.unwrap(), SubmitOutcome::Inserted);
        assert_eq!(
            db.submit_if_new(&attack).await.unwrap(),
            SubmitOutcome::Duplicate
        );

        let rows = db.get_recent_attacks(10).await.unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.timestamp, 1_704_103_200_000);
        assert_eq!(row.source_ip, "1.2.3.4");
        assert_eq!(row.username, "root");
        assert_eq!(row.password, "123456");
        assert_eq!(row.attack_type, "ssh-bruteforce");
        assert_eq!(row.evidence, "SSH-2.0-test");
    }

    #[tokio::test]
    async fn dictionary_ids_are_stable_and_distinct() {
        let db = test_db().await;

        let mut tx = db.pool.begin().await.unwrap();
        let a = Database::resolve_dict_id(&mut tx, DICT_USERNAMES, "root").await.unwrap();
        let b = Database::resolve_dict_id(&mut tx, DICT_USERNAMES, "root").await.unwrap();
        let c = Database::resolve_dict_id(&mut tx, DICT_USERNAMES, "admin").await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);

        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _dict_usernames")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(row.0, 2);
    }

    #[tokio::test]
    async fn shared_values_are_not_reinserted() {
        let db = test_db().await;

        let first = sample_attack();
        let second = Attack {
            source_ip: "9.9.9.9".to_string(),
            ..sample_attack()
        };

        assert_eq!(db.submit_if_new(&first).await.unwrap(), SubmitOutcome::Inserted);
        assert_eq!(db.submit_if_new(&second).await.unwrap(), SubmitOutcome::Inserted);

        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _dict_usernames")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(row.0, 1);
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _dict_source_ips")
            .fetch_one(&db.pool)
            .await
            .unwrap();
        assert_eq!(row.0, 2);
    }

    #[tokio::test]
    async fn evidence_is_trimmed_before_storage() {
        let db = test_db().await;

        let padded = Attack {
            evidence: "  SSH-2.0-test \r\n".to_string(),
            ..sample_attack()
        };
        assert_eq!(db.submit_if_new(&padded).await.unwrap(), SubmitOutcome::Inserted);
        assert_eq!(
            db.submit_if_new(&sample_attack()).await.unwrap(),
            SubmitOutcome::Duplicate
        );

        let rows = db.get_recent_attacks(1).await.unwrap();
        assert_eq!(rows[0].evidence, "SSH-2.0-test");
    }

    #[tokio::test]
    async fn concurrent_identical_submissions_insert_once() {
        let db = test_db().await;
        let attack = sample_attack();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let db = db.clone();
            let attack = attack.clone();
            tasks.push(tokio::spawn(async move { db.submit_if_new(&attack).await }));
        }

        let mut inserted = 0;
        for task in tasks {
            if task.await.unwrap().unwrap() == SubmitOutcome::Inserted {
                inserted += 1;
            }
        }

        assert_eq!(inserted, 1);
        assert_eq!(db.get_total_attacks().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn report_views_reflect_stored_attacks() {
        let db = test_db().await;

        db.submit_if_new(&sample_attack()).await.unwrap();
        let other_source = Attack {
            source_ip: "9.9.9.9".to_string(),
            attack_timestamp: FlexibleTime::parse("2024-01-01T11:00:00Z").unwrap(),
            ..sample_attack()
        };
        db.submit_if_new(&other_source).await.unwrap();
        // A fresh attack so the 24-hour report window is not empty.
        let fresh = Attack {
            source_ip: "9.9.9.9".to_string(),
            attack_timestamp: chrono::Utc::now().into(),
            ..sample_attack()
        };
        db.submit_if_new(&fresh).await.unwrap();

        let logins = db.get_top_logins(10).await.unwrap();
        assert_eq!(logins.len(), 1);
        assert_eq!(logins[0].username, "root");
        assert_eq!(logins[0].count, 3);

        let fingerprints = db.get_credential_fingerprints(10).await.unwrap();
        assert_eq!(fingerprints.len(), 1);
        assert_eq!(fingerprints[0].total_uses, 3);
        assert_eq!(fingerprints[0].distinct_source_ips, 2);

        let attackers = db.get_top_attackers_last_24_hours().await.unwrap();
        assert_eq!(attackers.len(), 1);
        assert_eq!(attackers[0].source_ip, "9.9.9.9");
        assert_eq!(attackers[0].count, 1);

        let daily = db.get_daily_attacks(10).await.unwrap();
        assert_eq!(daily.iter().map(|d| d.count).sum::<i64>(), 3);
    }
}
