//! Schema migration engine
//!
//! The schema version lives in the database itself (`PRAGMA user_version`),
//! so a restart mid-chain resumes from the last committed step. Each
//! migration runs inside one transaction together with the version bump;
//! either both land or neither does.

use anyhow::{Context, Result};
use sqlx::{Pool, Sqlite};
use tracing::{error, info};

use super::schema;

pub struct Migration {
    pub version: i64,
    pub sql: &'static str,
}

/// Ordered migration chain. Versions must be strictly increasing; append
/// only, never edit a shipped entry.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: schema::V1_FLAT_ATTACK_LOG,
    },
    Migration {
        version: 2,
        sql: schema::V2_DEDUP_AND_UNIQUE_INDEX,
    },
    Migration {
        version: 3,
        sql: schema::V3_ANALYSIS_VIEWS,
    },
    Migration {
        version: 4,
        sql: schema::V4_TOP_LOGINS_REPORT,
    },
    Migration {
        version: 5,
        sql: schema::V5_TRIM_EVIDENCE,
    },
    Migration {
        version: 6,
        sql: schema::V6_DICTIONARY_NORMALIZATION,
    },
];

/// Bring the database up to the latest known schema version.
pub async fn run(pool: &Pool<Sqlite>) -> Result<()> {
    apply(pool, MIGRATIONS).await
}

pub async fn current_version(pool: &Pool<Sqlite>) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .context("could not read user_version")?;
    Ok(row.0)
}

/// Apply every migration in `migrations` whose version exceeds the stored
/// one, in order. Fails fast: a broken step leaves the database at the last
/// committed version.
pub(crate) async fn apply(pool: &Pool<Sqlite>, migrations: &[Migration]) -> Result<()> {
    let mut current = current_version(pool).await?;
    info!("Current DB version: {}", current);

    let mut migrated = false;

    for migration in migrations {
        if current >= migration.version {
            continue;
        }

        info!("Migrating database to version {}...", migration.version);

        let mut tx = pool.begin().await.with_context(|| {
            format!(
                "could not begin transaction for migration to version {}",
                migration.version
            )
        })?;

        sqlx::raw_sql(migration.sql)
            .execute(&mut *tx)
            .await
            .with_context(|| {
                format!("could not execute migration to version {}", migration.version)
            })?;

        let set_version = format!("PRAGMA user_version = {}", migration.version);
        sqlx::raw_sql(&set_version)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("could not set user_version to {}", migration.version))?;

        tx.commit().await.with_context(|| {
            format!(
                "could not commit transaction for migration to version {}",
                migration.version
            )
        })?;

        info!("Successfully migrated database to version {}", migration.version);
        current = migration.version;
        migrated = true;
    }

    if migrated {
        info!("Running vacuum to shrink the database file...");
        // Not part of any migration's guarantees, so failure is non-fatal.
        if let Err(e) = sqlx::query("VACUUM").execute(pool).await {
            error!("Failed to run VACUUM: {}", e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::memory_pool;

    #[tokio::test]
    async fn fresh_database_migrates_to_latest() {
        let pool = memory_pool().await;
        run(&pool).await.unwrap();

        assert_eq!(current_version(&pool).await.unwrap(), 6);

        // The normalized schema is in place.
        for table in [
            "_attacks",
            "_dict_source_ips",
            "_dict_destination_ips",
            "_dict_usernames",
            "_dict_passwords",
            "_dict_attack_types",
            "_dict_evidences",
        ] {
            let row: (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(table)
            .fetch_one(&pool)
            .await
            .unwrap();
            assert_eq!(row.0, 1, "missing table {}", table);
        }

        // The reconstituted view replaces the flat table.
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'view' AND name = 'attacks'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(row.0, 1);
    }

    #[tokio::test]
    async fn second_run_is_a_noop() {
        let pool = memory_pool().await;
        run(&pool).await.unwrap();
        run(&pool).await.unwrap();
        assert_eq!(current_version(&pool).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn legacy_database_is_normalized_without_data_loss() {
        let pool = memory_pool().await;

        // Stop at version 1 and fill the flat table the way an old release
        // would have: duplicates and a NULL row included.
        apply(&pool, &MIGRATIONS[..1]).await.unwrap();
        assert_eq!(current_version(&pool).await.unwrap(), 1);

        let insert = r#"
            INSERT INTO attacks (source_ip, destination_ip, username, password, attack_timestamp, evidence, attack_type)
            VALUES (?, ?, ?, ?, ?, ?, ?)
        "#;
        for _ in 0..3 {
            sqlx::query(insert)
                .bind("1.2.3.4")
                .bind("5.6.7.8")
                .bind("root")
                .bind("123456")
                .bind(1_704_103_200_000_i64)
                .bind("SSH-2.0-test")
                .bind("ssh-bruteforce")
                .execute(&pool)
                .await
                .unwrap();
        }
        sqlx::query(insert)
            .bind("9.9.9.9")
            .bind("5.6.7.8")
            .bind("admin")
            .bind("123456")
            .bind(1_704_103_260_000_i64)
            .bind("SSH-2.0-test")
            .bind("ssh-bruteforce")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO attacks (source_ip) VALUES ('3.3.3.3')")
            .execute(&pool)
            .await
            .unwrap();

        run(&pool).await.unwrap();
        assert_eq!(current_version(&pool).await.unwrap(), 6);

        // Duplicates collapsed, NULL row purged.
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attacks")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.0, 2);

        // Dictionaries hold the distinct historical values.
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _dict_source_ips")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.0, 2);
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _dict_passwords")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(row.0, 1);

        // The reconstituted view still reads like the flat table did.
        let row: (String, String) = sqlx::query_as(
            "SELECT username, password FROM attacks WHERE source_ip = '9.9.9.9'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(row, ("admin".to_string(), "123456".to_string()));
    }

    #[tokio::test]
    async fn failed_step_leaves_version_at_last_commit() {
        let pool = memory_pool().await;

        let chain = &[
            Migration {
                version: 1,
                sql: "CREATE TABLE probe (id INTEGER PRIMARY KEY)",
            },
            Migration {
                version: 2,
                sql: "THIS IS NOT SQL",
            },
        ];

        assert!(apply(&pool, chain).await.is_err());
        assert_eq!(current_version(&pool).await.unwrap(), 1);

        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'probe'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(row.0, 1);
    }
}
