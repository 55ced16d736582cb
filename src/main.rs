//! Attack pod collector proxy
//!
//! Sits transparently between honeypot attack pods and their collector API:
//! - forwards every request and response unchanged
//! - records each distinct attack submission in a local SQLite database
//! - optionally answers submissions locally without contacting the upstream

mod config;
mod db;
mod intercept;
mod timestamp;
mod web;

use anyhow::Result;
use tracing::{debug, info, Level};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before any other initialization)
    let _ = dotenvy::dotenv();

    let config = config::Config::load()?;

    // Initialize logging based on LOG_FORMAT env var
    // Use LOG_FORMAT=gcp for structured GCP Cloud Logging
    let level = if config.debug_log {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "gcp" {
        tracing_subscriber::registry()
            .with(tracing_subscriber::filter::LevelFilter::from_level(level))
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_max_level(level).init();
    }

    info!("Starting attack pod proxy...");
    info!("Configuration loaded");

    // Initialize database; migrations must finish before the server
    // accepts its first connection.
    let db = db::Database::new(&config.database_path).await?;
    db.run_migrations().await?;
    info!(
        "Database initialized (schema version {})",
        db.schema_version().await?
    );

    match db.get_total_attacks().await {
        Ok(total) => info!("{} attacks recorded so far", total),
        Err(e) => info!("Could not count recorded attacks: {}", e),
    }
    if config.debug_log {
        log_startup_report(&db).await;
    }

    // Start web server (blocking)
    web::start_server(&config, db).await?;

    Ok(())
}

/// Dump a short summary of the stored dataset, for operators running with
/// debug logging enabled.
async fn log_startup_report(db: &db::Database) {
    let (recent, logins, attackers, daily, fingerprints) = tokio::join!(
        db.get_recent_attacks(5),
        db.get_top_logins(5),
        db.get_top_attackers_last_24_hours(),
        db.get_daily_attacks(7),
        db.get_credential_fingerprints(5),
    );

    if let Ok(recent) = recent {
        for row in recent {
            debug!(
                "Recent: {} {} -> {} as {}",
                row.timestamp, row.source_ip, row.destination_ip, row.username
            );
        }
    }
    if let Ok(logins) = logins {
        debug!("Top logins: {:?}", logins);
    }
    if let Ok(attackers) = attackers {
        debug!("Top attackers (24h): {:?}", attackers);
    }
    if let Ok(daily) = daily {
        debug!("Attacks per day: {:?}", daily);
    }
    if let Ok(fingerprints) = fingerprints {
        debug!("Rarest credential fingerprints: {:?}", fingerprints);
    }
}
