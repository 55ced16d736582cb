//! Attack submission interception
//!
//! Watches the buffered request body of submission requests and records
//! attacks locally. Strictly a side channel: nothing here may change what
//! gets forwarded to the collector or returned to the sensor.

use axum::http::Method;
use tracing::{debug, error, info};

use crate::db::{Attack, Database, SubmitOutcome};

// Endpoints used by the attack pod monitor:
// https://github.com/NetWatch-team/SSH-AttackPod/blob/main/src/monitor.py
pub const ENDPOINT_ADD_ATTACK: &str = "/add_attack";
/// Reserved pass-through endpoint, no special handling yet.
pub const ENDPOINT_CHECK_IP: &str = "/check_ip";

/// Whether this request carries an attack submission. Exact, case-sensitive
/// match on method and path.
pub fn is_submission(method: &Method, path: &str) -> bool {
    method == Method::POST && path == ENDPOINT_ADD_ATTACK
}

/// Decode and persist one submission body. Every failure is logged and
/// swallowed; the sensor's request proceeds regardless.
pub async fn observe_submission(db: &Database, body: &[u8]) {
    let attack: Attack = match serde_json::from_slice(body) {
        Ok(attack) => attack,
        Err(e) => {
            error!("Failed to decode attack data: {}", e);
            return;
        }
    };

    // Sensors submit test records to verify their own connectivity; those
    // must never pollute the dataset.
    if attack.test_mode {
        debug!("Skipping test mode attack from {}", attack.source_ip);
        return;
    }

    match db.submit_if_new(&attack).await {
        Ok(SubmitOutcome::Inserted) => {
            info!(
                "{} | From: {:<15} | User: {:<22} | Pass: {}",
                attack.attack_timestamp.format_local(),
                attack.source_ip,
                attack.username,
                attack.password
            );
        }
        Ok(SubmitOutcome::Duplicate) => {
            debug!("Skipping duplicate attack entry from {}", attack.source_ip);
        }
        Err(e) => {
            error!("Failed to save attack to DB: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::test_db;

    const PAYLOAD: &str = r#"{"source_ip":"1.2.3.4","destination_ip":"5.6.7.8","username":"root","password":"123456","attack_timestamp":"2024-01-01T10:00:00Z","evidence":"SSH-2.0-test","attack_type":"ssh-bruteforce","test_mode":false}"#;

    #[test]
    fn submission_match_is_exact() {
        assert!(is_submission(&Method::POST, ENDPOINT_ADD_ATTACK));
        assert!(!is_submission(&Method::GET, ENDPOINT_ADD_ATTACK));
        assert!(!is_submission(&Method::POST, ENDPOINT_CHECK_IP));
        assert!(!is_submission(&Method::POST, "/add_attack/"));
        assert!(!is_submission(&Method::POST, "/Add_Attack"));
    }

    #[tokio::test]
    async fn valid_submission_is_persisted_once() {
        let db = test_db().await;
        observe_submission(&db, PAYLOAD.as_bytes()).await;
        observe_submission(&db, PAYLOAD.as_bytes()).await;
        assert_eq!(db.get_total_attacks().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn malformed_body_is_ignored() {
        let db = test_db().await;
        observe_submission(&db, b"not json at all").await;
        observe_submission(&db, b"{\"source_ip\": 42}").await;
        assert_eq!(db.get_total_attacks().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unparseable_timestamp_fails_decode() {
        let db = test_db().await;
        let payload = PAYLOAD.replace("2024-01-01T10:00:00Z", "yesterday at noon");
        observe_submission(&db, payload.as_bytes()).await;
        assert_eq!(db.get_total_attacks().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mode_records_are_not_persisted() {
        let db = test_db().await;
        let payload = PAYLOAD.replace("\"test_mode\":false", "\"test_mode\":true");
        observe_submission(&db, payload.as_bytes()).await;
        assert_eq!(db.get_total_attacks().await.unwrap(), 0);
    }
}
