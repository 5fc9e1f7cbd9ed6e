use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, QueryResult, Statement};
use serde_json::Value;
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Enqueue a domain event into the outbox table, inside the same transaction
/// as the state change it describes. No-op on non-Postgres backends; sqlite
/// test runs rely on direct post-commit emission.
pub async fn enqueue(
    db: &impl ConnectionTrait,
    aggregate_type: &str,
    aggregate_id: Option<Uuid>,
    event_type: &str,
    payload: &Value,
) -> Result<(), ServiceError> {
    if db.get_database_backend() != DbBackend::Postgres {
        debug!(
            "outbox enqueue skipped for non-Postgres backend (aggregate_type={}, event_type={})",
            aggregate_type, event_type
        );
        return Ok(());
    }

    let id = Uuid::new_v4();
    let sql = r#"INSERT INTO outbox_events
        (id, aggregate_type, aggregate_id, event_type, payload, status, attempts, available_at, created_at)
        VALUES ($1, $2, $3, $4, $5::jsonb, 'pending', 0, NOW(), NOW())"#;
    let stmt = Statement::from_sql_and_values(
        DbBackend::Postgres,
        sql,
        vec![
            id.into(),
            aggregate_type.into(),
            aggregate_id.map(|v| v.into()).unwrap_or(Value::Null.into()),
            event_type.into(),
            payload.clone().into(),
        ],
    );
    db.execute(stmt).await.map_err(ServiceError::db_error)?;
    debug!(
        "enqueued outbox event {} type={} agg={}",
        id, event_type, aggregate_type
    );
    Ok(())
}

/// Background worker to poll and dispatch outbox events via in-process EventSender.
pub async fn start_worker(db: Arc<DatabaseConnection>, sender: EventSender) {
    if db.get_database_backend() != DbBackend::Postgres {
        info!(
            "Outbox worker disabled for {:?} backend; relying on direct event emission",
            db.get_database_backend()
        );
        return;
    }

    tokio::spawn(async move {
        loop {
            if let Err(e) = drain_once(&db, &sender, 50).await {
                error!("outbox worker error: {}", e);
            }
            sleep(Duration::from_millis(500)).await;
        }
    });
}

async fn drain_once(
    db: &DatabaseConnection,
    sender: &EventSender,
    batch_size: i64,
) -> Result<(), ServiceError> {
    const MAX_ATTEMPTS: i32 = 8;
    const BASE_BACKOFF_SECS: u64 = 2;
    // Claim a batch; SKIP LOCKED keeps concurrent workers out of each other's way.
    let sql_claim = r#"
        WITH cte AS (
            SELECT id FROM outbox_events
            WHERE status = 'pending' AND available_at <= NOW()
            ORDER BY created_at ASC
            FOR UPDATE SKIP LOCKED
            LIMIT $1
        )
        UPDATE outbox_events o
        SET status = 'processing', updated_at = NOW(), attempts = o.attempts + 1
        FROM cte
        WHERE o.id = cte.id
        RETURNING o.id, o.event_type, o.payload
    "#;
    let stmt =
        Statement::from_sql_and_values(DbBackend::Postgres, sql_claim, vec![batch_size.into()]);
    let rows: Vec<QueryResult> = db.query_all(stmt).await.map_err(ServiceError::db_error)?;

    for row in rows {
        let id: Uuid = row.try_get("", "id").unwrap_or_default();
        let et: String = row.try_get("", "event_type").unwrap_or_default();
        let payload: Value = row.try_get("", "payload").unwrap_or(Value::Null);

        let evt = map_to_event(&et, &payload).unwrap_or_else(|| Event::with_data(et.clone()));

        let dispatch_ok = sender.send(evt).await.is_ok();
        if dispatch_ok {
            let sql_update = r#"UPDATE outbox_events SET status = 'delivered', processed_at = NOW(), updated_at = NOW(), error_message = NULL WHERE id = $1"#;
            let stmt_upd =
                Statement::from_sql_and_values(DbBackend::Postgres, sql_update, vec![id.into()]);
            if let Err(e) = db.execute(stmt_upd).await {
                warn!("failed updating outbox {}: {}", id, e);
            }
        } else {
            // Reschedule with exponential backoff, or park after too many attempts.
            let sql_attempts = r#"SELECT attempts FROM outbox_events WHERE id = $1"#;
            let row = db
                .query_one(Statement::from_sql_and_values(
                    DbBackend::Postgres,
                    sql_attempts,
                    vec![id.into()],
                ))
                .await
                .map_err(ServiceError::db_error)?;
            let attempts: i32 = row
                .and_then(|r| r.try_get("", "attempts").ok())
                .unwrap_or(1);
            if attempts < MAX_ATTEMPTS {
                let backoff = BASE_BACKOFF_SECS.saturating_pow(attempts as u32);
                let now_ms = chrono::Utc::now().timestamp_millis() as u64;
                let jitter = now_ms % 1000; // ms
                let sql_retry = r#"UPDATE outbox_events SET status = 'pending', available_at = NOW() + make_interval(secs := $2::int) + ($3::int * interval '1 millisecond'), updated_at = NOW(), error_message = 'send failed' WHERE id = $1"#;
                let stmt_retry = Statement::from_sql_and_values(
                    DbBackend::Postgres,
                    sql_retry,
                    vec![id.into(), (backoff as i64).into(), (jitter as i64).into()],
                );
                if let Err(e) = db.execute(stmt_retry).await {
                    warn!("failed scheduling retry for outbox {}: {}", id, e);
                }
            } else {
                let sql_fail = r#"UPDATE outbox_events SET status = 'failed', updated_at = NOW(), error_message = 'max attempts exceeded' WHERE id = $1"#;
                let stmt_fail =
                    Statement::from_sql_and_values(DbBackend::Postgres, sql_fail, vec![id.into()]);
                if let Err(e) = db.execute(stmt_fail).await {
                    warn!("failed marking outbox {} failed: {}", id, e);
                }
            }
        }
    }
    Ok(())
}

fn map_to_event(event_type: &str, payload: &Value) -> Option<Event> {
    fn uuid_field(payload: &Value, key: &str) -> Option<Uuid> {
        payload
            .get(key)
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    match event_type {
        "RequisitionItemApproved" => {
            uuid_field(payload, "item_id").map(Event::RequisitionItemApproved)
        }
        "RequisitionItemRejected" => {
            uuid_field(payload, "item_id").map(Event::RequisitionItemRejected)
        }
        "RequisitionItemReturned" => {
            uuid_field(payload, "item_id").map(Event::RequisitionItemReturned)
        }
        "StockAdjustmentProposed" => {
            uuid_field(payload, "adjustment_id").map(Event::StockAdjustmentProposed)
        }
        "StockAdjustmentApproved" => {
            uuid_field(payload, "adjustment_id").map(Event::StockAdjustmentApproved)
        }
        "StockAdjustmentRejected" => {
            uuid_field(payload, "adjustment_id").map(Event::StockAdjustmentRejected)
        }
        "JobStatusChanged" => {
            let job_card_id = uuid_field(payload, "job_card_id")?;
            let old_status = payload.get("old_status")?.as_str()?.to_string();
            let new_status = payload.get("new_status")?.as_str()?.to_string();
            Some(Event::JobStatusChanged {
                job_card_id,
                old_status,
                new_status,
            })
        }
        "QcReviewed" => {
            let qc_request_id = uuid_field(payload, "qc_request_id")?;
            let job_card_id = uuid_field(payload, "job_card_id")?;
            let approved = payload.get("approved").and_then(|v| v.as_bool())?;
            Some(Event::QcReviewed {
                qc_request_id,
                job_card_id,
                approved,
            })
        }
        "InvoiceGenerated" => {
            let invoice_id = uuid_field(payload, "invoice_id")?;
            let job_card_id = uuid_field(payload, "job_card_id")?;
            let invoice_number = payload.get("invoice_number")?.as_str()?.to_string();
            Some(Event::InvoiceGenerated {
                invoice_id,
                job_card_id,
                invoice_number,
            })
        }
        "PaymentRecorded" => {
            let payment_id = uuid_field(payload, "payment_id")?;
            let invoice_id = uuid_field(payload, "invoice_id")?;
            let settled = payload
                .get("settled")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            Some(Event::PaymentRecorded {
                payment_id,
                invoice_id,
                settled,
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_job_status_changed_event() {
        let job_card_id = Uuid::new_v4();
        let payload = serde_json::json!({
            "job_card_id": job_card_id.to_string(),
            "old_status": "in_progress",
            "new_status": "qc_requested",
        });

        let event = map_to_event("JobStatusChanged", &payload).expect("event not mapped");
        match event {
            Event::JobStatusChanged {
                job_card_id: mapped_id,
                old_status,
                new_status,
            } => {
                assert_eq!(mapped_id, job_card_id);
                assert_eq!(old_status, "in_progress");
                assert_eq!(new_status, "qc_requested");
            }
            other => unreachable!("test expected JobStatusChanged but got {:?}", other),
        }
    }

    #[test]
    fn maps_payment_recorded_event() {
        let payment_id = Uuid::new_v4();
        let invoice_id = Uuid::new_v4();
        let payload = serde_json::json!({
            "payment_id": payment_id.to_string(),
            "invoice_id": invoice_id.to_string(),
            "settled": true,
        });

        let event = map_to_event("PaymentRecorded", &payload).expect("event not mapped");
        match event {
            Event::PaymentRecorded {
                payment_id: mapped_payment,
                invoice_id: mapped_invoice,
                settled,
            } => {
                assert_eq!(mapped_payment, payment_id);
                assert_eq!(mapped_invoice, invoice_id);
                assert!(settled);
            }
            other => unreachable!("test expected PaymentRecorded but got {:?}", other),
        }
    }

    #[test]
    fn unknown_event_types_do_not_map() {
        assert!(map_to_event("SomethingElse", &serde_json::json!({})).is_none());
    }

    #[test]
    fn incomplete_payload_does_not_map() {
        let payload = serde_json::json!({ "job_card_id": Uuid::new_v4().to_string() });
        assert!(map_to_event("JobStatusChanged", &payload).is_none());
    }
}
