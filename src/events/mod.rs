use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

pub mod outbox;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Post-commit emission: the state change is already durable, so a full
    /// channel or shut-down receiver only costs us the notification. Log and
    /// move on.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!("event dropped after commit: {:?}: {}", event, e);
        }
    }
}

// The domain events emitted after a mutation commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Requisition events
    RequisitionCreated {
        requisition_group_id: Uuid,
        job_card_id: Uuid,
        item_count: usize,
    },
    RequisitionItemApproved(Uuid),
    RequisitionItemRejected(Uuid),
    RequisitionItemReturned(Uuid),

    // Inventory events
    StockMovementRecorded {
        product_id: Uuid,
        movement_id: Uuid,
        quantity_before: i32,
        quantity_change: i32,
        quantity_after: i32,
        reference_type: String,
    },
    StockAdjustmentProposed(Uuid),
    StockAdjustmentApproved(Uuid),
    StockAdjustmentRejected(Uuid),

    // Job lifecycle events
    JobStatusChanged {
        job_card_id: Uuid,
        old_status: String,
        new_status: String,
    },
    QcReviewed {
        qc_request_id: Uuid,
        job_card_id: Uuid,
        approved: bool,
    },

    // Billing events
    InvoiceGenerated {
        invoice_id: Uuid,
        job_card_id: Uuid,
        invoice_number: String,
    },
    PaymentRecorded {
        payment_id: Uuid,
        invoice_id: Uuid,
        settled: bool,
    },

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    /// Create a generic event with string data
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

// Function to process incoming events and distribute them to interested handlers.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::StockMovementRecorded {
                product_id,
                quantity_after,
                reference_type,
                ..
            } => {
                info!(
                    "stock movement recorded: product={} after={} ref={}",
                    product_id, quantity_after, reference_type
                );
                if quantity_after < 0 {
                    warn!(
                        "negative stock after movement: product {} at {}",
                        product_id, quantity_after
                    );
                }
            }
            Event::JobStatusChanged {
                job_card_id,
                ref old_status,
                ref new_status,
            } => {
                info!(
                    "job {} moved {} -> {}",
                    job_card_id, old_status, new_status
                );
            }
            Event::QcReviewed {
                job_card_id,
                approved,
                ..
            } => {
                if approved {
                    info!("qc passed for job {}", job_card_id);
                } else {
                    warn!("qc rejected for job {}, rework required", job_card_id);
                }
            }
            Event::InvoiceGenerated {
                invoice_id,
                invoice_number,
                ..
            } => {
                info!("invoice {} generated as {}", invoice_id, invoice_number);
            }
            Event::PaymentRecorded {
                invoice_id,
                settled,
                ..
            } => {
                if settled {
                    info!("invoice {} fully settled", invoice_id);
                } else {
                    info!("partial payment recorded on invoice {}", invoice_id);
                }
            }
            other => {
                info!("event: {:?}", other);
            }
        }
    }

    warn!("Event processing loop has ended");
}
