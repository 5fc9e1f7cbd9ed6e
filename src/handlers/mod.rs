use crate::{
    events::EventSender,
    services::{
        InventoryService, InvoicingService, JobCardService, QcService, RequisitionService,
        StockAdjustmentService,
    },
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod common;
pub mod inventory;
pub mod invoices;
pub mod job_cards;
pub mod qc;
pub mod requisitions;
pub mod stock_adjustments;

/// Container for the application's domain services, shared across handlers.
#[derive(Clone)]
pub struct AppServices {
    pub inventory: Arc<InventoryService>,
    pub requisitions: Arc<RequisitionService>,
    pub stock_adjustments: Arc<StockAdjustmentService>,
    pub job_cards: Arc<JobCardService>,
    pub qc: Arc<QcService>,
    pub invoicing: Arc<InvoicingService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        labor_rate: Decimal,
        tax_rate_percent: Decimal,
    ) -> Self {
        Self {
            inventory: Arc::new(InventoryService::new(db.clone(), event_sender.clone())),
            requisitions: Arc::new(RequisitionService::new(db.clone(), event_sender.clone())),
            stock_adjustments: Arc::new(StockAdjustmentService::new(
                db.clone(),
                event_sender.clone(),
            )),
            job_cards: Arc::new(JobCardService::new(db.clone(), event_sender.clone())),
            qc: Arc::new(QcService::new(db.clone(), event_sender.clone())),
            invoicing: Arc::new(InvoicingService::new(
                db,
                event_sender,
                labor_rate,
                tax_rate_percent,
            )),
        }
    }
}
