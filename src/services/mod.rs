pub mod inventory;
pub mod invoicing;
pub mod job_cards;
pub mod qc;
pub mod requisitions;
pub mod stock_adjustments;

pub use inventory::InventoryService;
pub use invoicing::InvoicingService;
pub use job_cards::JobCardService;
pub use qc::QcService;
pub use requisitions::RequisitionService;
pub use stock_adjustments::StockAdjustmentService;
