pub mod invoice_item;
pub mod inventory_movement;
pub mod job_card;
pub mod job_status_history;
pub mod payment;
pub mod product;
pub mod product_batch;
pub mod qc_checklist_item;
pub mod qc_request;
pub mod requisition_item;
pub mod service_invoice;
pub mod service_task;
pub mod stock_adjustment;
pub mod stock_adjustment_item;
