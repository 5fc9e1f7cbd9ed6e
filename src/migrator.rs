use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260801_000001_create_products_tables::Migration),
            Box::new(m20260801_000002_create_inventory_movements_table::Migration),
            Box::new(m20260801_000003_create_job_cards_tables::Migration),
            Box::new(m20260801_000004_create_requisition_items_table::Migration),
            Box::new(m20260801_000005_create_stock_adjustments_tables::Migration),
            Box::new(m20260801_000006_create_qc_tables::Migration),
            Box::new(m20260801_000007_create_invoicing_tables::Migration),
            Box::new(m20260801_000008_create_outbox_table::Migration),
        ]
    }
}

// Migration implementations

mod m20260801_000001_create_products_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260801_000001_create_products_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::DealerId).uuid().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Sku).string().not_null())
                        .col(ColumnDef::new(Products::Price).decimal().not_null())
                        .col(ColumnDef::new(Products::SalePrice).decimal().null())
                        .col(
                            ColumnDef::new(Products::StockQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::LowStockThreshold)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::StockStatus).string().not_null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_dealer_id")
                        .table(Products::Table)
                        .col(Products::DealerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_dealer_sku")
                        .table(Products::Table)
                        .col(Products::DealerId)
                        .col(Products::Sku)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ProductBatches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductBatches::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ProductBatches::ProductId).uuid().not_null())
                        .col(ColumnDef::new(ProductBatches::DealerId).uuid().not_null())
                        .col(
                            ColumnDef::new(ProductBatches::BatchNumber)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductBatches::CurrentQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ProductBatches::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductBatches::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_product_batches_product_id")
                        .table(ProductBatches::Table)
                        .col(ProductBatches::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductBatches::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        DealerId,
        Name,
        Sku,
        Price,
        SalePrice,
        StockQuantity,
        LowStockThreshold,
        StockStatus,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductBatches {
        Table,
        Id,
        ProductId,
        DealerId,
        BatchNumber,
        CurrentQuantity,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260801_000002_create_inventory_movements_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260801_000002_create_inventory_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::DealerId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryMovements::BatchId).uuid().null())
                        .col(
                            ColumnDef::new(InventoryMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::QuantityBefore)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::QuantityChange)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::QuantityAfter)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::ReferenceType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::ReferenceId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryMovements::Reason).string().null())
                        .col(
                            ColumnDef::new(InventoryMovements::PerformedBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_movements_product_id")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::ProductId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_movements_reference")
                        .table(InventoryMovements::Table)
                        .col(InventoryMovements::ReferenceType)
                        .col(InventoryMovements::ReferenceId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum InventoryMovements {
        Table,
        Id,
        DealerId,
        ProductId,
        BatchId,
        MovementType,
        QuantityBefore,
        QuantityChange,
        QuantityAfter,
        ReferenceType,
        ReferenceId,
        Reason,
        PerformedBy,
        CreatedAt,
    }
}

mod m20260801_000003_create_job_cards_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260801_000003_create_job_cards_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(JobCards::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(JobCards::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(JobCards::TicketId).uuid().not_null())
                        .col(ColumnDef::new(JobCards::DealerId).uuid().not_null())
                        .col(ColumnDef::new(JobCards::TechnicianId).uuid().null())
                        .col(ColumnDef::new(JobCards::Status).string().not_null())
                        .col(ColumnDef::new(JobCards::Notes).string().null())
                        .col(
                            ColumnDef::new(JobCards::EstimatedCompletionAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(JobCards::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobCards::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_job_cards_ticket_id")
                        .table(JobCards::Table)
                        .col(JobCards::TicketId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_job_cards_dealer_status")
                        .table(JobCards::Table)
                        .col(JobCards::DealerId)
                        .col(JobCards::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(JobStatusHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(JobStatusHistory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobStatusHistory::JobCardId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobStatusHistory::FromStatus)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(JobStatusHistory::ToStatus)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(JobStatusHistory::ActorId).uuid().not_null())
                        .col(ColumnDef::new(JobStatusHistory::Reason).string().null())
                        .col(
                            ColumnDef::new(JobStatusHistory::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_job_status_history_job_card_id")
                        .table(JobStatusHistory::Table)
                        .col(JobStatusHistory::JobCardId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ServiceTasks::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ServiceTasks::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ServiceTasks::JobCardId).uuid().not_null())
                        .col(ColumnDef::new(ServiceTasks::Name).string().not_null())
                        .col(ColumnDef::new(ServiceTasks::Description).string().null())
                        .col(
                            ColumnDef::new(ServiceTasks::Completed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(ServiceTasks::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceTasks::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_service_tasks_job_card_id")
                        .table(ServiceTasks::Table)
                        .col(ServiceTasks::JobCardId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ServiceTasks::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(JobStatusHistory::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(JobCards::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum JobCards {
        Table,
        Id,
        TicketId,
        DealerId,
        TechnicianId,
        Status,
        Notes,
        EstimatedCompletionAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum JobStatusHistory {
        Table,
        Id,
        JobCardId,
        FromStatus,
        ToStatus,
        ActorId,
        Reason,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum ServiceTasks {
        Table,
        Id,
        JobCardId,
        Name,
        Description,
        Completed,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260801_000004_create_requisition_items_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260801_000004_create_requisition_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(RequisitionItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RequisitionItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequisitionItems::RequisitionGroupId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequisitionItems::JobCardId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RequisitionItems::TicketId).uuid().not_null())
                        .col(ColumnDef::new(RequisitionItems::DealerId).uuid().not_null())
                        .col(ColumnDef::new(RequisitionItems::StaffId).uuid().not_null())
                        .col(
                            ColumnDef::new(RequisitionItems::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequisitionItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequisitionItems::UnitPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequisitionItems::TotalPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RequisitionItems::Status).string().not_null())
                        .col(ColumnDef::new(RequisitionItems::Notes).string().null())
                        .col(
                            ColumnDef::new(RequisitionItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RequisitionItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_requisition_items_group_id")
                        .table(RequisitionItems::Table)
                        .col(RequisitionItems::RequisitionGroupId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_requisition_items_job_card_id")
                        .table(RequisitionItems::Table)
                        .col(RequisitionItems::JobCardId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RequisitionItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum RequisitionItems {
        Table,
        Id,
        RequisitionGroupId,
        JobCardId,
        TicketId,
        DealerId,
        StaffId,
        ProductId,
        Quantity,
        UnitPrice,
        TotalPrice,
        Status,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260801_000005_create_stock_adjustments_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260801_000005_create_stock_adjustments_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockAdjustments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockAdjustments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAdjustments::DealerId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockAdjustments::AdjustmentNumber)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAdjustments::Reason).string().not_null())
                        .col(ColumnDef::new(StockAdjustments::Status).string().not_null())
                        .col(
                            ColumnDef::new(StockAdjustments::PerformedBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAdjustments::ApprovedBy).uuid().null())
                        .col(
                            ColumnDef::new(StockAdjustments::ApprovedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustments::RejectionReason)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustments::TotalItems)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockAdjustments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_adjustments_dealer_status")
                        .table(StockAdjustments::Table)
                        .col(StockAdjustments::DealerId)
                        .col(StockAdjustments::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockAdjustmentItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockAdjustmentItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustmentItems::AdjustmentId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustmentItems::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockAdjustmentItems::BatchId).uuid().null())
                        .col(
                            ColumnDef::new(StockAdjustmentItems::SystemQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustmentItems::ActualQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustmentItems::Difference)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockAdjustmentItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_adjustment_items_adjustment_id")
                        .table(StockAdjustmentItems::Table)
                        .col(StockAdjustmentItems::AdjustmentId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockAdjustmentItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockAdjustments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum StockAdjustments {
        Table,
        Id,
        DealerId,
        AdjustmentNumber,
        Reason,
        Status,
        PerformedBy,
        ApprovedBy,
        ApprovedAt,
        RejectionReason,
        TotalItems,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum StockAdjustmentItems {
        Table,
        Id,
        AdjustmentId,
        ProductId,
        BatchId,
        SystemQuantity,
        ActualQuantity,
        Difference,
        CreatedAt,
    }
}

mod m20260801_000006_create_qc_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260801_000006_create_qc_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(QcRequests::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(QcRequests::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(QcRequests::JobCardId).uuid().not_null())
                        .col(ColumnDef::new(QcRequests::DealerId).uuid().not_null())
                        .col(ColumnDef::new(QcRequests::Status).string().not_null())
                        .col(ColumnDef::new(QcRequests::RequestedBy).uuid().not_null())
                        .col(ColumnDef::new(QcRequests::ReviewerId).uuid().null())
                        .col(
                            ColumnDef::new(QcRequests::ReviewedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(QcRequests::Notes).string().null())
                        .col(
                            ColumnDef::new(QcRequests::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_qc_requests_job_card_id")
                        .table(QcRequests::Table)
                        .col(QcRequests::JobCardId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_qc_requests_dealer_status")
                        .table(QcRequests::Table)
                        .col(QcRequests::DealerId)
                        .col(QcRequests::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(QcChecklistItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(QcChecklistItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(QcChecklistItems::QcRequestId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(QcChecklistItems::Category).string().not_null())
                        .col(
                            ColumnDef::new(QcChecklistItems::Description)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(QcChecklistItems::Passed).boolean().not_null())
                        .col(ColumnDef::new(QcChecklistItems::PhotoUrl).string().null())
                        .col(
                            ColumnDef::new(QcChecklistItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_qc_checklist_items_request_id")
                        .table(QcChecklistItems::Table)
                        .col(QcChecklistItems::QcRequestId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(QcChecklistItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(QcRequests::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum QcRequests {
        Table,
        Id,
        JobCardId,
        DealerId,
        Status,
        RequestedBy,
        ReviewerId,
        ReviewedAt,
        Notes,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum QcChecklistItems {
        Table,
        Id,
        QcRequestId,
        Category,
        Description,
        Passed,
        PhotoUrl,
        CreatedAt,
    }
}

mod m20260801_000007_create_invoicing_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260801_000007_create_invoicing_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ServiceInvoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ServiceInvoices::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ServiceInvoices::DealerId).uuid().not_null())
                        .col(ColumnDef::new(ServiceInvoices::JobCardId).uuid().not_null())
                        .col(
                            ColumnDef::new(ServiceInvoices::InvoiceNumber)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ServiceInvoices::Subtotal).decimal().not_null())
                        .col(
                            ColumnDef::new(ServiceInvoices::DiscountAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ServiceInvoices::TaxAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ServiceInvoices::GrandTotal)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceInvoices::PaidAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ServiceInvoices::DueAmount)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceInvoices::PaymentStatus)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ServiceInvoices::Status).string().not_null())
                        .col(ColumnDef::new(ServiceInvoices::Notes).string().null())
                        .col(
                            ColumnDef::new(ServiceInvoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ServiceInvoices::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_service_invoices_dealer_number")
                        .table(ServiceInvoices::Table)
                        .col(ServiceInvoices::DealerId)
                        .col(ServiceInvoices::InvoiceNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_service_invoices_job_card_id")
                        .table(ServiceInvoices::Table)
                        .col(ServiceInvoices::JobCardId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InvoiceItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InvoiceItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InvoiceItems::InvoiceId).uuid().not_null())
                        .col(ColumnDef::new(InvoiceItems::ItemType).string().not_null())
                        .col(
                            ColumnDef::new(InvoiceItems::Description)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InvoiceItems::Quantity).integer().not_null())
                        .col(ColumnDef::new(InvoiceItems::UnitPrice).decimal().not_null())
                        .col(ColumnDef::new(InvoiceItems::Total).decimal().not_null())
                        .col(
                            ColumnDef::new(InvoiceItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoice_items_invoice_id")
                        .table(InvoiceItems::Table)
                        .col(InvoiceItems::InvoiceId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Payments::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Payments::InvoiceId).uuid().not_null())
                        .col(ColumnDef::new(Payments::DealerId).uuid().not_null())
                        .col(ColumnDef::new(Payments::Amount).decimal().not_null())
                        .col(ColumnDef::new(Payments::Method).string().not_null())
                        .col(ColumnDef::new(Payments::Reference).string().null())
                        .col(ColumnDef::new(Payments::Notes).string().null())
                        .col(ColumnDef::new(Payments::ReceivedBy).uuid().not_null())
                        .col(
                            ColumnDef::new(Payments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_payments_invoice_id")
                        .table(Payments::Table)
                        .col(Payments::InvoiceId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Payments::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(InvoiceItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ServiceInvoices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ServiceInvoices {
        Table,
        Id,
        DealerId,
        JobCardId,
        InvoiceNumber,
        Subtotal,
        DiscountAmount,
        TaxAmount,
        GrandTotal,
        PaidAmount,
        DueAmount,
        PaymentStatus,
        Status,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum InvoiceItems {
        Table,
        Id,
        InvoiceId,
        ItemType,
        Description,
        Quantity,
        UnitPrice,
        Total,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Payments {
        Table,
        Id,
        InvoiceId,
        DealerId,
        Amount,
        Method,
        Reference,
        Notes,
        ReceivedBy,
        CreatedAt,
    }
}

mod m20260801_000008_create_outbox_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260801_000008_create_outbox_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OutboxEvents::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OutboxEvents::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OutboxEvents::AggregateType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OutboxEvents::AggregateId).uuid().null())
                        .col(ColumnDef::new(OutboxEvents::EventType).string().not_null())
                        .col(ColumnDef::new(OutboxEvents::Payload).json_binary().null())
                        .col(
                            ColumnDef::new(OutboxEvents::Status)
                                .string()
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(OutboxEvents::Attempts)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(OutboxEvents::ErrorMessage).string().null())
                        .col(
                            ColumnDef::new(OutboxEvents::AvailableAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(OutboxEvents::ProcessedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(OutboxEvents::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OutboxEvents::UpdatedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_outbox_events_status_available_at")
                        .table(OutboxEvents::Table)
                        .col(OutboxEvents::Status)
                        .col(OutboxEvents::AvailableAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OutboxEvents::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum OutboxEvents {
        Table,
        Id,
        AggregateType,
        AggregateId,
        EventType,
        Payload,
        Status,
        Attempts,
        ErrorMessage,
        AvailableAt,
        ProcessedAt,
        CreatedAt,
        UpdatedAt,
    }
}
