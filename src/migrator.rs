use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_catalog_tables::Migration),
            Box::new(m20240101_000002_create_budget_allocations_table::Migration),
            Box::new(m20240101_000003_create_purchase_order_tables::Migration),
            Box::new(m20240101_000004_create_invoice_tables::Migration),
        ]
    }
}

mod m20240101_000001_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ExchangeRates::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ExchangeRates::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(ExchangeRates::Year)
                                .integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(ExchangeRates::Rate).double().not_null())
                        .col(
                            ColumnDef::new(ExchangeRates::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ExchangeRates::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Supports::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Supports::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(Supports::Code)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Supports::Name).string_len(200).not_null())
                        .col(ColumnDef::new(Supports::Category).string_len(100).not_null())
                        .col(ColumnDef::new(Supports::Subcategory).string_len(100).null())
                        .col(
                            ColumnDef::new(Supports::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Supports::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Supports::UpdatedAt)
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
                        .name("idx_supports_category")
                        .table(Supports::Table)
                        .col(Supports::Category)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Vendors::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Vendors::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Vendors::RazonSocial).string_len(255).not_null())
                        .col(
                            ColumnDef::new(Vendors::Ruc)
                                .string_len(32)
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Vendors::Active)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Vendors::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Vendors::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Periods::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Periods::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Periods::Year).integer().not_null())
                        .col(ColumnDef::new(Periods::Month).integer().not_null())
                        .col(ColumnDef::new(Periods::Label).string_len(32).not_null())
                        .col(
                            ColumnDef::new(Periods::CreatedAt)
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
                        .name("ux_periods_year_month")
                        .table(Periods::Table)
                        .col(Periods::Year)
                        .col(Periods::Month)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Periods::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Vendors::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Supports::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ExchangeRates::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ExchangeRates {
        Table,
        Id,
        Year,
        Rate,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Supports {
        Table,
        Id,
        Code,
        Name,
        Category,
        Subcategory,
        Active,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Vendors {
        Table,
        Id,
        RazonSocial,
        Ruc,
        Active,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Periods {
        Table,
        Id,
        Year,
        Month,
        Label,
        CreatedAt,
    }
}

mod m20240101_000002_create_budget_allocations_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_budget_allocations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BudgetAllocations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BudgetAllocations::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(BudgetAllocations::SupportId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BudgetAllocations::PeriodId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BudgetAllocations::Amount)
                                .decimal_len(14, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(BudgetAllocations::Currency)
                                .string_len(3)
                                .not_null(),
                        )
                        .col(ColumnDef::new(BudgetAllocations::Notes).text().null())
                        .col(
                            ColumnDef::new(BudgetAllocations::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BudgetAllocations::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_budget_allocations_support_id")
                                .from(BudgetAllocations::Table, BudgetAllocations::SupportId)
                                .to(Supports::Table, Supports::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_budget_allocations_period_id")
                                .from(BudgetAllocations::Table, BudgetAllocations::PeriodId)
                                .to(Periods::Table, Periods::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("ux_budget_allocations_support_period")
                        .table(BudgetAllocations::Table)
                        .col(BudgetAllocations::SupportId)
                        .col(BudgetAllocations::PeriodId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BudgetAllocations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum BudgetAllocations {
        Table,
        Id,
        SupportId,
        PeriodId,
        Amount,
        Currency,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Supports {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Periods {
        Table,
        Id,
    }
}

mod m20240101_000003_create_purchase_order_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_purchase_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PurchaseOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PurchaseOrders::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::Number)
                                .string_len(64)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(PurchaseOrders::Description).text().null())
                        .col(ColumnDef::new(PurchaseOrders::ProveedorId).integer().null())
                        // Legacy embedded vendor columns, superseded by proveedor_id
                        .col(ColumnDef::new(PurchaseOrders::Proveedor).string_len(255).null())
                        .col(ColumnDef::new(PurchaseOrders::Ruc).string_len(32).null())
                        .col(
                            ColumnDef::new(PurchaseOrders::Currency)
                                .string_len(3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::Amount)
                                .decimal_len(14, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::Estado)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PurchaseOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_purchase_orders_proveedor_id")
                                .from(PurchaseOrders::Table, PurchaseOrders::ProveedorId)
                                .to(Vendors::Table, Vendors::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_purchase_orders_proveedor_id")
                        .table(PurchaseOrders::Table)
                        .col(PurchaseOrders::ProveedorId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OcStatusHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OcStatusHistory::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(OcStatusHistory::OcId).integer().not_null())
                        .col(
                            ColumnDef::new(OcStatusHistory::Status)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OcStatusHistory::PreviousStatus)
                                .string_len(32)
                                .null(),
                        )
                        .col(ColumnDef::new(OcStatusHistory::Note).text().null())
                        .col(
                            ColumnDef::new(OcStatusHistory::ChangedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_oc_status_history_oc_id")
                                .from(OcStatusHistory::Table, OcStatusHistory::OcId)
                                .to(PurchaseOrders::Table, PurchaseOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_oc_status_history_oc_id")
                        .table(OcStatusHistory::Table)
                        .col(OcStatusHistory::OcId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OcStatusHistory::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PurchaseOrders {
        Table,
        Id,
        Number,
        Description,
        ProveedorId,
        Proveedor,
        Ruc,
        Currency,
        Amount,
        Estado,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum OcStatusHistory {
        Table,
        Id,
        OcId,
        Status,
        PreviousStatus,
        Note,
        ChangedAt,
    }

    #[derive(DeriveIden)]
    enum Vendors {
        Table,
        Id,
    }
}

mod m20240101_000004_create_invoice_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_invoice_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Invoices::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Invoices::VendorId).integer().not_null())
                        .col(ColumnDef::new(Invoices::OcId).integer().null())
                        .col(ColumnDef::new(Invoices::DocType).string_len(32).not_null())
                        .col(ColumnDef::new(Invoices::NumberNorm).string_len(64).not_null())
                        .col(ColumnDef::new(Invoices::IssueDate).date().not_null())
                        .col(ColumnDef::new(Invoices::Currency).string_len(3).not_null())
                        .col(
                            ColumnDef::new(Invoices::TotalForeign)
                                .decimal_len(14, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::TotalLocal)
                                .decimal_len(14, 2)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::StatusCurrent)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_vendor_id")
                                .from(Invoices::Table, Invoices::VendorId)
                                .to(Vendors::Table, Vendors::Id)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_oc_id")
                                .from(Invoices::Table, Invoices::OcId)
                                .to(PurchaseOrders::Table, PurchaseOrders::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("ux_invoices_vendor_doc_number")
                        .table(Invoices::Table)
                        .col(Invoices::VendorId)
                        .col(Invoices::DocType)
                        .col(Invoices::NumberNorm)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoices_status_current")
                        .table(Invoices::Table)
                        .col(Invoices::StatusCurrent)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InvoiceStatusHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InvoiceStatusHistory::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(InvoiceStatusHistory::InvoiceId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceStatusHistory::Status)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceStatusHistory::PreviousStatus)
                                .string_len(32)
                                .null(),
                        )
                        .col(ColumnDef::new(InvoiceStatusHistory::Note).text().null())
                        .col(
                            ColumnDef::new(InvoiceStatusHistory::ChangedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoice_status_history_invoice_id")
                                .from(InvoiceStatusHistory::Table, InvoiceStatusHistory::InvoiceId)
                                .to(Invoices::Table, Invoices::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_invoice_status_history_invoice_id")
                        .table(InvoiceStatusHistory::Table)
                        .col(InvoiceStatusHistory::InvoiceId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InvoiceStatusHistory::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Invoices::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Invoices {
        Table,
        Id,
        VendorId,
        OcId,
        DocType,
        NumberNorm,
        IssueDate,
        Currency,
        TotalForeign,
        TotalLocal,
        StatusCurrent,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum InvoiceStatusHistory {
        Table,
        Id,
        InvoiceId,
        Status,
        PreviousStatus,
        Note,
        ChangedAt,
    }

    #[derive(DeriveIden)]
    enum Vendors {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum PurchaseOrders {
        Table,
        Id,
    }
}
