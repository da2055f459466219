//! Database seeder for Inventra development and testing.
//!
//! Seeds a chart of accounts covering every configured posting account, a
//! default store, a supplier and a handful of sample parts. Records that
//! already exist are left alone, so the seeder can run repeatedly.
//!
//! Usage: cargo run --bin seeder

use inventra_core::catalog::{PartInput, PriceTiers};
use inventra_core::ledger::AccountType;
use inventra_db::repositories::{
    AccountRepository, CatalogRepository, CreateAccountInput, PartClassification, PartRepository,
};
use inventra_shared::AppConfig;
use inventra_shared::types::{MainGroupId, SubgroupId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// (main group code, name, type, [(subgroup code, name, [(account code, name)])])
type ChartSeed = (
    &'static str,
    &'static str,
    AccountType,
    &'static [(&'static str, &'static str, &'static [(&'static str, &'static str)])],
);

const CHART: &[ChartSeed] = &[
    (
        "1",
        "Assets",
        AccountType::Asset,
        &[(
            "11",
            "Current Assets",
            &[
                ("1000", "Cash on Hand"),
                ("1200", "Accounts Receivable"),
                ("1300", "Inventory"),
            ],
        )],
    ),
    (
        "2",
        "Liabilities",
        AccountType::Liability,
        &[(
            "21",
            "Current Liabilities",
            &[
                ("2100", "Accounts Payable"),
                ("2150", "Purchase Expense Clearing"),
            ],
        )],
    ),
    (
        "3",
        "Equity",
        AccountType::Equity,
        &[("31", "Owner's Equity", &[("3000", "Owner's Capital")])],
    ),
    (
        "4",
        "Revenue",
        AccountType::Revenue,
        &[("41", "Sales", &[("4100", "Parts Sales")])],
    ),
    (
        "5",
        "Cost of Sales",
        AccountType::Cost,
        &[("51", "Cost of Goods Sold", &[("5100", "Cost of Parts Sold")])],
    ),
    (
        "6",
        "Expenses",
        AccountType::Expense,
        &[("61", "Operating Expenses", &[("6100", "General Expenses")])],
    ),
];

const PARTS: &[(&str, &str, Decimal, Decimal)] = &[
    ("OF-1001", "Oil filter, spin-on", dec!(4.50), dec!(8.00)),
    ("AF-2040", "Air filter element", dec!(7.25), dec!(13.50)),
    ("BP-3310", "Brake pad set, front", dec!(18.00), dec!(32.00)),
    ("SP-0450", "Spark plug, iridium", dec!(3.10), dec!(6.25)),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inventra=info,seeder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    let db = inventra_db::connect(&config.database).await?;
    info!("Connected to database");

    seed_chart(&db).await?;
    seed_catalog(&db).await?;
    seed_parts(&db).await?;

    info!("Seeding complete");
    Ok(())
}

async fn seed_chart(db: &DatabaseConnection) -> anyhow::Result<()> {
    let accounts = AccountRepository::new(db.clone());
    if accounts.find_by_code("1000").await?.is_some() {
        info!("Chart of accounts already seeded, skipping");
        return Ok(());
    }

    for (group_code, group_name, account_type, subgroups) in CHART {
        let group = accounts
            .create_main_group(group_code, group_name, *account_type)
            .await?;
        for (subgroup_code, subgroup_name, codes) in *subgroups {
            let subgroup = accounts
                .create_subgroup(MainGroupId::from_uuid(group.id), subgroup_code, subgroup_name)
                .await?;
            for (code, name) in *codes {
                accounts
                    .create_account(CreateAccountInput {
                        subgroup_id: SubgroupId::from_uuid(subgroup.id),
                        code: (*code).to_string(),
                        name: (*name).to_string(),
                        opening_balance: Decimal::ZERO,
                    })
                    .await?;
            }
        }
        info!(group = group_name, "Main group seeded");
    }
    Ok(())
}

async fn seed_catalog(db: &DatabaseConnection) -> anyhow::Result<()> {
    let catalog = CatalogRepository::new(db.clone());

    if catalog.list_stores().await?.is_empty() {
        catalog.create_store("MAIN", "Main Warehouse").await?;
        info!("Store seeded");
    }
    if catalog.list_suppliers().await?.is_empty() {
        catalog.create_supplier("SUP-001", "Northwind Auto Parts", None).await?;
        info!("Supplier seeded");
    }
    Ok(())
}

async fn seed_parts(db: &DatabaseConnection) -> anyhow::Result<()> {
    let parts = PartRepository::new(db.clone());

    for (part_no, description, cost, retail) in PARTS {
        if parts.get_by_part_no(part_no).await?.is_some() {
            continue;
        }
        parts
            .create(
                PartInput {
                    part_no: (*part_no).to_string(),
                    description: (*description).to_string(),
                    cost: *cost,
                    prices: PriceTiers {
                        retail: *retail,
                        wholesale: *retail * dec!(0.9),
                        dealer: *retail * dec!(0.8),
                    },
                },
                PartClassification::default(),
            )
            .await?;
        info!(part_no, "Part seeded");
    }
    Ok(())
}
