//! Inventra reconciler.
//!
//! Compares every cached account balance with its opening balance plus posted
//! ledger lines, and lists stock movements whose originating document is gone.
//! With `reconcile.repair` or `reconcile.clean_orphans` enabled it also fixes
//! what it finds.

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inventra_db::connect;
use inventra_db::repositories::{ReportRepository, StockRepository};
use inventra_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inventra=info,reconciler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    let db = connect(&config.database).await?;
    info!("Connected to database");

    let reports = ReportRepository::new(db.clone());
    let report = if config.reconcile.repair {
        reports.repair_balances().await?
    } else {
        reports.reconcile().await?
    };
    for discrepancy in &report.discrepancies {
        warn!(
            code = %discrepancy.code,
            cached = %discrepancy.cached,
            recomputed = %discrepancy.recomputed,
            difference = %discrepancy.difference,
            "Balance drift"
        );
    }
    info!(
        checked = report.accounts_checked,
        drifted = report.discrepancies.len(),
        repaired = config.reconcile.repair,
        "Balance reconciliation finished"
    );

    let stock = StockRepository::new(db);
    if config.reconcile.clean_orphans {
        let removed = stock.delete_orphans().await?;
        info!(removed, "Orphaned stock movements deleted");
    } else {
        let orphans = stock.find_orphans().await?;
        for movement in &orphans {
            warn!(
                id = %movement.id,
                reference_type = ?movement.reference_type,
                reference_id = %movement.reference_id,
                "Orphaned stock movement"
            );
        }
        info!(found = orphans.len(), "Orphan scan finished");
    }

    Ok(())
}
