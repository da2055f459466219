//! Application configuration management.

use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Accounts used by automatic postings.
    #[serde(default)]
    pub posting: PostingConfig,
    /// Costing policy.
    #[serde(default)]
    pub costing: CostingConfig,
    /// Reconciliation job settings.
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Account codes that document postings resolve against the chart of accounts.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PostingConfig {
    /// Inventory asset account (debited on receipt, credited on sale).
    #[serde(default = "default_inventory_account")]
    pub inventory_account: String,
    /// Default supplier payable account.
    #[serde(default = "default_payable_account")]
    pub payable_account: String,
    /// Clearing account credited with freight/tax expenses capitalised into inventory.
    #[serde(default = "default_expense_clearing_account")]
    pub expense_clearing_account: String,
    /// Customer receivable account.
    #[serde(default = "default_receivable_account")]
    pub receivable_account: String,
    /// Sales revenue account.
    #[serde(default = "default_sales_account")]
    pub sales_account: String,
    /// Cost of goods sold account.
    #[serde(default = "default_cogs_account")]
    pub cogs_account: String,
}

fn default_inventory_account() -> String {
    "1300".to_string()
}

fn default_payable_account() -> String {
    "2100".to_string()
}

fn default_expense_clearing_account() -> String {
    "2150".to_string()
}

fn default_receivable_account() -> String {
    "1200".to_string()
}

fn default_sales_account() -> String {
    "4100".to_string()
}

fn default_cogs_account() -> String {
    "5100".to_string()
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            inventory_account: default_inventory_account(),
            payable_account: default_payable_account(),
            expense_clearing_account: default_expense_clearing_account(),
            receivable_account: default_receivable_account(),
            sales_account: default_sales_account(),
            cogs_account: default_cogs_account(),
        }
    }
}

/// How a purchase receipt changes a part's cost.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CostingMethod {
    /// Quantity-weighted average of on-hand stock and the received landed cost.
    #[default]
    WeightedAverage,
    /// The latest landed cost replaces the part cost.
    LastLanded,
}

/// Costing configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CostingConfig {
    /// Costing method applied on receipt.
    #[serde(default)]
    pub method: CostingMethod,
}

/// Reconciliation job configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReconcileConfig {
    /// Rewrite drifted cached balances instead of only reporting them.
    #[serde(default)]
    pub repair: bool,
    /// Delete stock movements whose originating document no longer exists.
    #[serde(default)]
    pub clean_orphans: bool,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("INVENTRA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("RUN_MODE", Some("test-nonexistent")),
                ("INVENTRA__DATABASE__URL", Some("postgres://localhost/inventra_test")),
                ("INVENTRA__POSTING__INVENTORY_ACCOUNT", Some("1310")),
                ("INVENTRA__COSTING__METHOD", Some("last_landed")),
                ("INVENTRA__RECONCILE__REPAIR", Some("true")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/inventra_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.posting.inventory_account, "1310");
                assert_eq!(config.posting.payable_account, "2100");
                assert_eq!(config.costing.method, CostingMethod::LastLanded);
                assert!(config.reconcile.repair);
                assert!(!config.reconcile.clean_orphans);
            },
        );
    }

    #[test]
    fn test_posting_defaults() {
        let posting = PostingConfig::default();
        assert_eq!(posting.inventory_account, "1300");
        assert_eq!(posting.cogs_account, "5100");
    }

    #[test]
    fn test_costing_default_is_weighted_average() {
        assert_eq!(CostingConfig::default().method, CostingMethod::WeightedAverage);
    }
}
