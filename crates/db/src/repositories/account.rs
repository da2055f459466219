//! Account repository for chart of accounts database operations.
//!
//! Main groups carry the account type; subgroups and accounts inherit it.

use std::collections::HashMap;

use chrono::Utc;
use inventra_core::documents::PostingAccounts;
use inventra_core::ledger::{AccountInfo, AccountType, LedgerError};
use inventra_core::reports::ChartAccount;
use inventra_shared::config::PostingConfig;
use inventra_shared::types::{AccountId, MainGroupId, SubgroupId};
use inventra_shared::AppError;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{accounts, ledger_lines, main_groups, subgroups, suppliers};

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountRepoError {
    /// Code already used by another group or account.
    #[error("Code '{0}' already exists")]
    DuplicateCode(String),

    /// Main group not found.
    #[error("Main group not found: {0}")]
    MainGroupNotFound(MainGroupId),

    /// Subgroup not found.
    #[error("Subgroup not found: {0}")]
    SubgroupNotFound(SubgroupId),

    /// A configured posting account code has no account.
    #[error("Posting account '{0}' is not in the chart of accounts")]
    PostingAccountMissing(String),

    /// Ledger rule violated (unknown account, account in use).
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AccountRepoError> for AppError {
    fn from(err: AccountRepoError) -> Self {
        match err {
            AccountRepoError::DuplicateCode(_) => Self::Conflict(err.to_string()),
            AccountRepoError::MainGroupNotFound(_)
            | AccountRepoError::SubgroupNotFound(_)
            | AccountRepoError::PostingAccountMissing(_) => Self::NotFound(err.to_string()),
            AccountRepoError::Ledger(e) => e.into(),
            AccountRepoError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Subgroup the account belongs to.
    pub subgroup_id: SubgroupId,
    /// Account code, unique across the chart.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Balance carried in from before the first entry.
    pub opening_balance: Decimal,
}

/// Account repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a main group.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is taken or the insert fails.
    pub async fn create_main_group(
        &self,
        code: &str,
        name: &str,
        account_type: AccountType,
    ) -> Result<main_groups::Model, AccountRepoError> {
        let existing = main_groups::Entity::find()
            .filter(main_groups::Column::Code.eq(code))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(AccountRepoError::DuplicateCode(code.to_string()));
        }

        let group = main_groups::ActiveModel {
            id: Set(MainGroupId::new().into_inner()),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            account_type: Set(account_type.into()),
            created_at: Set(Utc::now().into()),
        };
        Ok(group.insert(&self.db).await?)
    }

    /// Creates a subgroup under a main group.
    ///
    /// # Errors
    ///
    /// Returns an error if the main group is missing, the code is taken, or
    /// the insert fails.
    pub async fn create_subgroup(
        &self,
        main_group_id: MainGroupId,
        code: &str,
        name: &str,
    ) -> Result<subgroups::Model, AccountRepoError> {
        main_groups::Entity::find_by_id(main_group_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(AccountRepoError::MainGroupNotFound(main_group_id))?;

        let existing = subgroups::Entity::find()
            .filter(subgroups::Column::Code.eq(code))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(AccountRepoError::DuplicateCode(code.to_string()));
        }

        let subgroup = subgroups::ActiveModel {
            id: Set(SubgroupId::new().into_inner()),
            main_group_id: Set(main_group_id.into_inner()),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        };
        Ok(subgroup.insert(&self.db).await?)
    }

    /// Creates an account. The cached balance starts at the opening balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the subgroup is missing, the code is taken, or
    /// the insert fails.
    pub async fn create_account(
        &self,
        input: CreateAccountInput,
    ) -> Result<accounts::Model, AccountRepoError> {
        subgroups::Entity::find_by_id(input.subgroup_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(AccountRepoError::SubgroupNotFound(input.subgroup_id))?;

        if self.find_by_code(&input.code).await?.is_some() {
            return Err(AccountRepoError::DuplicateCode(input.code));
        }

        let now = Utc::now().into();
        let account = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            subgroup_id: Set(input.subgroup_id.into_inner()),
            code: Set(input.code),
            name: Set(input.name),
            opening_balance: Set(input.opening_balance),
            current_balance: Set(input.opening_balance),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let account = account.insert(&self.db).await?;
        tracing::info!(account_id = %account.id, code = %account.code, "Account created");
        Ok(account)
    }

    /// Finds an account by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<accounts::Model>, AccountRepoError> {
        Ok(accounts::Entity::find()
            .filter(accounts::Column::Code.eq(code))
            .one(&self.db)
            .await?)
    }

    /// Finds an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: AccountId) -> Result<Option<accounts::Model>, AccountRepoError> {
        Ok(accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?)
    }

    /// Activates or deactivates an account. Inactive accounts reject postings.
    ///
    /// # Errors
    ///
    /// Returns an error if the account is missing or the update fails.
    pub async fn set_active(
        &self,
        id: AccountId,
        is_active: bool,
    ) -> Result<accounts::Model, AccountRepoError> {
        let account = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))?;

        let mut active: accounts::ActiveModel = account.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Deletes an account that no ledger line or supplier references.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AccountInUse`] when lines or suppliers still
    /// point at the account.
    pub async fn delete_account(&self, id: AccountId) -> Result<(), AccountRepoError> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))?;

        let lines = ledger_lines::Entity::find()
            .filter(ledger_lines::Column::AccountId.eq(id.into_inner()))
            .count(&self.db)
            .await?;
        let suppliers = suppliers::Entity::find()
            .filter(suppliers::Column::PayableAccountId.eq(id.into_inner()))
            .count(&self.db)
            .await?;
        if lines + suppliers > 0 {
            return Err(LedgerError::AccountInUse {
                account_id: id,
                lines: lines + suppliers,
            }
            .into());
        }

        accounts::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await?;
        tracing::info!(account_id = %id, "Account deleted");
        Ok(())
    }

    /// Lists the chart of accounts with group names and types.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn chart(&self) -> Result<Vec<ChartAccount>, AccountRepoError> {
        Ok(load_chart(&self.db).await?)
    }

    /// Resolves configured posting account codes.
    ///
    /// # Errors
    ///
    /// Returns [`AccountRepoError::PostingAccountMissing`] for an unknown code.
    pub async fn posting_accounts(
        &self,
        config: &PostingConfig,
    ) -> Result<PostingAccounts, AccountRepoError> {
        resolve_posting_accounts(&self.db, config).await
    }
}

/// Loads every account with its subgroup and main group.
pub(crate) async fn load_chart<C: ConnectionTrait>(conn: &C) -> Result<Vec<ChartAccount>, DbErr> {
    let groups: HashMap<Uuid, main_groups::Model> = main_groups::Entity::find()
        .all(conn)
        .await?
        .into_iter()
        .map(|g| (g.id, g))
        .collect();
    let subgroups: HashMap<Uuid, subgroups::Model> = subgroups::Entity::find()
        .all(conn)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let accounts = accounts::Entity::find()
        .order_by_asc(accounts::Column::Code)
        .all(conn)
        .await?;

    Ok(accounts
        .into_iter()
        .filter_map(|account| {
            let subgroup = subgroups.get(&account.subgroup_id)?;
            let group = groups.get(&subgroup.main_group_id)?;
            Some(ChartAccount {
                id: AccountId::from_uuid(account.id),
                code: account.code,
                name: account.name,
                account_type: group.account_type.into(),
                main_group_id: MainGroupId::from_uuid(group.id),
                main_group_name: group.name.clone(),
                subgroup_id: SubgroupId::from_uuid(subgroup.id),
                subgroup_name: subgroup.name.clone(),
                opening_balance: account.opening_balance,
                current_balance: account.current_balance,
            })
        })
        .collect())
}

/// Loads posting facts for the given accounts. Unknown ids are absent.
pub(crate) async fn load_account_infos<C: ConnectionTrait>(
    conn: &C,
    ids: &[AccountId],
) -> Result<HashMap<AccountId, AccountInfo>, DbErr> {
    let uuids: Vec<Uuid> = ids.iter().map(|id| id.into_inner()).collect();
    let rows = accounts::Entity::find()
        .filter(accounts::Column::Id.is_in(uuids))
        .find_also_related(subgroups::Entity)
        .all(conn)
        .await?;

    let group_ids: Vec<Uuid> = rows
        .iter()
        .filter_map(|(_, subgroup)| subgroup.as_ref().map(|s| s.main_group_id))
        .collect();
    let types: HashMap<Uuid, AccountType> = main_groups::Entity::find()
        .filter(main_groups::Column::Id.is_in(group_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|g| (g.id, g.account_type.into()))
        .collect();

    Ok(rows
        .into_iter()
        .filter_map(|(account, subgroup)| {
            let account_type = *types.get(&subgroup?.main_group_id)?;
            let id = AccountId::from_uuid(account.id);
            Some((
                id,
                AccountInfo {
                    id,
                    code: account.code,
                    account_type,
                    is_active: account.is_active,
                },
            ))
        })
        .collect())
}

/// Resolves the configured account codes to ids.
pub(crate) async fn resolve_posting_accounts<C: ConnectionTrait>(
    conn: &C,
    config: &PostingConfig,
) -> Result<PostingAccounts, AccountRepoError> {
    let codes = [
        &config.inventory_account,
        &config.payable_account,
        &config.expense_clearing_account,
        &config.receivable_account,
        &config.sales_account,
        &config.cogs_account,
    ];
    let by_code: HashMap<String, Uuid> = accounts::Entity::find()
        .filter(accounts::Column::Code.is_in(codes.iter().map(|c| c.as_str())))
        .all(conn)
        .await?
        .into_iter()
        .map(|a| (a.code, a.id))
        .collect();

    let resolve = |code: &String| {
        by_code
            .get(code)
            .map(|id| AccountId::from_uuid(*id))
            .ok_or_else(|| AccountRepoError::PostingAccountMissing(code.clone()))
    };

    Ok(PostingAccounts {
        inventory: resolve(&config.inventory_account)?,
        payable: resolve(&config.payable_account)?,
        expense_clearing: resolve(&config.expense_clearing_account)?,
        receivable: resolve(&config.receivable_account)?,
        sales: resolve(&config.sales_account)?,
        cogs: resolve(&config.cogs_account)?,
    })
}
