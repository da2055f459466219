//! Catalog repositories: parts, reference data, suppliers and stores.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use inventra_core::catalog::{
    CatalogError, LegacyPart, PartInput, PriceTiers, canonical_order,
    collapse_duplicates, normalize_part_no,
};
use inventra_shared::AppError;
use inventra_shared::types::{
    AccountId, ApplicationId, BrandId, CategoryId, PageRequest, PageResponse, PartId,
    SubcategoryId, SupplierId, StoreId,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use serde::Serialize;

use crate::entities::{
    applications, brands, categories, parts, purchase_order_items, sales_invoice_items,
    sea_orm_active_enums::CostSource as DbCostSource, stock_movements, stores, subcategories,
    suppliers,
};

/// Error types for catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogRepoError {
    /// Catalog rule violated.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// Code already used by another record of the same kind.
    #[error("{entity} code '{code}' already exists")]
    DuplicateCode {
        /// Kind of record.
        entity: &'static str,
        /// The code.
        code: String,
    },

    /// Referenced record not found.
    #[error("{entity} not found")]
    NotFound {
        /// Kind of record.
        entity: &'static str,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<CatalogRepoError> for AppError {
    fn from(err: CatalogRepoError) -> Self {
        match err {
            CatalogRepoError::Catalog(e) => e.into(),
            CatalogRepoError::DuplicateCode { .. } => Self::Conflict(err.to_string()),
            CatalogRepoError::NotFound { .. } => Self::NotFound(err.to_string()),
            CatalogRepoError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Optional classification of a part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartClassification {
    pub brand_id: Option<BrandId>,
    pub category_id: Option<CategoryId>,
    pub subcategory_id: Option<SubcategoryId>,
    pub application_id: Option<ApplicationId>,
}

/// Outcome of loading legacy part rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// New part numbers inserted.
    pub inserted: usize,
    /// Existing parts overwritten by a better-ranked incoming row.
    pub replaced: usize,
    /// Incoming rows that lost to another row with the same part number.
    pub discarded: usize,
}

/// Part repository.
#[derive(Debug, Clone)]
pub struct PartRepository {
    db: DatabaseConnection,
}

impl PartRepository {
    /// Creates a new part repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a part. The initial cost counts as a manual cost.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicatePartNo`] when the number is taken,
    /// also when a concurrent create wins the unique index, or a
    /// validation error for a blank number or negative amount.
    pub async fn create(
        &self,
        input: PartInput,
        classification: PartClassification,
    ) -> Result<parts::Model, CatalogRepoError> {
        let input = input.validated()?;
        if self.get_by_part_no(&input.part_no).await?.is_some() {
            return Err(CatalogError::DuplicatePartNo(input.part_no).into());
        }

        let part_no = input.part_no.clone();
        let now = Utc::now().into();
        let part = parts::ActiveModel {
            id: Set(PartId::new().into_inner()),
            part_no: Set(input.part_no),
            description: Set(input.description),
            brand_id: Set(classification.brand_id.map(BrandId::into_inner)),
            category_id: Set(classification.category_id.map(CategoryId::into_inner)),
            subcategory_id: Set(classification.subcategory_id.map(SubcategoryId::into_inner)),
            application_id: Set(classification.application_id.map(ApplicationId::into_inner)),
            cost: Set(input.cost),
            cost_source: Set(DbCostSource::Manual),
            cost_updated_at: Set(Some(now)),
            retail_price: Set(input.prices.retail),
            wholesale_price: Set(input.prices.wholesale),
            dealer_price: Set(input.prices.dealer),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let part = part.insert(&self.db).await.map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                CatalogRepoError::from(CatalogError::DuplicatePartNo(part_no))
            }
            _ => err.into(),
        })?;
        tracing::info!(part_id = %part.id, part_no = %part.part_no, "Part created");
        Ok(part)
    }

    /// Updates description, prices and classification. Cost is left alone;
    /// use [`Self::set_manual_cost`] for that.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::PartNotFound`] for an unknown part number.
    pub async fn update(
        &self,
        part_no: &str,
        description: String,
        prices: PriceTiers,
        classification: PartClassification,
    ) -> Result<parts::Model, CatalogRepoError> {
        let part = self.require(part_no).await?;
        PartInput {
            part_no: part.part_no.clone(),
            description: description.clone(),
            cost: part.cost,
            prices,
        }
        .validated()?;

        let mut active: parts::ActiveModel = part.into();
        active.description = Set(description);
        active.retail_price = Set(prices.retail);
        active.wholesale_price = Set(prices.wholesale);
        active.dealer_price = Set(prices.dealer);
        active.brand_id = Set(classification.brand_id.map(BrandId::into_inner));
        active.category_id = Set(classification.category_id.map(CategoryId::into_inner));
        active.subcategory_id = Set(classification.subcategory_id.map(SubcategoryId::into_inner));
        active.application_id = Set(classification.application_id.map(ApplicationId::into_inner));
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.db).await?)
    }

    /// Overrides a part's cost by hand.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown part or a negative cost.
    pub async fn set_manual_cost(
        &self,
        part_no: &str,
        cost: Decimal,
    ) -> Result<parts::Model, CatalogRepoError> {
        if cost < Decimal::ZERO {
            return Err(CatalogError::Validation {
                field: "cost",
                reason: "must not be negative",
            }
            .into());
        }
        let part = self.require(part_no).await?;

        let now = Utc::now().into();
        let mut active: parts::ActiveModel = part.into();
        active.cost = Set(cost);
        active.cost_source = Set(DbCostSource::Manual);
        active.cost_updated_at = Set(Some(now));
        active.updated_at = Set(now);
        let part = active.update(&self.db).await?;
        tracing::info!(part_no = %part.part_no, cost = %part.cost, "Manual cost set");
        Ok(part)
    }

    /// Finds a part by number. Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_by_part_no(&self, part_no: &str) -> Result<Option<parts::Model>, CatalogRepoError> {
        let part_no = normalize_part_no(part_no)?;
        Ok(parts::Entity::find()
            .filter(parts::Column::PartNo.eq(part_no))
            .one(&self.db)
            .await?)
    }

    /// Finds a part by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: PartId) -> Result<Option<parts::Model>, CatalogRepoError> {
        Ok(parts::Entity::find_by_id(id.into_inner()).one(&self.db).await?)
    }

    /// Lists parts ordered by part number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, page: &PageRequest) -> Result<PageResponse<parts::Model>, CatalogRepoError> {
        let total = parts::Entity::find().count(&self.db).await?;
        let rows = parts::Entity::find()
            .order_by_asc(parts::Column::PartNo)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;
        Ok(PageResponse::new(rows, page, total))
    }

    /// Deletes a part nothing references.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InUse`] when movements or document lines
    /// still reference the part. A reference committed after the count
    /// trips the foreign key and is reported the same way.
    pub async fn delete(&self, part_no: &str) -> Result<(), CatalogRepoError> {
        let part = self.require(part_no).await?;

        let movements = stock_movements::Entity::find()
            .filter(stock_movements::Column::PartId.eq(part.id))
            .count(&self.db)
            .await?;
        let purchase_lines = purchase_order_items::Entity::find()
            .filter(purchase_order_items::Column::PartId.eq(part.id))
            .count(&self.db)
            .await?;
        let sale_lines = sales_invoice_items::Entity::find()
            .filter(sales_invoice_items::Column::PartId.eq(part.id))
            .count(&self.db)
            .await?;

        let references = movements + purchase_lines + sale_lines;
        if references > 0 {
            return Err(CatalogError::InUse {
                entity: "Part",
                key: part.part_no,
                references,
            }
            .into());
        }

        parts::Entity::delete_by_id(part.id)
            .exec(&self.db)
            .await
            .map_err(|err| match err.sql_err() {
                Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                    CatalogRepoError::from(CatalogError::InUse {
                        entity: "Part",
                        key: part.part_no.clone(),
                        references: 1,
                    })
                }
                _ => err.into(),
            })?;
        tracing::info!(part_no = %part.part_no, "Part deleted");
        Ok(())
    }

    /// Loads legacy rows, keeping one canonical row per part number.
    ///
    /// Incoming rows compete with each other and with the part already
    /// stored under the same number. The stored row keeps its id so
    /// existing movements stay attached; it takes the winner's fields.
    ///
    /// # Errors
    ///
    /// Returns an error for a blank part number or a database failure.
    /// Nothing is written unless every row loads.
    pub async fn import_legacy_rows(
        &self,
        rows: Vec<LegacyPart>,
    ) -> Result<ImportSummary, CatalogRepoError> {
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.part_no = normalize_part_no(&row.part_no)?;
                Ok(row)
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;

        let collapsed = collapse_duplicates(rows);
        let mut summary = ImportSummary {
            discarded: collapsed.discarded.len(),
            ..ImportSummary::default()
        };

        let txn = self.db.begin().await?;
        let existing: HashMap<String, parts::Model> = parts::Entity::find()
            .filter(
                parts::Column::PartNo
                    .is_in(collapsed.canonical.iter().map(|r| r.part_no.clone())),
            )
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| (p.part_no.clone(), p))
            .collect();

        for row in collapsed.canonical {
            match existing.get(&row.part_no) {
                None => {
                    to_active_model(&row, row.id.into_inner()).insert(&txn).await?;
                    summary.inserted += 1;
                }
                Some(stored) => {
                    if canonical_order(&row, &to_legacy(stored)) == Ordering::Less {
                        to_active_model(&row, stored.id).update(&txn).await?;
                        summary.replaced += 1;
                    } else {
                        summary.discarded += 1;
                    }
                }
            }
        }

        txn.commit().await?;
        tracing::info!(
            inserted = summary.inserted,
            replaced = summary.replaced,
            discarded = summary.discarded,
            "Legacy parts imported"
        );
        Ok(summary)
    }

    async fn require(&self, part_no: &str) -> Result<parts::Model, CatalogRepoError> {
        self.get_by_part_no(part_no)
            .await?
            .ok_or_else(|| CatalogError::PartNotFound(part_no.trim().to_string()).into())
    }
}

fn to_legacy(part: &parts::Model) -> LegacyPart {
    LegacyPart {
        id: PartId::from_uuid(part.id),
        part_no: part.part_no.clone(),
        description: part.description.clone(),
        cost: part.cost,
        cost_source: part.cost_source.into(),
        cost_updated_at: part.cost_updated_at.map(|t| t.with_timezone(&Utc)),
        prices: PriceTiers {
            retail: part.retail_price,
            wholesale: part.wholesale_price,
            dealer: part.dealer_price,
        },
        created_at: part.created_at.with_timezone(&Utc),
        updated_at: part.updated_at.with_timezone(&Utc),
    }
}

fn to_active_model(row: &LegacyPart, id: uuid::Uuid) -> parts::ActiveModel {
    let at = |t: DateTime<Utc>| t.fixed_offset();
    parts::ActiveModel {
        id: Set(id),
        part_no: Set(row.part_no.clone()),
        description: Set(row.description.clone()),
        cost: Set(row.cost),
        cost_source: Set(row.cost_source.into()),
        cost_updated_at: Set(row.cost_updated_at.map(at)),
        retail_price: Set(row.prices.retail),
        wholesale_price: Set(row.prices.wholesale),
        dealer_price: Set(row.prices.dealer),
        created_at: Set(at(row.created_at)),
        updated_at: Set(at(row.updated_at)),
        ..Default::default()
    }
}

/// Repository for catalog reference data, suppliers and stores.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    db: DatabaseConnection,
}

impl CatalogRepository {
    /// Creates a new catalog repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a brand.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is taken or the insert fails.
    pub async fn create_brand(&self, code: &str, name: &str) -> Result<brands::Model, CatalogRepoError> {
        let taken = brands::Entity::find()
            .filter(brands::Column::Code.eq(code))
            .one(&self.db)
            .await?;
        if taken.is_some() {
            return Err(duplicate("Brand", code));
        }
        Ok(brands::ActiveModel {
            id: Set(BrandId::new().into_inner()),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?)
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is taken or the insert fails.
    pub async fn create_category(
        &self,
        code: &str,
        name: &str,
    ) -> Result<categories::Model, CatalogRepoError> {
        let taken = categories::Entity::find()
            .filter(categories::Column::Code.eq(code))
            .one(&self.db)
            .await?;
        if taken.is_some() {
            return Err(duplicate("Category", code));
        }
        Ok(categories::ActiveModel {
            id: Set(CategoryId::new().into_inner()),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?)
    }

    /// Creates a subcategory under a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the category is missing, the code is taken, or
    /// the insert fails.
    pub async fn create_subcategory(
        &self,
        category_id: CategoryId,
        code: &str,
        name: &str,
    ) -> Result<subcategories::Model, CatalogRepoError> {
        categories::Entity::find_by_id(category_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(CatalogRepoError::NotFound { entity: "Category" })?;
        let taken = subcategories::Entity::find()
            .filter(subcategories::Column::Code.eq(code))
            .one(&self.db)
            .await?;
        if taken.is_some() {
            return Err(duplicate("Subcategory", code));
        }
        Ok(subcategories::ActiveModel {
            id: Set(SubcategoryId::new().into_inner()),
            category_id: Set(category_id.into_inner()),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?)
    }

    /// Creates an application (the vehicle or machine a part fits).
    ///
    /// # Errors
    ///
    /// Returns an error if the code is taken or the insert fails.
    pub async fn create_application(
        &self,
        code: &str,
        name: &str,
    ) -> Result<applications::Model, CatalogRepoError> {
        let taken = applications::Entity::find()
            .filter(applications::Column::Code.eq(code))
            .one(&self.db)
            .await?;
        if taken.is_some() {
            return Err(duplicate("Application", code));
        }
        Ok(applications::ActiveModel {
            id: Set(ApplicationId::new().into_inner()),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?)
    }

    /// Creates a store.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is taken or the insert fails.
    pub async fn create_store(&self, code: &str, name: &str) -> Result<stores::Model, CatalogRepoError> {
        let taken = stores::Entity::find()
            .filter(stores::Column::Code.eq(code))
            .one(&self.db)
            .await?;
        if taken.is_some() {
            return Err(duplicate("Store", code));
        }
        Ok(stores::ActiveModel {
            id: Set(StoreId::new().into_inner()),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?)
    }

    /// Lists stores by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_stores(&self) -> Result<Vec<stores::Model>, CatalogRepoError> {
        Ok(stores::Entity::find()
            .order_by_asc(stores::Column::Code)
            .all(&self.db)
            .await?)
    }

    /// Creates a supplier. Without a payable account, receipts credit the
    /// configured default payable account.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is taken or the insert fails.
    pub async fn create_supplier(
        &self,
        code: &str,
        name: &str,
        payable_account_id: Option<AccountId>,
    ) -> Result<suppliers::Model, CatalogRepoError> {
        let taken = suppliers::Entity::find()
            .filter(suppliers::Column::Code.eq(code))
            .one(&self.db)
            .await?;
        if taken.is_some() {
            return Err(duplicate("Supplier", code));
        }
        let supplier = suppliers::ActiveModel {
            id: Set(SupplierId::new().into_inner()),
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            payable_account_id: Set(payable_account_id.map(AccountId::into_inner)),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await?;
        tracing::info!(supplier_id = %supplier.id, code = %supplier.code, "Supplier created");
        Ok(supplier)
    }

    /// Finds a supplier by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_supplier(&self, id: SupplierId) -> Result<Option<suppliers::Model>, CatalogRepoError> {
        Ok(suppliers::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?)
    }

    /// Lists suppliers by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_suppliers(&self) -> Result<Vec<suppliers::Model>, CatalogRepoError> {
        Ok(suppliers::Entity::find()
            .order_by_asc(suppliers::Column::Code)
            .all(&self.db)
            .await?)
    }
}

fn duplicate(entity: &'static str, code: &str) -> CatalogRepoError {
    CatalogRepoError::DuplicateCode {
        entity,
        code: code.to_string(),
    }
}

