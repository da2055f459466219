//! Initial database migration.
//!
//! Creates enums, catalog, chart of accounts, ledger, document and stock
//! tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: CATALOG
        // ============================================================
        db.execute_unprepared(CATALOG_SQL).await?;
        db.execute_unprepared(PARTS_SQL).await?;

        // ============================================================
        // PART 3: CHART OF ACCOUNTS
        // ============================================================
        db.execute_unprepared(CHART_OF_ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 4: PARTIES & LOCATIONS
        // ============================================================
        db.execute_unprepared(SUPPLIERS_STORES_SQL).await?;

        // ============================================================
        // PART 5: LEDGER
        // ============================================================
        db.execute_unprepared(LEDGER_SQL).await?;
        db.execute_unprepared(NUMBER_SEQUENCES_SQL).await?;

        // ============================================================
        // PART 6: DOCUMENTS
        // ============================================================
        db.execute_unprepared(PURCHASE_ORDERS_SQL).await?;
        db.execute_unprepared(SALES_INVOICES_SQL).await?;

        // ============================================================
        // PART 7: STOCK
        // ============================================================
        db.execute_unprepared(STOCK_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE account_type AS ENUM (
    'asset',
    'liability',
    'equity',
    'revenue',
    'expense',
    'cost'
);

CREATE TYPE entry_kind AS ENUM ('journal', 'voucher');

CREATE TYPE voucher_type AS ENUM ('payment', 'receipt', 'journal', 'contra');

CREATE TYPE entry_status AS ENUM ('draft', 'posted');

CREATE TYPE cost_source AS ENUM ('manual', 'dpo_received', 'po_received');

CREATE TYPE purchase_kind AS ENUM ('po', 'dpo');

CREATE TYPE purchase_status AS ENUM (
    'draft',
    'pending',
    'received',
    'completed',
    'cancelled'
);

CREATE TYPE invoice_status AS ENUM ('draft', 'posted', 'cancelled');

CREATE TYPE movement_direction AS ENUM ('in', 'out');

CREATE TYPE reference_type AS ENUM (
    'purchase',
    'direct_purchase',
    'sale',
    'adjustment',
    'reservation'
);
";

const CATALOG_SQL: &str = r"
CREATE TABLE brands (
    id UUID PRIMARY KEY,
    code VARCHAR(50) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE categories (
    id UUID PRIMARY KEY,
    code VARCHAR(50) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE subcategories (
    id UUID PRIMARY KEY,
    category_id UUID NOT NULL REFERENCES categories(id) ON DELETE RESTRICT,
    code VARCHAR(50) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE applications (
    id UUID PRIMARY KEY,
    code VARCHAR(50) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const PARTS_SQL: &str = r"
CREATE TABLE parts (
    id UUID PRIMARY KEY,
    part_no VARCHAR(100) NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    brand_id UUID REFERENCES brands(id) ON DELETE RESTRICT,
    category_id UUID REFERENCES categories(id) ON DELETE RESTRICT,
    subcategory_id UUID REFERENCES subcategories(id) ON DELETE RESTRICT,
    application_id UUID REFERENCES applications(id) ON DELETE RESTRICT,
    cost NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (cost >= 0),
    cost_source cost_source NOT NULL DEFAULT 'manual',
    cost_updated_at TIMESTAMPTZ,
    retail_price NUMERIC(19, 2) NOT NULL DEFAULT 0 CHECK (retail_price >= 0),
    wholesale_price NUMERIC(19, 2) NOT NULL DEFAULT 0 CHECK (wholesale_price >= 0),
    dealer_price NUMERIC(19, 2) NOT NULL DEFAULT 0 CHECK (dealer_price >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- One row per part number; legacy duplicates are collapsed on import.
CREATE UNIQUE INDEX idx_parts_part_no ON parts(part_no);
";

const CHART_OF_ACCOUNTS_SQL: &str = r"
CREATE TABLE main_groups (
    id UUID PRIMARY KEY,
    code VARCHAR(20) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    account_type account_type NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE subgroups (
    id UUID PRIMARY KEY,
    main_group_id UUID NOT NULL REFERENCES main_groups(id) ON DELETE RESTRICT,
    code VARCHAR(20) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    subgroup_id UUID NOT NULL REFERENCES subgroups(id) ON DELETE RESTRICT,
    code VARCHAR(20) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    opening_balance NUMERIC(19, 2) NOT NULL DEFAULT 0,
    current_balance NUMERIC(19, 2) NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_accounts_subgroup ON accounts(subgroup_id);
";

const SUPPLIERS_STORES_SQL: &str = r"
CREATE TABLE suppliers (
    id UUID PRIMARY KEY,
    code VARCHAR(50) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    payable_account_id UUID REFERENCES accounts(id) ON DELETE RESTRICT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE stores (
    id UUID PRIMARY KEY,
    code VARCHAR(50) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const LEDGER_SQL: &str = r"
CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY,
    kind entry_kind NOT NULL,
    voucher_type voucher_type,
    entry_no VARCHAR(30) NOT NULL UNIQUE,
    entry_date DATE NOT NULL,
    description TEXT NOT NULL,
    status entry_status NOT NULL DEFAULT 'draft',
    reference_type reference_type,
    reference_id UUID,
    posted_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_voucher_type CHECK (
        (kind = 'voucher' AND voucher_type IS NOT NULL)
        OR (kind = 'journal' AND voucher_type IS NULL)
    ),
    CONSTRAINT chk_reference_pair CHECK (
        (reference_type IS NULL) = (reference_id IS NULL)
    )
);

CREATE INDEX idx_ledger_entries_date ON ledger_entries(entry_date);
CREATE INDEX idx_ledger_entries_reference ON ledger_entries(reference_type, reference_id);

CREATE TABLE ledger_lines (
    id UUID PRIMARY KEY,
    entry_id UUID NOT NULL REFERENCES ledger_entries(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE RESTRICT,
    line_no INTEGER NOT NULL,
    debit NUMERIC(19, 2) NOT NULL DEFAULT 0 CHECK (debit >= 0),
    credit NUMERIC(19, 2) NOT NULL DEFAULT 0 CHECK (credit >= 0),
    memo TEXT,

    CONSTRAINT chk_one_side CHECK (
        (debit > 0 AND credit = 0) OR (credit > 0 AND debit = 0)
    )
);

CREATE INDEX idx_ledger_lines_entry ON ledger_lines(entry_id);
CREATE INDEX idx_ledger_lines_account ON ledger_lines(account_id);
";

const NUMBER_SEQUENCES_SQL: &str = r"
CREATE TABLE number_sequences (
    prefix VARCHAR(10) PRIMARY KEY,
    last_value BIGINT NOT NULL DEFAULT 0
);
";

const PURCHASE_ORDERS_SQL: &str = r"
CREATE TABLE purchase_orders (
    id UUID PRIMARY KEY,
    kind purchase_kind NOT NULL,
    number VARCHAR(30) NOT NULL UNIQUE,
    supplier_id UUID NOT NULL REFERENCES suppliers(id) ON DELETE RESTRICT,
    status purchase_status NOT NULL DEFAULT 'draft',
    order_date DATE NOT NULL,
    notes TEXT,
    received_at TIMESTAMPTZ,
    ledger_entry_id UUID REFERENCES ledger_entries(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_purchase_orders_status ON purchase_orders(status);

CREATE TABLE purchase_order_items (
    id UUID PRIMARY KEY,
    purchase_order_id UUID NOT NULL REFERENCES purchase_orders(id) ON DELETE CASCADE,
    line_no INTEGER NOT NULL,
    part_id UUID NOT NULL REFERENCES parts(id) ON DELETE RESTRICT,
    store_id UUID REFERENCES stores(id) ON DELETE RESTRICT,
    quantity BIGINT NOT NULL CHECK (quantity > 0),
    unit_price NUMERIC(19, 4) NOT NULL CHECK (unit_price >= 0)
);

CREATE INDEX idx_purchase_order_items_order ON purchase_order_items(purchase_order_id);
CREATE INDEX idx_purchase_order_items_part ON purchase_order_items(part_id);

CREATE TABLE purchase_order_expenses (
    id UUID PRIMARY KEY,
    purchase_order_id UUID NOT NULL REFERENCES purchase_orders(id) ON DELETE CASCADE,
    label VARCHAR(255) NOT NULL,
    amount NUMERIC(19, 2) NOT NULL CHECK (amount >= 0)
);
";

const SALES_INVOICES_SQL: &str = r"
CREATE TABLE sales_invoices (
    id UUID PRIMARY KEY,
    number VARCHAR(30) NOT NULL UNIQUE,
    customer_name VARCHAR(255) NOT NULL,
    status invoice_status NOT NULL DEFAULT 'draft',
    invoice_date DATE NOT NULL,
    posted_at TIMESTAMPTZ,
    ledger_entry_id UUID REFERENCES ledger_entries(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE sales_invoice_items (
    id UUID PRIMARY KEY,
    sales_invoice_id UUID NOT NULL REFERENCES sales_invoices(id) ON DELETE CASCADE,
    line_no INTEGER NOT NULL,
    part_id UUID NOT NULL REFERENCES parts(id) ON DELETE RESTRICT,
    store_id UUID REFERENCES stores(id) ON DELETE RESTRICT,
    quantity BIGINT NOT NULL CHECK (quantity > 0),
    unit_price NUMERIC(19, 2) NOT NULL CHECK (unit_price >= 0),
    unit_cost NUMERIC(19, 4)
);

CREATE INDEX idx_sales_invoice_items_invoice ON sales_invoice_items(sales_invoice_id);
CREATE INDEX idx_sales_invoice_items_part ON sales_invoice_items(part_id);
";

const STOCK_SQL: &str = r"
CREATE TABLE stock_adjustments (
    id UUID PRIMARY KEY,
    part_id UUID NOT NULL REFERENCES parts(id) ON DELETE RESTRICT,
    store_id UUID REFERENCES stores(id) ON DELETE RESTRICT,
    delta BIGINT NOT NULL CHECK (delta <> 0),
    reason TEXT NOT NULL,
    adjusted_on DATE NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

-- Append-only. The document reference has no foreign key; see the reconciler.
CREATE TABLE stock_movements (
    id UUID PRIMARY KEY,
    part_id UUID NOT NULL REFERENCES parts(id) ON DELETE RESTRICT,
    store_id UUID REFERENCES stores(id) ON DELETE RESTRICT,
    direction movement_direction NOT NULL,
    quantity BIGINT NOT NULL CHECK (quantity > 0),
    reference_type reference_type NOT NULL,
    reference_id UUID NOT NULL,
    unit_cost NUMERIC(19, 4),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_stock_movements_part ON stock_movements(part_id, store_id);
CREATE INDEX idx_stock_movements_reference ON stock_movements(reference_type, reference_id);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS stock_movements CASCADE;
DROP TABLE IF EXISTS stock_adjustments CASCADE;
DROP TABLE IF EXISTS sales_invoice_items CASCADE;
DROP TABLE IF EXISTS sales_invoices CASCADE;
DROP TABLE IF EXISTS purchase_order_expenses CASCADE;
DROP TABLE IF EXISTS purchase_order_items CASCADE;
DROP TABLE IF EXISTS purchase_orders CASCADE;
DROP TABLE IF EXISTS number_sequences CASCADE;
DROP TABLE IF EXISTS ledger_lines CASCADE;
DROP TABLE IF EXISTS ledger_entries CASCADE;
DROP TABLE IF EXISTS stores CASCADE;
DROP TABLE IF EXISTS suppliers CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS subgroups CASCADE;
DROP TABLE IF EXISTS main_groups CASCADE;
DROP TABLE IF EXISTS parts CASCADE;
DROP TABLE IF EXISTS applications CASCADE;
DROP TABLE IF EXISTS subcategories CASCADE;
DROP TABLE IF EXISTS categories CASCADE;
DROP TABLE IF EXISTS brands CASCADE;

DROP TYPE IF EXISTS reference_type;
DROP TYPE IF EXISTS movement_direction;
DROP TYPE IF EXISTS invoice_status;
DROP TYPE IF EXISTS purchase_status;
DROP TYPE IF EXISTS purchase_kind;
DROP TYPE IF EXISTS cost_source;
DROP TYPE IF EXISTS entry_status;
DROP TYPE IF EXISTS voucher_type;
DROP TYPE IF EXISTS entry_kind;
DROP TYPE IF EXISTS account_type;
";
