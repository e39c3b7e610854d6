//! Core ledger schema.
//!
//! Creates the enums, accounts, the append-only transaction record table and
//! the scheduled transfer table.

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
        // PART 2: TABLES
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(TRANSACTION_RECORDS_SQL).await?;
        db.execute_unprepared(SCHEDULED_TRANSFERS_SQL).await?;

        // ============================================================
        // PART 3: APPEND-ONLY GUARD
        // ============================================================
        db.execute_unprepared(IMMUTABLE_RECORDS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE account_status AS ENUM ('active', 'suspended', 'closed');
CREATE TYPE account_type AS ENUM ('savings', 'current', 'fixed_deposit');
CREATE TYPE transaction_kind AS ENUM ('credit', 'debit', 'transfer');
CREATE TYPE record_status AS ENUM ('completed', 'failed');
CREATE TYPE schedule_status AS ENUM ('pending', 'executed', 'failed', 'cancelled');
";

const ACCOUNTS_SQL: &str = r"
-- Rows are created by the account-opening flow and never deleted
CREATE TABLE accounts (
    number BIGINT PRIMARY KEY,
    user_id BIGINT NOT NULL,
    account_type account_type NOT NULL,
    balance NUMERIC(18, 2) NOT NULL DEFAULT 0,
    status account_status NOT NULL DEFAULT 'active',
    ifsc_code VARCHAR(11) NOT NULL,
    opened_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_balance_non_negative CHECK (balance >= 0)
);

CREATE INDEX idx_accounts_user ON accounts(user_id);
";

const TRANSACTION_RECORDS_SQL: &str = r"
-- Append-only audit trail. No foreign keys: attempts against unknown
-- accounts are recorded as failed.
CREATE TABLE transaction_records (
    id BIGINT GENERATED ALWAYS AS IDENTITY (START WITH 1000000000) PRIMARY KEY,
    kind transaction_kind NOT NULL,
    from_account BIGINT,
    to_account BIGINT,
    -- Unconstrained so a rejected request is recorded with the exact amount asked for
    amount NUMERIC NOT NULL,
    recorded_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    status record_status NOT NULL,
    comment TEXT NOT NULL DEFAULT '',
    scheduled_transfer_id BIGINT,
    CONSTRAINT chk_completed_amount_positive CHECK (status <> 'completed' OR amount > 0),
    CONSTRAINT chk_has_account CHECK (from_account IS NOT NULL OR to_account IS NOT NULL)
);

CREATE INDEX idx_records_from ON transaction_records(from_account, recorded_at DESC);
CREATE INDEX idx_records_to ON transaction_records(to_account, recorded_at DESC);
";

const SCHEDULED_TRANSFERS_SQL: &str = r"
CREATE TABLE scheduled_transfers (
    id BIGINT GENERATED ALWAYS AS IDENTITY PRIMARY KEY,
    from_account BIGINT NOT NULL REFERENCES accounts(number),
    to_account BIGINT NOT NULL REFERENCES accounts(number),
    amount NUMERIC(18, 2) NOT NULL,
    scheduled_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    status schedule_status NOT NULL DEFAULT 'pending',
    processed_at TIMESTAMPTZ,
    CONSTRAINT chk_scheduled_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_scheduled_distinct CHECK (from_account <> to_account),
    CONSTRAINT chk_processed_when_terminal CHECK ((status = 'pending') = (processed_at IS NULL))
);

CREATE INDEX idx_scheduled_due ON scheduled_transfers(status, scheduled_at);
CREATE INDEX idx_scheduled_from ON scheduled_transfers(from_account, created_at DESC);
CREATE INDEX idx_scheduled_to ON scheduled_transfers(to_account, created_at DESC);
";

const IMMUTABLE_RECORDS_SQL: &str = r"
CREATE OR REPLACE FUNCTION reject_record_mutation() RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'transaction_records is append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_transaction_records_immutable
    BEFORE UPDATE OR DELETE ON transaction_records
    FOR EACH ROW EXECUTE FUNCTION reject_record_mutation();
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS scheduled_transfers CASCADE;
DROP TABLE IF EXISTS transaction_records CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP FUNCTION IF EXISTS reject_record_mutation();
DROP TYPE IF EXISTS schedule_status;
DROP TYPE IF EXISTS record_status;
DROP TYPE IF EXISTS transaction_kind;
DROP TYPE IF EXISTS account_type;
DROP TYPE IF EXISTS account_status;
";
