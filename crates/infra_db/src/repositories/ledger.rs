//! Ledger repository implementation
//!
//! Database access for accounts and the movement trail. The transfer and
//! reversal primitives here run against an open transaction so the trip
//! and payment repositories can compose them with their own row updates
//! atomically.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use core_kernel::{AccountId, CoreError, Money, MovementId, TripId};
use domain_ledger::{lock_order, Account, AccountStatus, LedgerMovement, MovementKind};

use crate::error::{DatabaseError, ServiceError};

#[derive(Debug, FromRow)]
pub(crate) struct AccountRow {
    pub id: Uuid,
    pub holder_name: String,
    pub balance: Decimal,
    pub status: String,
}

impl AccountRow {
    pub(crate) fn into_account(self) -> Result<Account, DatabaseError> {
        let status = AccountStatus::parse(&self.status).ok_or_else(|| {
            DatabaseError::CorruptRow(format!("unknown account status '{}'", self.status))
        })?;
        Ok(Account {
            id: AccountId::from(self.id),
            holder_name: self.holder_name,
            balance: Money::new(self.balance),
            status,
        })
    }
}

#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    payer_id: Uuid,
    payee_id: Uuid,
    amount: Decimal,
    kind: String,
    trip_id: Option<Uuid>,
    reverses: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl MovementRow {
    fn into_movement(self) -> Result<LedgerMovement, DatabaseError> {
        let kind = MovementKind::parse(&self.kind).ok_or_else(|| {
            DatabaseError::CorruptRow(format!("unknown movement kind '{}'", self.kind))
        })?;
        Ok(LedgerMovement {
            id: MovementId::from(self.id),
            payer_id: AccountId::from(self.payer_id),
            payee_id: AccountId::from(self.payee_id),
            amount: Money::new(self.amount),
            kind,
            trip_id: self.trip_id.map(TripId::from),
            reverses: self.reverses.map(MovementId::from),
            created_at: self.created_at,
        })
    }
}

/// Locks both accounts of a transfer pair and returns them
///
/// Rows are locked in ascending identifier order regardless of the
/// direction of the transfer, so concurrent opposite-direction operations
/// on the same pair queue up instead of deadlocking.
pub(crate) async fn lock_account_pair(
    conn: &mut PgConnection,
    payer_id: AccountId,
    payee_id: AccountId,
) -> Result<(Account, Account), ServiceError> {
    let (first, second) = lock_order(payer_id, payee_id);

    let mut locked = Vec::with_capacity(2);
    for id in [first, second] {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, holder_name, balance, status FROM accounts WHERE id = $1 FOR UPDATE",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| CoreError::not_found("account", id))?;
        locked.push(row.into_account().map_err(ServiceError::Database)?);
    }

    let second_account = locked.pop().expect("two rows locked");
    let first_account = locked.pop().expect("two rows locked");
    if first_account.id == payer_id {
        Ok((first_account, second_account))
    } else {
        Ok((second_account, first_account))
    }
}

/// Applies a movement to the locked balances and records it
///
/// For a transfer the payer is debited and the payee credited; for a
/// reversal the direction flips. The caller must hold `FOR UPDATE` locks
/// on both accounts and have verified coverage.
pub(crate) async fn apply_movement(
    conn: &mut PgConnection,
    movement: &LedgerMovement,
) -> Result<(), ServiceError> {
    let (debited, credited) = match movement.kind {
        MovementKind::Transfer => (movement.payer_id, movement.payee_id),
        MovementKind::Reversal => (movement.payee_id, movement.payer_id),
    };

    sqlx::query("UPDATE accounts SET balance = balance - $1, updated_at = NOW() WHERE id = $2")
        .bind(movement.amount.amount())
        .bind(Uuid::from(debited))
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE accounts SET balance = balance + $1, updated_at = NOW() WHERE id = $2")
        .bind(movement.amount.amount())
        .bind(Uuid::from(credited))
        .execute(&mut *conn)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO ledger_movements (id, payer_id, payee_id, amount, kind, trip_id, reverses, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(Uuid::from(movement.id))
    .bind(Uuid::from(movement.payer_id))
    .bind(Uuid::from(movement.payee_id))
    .bind(movement.amount.amount())
    .bind(movement.kind.as_str())
    .bind(movement.trip_id.map(Uuid::from))
    .bind(movement.reverses.map(Uuid::from))
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Fetches a movement inside an open transaction
pub(crate) async fn find_movement_in_tx(
    conn: &mut PgConnection,
    id: MovementId,
) -> Result<LedgerMovement, ServiceError> {
    let row = sqlx::query_as::<_, MovementRow>(
        r#"
        SELECT id, payer_id, payee_id, amount, kind, trip_id, reverses, created_at
        FROM ledger_movements WHERE id = $1
        "#,
    )
    .bind(Uuid::from(id))
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| CoreError::not_found("movement", id))?;
    row.into_movement().map_err(ServiceError::Database)
}

/// Repository for accounts and the movement trail
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts an account
    ///
    /// # Errors
    ///
    /// Returns `ConflictError` if the identifier is already taken
    pub async fn create_account(&self, account: &Account) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, holder_name, balance, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            "#,
        )
        .bind(Uuid::from(account.id))
        .bind(&account.holder_name)
        .bind(account.balance.amount())
        .bind(account.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::DuplicateEntry(_) => ServiceError::Domain(CoreError::conflict(
                format!("account {} already exists", account.id),
            )),
            other => ServiceError::Database(other),
        })?;
        Ok(())
    }

    /// Fetches an account by id
    pub async fn find_account(&self, id: AccountId) -> Result<Account, ServiceError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, holder_name, balance, status FROM accounts WHERE id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CoreError::not_found("account", id))?;
        row.into_account().map_err(ServiceError::Database)
    }

    /// Fetches the current balance of an account
    pub async fn get_balance(&self, id: AccountId) -> Result<Money, ServiceError> {
        Ok(self.find_account(id).await?.balance)
    }

    /// Updates the account status
    pub async fn set_status(&self, id: AccountId, status: AccountStatus) -> Result<(), ServiceError> {
        let result = sqlx::query("UPDATE accounts SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status.as_str())
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("account", id).into());
        }
        Ok(())
    }

    /// Fetches a movement by id
    pub async fn find_movement(&self, id: MovementId) -> Result<LedgerMovement, ServiceError> {
        let mut conn = self.pool.acquire().await?;
        find_movement_in_tx(&mut conn, id).await
    }

    /// Lists the movements recorded for a trip, oldest first
    pub async fn movements_for_trip(&self, trip_id: TripId) -> Result<Vec<LedgerMovement>, ServiceError> {
        let rows = sqlx::query_as::<_, MovementRow>(
            r#"
            SELECT id, payer_id, payee_id, amount, kind, trip_id, reverses, created_at
            FROM ledger_movements WHERE trip_id = $1 ORDER BY created_at
            "#,
        )
        .bind(Uuid::from(trip_id))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| r.into_movement().map_err(ServiceError::Database))
            .collect()
    }
}
