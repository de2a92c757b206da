//! Chart-of-accounts repository.

use chrono::Utc;
use partida_core::chart::{Account, AccountTree, BalanceSide};
use partida_shared::AppError;
use partida_shared::types::{AccountId, TenantId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::info;
use uuid::Uuid;

use super::support::load_accounts;
use crate::entities::{accounts, journal_lines, period_balances};

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Code already used by the tenant.
    #[error("Account code '{0}' already exists")]
    DuplicateCode(String),

    /// Code is empty or not made of digits.
    #[error("Invalid account code '{0}'")]
    InvalidCode(String),

    /// Account not found.
    #[error("Account not found: {0}")]
    NotFound(Uuid),

    /// Account has received journal lines.
    #[error("Cannot delete account: it has {0} journal lines")]
    HasLines(u64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::DuplicateCode(_)
            | AccountError::InvalidCode(_)
            | AccountError::HasLines(_) => Self::Validation(err.to_string()),
            AccountError::NotFound(id) => Self::NotFound(format!("account {id}")),
            AccountError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Tenant ID.
    pub tenant_id: TenantId,
    /// Hierarchical code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Depth in the hierarchy; defaults to the code length.
    pub level: Option<i32>,
    /// Whether the account receives lines.
    pub postable: bool,
    /// Monetary item.
    pub monetary: bool,
    /// Restated by the inflation adjustment.
    pub adjustable: bool,
    /// Natural balance side.
    pub balance_side: BalanceSide,
}

impl CreateAccountInput {
    /// Active, non-monetary account with the level taken from the code.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        code: impl Into<String>,
        name: impl Into<String>,
        postable: bool,
        balance_side: BalanceSide,
    ) -> Self {
        Self {
            tenant_id,
            code: code.into(),
            name: name.into(),
            level: None,
            postable,
            monetary: false,
            adjustable: false,
            balance_side,
        }
    }

    /// Marks the account as restated by the inflation adjustment.
    #[must_use]
    pub const fn adjustable(mut self) -> Self {
        self.adjustable = true;
        self
    }

    /// Marks the account as a monetary item.
    #[must_use]
    pub const fn monetary(mut self) -> Self {
        self.monetary = true;
        self
    }
}

fn valid_code(code: &str) -> bool {
    !code.is_empty() && code.chars().all(|c| c.is_ascii_digit())
}

/// Chart-of-accounts repository.
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

    /// Creates a new active account.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is invalid or taken, or the insert fails.
    pub async fn create_account(&self, input: CreateAccountInput) -> Result<Account, AccountError> {
        if !valid_code(&input.code) {
            return Err(AccountError::InvalidCode(input.code));
        }

        let existing = accounts::Entity::find()
            .filter(accounts::Column::TenantId.eq(input.tenant_id.into_inner()))
            .filter(accounts::Column::Code.eq(&input.code))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(AccountError::DuplicateCode(input.code));
        }

        let level = input
            .level
            .unwrap_or_else(|| i32::try_from(input.code.len()).unwrap_or(i32::MAX));
        let now = Utc::now().into();

        let account = accounts::ActiveModel {
            id: Set(AccountId::new().into_inner()),
            tenant_id: Set(input.tenant_id.into_inner()),
            code: Set(input.code),
            name: Set(input.name),
            level: Set(level),
            postable: Set(input.postable),
            monetary: Set(input.monetary),
            adjustable: Set(input.adjustable),
            balance_side: Set(input.balance_side.into()),
            last_balance: Set(Decimal::ZERO),
            last_movement: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await?;

        Ok(account.into())
    }

    /// Finds an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id(
        &self,
        tenant_id: TenantId,
        id: AccountId,
    ) -> Result<Option<Account>, AccountError> {
        let account = accounts::Entity::find_by_id(id.into_inner())
            .filter(accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .one(&self.db)
            .await?;

        Ok(account.map(Account::from))
    }

    /// Finds an account by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_code(
        &self,
        tenant_id: TenantId,
        code: &str,
    ) -> Result<Option<Account>, AccountError> {
        let account = accounts::Entity::find()
            .filter(accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .filter(accounts::Column::Code.eq(code))
            .one(&self.db)
            .await?;

        Ok(account.map(Account::from))
    }

    /// Lists the tenant's accounts in code order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_accounts(&self, tenant_id: TenantId) -> Result<Vec<Account>, AccountError> {
        Ok(load_accounts(&self.db, tenant_id).await?)
    }

    /// Loads the tenant's chart as a hierarchy.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn chart(&self, tenant_id: TenantId) -> Result<AccountTree, AccountError> {
        Ok(AccountTree::new(self.list_accounts(tenant_id).await?))
    }

    /// Activates or deactivates an account. Inactive accounts reject new lines.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::NotFound` or a database error.
    pub async fn set_active(
        &self,
        tenant_id: TenantId,
        id: AccountId,
        is_active: bool,
    ) -> Result<Account, AccountError> {
        let account = accounts::Entity::find_by_id(id.into_inner())
            .filter(accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .one(&self.db)
            .await?
            .ok_or(AccountError::NotFound(id.into_inner()))?;

        let mut active: accounts::ActiveModel = account.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(Utc::now().into());
        let account = active.update(&self.db).await?;

        Ok(account.into())
    }

    /// Deletes an account that never received a journal line.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::HasLines` when lines reference the account,
    /// `AccountError::NotFound`, or a database error.
    pub async fn delete_account(&self, tenant_id: TenantId, id: AccountId) -> Result<(), AccountError> {
        let txn = self.db.begin().await?;

        let account = accounts::Entity::find_by_id(id.into_inner())
            .filter(accounts::Column::TenantId.eq(tenant_id.into_inner()))
            .one(&txn)
            .await?
            .ok_or(AccountError::NotFound(id.into_inner()))?;

        let line_count = journal_lines::Entity::find()
            .filter(journal_lines::Column::AccountId.eq(account.id))
            .count(&txn)
            .await?;
        if line_count > 0 {
            return Err(AccountError::HasLines(line_count));
        }

        period_balances::Entity::delete_many()
            .filter(period_balances::Column::AccountId.eq(account.id))
            .exec(&txn)
            .await?;
        accounts::Entity::delete_by_id(account.id).exec(&txn).await?;

        txn.commit().await?;

        info!(tenant_id = %tenant_id, code = %account.code, "account deleted");
        Ok(())
    }
}
