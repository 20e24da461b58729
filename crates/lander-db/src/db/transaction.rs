//! Database transaction utilities
//!
//! Multi-row writes (bulk reorder, site creation with its high-water mark)
//! go through `TransactionGuard` so they either fully apply or not at all.

use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres, Transaction};
use std::ops::{Deref, DerefMut};

/// A named database transaction
///
/// Dropping the guard without calling `commit` rolls the transaction back
/// (sqlx `Transaction` semantics); the name only shows up in logs.
///
/// # Example
///
/// ```ignore
/// use lander_db::TransactionGuard;
///
/// async fn example(pool: &sqlx::PgPool) -> anyhow::Result<()> {
///     let mut tx = TransactionGuard::begin(pool, "reorder").await?;
///     sqlx::query("UPDATE landing_pages SET ...").execute(&mut **tx).await?;
///     tx.commit().await?;
///     Ok(())
/// }
/// ```
pub struct TransactionGuard<'a> {
    transaction: Transaction<'a, Postgres>,
    operation: &'static str,
}

impl<'a> TransactionGuard<'a> {
    /// Begin a new database transaction
    pub async fn begin(pool: &'a PgPool, operation: &'static str) -> Result<Self> {
        let transaction = pool
            .begin()
            .await
            .with_context(|| format!("Failed to begin transaction for {}", operation))?;

        tracing::trace!(operation, "Transaction started");

        Ok(Self {
            transaction,
            operation,
        })
    }

    /// Commit the transaction
    pub async fn commit(self) -> Result<()> {
        let operation = self.operation;
        self.transaction
            .commit()
            .await
            .with_context(|| format!("Failed to commit transaction for {}", operation))?;
        tracing::trace!(operation, "Transaction committed");
        Ok(())
    }

    /// Roll the transaction back explicitly
    pub async fn rollback(self) -> Result<()> {
        let operation = self.operation;
        self.transaction
            .rollback()
            .await
            .with_context(|| format!("Failed to rollback transaction for {}", operation))?;
        tracing::debug!(operation, "Transaction rolled back");
        Ok(())
    }
}

impl<'a> Deref for TransactionGuard<'a> {
    type Target = Transaction<'a, Postgres>;

    fn deref(&self) -> &Self::Target {
        &self.transaction
    }
}

impl<'a> DerefMut for TransactionGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.transaction
    }
}
