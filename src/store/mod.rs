//! In-memory transaction store shared by tool handlers and the webhook.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::models::transaction::{StatusFilter, Transaction};
use crate::{AppError, Result};

/// Concurrency-safe map of transactions keyed by payload MD5.
///
/// The store is intentionally ephemeral: transactions live for the
/// lifetime of the server process.
#[derive(Debug, Default)]
pub struct TransactionStore {
    inner: RwLock<HashMap<String, Transaction>>,
}

impl TransactionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a transaction.
    pub async fn insert(&self, transaction: Transaction) {
        self.inner
            .write()
            .await
            .insert(transaction.md5.clone(), transaction);
    }

    /// Fetch a transaction snapshot by MD5.
    pub async fn get(&self, md5: &str) -> Option<Transaction> {
        self.inner.read().await.get(md5).cloned()
    }

    /// List transactions matching `filter`, oldest first.
    pub async fn list(&self, filter: StatusFilter) -> Vec<Transaction> {
        let guard = self.inner.read().await;
        let mut transactions: Vec<Transaction> = guard
            .values()
            .filter(|tx| filter.matches(tx.status))
            .cloned()
            .collect();
        transactions.sort_by_key(|tx| tx.created_at);
        transactions
    }

    /// Number of stored transactions.
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Whether the store holds no transactions.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Mark a transaction paid, returning the updated snapshot.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown MD5.
    pub async fn mark_paid(&self, md5: &str, now: DateTime<Utc>) -> Result<Transaction> {
        let mut guard = self.inner.write().await;
        let tx = guard
            .get_mut(md5)
            .ok_or_else(|| AppError::NotFound(md5.to_owned()))?;
        tx.mark_paid(now);
        Ok(tx.clone())
    }

    /// Apply a payment callback: record the scan (cooldown enforced) and,
    /// on success, mark the transaction paid. Returns the updated snapshot.
    ///
    /// The scan and the status transition happen under one write lock so a
    /// concurrent callback for the same MD5 cannot interleave.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown MD5,
    /// `AppError::AlreadyPaid` for a transaction that is already paid, or
    /// `AppError::Cooldown` when the scan cooldown is still active.
    pub async fn apply_callback(
        &self,
        md5: &str,
        success: bool,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> Result<Transaction> {
        let mut guard = self.inner.write().await;
        let tx = guard
            .get_mut(md5)
            .ok_or_else(|| AppError::NotFound(md5.to_owned()))?;
        tx.record_scan(now, cooldown)?;
        if success {
            tx.mark_paid(now);
        }
        Ok(tx.clone())
    }
}
