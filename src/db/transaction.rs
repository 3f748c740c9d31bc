/*!
 * Transaction helper
 *
 * Wraps a sea-orm transaction so that every write path commits on success,
 * rolls back on failure and records the outcome under one operation label.
 */

use crate::errors::ServiceError;
use metrics::{counter, histogram};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::time::Instant;
use tracing::{debug, error, warn};

pub struct TrackedTransaction {
    txn: DatabaseTransaction,
    operation: &'static str,
    started: Instant,
}

impl TrackedTransaction {
    pub async fn begin(
        db: &DatabaseConnection,
        operation: &'static str,
    ) -> Result<Self, ServiceError> {
        let txn = db.begin().await?;
        counter!("furnishflow_db.transactions.started", 1, "operation" => operation);
        debug!(operation, "transaction started");
        Ok(Self {
            txn,
            operation,
            started: Instant::now(),
        })
    }

    /// Connection to run statements on inside the transaction.
    pub fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits when `result` is `Ok`, otherwise rolls back and hands the
    /// original error back to the caller.
    pub async fn finish<T>(self, result: Result<T, ServiceError>) -> Result<T, ServiceError> {
        let operation = self.operation;
        let elapsed = self.started.elapsed().as_secs_f64();
        histogram!("furnishflow_db.transactions.duration_seconds", elapsed, "operation" => operation);

        match result {
            Ok(value) => {
                if let Err(e) = self.txn.commit().await {
                    error!(operation, error = %e, "transaction commit failed");
                    counter!("furnishflow_db.transactions.failed", 1, "operation" => operation);
                    return Err(e.into());
                }
                counter!("furnishflow_db.transactions.committed", 1, "operation" => operation);
                debug!(operation, "transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.txn.rollback().await {
                    error!(operation, error = %rollback_err, "transaction rollback failed");
                }
                counter!("furnishflow_db.transactions.rolled_back", 1, "operation" => operation);
                warn!(operation, error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }
}
