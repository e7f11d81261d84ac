//! PostgreSQL implementation of TransactionRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{column, corrupt, db_error};
use crate::domain::foundation::{
    DomainError, ErrorCode, PayerId, ProjectId, ProviderCode, SessionId, Timestamp,
    TransactionId, TransactionStatus,
};
use crate::domain::transaction::Transaction;
use crate::ports::TransactionRepository;

#[derive(Clone)]
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn save(&self, transaction: &Transaction) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, reference, project_id, provider, session_id, payer_id, amount, currency,
                status, provider_transaction_id, client_reference, resolved_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(transaction.id().as_uuid())
        .bind(transaction.reference())
        .bind(transaction.project_id().as_uuid())
        .bind(transaction.provider().as_str())
        .bind(transaction.session_id().map(|id| *id.as_uuid()))
        .bind(transaction.payer_id().map(|id| *id.as_uuid()))
        .bind(transaction.amount())
        .bind(transaction.currency())
        .bind(transaction.status().as_str())
        .bind(transaction.provider_transaction_id())
        .bind(transaction.client_reference())
        .bind(transaction.resolved_at().map(|t| *t.as_datetime()))
        .bind(transaction.created_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("insert transaction"))?;

        Ok(())
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, reference, project_id, provider, session_id, payer_id, amount, currency,
                   status, provider_transaction_id, client_reference, resolved_at, created_at
            FROM transactions
            WHERE reference = $1
            "#,
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch transaction"))?;

        row.map(row_to_transaction).transpose()
    }

    async fn record_provider_transaction_id(
        &self,
        reference: &str,
        provider_transaction_id: &str,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE transactions SET provider_transaction_id = $2 WHERE reference = $1",
        )
        .bind(reference)
        .bind(provider_transaction_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("record provider transaction id"))?;

        if result.rows_affected() == 0 {
            return Err(
                DomainError::new(ErrorCode::TransactionNotFound, "Transaction not found")
                    .with_detail("reference", reference),
            );
        }
        Ok(())
    }

    async fn update_status(
        &self,
        reference: &str,
        status: TransactionStatus,
        resolved_at: Timestamp,
    ) -> Result<bool, DomainError> {
        if status == TransactionStatus::Pending {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "A transaction cannot be resolved back to PENDING",
            ));
        }

        let result = sqlx::query(
            r#"
            UPDATE transactions SET status = $2, resolved_at = $3
            WHERE reference = $1 AND status = 'PENDING'
            "#,
        )
        .bind(reference)
        .bind(status.as_str())
        .bind(resolved_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("update transaction status"))?;

        Ok(result.rows_affected() == 1)
    }
}

fn row_to_transaction(row: sqlx::postgres::PgRow) -> Result<Transaction, DomainError> {
    let provider: String = column(&row, "provider")?;
    let status: String = column(&row, "status")?;
    let session_id: Option<uuid::Uuid> = column(&row, "session_id")?;
    let payer_id: Option<uuid::Uuid> = column(&row, "payer_id")?;
    let resolved_at: Option<chrono::DateTime<chrono::Utc>> = column(&row, "resolved_at")?;
    let created_at: chrono::DateTime<chrono::Utc> = column(&row, "created_at")?;

    Ok(Transaction::reconstitute(
        TransactionId::from_uuid(column(&row, "id")?),
        column(&row, "reference")?,
        ProjectId::from_uuid(column(&row, "project_id")?),
        ProviderCode::new(provider).map_err(|e| corrupt("provider code", e))?,
        session_id.map(SessionId::from_uuid),
        payer_id.map(PayerId::from_uuid),
        column(&row, "amount")?,
        column(&row, "currency")?,
        status
            .parse::<TransactionStatus>()
            .map_err(|e| corrupt("transaction status", e))?,
        column(&row, "provider_transaction_id")?,
        column(&row, "client_reference")?,
        resolved_at.map(Timestamp::from_datetime),
        Timestamp::from_datetime(created_at),
    ))
}
