//! PostgreSQL implementation of PayerRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{column, db_error};
use crate::domain::foundation::{DomainError, PayerId, Timestamp};
use crate::domain::transaction::Payer;
use crate::ports::PayerRepository;

#[derive(Clone)]
pub struct PostgresPayerRepository {
    pool: PgPool,
}

impl PostgresPayerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PayerRepository for PostgresPayerRepository {
    async fn upsert_by_phone(&self, payer: Payer) -> Result<Payer, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO payers (id, phone, name, email, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (phone) DO UPDATE SET
                name = COALESCE(payers.name, EXCLUDED.name),
                email = COALESCE(payers.email, EXCLUDED.email)
            RETURNING id, phone, name, email, created_at
            "#,
        )
        .bind(payer.id.as_uuid())
        .bind(&payer.phone)
        .bind(payer.name.as_deref())
        .bind(payer.email.as_deref())
        .bind(payer.created_at.as_datetime())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("upsert payer"))?;

        row_to_payer(row)
    }

    async fn find_by_id(&self, id: &PayerId) -> Result<Option<Payer>, DomainError> {
        let row = sqlx::query("SELECT id, phone, name, email, created_at FROM payers WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("fetch payer"))?;

        row.map(row_to_payer).transpose()
    }
}

fn row_to_payer(row: sqlx::postgres::PgRow) -> Result<Payer, DomainError> {
    let created_at: chrono::DateTime<chrono::Utc> = column(&row, "created_at")?;
    Ok(Payer {
        id: PayerId::from_uuid(column(&row, "id")?),
        phone: column(&row, "phone")?,
        name: column(&row, "name")?,
        email: column(&row, "email")?,
        created_at: Timestamp::from_datetime(created_at),
    })
}
