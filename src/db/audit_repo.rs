// src/db/audit_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::audit::{AppModule, AuditAction, AuditEntry, AuditStats},
};

// Filtro já normalizado (usuário como padrão ILIKE)
pub struct AuditCriteria<'a> {
    pub user_pattern: Option<&'a str>,
    pub module: Option<AppModule>,
    pub action: Option<AuditAction>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

const FILTER_WHERE: &str = r#"
    WHERE ($1::text IS NULL OR username ILIKE $1)
      AND ($2::app_module IS NULL OR module = $2)
      AND ($3::audit_action IS NULL OR action = $3)
      AND ($4::date IS NULL OR created_at >= $4::date)
      AND ($5::date IS NULL OR created_at < $5::date + 1)
"#;

#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        username: &str,
        action: AuditAction,
        module: AppModule,
        description: &str,
        ip_address: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO audit_log (username, action, module, description, ip_address)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
            .bind(username)
            .bind(action)
            .bind(module)
            .bind(description)
            .bind(ip_address)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn list(&self, criteria: &AuditCriteria<'_>, limit: i64, offset: i64) -> Result<Vec<AuditEntry>, AppError> {
        let query = format!("SELECT * FROM audit_log {FILTER_WHERE} ORDER BY created_at DESC LIMIT $6 OFFSET $7");
        let entries = sqlx::query_as::<_, AuditEntry>(&query)
            .bind(criteria.user_pattern)
            .bind(criteria.module)
            .bind(criteria.action)
            .bind(criteria.from)
            .bind(criteria.to)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }

    pub async fn count(&self, criteria: &AuditCriteria<'_>) -> Result<i64, AppError> {
        let query = format!("SELECT COUNT(*) FROM audit_log {FILTER_WHERE}");
        let total: i64 = sqlx::query_scalar(&query)
            .bind(criteria.user_pattern)
            .bind(criteria.module)
            .bind(criteria.action)
            .bind(criteria.from)
            .bind(criteria.to)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn stats(&self) -> Result<AuditStats, AppError> {
        let stats = sqlx::query_as::<_, AuditStats>(
            r#"
            SELECT
                COUNT(*) AS total_events,
                COUNT(*) FILTER (WHERE created_at >= CURRENT_DATE) AS events_today,
                COUNT(DISTINCT username) AS distinct_users
            FROM audit_log
            "#,
        )
            .fetch_one(&self.pool)
            .await?;
        Ok(stats)
    }

    /// Apaga eventos com mais de `days` dias. Devolve quantos saíram.
    pub async fn purge_older_than<'e, E>(&self, executor: E, days: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM audit_log WHERE created_at < NOW() - make_interval(days => $1::int)")
            .bind(days)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
