// src/services/audit_service.rs

use crate::{
    common::{
        db_utils::{like_pattern, Page, PageParams},
        error::AppError,
    },
    db::audit_repo::{AuditCriteria, AuditRepository},
    models::audit::{AppModule, AuditAction, AuditEntry, AuditFilter, AuditStats, PurgeResult},
    services::document_service::AUDIT_EXPORT_ROWS,
};

#[derive(Clone)]
pub struct AuditService {
    audit_repo: AuditRepository,
}

impl AuditService {
    pub fn new(audit_repo: AuditRepository) -> Self {
        Self { audit_repo }
    }

    /// Registra um evento. Falhas só vão para o log.
    pub async fn log(
        &self,
        username: &str,
        action: AuditAction,
        module: AppModule,
        description: &str,
        ip_address: Option<&str>,
    ) {
        if let Err(e) = self
            .audit_repo
            .insert(self.audit_repo.pool(), username, action, module, description, ip_address)
            .await
        {
            tracing::warn!("⚠️ Falha ao gravar bitácora ({:?} {:?}): {}", action, module, e);
        }
    }

    pub async fn list(&self, filter: &AuditFilter, params: &PageParams) -> Result<Page<AuditEntry>, AppError> {
        let pattern = like_pattern(filter.user.as_deref());
        let criteria = criteria(filter, pattern.as_deref());

        let entries = self
            .audit_repo
            .list(&criteria, params.per_page(), params.offset())
            .await?;
        let total = self.audit_repo.count(&criteria).await?;
        Ok(Page::new(entries, params, total))
    }

    pub async fn stats(&self) -> Result<AuditStats, AppError> {
        self.audit_repo.stats().await
    }

    /// Eventos do filtro para o PDF (limitados).
    pub async fn export(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, AppError> {
        let pattern = like_pattern(filter.user.as_deref());
        self.audit_repo
            .list(&criteria(filter, pattern.as_deref()), AUDIT_EXPORT_ROWS as i64, 0)
            .await
    }

    /// Remove eventos antigos e registra a própria limpeza.
    pub async fn purge(&self, days: i64, username: &str, ip_address: Option<&str>) -> Result<PurgeResult, AppError> {
        let deleted = self
            .audit_repo
            .purge_older_than(self.audit_repo.pool(), days)
            .await?;
        tracing::info!("🔥 Bitácora: {} eventos com mais de {} dias removidos", deleted, days);

        self.log(
            username,
            AuditAction::Purge,
            AppModule::Audit,
            &purge_description(deleted, days),
            ip_address,
        )
        .await;
        Ok(PurgeResult { days, deleted })
    }
}

fn criteria<'a>(filter: &AuditFilter, user_pattern: Option<&'a str>) -> AuditCriteria<'a> {
    AuditCriteria {
        user_pattern,
        module: filter.module,
        action: filter.action,
        from: filter.from,
        to: filter.to,
    }
}

pub fn purge_description(deleted: u64, days: i64) -> String {
    format!("Depuración: {} registros con más de {} días", deleted, days)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_description_names_counts() {
        assert_eq!(
            purge_description(12, 90),
            "Depuración: 12 registros con más de 90 días"
        );
    }

    #[test]
    fn criteria_copies_filter() {
        let filter = AuditFilter {
            user: Some("ana".into()),
            module: Some(AppModule::Sales),
            action: Some(AuditAction::Create),
            ..Default::default()
        };
        let c = criteria(&filter, Some("%ana%"));
        assert_eq!(c.user_pattern, Some("%ana%"));
        assert_eq!(c.module, Some(AppModule::Sales));
        assert_eq!(c.action, Some(AuditAction::Create));
        assert!(c.from.is_none());
    }
}
