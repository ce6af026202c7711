// src/common/db_utils.rs

use serde::{Deserialize, Serialize};
use sqlx::{Executor, Postgres};
use utoipa::{IntoParams, ToSchema};

use crate::common::error::AppError;

/// Monta o padrão `%termo%` para ILIKE, escapando os curingas do próprio termo.
/// Termos vazios viram `None` (sem filtro).
pub fn like_pattern(term: Option<&str>) -> Option<String> {
    let term = term.map(str::trim).filter(|t| !t.is_empty())?;
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{}%", escaped))
}

/// Serializa a numeração de documentos de um mesmo prefixo até o fim da transação.
pub async fn lock_sequence<'e, E>(executor: E, key: &str) -> Result<(), AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(key)
        .execute(executor)
        .await?;
    Ok(())
}

// ---
// Paginação
// ---
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageParams {
    pub const DEFAULT_PER_PAGE: i64 = 50;
    pub const MAX_PER_PAGE: i64 = 200;
    pub const MAX_PAGE: i64 = 1_000_000;

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, Self::MAX_PAGE)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.per_page()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, params: &PageParams, total: i64) -> Self {
        let per_page = params.per_page();
        Self {
            items,
            page: params.page(),
            per_page,
            total,
            pages: (total + per_page - 1) / per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(Some(" 50%_off ")).as_deref(), Some("%50\\%\\_off%"));
        assert_eq!(like_pattern(Some("   ")), None);
        assert_eq!(like_pattern(None), None);
    }

    #[test]
    fn page_params_clamp() {
        let p = PageParams { page: Some(0), per_page: Some(10_000) };
        assert_eq!(p.page(), 1);
        assert_eq!(p.per_page(), PageParams::MAX_PER_PAGE);
        assert_eq!(p.offset(), 0);

        let p = PageParams { page: Some(3), per_page: None };
        assert_eq!(p.offset(), 100);
    }

    #[test]
    fn huge_page_does_not_overflow_offset() {
        let p = PageParams { page: Some(i64::MAX), per_page: Some(50) };
        assert_eq!(p.page(), PageParams::MAX_PAGE);
        assert_eq!(p.offset(), (PageParams::MAX_PAGE - 1) * 50);

        let p = PageParams { page: Some(i64::MIN), per_page: Some(i64::MIN) };
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn page_counts_pages() {
        let params = PageParams { page: Some(1), per_page: Some(20) };
        let page = Page::new(vec![1, 2, 3], &params, 41);
        assert_eq!(page.pages, 3);
        let empty: Page<i32> = Page::new(vec![], &params, 0);
        assert_eq!(empty.pages, 0);
    }
}
