use serde::Serialize;
use utoipa::ToSchema;

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

/// Página pedida pelo cliente, já normalizada (page >= 1, 1 <= limit <= 100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    /// Satura em `i64::MAX`: página absurda vira página vazia, nunca overflow.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn describe(&self, total: i64) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
            total,
            pages: (total + self.limit - 1) / self.limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq, ToSchema)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

/// Texto livre de busca -> padrão `ILIKE` com os curingas escapados.
pub fn contains_pattern(search: &str) -> String {
    format!("%{}%", escape_like(search))
}

pub fn prefix_pattern(search: &str) -> String {
    format!("{}%", escape_like(search))
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Normaliza um filtro opcional vindo da query string (`?search=` vazio conta como ausente).
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 10, 0)]
    #[case(1, 10, 1)]
    #[case(10, 10, 1)]
    #[case(11, 10, 2)]
    #[case(25, 7, 4)]
    fn pages_is_ceil_of_total_over_limit(#[case] total: i64, #[case] limit: i64, #[case] pages: i64) {
        let request = PageRequest::new(Some(1), Some(limit));
        assert_eq!(request.describe(total).pages, pages);
    }

    #[test]
    fn page_and_limit_are_clamped() {
        let request = PageRequest::new(Some(0), Some(0));
        assert_eq!(request, PageRequest { page: 1, limit: 1 });

        let request = PageRequest::new(Some(-3), Some(5_000));
        assert_eq!(request, PageRequest { page: 1, limit: 100 });

        assert_eq!(PageRequest::default(), PageRequest { page: 1, limit: 10 });
    }

    #[test]
    fn offset_skips_previous_pages() {
        assert_eq!(PageRequest::new(Some(3), Some(20)).offset(), 40);
        assert_eq!(PageRequest::new(Some(i64::MAX), Some(100)).offset(), i64::MAX);
    }

    #[test]
    fn like_patterns_escape_wildcards() {
        assert_eq!(contains_pattern("AR-01"), "%AR-01%");
        assert_eq!(contains_pattern("50%_x"), "%50\\%\\_x%");
        assert_eq!(prefix_pattern("ab"), "ab%");
    }

    #[test]
    fn blank_filters_are_dropped() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some(" vaca ".into())), Some("vaca".into()));
        assert_eq!(non_empty(None), None);
    }
}
