// src/services/dashboard_service.rs

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{
    common::error::AppError,
    db::Store,
    models::{
        dashboard::{
            AlertFeedItem, DailyProduction, DashboardStats, ProductionSeries, ProductionSummary, ProductionTotals,
            SearchHit,
        },
        establishment::EstablishmentScope,
    },
};

const STATS_WINDOW_DAYS: i64 = 30;
const STATS_MAX_DAYS: usize = 30;
const ACTIVITY_FEED_SIZE: i64 = 20;
const SEARCH_MIN_CHARS: usize = 2;
const SEARCH_MAX_HITS: i64 = 10;

pub fn alert_limit(requested: Option<i64>) -> i64 {
    requested.unwrap_or(10).clamp(1, 100)
}

pub fn summary_period(requested: Option<i64>) -> i64 {
    requested.unwrap_or(STATS_WINDOW_DAYS).clamp(1, 365)
}

fn window_start(today: NaiveDate, days: i64) -> NaiveDate {
    today - Duration::days(days)
}

/// Totais da janela. A média diária considera só os dias com registro.
pub fn summarize(daily: &[DailyProduction], period: i64) -> ProductionTotals {
    let total_liters: Decimal = daily.iter().map(|d| d.total_liters).sum();
    let total_records: i64 = daily.iter().map(|d| d.total_records).sum();
    let days_with_data = daily.len() as i64;

    let avg_daily_liters = if days_with_data == 0 {
        Decimal::ZERO
    } else {
        (total_liters / Decimal::from(days_with_data))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    };

    ProductionTotals {
        total_liters,
        total_records,
        avg_daily_liters,
        days_with_data,
        period,
    }
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn Store>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn stats(&self, scope: &EstablishmentScope) -> Result<DashboardStats, AppError> {
        let today = Utc::now().date_naive();

        let stats = self.store.establishment_counts(scope.id).await?;

        // O card de produção mostra do dia mais recente para o mais antigo
        let mut daily = self
            .store
            .daily_production(scope.id, window_start(today, STATS_WINDOW_DAYS))
            .await?;
        daily.reverse();
        daily.truncate(STATS_MAX_DAYS);

        let activity = self.store.recent_activity(scope.id, ACTIVITY_FEED_SIZE).await?;
        let rodeos = self.store.rodeo_summaries(scope.id).await?;

        Ok(DashboardStats {
            establishment: scope.clone(),
            stats,
            production: ProductionSeries { daily },
            activity,
            rodeos,
        })
    }

    pub async fn alerts(&self, scope: &EstablishmentScope, limit: Option<i64>) -> Result<Vec<AlertFeedItem>, AppError> {
        let rows = self.store.active_alert_feed(scope.id, alert_limit(limit)).await?;
        Ok(rows.into_iter().map(AlertFeedItem::from).collect())
    }

    pub async fn search(&self, scope: &EstablishmentScope, query: Option<String>) -> Result<Vec<SearchHit>, AppError> {
        let query = query.unwrap_or_default();
        let query = query.trim();
        if query.chars().count() < SEARCH_MIN_CHARS {
            return Ok(Vec::new());
        }

        self.store.search_animals(scope.id, query, SEARCH_MAX_HITS).await
    }

    pub async fn production_summary(
        &self,
        scope: &EstablishmentScope,
        days: Option<i64>,
    ) -> Result<ProductionSummary, AppError> {
        let period = summary_period(days);
        let since = window_start(Utc::now().date_naive(), period);

        let daily = self.store.daily_production(scope.id, since).await?;

        Ok(ProductionSummary {
            summary: summarize(&daily, period),
            daily,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    fn day(date: &str, total: i64, records: i64) -> DailyProduction {
        DailyProduction {
            date: date.parse().unwrap(),
            animals_milked: records,
            avg_liters_per_animal: Decimal::from(total) / Decimal::from(records),
            total_liters: Decimal::from(total),
            avg_quality: Decimal::ZERO,
            total_records: records,
        }
    }

    #[test]
    fn average_uses_only_days_with_data() {
        let daily = vec![day("2025-03-01", 100, 4), day("2025-03-03", 50, 2)];

        let totals = summarize(&daily, 30);

        assert_eq!(totals.total_liters, Decimal::from(150));
        assert_eq!(totals.total_records, 6);
        assert_eq!(totals.days_with_data, 2);
        assert_eq!(totals.avg_daily_liters, Decimal::from(75));
        assert_eq!(totals.period, 30);
    }

    #[test]
    fn empty_window_averages_zero() {
        let totals = summarize(&[], 7);
        assert_eq!(totals.avg_daily_liters, Decimal::ZERO);
        assert_eq!(totals.days_with_data, 0);
    }

    #[rstest]
    #[case(None, 30)]
    #[case(Some(0), 1)]
    #[case(Some(90), 90)]
    #[case(Some(10_000), 365)]
    fn period_is_clamped(#[case] requested: Option<i64>, #[case] expected: i64) {
        assert_eq!(summary_period(requested), expected);
    }

    #[rstest]
    #[case(None, 10)]
    #[case(Some(-5), 1)]
    #[case(Some(500), 100)]
    fn alert_limit_is_clamped(#[case] requested: Option<i64>, #[case] expected: i64) {
        assert_eq!(alert_limit(requested), expected);
    }

    #[test]
    fn window_starts_n_days_back() {
        let today: NaiveDate = "2025-03-31".parse().unwrap();
        assert_eq!(window_start(today, 30), "2025-03-01".parse::<NaiveDate>().unwrap());
    }
}
