/// HTTP route handlers
///
/// Thin translation between query parameters and the scanner; every
/// operation is read-only and recomputed from the upstream snapshot.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::analysis::TradeSignal;
use crate::market::MarketError;
use crate::portfolio::{self, RiskProfile};
use crate::scanner::{ScanFilters, SortKey};

use super::AppState;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub timestamp: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    fn new(data: T) -> Self {
        Self {
            success: true,
            count: None,
            timestamp: Utc::now().to_rfc3339(),
            data,
        }
    }

    fn with_count(data: T, count: usize) -> Self {
        Self {
            count: Some(count),
            ..Self::new(data)
        }
    }
}

pub struct ApiError(MarketError);

impl From<MarketError> for ApiError {
    fn from(error: MarketError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MarketError::CoinNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!(error = %self.0, "Request failed");
        let body = serde_json::json!({
            "success": false,
            "error": self.0.to_string(),
            "message": "Upstream market data is unavailable. Please try again.",
            "timestamp": Utc::now().to_rfc3339(),
        });
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannerQuery {
    pub min_market_cap: Option<f64>,
    pub max_market_cap: Option<f64>,
    pub min_volume: Option<f64>,
    pub min_momentum_score: Option<f64>,
    /// Comma-separated signal names, e.g. "STRONG BUY,BUY"
    pub signals: Option<String>,
    pub sort_by: Option<SortKey>,
    pub limit: Option<usize>,
}

impl ScannerQuery {
    fn into_filters(self, default_limit: usize) -> ScanFilters {
        let signals = self.signals.map(|raw| {
            raw.split(',')
                .filter_map(|s| TradeSignal::from_str(s).ok())
                .collect::<Vec<_>>()
        });

        ScanFilters {
            min_market_cap: self.min_market_cap,
            max_market_cap: self.max_market_cap,
            min_volume: self.min_volume,
            min_momentum_score: self.min_momentum_score,
            signals,
            sort_by: self.sort_by.unwrap_or_default(),
            limit: self.limit.filter(|l| *l > 0).unwrap_or(default_limit),
        }
    }
}

pub async fn scanner(
    State(state): State<AppState>,
    Query(query): Query<ScannerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filters = query.into_filters(state.default_limit);
    let results = state.scanner.scan_market(&filters).await?;
    let count = results.len();
    Ok(Json(ApiResponse::with_count(results, count)))
}

pub async fn coin_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = state.scanner.detailed_analysis(&id).await?;
    Ok(Json(ApiResponse::new(result)))
}

#[derive(Debug, Default, Deserialize)]
pub struct PortfolioQuery {
    pub initial: Option<f64>,
    pub target: Option<f64>,
    pub risk: Option<String>,
}

pub async fn portfolio_simulate(
    State(state): State<AppState>,
    Query(query): Query<PortfolioQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let initial = query.initial.filter(|v| *v > 0.0).unwrap_or(100.0);
    let target = query.target.filter(|v| *v > 0.0).unwrap_or(1000.0);
    let profile = query
        .risk
        .as_deref()
        .and_then(|r| RiskProfile::from_str(r).ok())
        .unwrap_or_default();

    let result = portfolio::simulate(&state.scanner, initial, target, profile).await?;
    Ok(Json(ApiResponse::new(result)))
}

pub async fn trending(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let trending = state.scanner.client().get_trending().await?;
    Ok(Json(ApiResponse::new(trending)))
}

pub async fn global(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let global = state.scanner.client().get_global().await?;
    Ok(Json(ApiResponse::new(global)))
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    pub days: Option<u32>,
}

pub async fn chart(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ChartQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let days = query.days.filter(|d| *d > 0).unwrap_or(30);
    let chart = state.scanner.client().get_market_chart(&id, days).await?;
    Ok(Json(ApiResponse::new(chart)))
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "running",
        "timestamp": Utc::now().to_rfc3339(),
        "service": "Lynx Momentum Scanner API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let cache = state.scanner.client().cache_stats();
    Json(serde_json::json!({
        "success": true,
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "cache": cache,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_parses_signal_list() {
        let query = ScannerQuery {
            signals: Some("STRONG BUY,BUY,garbage".to_string()),
            ..ScannerQuery::default()
        };
        let filters = query.into_filters(50);
        let signals = filters.signals.unwrap();
        assert_eq!(signals, vec![TradeSignal::StrongBuy, TradeSignal::Buy]);
    }

    #[test]
    fn query_defaults_limit_and_sort() {
        let filters = ScannerQuery::default().into_filters(50);
        assert_eq!(filters.limit, 50);
        assert_eq!(filters.sort_by, SortKey::Momentum);

        let query = ScannerQuery {
            limit: Some(0),
            ..ScannerQuery::default()
        };
        assert_eq!(query.into_filters(50).limit, 50);
    }
}
