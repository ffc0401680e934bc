//! Yahoo Finance chart API response models.
//!
//! Only the `meta` block of `/v8/finance/chart/{symbol}` is used; it carries
//! the last traded price without needing the crumb-protected quote endpoints.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct YahooChartResponse {
    pub chart: YahooChart,
}

#[derive(Debug, Deserialize)]
pub struct YahooChart {
    pub result: Option<Vec<YahooChartResult>>,
    pub error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
pub struct YahooChartResult {
    pub meta: YahooChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooChartMeta {
    pub currency: Option<String>,
    pub symbol: Option<String>,
    pub regular_market_price: Option<f64>,
    pub chart_previous_close: Option<f64>,
    pub previous_close: Option<f64>,
    /// Unix seconds
    pub regular_market_time: Option<i64>,
}

/// Error block, e.g. `{"code": "Not Found", "description": "No data found, symbol may be delisted"}`
#[derive(Debug, Deserialize)]
pub struct YahooChartError {
    pub code: String,
    pub description: Option<String>,
}
