//! NSE `/api/quote-equity` response models.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NseQuoteResponse {
    pub metadata: Option<NseMetadata>,
    pub price_info: Option<NsePriceInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NseMetadata {
    /// e.g. "16-Oct-2024 15:30:00", exchange local time (IST)
    pub last_update_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NsePriceInfo {
    pub last_price: Option<f64>,
    pub previous_close: Option<f64>,
}
