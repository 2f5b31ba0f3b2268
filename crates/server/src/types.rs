use serde::Deserialize;
use std::sync::Arc;

use crate::client::CoinGeckoClient;
use crate::live::LiveFeeds;
use crate::render::Templates;

pub struct AppState {
    /// Authenticated client for detail, OHLC, onchain and search endpoints.
    pub client: CoinGeckoClient,
    /// Keyless client for the public market list.
    pub public: CoinGeckoClient,
    pub live: Arc<LiveFeeds>,
    pub templates: Templates,
}

impl AppState {
    pub fn revalidate_seconds(&self) -> u32 {
        self.client.revalidate_seconds().min(u32::MAX as u64) as u32
    }
}

#[derive(Debug, Deserialize)]
pub struct CoinPageQuery {
    pub amount: Option<String>,
}

impl CoinPageQuery {
    /// Converter amount; anything unparseable, negative or non-finite is 1.
    pub fn amount(&self) -> f64 {
        self.amount
            .as_deref()
            .and_then(|a| a.trim().parse::<f64>().ok())
            .filter(|a| a.is_finite() && *a >= 0.0)
            .unwrap_or(1.0)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct OhlcQuery {
    pub period: Option<String>,
}
