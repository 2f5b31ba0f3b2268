use serde::Serialize;

use crate::format::{format_currency, time_ago_str, PLACEHOLDER};
use crate::types::{ExchangeTicker, TrustScore};

/// Only the first tickers of a coin are listed.
pub const MAX_EXCHANGES: usize = 10;

const TIGHT_SPREAD: f64 = 0.05;
const MODERATE_SPREAD: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SpreadBand {
    Tight,
    Moderate,
    Wide,
}

impl SpreadBand {
    pub fn classify(spread: f64) -> Self {
        if spread < TIGHT_SPREAD {
            SpreadBand::Tight
        } else if spread < MODERATE_SPREAD {
            SpreadBand::Moderate
        } else {
            SpreadBand::Wide
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrustBadge {
    pub label: &'static str,
    pub class: &'static str,
}

impl TrustBadge {
    pub fn from_score(score: Option<TrustScore>) -> Self {
        match score {
            Some(TrustScore::Green) => TrustBadge { label: "High", class: "trust-high" },
            Some(TrustScore::Yellow) => TrustBadge { label: "Medium", class: "trust-medium" },
            Some(TrustScore::Red) => TrustBadge { label: "Low", class: "trust-low" },
            Some(TrustScore::Unknown) | None => TrustBadge { label: PLACEHOLDER, class: "trust-unknown" },
        }
    }
}

/// "Anomaly" and "Stale" tags, or none when the ticker is healthy.
pub fn status_tags(ticker: &ExchangeTicker) -> Vec<&'static str> {
    let mut tags = Vec::new();
    if ticker.is_anomaly {
        tags.push("Anomaly");
    }
    if ticker.is_stale {
        tags.push("Stale");
    }
    tags
}

fn ticker_volume(ticker: &ExchangeTicker) -> f64 {
    ticker.converted_volume.usd().unwrap_or(0.0)
}

/// Each ticker's share of the summed USD volume, in percent. All zero when
/// nothing traded.
pub fn volume_shares(tickers: &[ExchangeTicker]) -> Vec<f64> {
    let total: f64 = tickers.iter().map(ticker_volume).sum();
    tickers
        .iter()
        .map(|t| if total > 0.0 { ticker_volume(t) * 100.0 / total } else { 0.0 })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ExchangeRow {
    pub rank: usize,
    pub exchange: String,
    pub identifier: String,
    pub logo: Option<String>,
    pub pair: String,
    pub price: String,
    pub volume: String,
    pub volume_share: String,
    pub spread: String,
    pub spread_band: Option<SpreadBand>,
    pub last_trade: String,
    pub trust: TrustBadge,
    pub status: Vec<&'static str>,
    pub ok: bool,
}

pub fn exchange_rows(tickers: &[ExchangeTicker], now_ms: i64) -> Vec<ExchangeRow> {
    let listed = &tickers[..tickers.len().min(MAX_EXCHANGES)];
    let shares = volume_shares(listed);

    listed
        .iter()
        .zip(shares)
        .enumerate()
        .map(|(index, (ticker, share))| {
            let spread = ticker.bid_ask_spread_percentage.filter(|s| s.is_finite());
            let status = status_tags(ticker);
            ExchangeRow {
                rank: index + 1,
                exchange: ticker.market.name.clone(),
                identifier: ticker.market.identifier.clone(),
                logo: ticker.market.logo.clone().filter(|l| !l.is_empty()),
                pair: format!("{}/{}", ticker.base, ticker.target),
                price: format_currency(ticker.converted_last.usd().or(ticker.last).unwrap_or(0.0)),
                volume: format_currency(ticker_volume(ticker)),
                volume_share: format!("{:.1}%", share),
                spread: spread.map_or_else(|| PLACEHOLDER.to_string(), |s| format!("{:.3}%", s)),
                spread_band: spread.map(SpreadBand::classify),
                last_trade: time_ago_str(ticker.last_traded_at.as_deref(), now_ms),
                trust: TrustBadge::from_score(ticker.trust_score),
                ok: status.is_empty(),
                status,
            }
        })
        .collect()
}
