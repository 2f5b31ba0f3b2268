use rand::Rng;
use serde::Serialize;

use crate::format::{format_currency, time_ago};
use crate::types::{Trade, TradeSide};

pub const TRADE_COUNT: usize = 10;
/// Full width of the price band around the current price (±0.25%).
pub const PRICE_BAND: f64 = 0.005;
pub const MAX_TRADE_AMOUNT: f64 = 2.0;
pub const TRADE_SPACING_MS: i64 = 60_000;

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Simulated recent trades around `current_price`, newest first, one
/// minute apart counting back from `now_ms`.
pub fn generate_mock_trades<R: Rng + ?Sized>(rng: &mut R, current_price: f64, now_ms: i64) -> Vec<Trade> {
    (0..TRADE_COUNT)
        .map(|i| {
            let price = current_price + (rng.gen::<f64>() - 0.5) * (current_price * PRICE_BAND);
            let amount = round4(rng.gen::<f64>() * MAX_TRADE_AMOUNT);
            let side = if rng.gen_bool(0.5) { TradeSide::Buy } else { TradeSide::Sell };
            Trade {
                price,
                amount,
                value: price * amount,
                side,
                timestamp: now_ms - i as i64 * TRADE_SPACING_MS,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeRow {
    pub price: String,
    pub amount: String,
    pub value: String,
    pub side: &'static str,
    pub buy: bool,
    pub time: String,
}

pub fn trade_rows(trades: &[Trade], now_ms: i64) -> Vec<TradeRow> {
    trades
        .iter()
        .map(|trade| TradeRow {
            price: format_currency(trade.price),
            amount: format!("{:.4}", trade.amount),
            value: format_currency(trade.value),
            side: match trade.side {
                TradeSide::Buy => "Buy",
                TradeSide::Sell => "Sell",
            },
            buy: trade.side == TradeSide::Buy,
            time: time_ago(trade.timestamp, now_ms),
        })
        .collect()
}
