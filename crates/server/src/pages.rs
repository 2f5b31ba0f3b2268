// View models for the HTML pages. Fetching happens in the `compose_*`
// functions; everything in `build_*` is pure so it can be tested without a
// network.

use chrono::{TimeZone, Utc};
use log::{error, warn};
use serde::Serialize;
use shared::details::{conversions, detail_rows, platform_contract, Conversion, DetailRow};
use shared::exchanges::{exchange_rows, ExchangeRow};
use shared::format::{format_change, format_currency, format_currency_opt, format_number, time_ago};
use shared::milestones::{milestones, Milestone};
use shared::rankings::{mover_rows, MoverRow, TOP_MOVERS_LIMIT};
use shared::trades::{generate_mock_trades, trade_rows, TradeRow};
use shared::{top_movers, CoinDetails, MarketListItem, OhlcPoint, PoolData, Trade, TrendingCoin};
use std::time::Duration;

use crate::data::{
    fetch_coin_details, fetch_markets, fetch_ohlc, fetch_top_coin, get_pools, get_trending, ChartPeriod,
    MARKET_LIST_SIZE, RANKINGS_SIZE,
};
use crate::error::ApiError;
use crate::live::LiveSnapshot;
use crate::types::AppState;

/// How long a page waits for the first poll of a new live feed.
pub const LIVE_WAIT: Duration = Duration::from_millis(1500);
/// Candles listed in the trend table, newest first.
pub const TREND_ROWS: usize = 12;

const CHART_PERIODS: [ChartPeriod; 7] = [
    ChartPeriod::Daily,
    ChartPeriod::Weekly,
    ChartPeriod::Monthly,
    ChartPeriod::ThreeMonths,
    ChartPeriod::SixMonths,
    ChartPeriod::Yearly,
    ChartPeriod::Max,
];

#[derive(Debug, Clone, Serialize)]
pub struct CoinHeader {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub image: String,
    pub rank: Option<u32>,
    pub price: String,
    pub change: String,
    pub positive: bool,
    pub live: bool,
}

impl CoinHeader {
    /// Live quote when there is one, otherwise the detail snapshot.
    pub fn new(coin: &CoinDetails, live: Option<&LiveSnapshot>) -> Self {
        let md = &coin.market_data;
        let detail_change = md
            .price_change_percentage_24h_in_currency
            .usd()
            .or(md.price_change_percentage_24h.filter(|c| c.is_finite()));

        let (price, change) = match live {
            Some(snapshot) => (Some(snapshot.quote.price_usd), snapshot.quote.change_24h.or(detail_change)),
            None => (md.current_price.usd(), detail_change),
        };

        let image = if coin.image.large.is_empty() { &coin.image.small } else { &coin.image.large };

        CoinHeader {
            id: coin.id.clone(),
            name: coin.name.clone(),
            symbol: coin.symbol.to_uppercase(),
            image: image.clone(),
            rank: coin.market_cap_rank,
            price: format_currency_opt(price),
            change: format_change(change),
            positive: change.map_or(true, |c| c >= 0.0),
            live: live.is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub open: String,
    pub close: String,
    pub high: String,
    pub low: String,
    pub change: String,
    pub positive: bool,
    pub candles: usize,
}

pub fn trend_summary(ohlc: &[OhlcPoint]) -> Option<TrendSummary> {
    let first = ohlc.first()?;
    let last = ohlc.last()?;
    let high = ohlc.iter().map(|p| p.high).fold(f64::NEG_INFINITY, f64::max);
    let low = ohlc.iter().map(|p| p.low).fold(f64::INFINITY, f64::min);
    let change = if first.open != 0.0 { Some((last.close - first.open) / first.open * 100.0) } else { None };

    Some(TrendSummary {
        open: format_currency(first.open),
        close: format_currency(last.close),
        high: format_currency(high),
        low: format_currency(low),
        change: format_change(change),
        positive: last.close >= first.open,
        candles: ohlc.len(),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct CandleRow {
    pub time: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub up: bool,
}

fn candle_time(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|t| t.format("%d %b %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn candle_rows(ohlc: &[OhlcPoint], limit: usize) -> Vec<CandleRow> {
    ohlc.iter()
        .rev()
        .take(limit)
        .map(|p| CandleRow {
            time: candle_time(p.timestamp),
            open: format_currency(p.open),
            high: format_currency(p.high),
            low: format_currency(p.low),
            close: format_currency(p.close),
            up: p.close >= p.open,
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodLink {
    pub name: String,
    pub href: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoinPage {
    pub title: String,
    pub header: CoinHeader,
    pub details: Vec<DetailRow>,
    pub milestones: Vec<Milestone>,
    pub amount: String,
    pub conversions: Vec<Conversion>,
    pub trend: Option<TrendSummary>,
    pub candles: Vec<CandleRow>,
    pub periods: Vec<PeriodLink>,
    pub exchanges: Vec<ExchangeRow>,
    pub trades: Vec<TradeRow>,
    pub trades_updated: Option<String>,
    pub gainers: Vec<MoverRow>,
    pub losers: Vec<MoverRow>,
    pub pool: Option<PoolData>,
}

/// Everything the coin page needs from the authenticated API.
#[derive(Debug, Clone)]
pub struct CoinSources {
    pub details: CoinDetails,
    pub ohlc: Vec<OhlcPoint>,
    pub markets: Vec<MarketListItem>,
}

pub async fn fetch_coin_sources(state: &AppState, id: &str) -> Result<CoinSources, ApiError> {
    let (details, ohlc, markets) = tokio::try_join!(
        fetch_coin_details(&state.client, id),
        fetch_ohlc(&state.client, id, ChartPeriod::Daily),
        fetch_markets(&state.client, MARKET_LIST_SIZE),
    )?;
    Ok(CoinSources { details, ohlc, markets })
}

pub fn build_coin_page(
    sources: &CoinSources,
    pool: Option<PoolData>,
    live: Option<&LiveSnapshot>,
    trades: &[Trade],
    amount: f64,
    now_ms: i64,
) -> CoinPage {
    let coin = &sources.details;
    let movers = top_movers(&sources.markets, TOP_MOVERS_LIMIT);

    CoinPage {
        title: format!("{} ({})", coin.name, coin.symbol.to_uppercase()),
        header: CoinHeader::new(coin, live),
        details: detail_rows(coin),
        milestones: milestones(&coin.market_data),
        amount: format_number(amount, 8).replace(',', ""),
        conversions: conversions(&coin.market_data.current_price, amount),
        trend: trend_summary(&sources.ohlc),
        candles: candle_rows(&sources.ohlc, TREND_ROWS),
        periods: CHART_PERIODS
            .iter()
            .map(|p| PeriodLink { name: p.to_string(), href: format!("/api/coins/{}/ohlc?period={}", coin.id, p) })
            .collect(),
        exchanges: exchange_rows(&coin.tickers, now_ms),
        trades: trade_rows(trades, now_ms),
        trades_updated: live.map(|s| time_ago(s.updated_at, now_ms)),
        gainers: mover_rows(&movers.gainers),
        losers: mover_rows(&movers.losers),
        pool,
    }
}

pub async fn compose_coin_page(state: &AppState, id: &str, amount: f64) -> Result<CoinPage, ApiError> {
    let sources = fetch_coin_sources(state, id).await?;
    let (network, contract) = platform_contract(&sources.details);

    let (pool, live) = tokio::join!(
        get_pools(&state.client, id, network.as_deref(), contract.as_deref()),
        state.live.snapshot(id, LIVE_WAIT),
    );

    let now_ms = Utc::now().timestamp_millis();
    let trades = match &live {
        Some(snapshot) => snapshot.trades.clone(),
        None => match sources.details.market_data.current_price.usd() {
            Some(price) => generate_mock_trades(&mut rand::thread_rng(), price, now_ms),
            None => Vec::new(),
        },
    };

    Ok(build_coin_page(&sources, pool, live.as_ref(), &trades, amount, now_ms))
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewCard {
    pub header: CoinHeader,
    pub details: Vec<DetailRow>,
    pub trend: Option<TrendSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendingRow {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub thumb: String,
    pub rank: Option<u32>,
    pub price: String,
    pub change: String,
    pub positive: bool,
    pub href: String,
}

pub fn trending_rows(coins: &[TrendingCoin]) -> Vec<TrendingRow> {
    coins
        .iter()
        .map(|coin| {
            let item = &coin.item;
            let change = item.data.price_change_percentage_24h.usd();
            TrendingRow {
                id: item.id.clone(),
                name: item.name.clone(),
                symbol: item.symbol.to_uppercase(),
                thumb: item.thumb.clone(),
                rank: item.market_cap_rank,
                price: item
                    .data
                    .price
                    .filter(|p| p.is_finite())
                    .map(|p| if p < 1.0 { format!("${}", format_number(p, 8)) } else { format_currency(p) })
                    .unwrap_or_else(|| "-".to_string()),
                change: format_change(change),
                positive: change.map_or(true, |c| c >= 0.0),
                href: format!("/coins/{}", item.id),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct HomePage {
    pub title: String,
    pub overview: Option<OverviewCard>,
    pub trending: Vec<TrendingRow>,
    pub rankings_available: bool,
    pub gainers: Vec<MoverRow>,
    pub losers: Vec<MoverRow>,
}

async fn load_overview(state: &AppState) -> Result<Option<OverviewCard>, ApiError> {
    let top = match fetch_top_coin(&state.client).await? {
        Some(top) => top,
        None => return Ok(None),
    };

    let (details, ohlc) = tokio::try_join!(
        fetch_coin_details(&state.client, &top.id),
        fetch_ohlc(&state.client, &top.id, ChartPeriod::Daily),
    )?;

    Ok(Some(OverviewCard {
        header: CoinHeader::new(&details, None),
        details: detail_rows(&details),
        trend: trend_summary(&ohlc),
    }))
}

pub fn build_home_page(
    overview: Option<OverviewCard>,
    trending: &[TrendingCoin],
    rankings: Option<&[MarketListItem]>,
) -> HomePage {
    let movers = rankings.map(|coins| top_movers(coins, TOP_MOVERS_LIMIT)).unwrap_or_default();

    HomePage {
        title: "Cryptocurrency Prices".to_string(),
        overview,
        trending: trending_rows(trending),
        rankings_available: rankings.is_some(),
        gainers: mover_rows(&movers.gainers),
        losers: mover_rows(&movers.losers),
    }
}

/// Each section degrades on its own: a failed fetch hides that section,
/// never the page.
pub async fn compose_home_page(state: &AppState) -> HomePage {
    let (overview, trending, rankings) = tokio::join!(
        load_overview(state),
        get_trending(&state.client),
        fetch_markets(&state.public, RANKINGS_SIZE),
    );

    let overview = overview.unwrap_or_else(|e| {
        warn!("Market overview unavailable: {}", e);
        None
    });
    let rankings = match rankings {
        Ok(coins) => Some(coins),
        Err(e) => {
            error!("Error fetching rankings: {}", e);
            None
        }
    };

    build_home_page(overview, &trending, rankings.as_deref())
}
