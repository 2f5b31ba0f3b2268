use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};

// Upstream payloads as returned by the market-data API. Every field the
// provider is known to omit or null out is optional or defaulted.

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Per-currency values keyed by lower-case currency code (`usd`, `eur`, `btc`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceMap(pub BTreeMap<String, Option<f64>>);

impl PriceMap {
    pub fn get(&self, code: &str) -> Option<f64> {
        self.0.get(code).copied().flatten().filter(|v| v.is_finite())
    }

    pub fn usd(&self) -> Option<f64> {
        self.get("usd")
    }

    pub fn with_usd(value: f64) -> Self {
        let mut map = BTreeMap::new();
        map.insert("usd".to_string(), Some(value));
        PriceMap(map)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoinImage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub thumb: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub small: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub large: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailPlatform {
    #[serde(default)]
    pub decimal_place: Option<u32>,
    #[serde(default)]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub geckoterminal_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoinLinks {
    #[serde(default, deserialize_with = "null_as_default")]
    pub homepage: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blockchain_site: Vec<String>,
    #[serde(default)]
    pub subreddit_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub current_price: PriceMap,
    #[serde(default, deserialize_with = "null_as_default")]
    pub market_cap: PriceMap,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fully_diluted_valuation: PriceMap,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_volume: PriceMap,
    #[serde(default)]
    pub circulating_supply: Option<f64>,
    #[serde(default)]
    pub total_supply: Option<f64>,
    #[serde(default)]
    pub max_supply: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ath: PriceMap,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ath_change_percentage: PriceMap,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ath_date: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub atl: PriceMap,
    #[serde(default, deserialize_with = "null_as_default")]
    pub atl_change_percentage: PriceMap,
    #[serde(default, deserialize_with = "null_as_default")]
    pub atl_date: BTreeMap<String, String>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_change_24h_in_currency: PriceMap,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_change_percentage_24h_in_currency: PriceMap,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_change_percentage_30d_in_currency: PriceMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinDetails {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: CoinImage,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub asset_platform_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub detail_platforms: HashMap<String, DetailPlatform>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub market_data: MarketData,
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: CoinLinks,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tickers: Vec<ExchangeTicker>,
}

/// One candle. Upstream encodes it as `[timestamp_ms, open, high, low, close]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(i64, f64, f64, f64, f64)", into = "(i64, f64, f64, f64, f64)")]
pub struct OhlcPoint {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl From<(i64, f64, f64, f64, f64)> for OhlcPoint {
    fn from((timestamp, open, high, low, close): (i64, f64, f64, f64, f64)) -> Self {
        OhlcPoint { timestamp, open, high, low, close }
    }
}

impl From<OhlcPoint> for (i64, f64, f64, f64, f64) {
    fn from(p: OhlcPoint) -> Self {
        (p.timestamp, p.open, p.high, p.low, p.close)
    }
}

pub type OhlcData = Vec<OhlcPoint>;

/// Flattened row of the `/coins/markets` list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketListItem {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolData {
    pub id: String,
    pub address: String,
    pub name: String,
    pub network: String,
}

impl PoolData {
    /// Upstream pool entries can arrive with every field missing.
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.address.is_empty() && self.name.is_empty() && self.network.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoolAttributes {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// A pool entry as found in either onchain endpoint. Older responses carry
/// the fields flat, JSON:API responses nest them under `attributes`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoolRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub attributes: Option<PoolAttributes>,
}

impl From<PoolRecord> for PoolData {
    fn from(record: PoolRecord) -> Self {
        let attributes = record.attributes.unwrap_or_default();
        // JSON:API ids look like "<network>_<address>"
        let network = record
            .network
            .or_else(|| record.id.split_once('_').map(|(n, _)| n.to_string()))
            .unwrap_or_default();
        PoolData {
            address: record.address.or(attributes.address).unwrap_or_default(),
            name: record.name.or(attributes.name).unwrap_or_default(),
            id: record.id,
            network,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoolResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<PoolRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchCoinData {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchCoin {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub thumb: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub large: String,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub data: Option<SearchCoinData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub coins: Vec<SearchCoin>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendingItemData {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price_change_percentage_24h: PriceMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingItem {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub thumb: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub large: String,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: TrendingItemData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingCoin {
    pub item: TrendingItem,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendingResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub coins: Vec<TrendingCoin>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustScore {
    Green,
    Yellow,
    Red,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickerMarket {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExchangeTicker {
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub last: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub converted_last: PriceMap,
    #[serde(default, deserialize_with = "null_as_default")]
    pub converted_volume: PriceMap,
    #[serde(default, deserialize_with = "null_as_default")]
    pub market: TickerMarket,
    #[serde(default)]
    pub trust_score: Option<TrustScore>,
    #[serde(default)]
    pub bid_ask_spread_percentage: Option<f64>,
    #[serde(default)]
    pub last_traded_at: Option<String>,
    #[serde(default)]
    pub is_anomaly: bool,
    #[serde(default)]
    pub is_stale: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Simulated trade. There is no real trade feed behind these rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub price: f64,
    pub amount: f64,
    pub value: f64,
    pub side: TradeSide,
    pub timestamp: i64,
}

/// Current price and 24h change of a single coin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveQuote {
    pub price_usd: f64,
    pub change_24h: Option<f64>,
}
