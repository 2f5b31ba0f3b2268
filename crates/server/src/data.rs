use log::{error, info, warn};
use shared::types::{PoolResponse, SearchResponse, TrendingResponse};
use shared::{CoinDetails, LiveQuote, MarketListItem, OhlcData, PoolData, SearchCoin, TrendingCoin};
use std::fmt;
use std::str::FromStr;

use crate::client::{CoinGeckoClient, Param};
use crate::error::ApiError;

/// Size of the market list used for top movers on the coin page.
pub const MARKET_LIST_SIZE: u32 = 100;
/// Size of the market list used for the home page rankings.
pub const RANKINGS_SIZE: u32 = 50;

/// Chart window accepted by the OHLC endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartPeriod {
    Daily,
    Weekly,
    Monthly,
    ThreeMonths,
    SixMonths,
    Yearly,
    Max,
}

impl ChartPeriod {
    /// Value of the upstream `days` parameter.
    pub fn days(&self) -> &'static str {
        match self {
            ChartPeriod::Daily => "1",
            ChartPeriod::Weekly => "7",
            ChartPeriod::Monthly => "30",
            ChartPeriod::ThreeMonths => "90",
            ChartPeriod::SixMonths => "180",
            ChartPeriod::Yearly => "365",
            ChartPeriod::Max => "max",
        }
    }
}

impl FromStr for ChartPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(ChartPeriod::Daily),
            "weekly" => Ok(ChartPeriod::Weekly),
            "monthly" => Ok(ChartPeriod::Monthly),
            "3months" => Ok(ChartPeriod::ThreeMonths),
            "6months" => Ok(ChartPeriod::SixMonths),
            "yearly" => Ok(ChartPeriod::Yearly),
            "max" => Ok(ChartPeriod::Max),
            other => Err(format!("unknown chart period: {}", other)),
        }
    }
}

impl fmt::Display for ChartPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartPeriod::Daily => "daily",
            ChartPeriod::Weekly => "weekly",
            ChartPeriod::Monthly => "monthly",
            ChartPeriod::ThreeMonths => "3months",
            ChartPeriod::SixMonths => "6months",
            ChartPeriod::Yearly => "yearly",
            ChartPeriod::Max => "max",
        };
        f.write_str(name)
    }
}

/// Coin ids are slugs; anything else never reaches the upstream URL path.
/// Dot segments are rejected so an id cannot climb out of `/coins/{id}`.
pub fn is_valid_coin_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id.starts_with(|c: char| c.is_ascii_alphanumeric())
        && !id.contains("..")
        && id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

pub async fn fetch_coin_details(client: &CoinGeckoClient, id: &str) -> Result<CoinDetails, ApiError> {
    client
        .fetch(&format!("/coins/{}", id), &[("dex_pair_format", "contract_address".into())])
        .await
}

pub async fn fetch_ohlc(client: &CoinGeckoClient, id: &str, period: ChartPeriod) -> Result<OhlcData, ApiError> {
    client
        .fetch(
            &format!("/coins/{}/ohlc", id),
            &[
                ("vs_currency", "usd".into()),
                ("days", period.days().into()),
                ("precision", "full".into()),
            ],
        )
        .await
}

pub async fn fetch_markets(client: &CoinGeckoClient, per_page: u32) -> Result<Vec<MarketListItem>, ApiError> {
    client
        .fetch(
            "/coins/markets",
            &[
                ("vs_currency", "usd".into()),
                ("order", "market_cap_desc".into()),
                ("per_page", per_page.into()),
                ("page", 1u32.into()),
                ("sparkline", false.into()),
                ("price_change_percentage", "24h".into()),
            ],
        )
        .await
}

/// The coin currently ranked first by market cap, if the list is not empty.
pub async fn fetch_top_coin(client: &CoinGeckoClient) -> Result<Option<MarketListItem>, ApiError> {
    let mut coins = fetch_markets(client, 1).await?;
    Ok(if coins.is_empty() { None } else { Some(coins.remove(0)) })
}

/// Price and 24h change of one coin from the markets list. `None` when the
/// upstream does not know the id or has no price for it.
pub async fn fetch_live_quote(client: &CoinGeckoClient, id: &str) -> Result<Option<LiveQuote>, ApiError> {
    let coins: Vec<MarketListItem> = client
        .fetch(
            "/coins/markets",
            &[("vs_currency", "usd".into()), ("ids", id.into())],
        )
        .await?;

    Ok(coins
        .into_iter()
        .find(|c| c.id == id)
        .and_then(|c| {
            c.current_price.filter(|p| p.is_finite()).map(|price_usd| LiveQuote {
                price_usd,
                change_24h: c.price_change_percentage_24h.filter(|v| v.is_finite()),
            })
        }))
}

async fn first_pool(client: &CoinGeckoClient, endpoint: &str, params: &[(&str, Param)]) -> Result<Option<PoolData>, ApiError> {
    let response: PoolResponse = client.fetch(endpoint, params).await?;
    Ok(response.data.into_iter().map(PoolData::from).find(|pool| !pool.is_empty()))
}

/// Top liquidity pool for a coin. Looks up by token contract when both the
/// network and address are known, otherwise searches by coin id. Failures
/// and empty results both come back as `None`.
pub async fn get_pools(
    client: &CoinGeckoClient,
    id: &str,
    network: Option<&str>,
    contract_address: Option<&str>,
) -> Option<PoolData> {
    let result = match (network, contract_address) {
        (Some(network), Some(address)) => {
            first_pool(client, &format!("/onchain/networks/{}/tokens/{}/pools", network, address), &[]).await
        }
        _ => first_pool(client, "/onchain/search/pools", &[("query", id.into())]).await,
    };

    match result {
        Ok(pool) => pool,
        Err(e) => {
            warn!("Pool lookup failed for {}: {}", id, e);
            None
        }
    }
}

pub async fn search_coins(client: &CoinGeckoClient, query: &str) -> Vec<SearchCoin> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    match client.fetch::<SearchResponse>("/search", &[("query", query.into())]).await {
        Ok(response) => {
            info!("Search '{}' matched {} coins", query, response.coins.len());
            response.coins
        }
        Err(e) => {
            error!("Error searching coins: {}", e);
            Vec::new()
        }
    }
}

pub async fn get_trending(client: &CoinGeckoClient) -> Vec<TrendingCoin> {
    match client.fetch::<TrendingResponse>("/search/trending", &[]).await {
        Ok(response) => response.coins,
        Err(e) => {
            error!("Error fetching trending coins: {}", e);
            Vec::new()
        }
    }
}
