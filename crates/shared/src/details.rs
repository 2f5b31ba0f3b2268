use serde::Serialize;

use crate::format::{format_currency, format_currency_opt, format_number, format_supply, PLACEHOLDER};
use crate::types::{CoinDetails, PriceMap};

/// Currencies offered by the converter, in display order.
pub const CONVERTER_CURRENCIES: &[&str] = &["usd", "eur", "gbp", "jpy", "idr", "btc", "eth"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub label: &'static str,
    pub value: String,
    pub link: Option<String>,
    pub link_text: Option<&'static str>,
}

impl DetailRow {
    fn value(label: &'static str, value: String) -> Self {
        DetailRow { label, value, link: None, link_text: None }
    }

    fn link(label: &'static str, link: Option<&str>, link_text: &'static str) -> Self {
        let link = link.map(str::trim).filter(|l| !l.is_empty()).map(str::to_string);
        DetailRow { label, value: PLACEHOLDER.to_string(), link, link_text: Some(link_text) }
    }
}

/// The fixed, ordered facts shown next to a coin.
pub fn detail_rows(coin: &CoinDetails) -> Vec<DetailRow> {
    let md = &coin.market_data;
    let fdv = md.fully_diluted_valuation.usd().filter(|v| *v != 0.0);

    vec![
        DetailRow::value("Market Cap", format_currency_opt(md.market_cap.usd())),
        DetailRow::value("Fully Diluted Valuation", format_currency_opt(fdv)),
        DetailRow::value(
            "Market Cap Rank",
            coin.market_cap_rank.map_or_else(|| PLACEHOLDER.to_string(), |r| format!("# {}", r)),
        ),
        DetailRow::value("Total Volume", format_currency_opt(md.total_volume.usd())),
        DetailRow::value("Circulating Supply", format_supply(md.circulating_supply, &coin.symbol)),
        DetailRow::value("Total Supply", format_supply(md.total_supply, &coin.symbol)),
        DetailRow::value("Max Supply", format_supply(md.max_supply, &coin.symbol)),
        DetailRow::link("Website", coin.links.homepage.first().map(String::as_str), "Homepage"),
        DetailRow::link("Explorer", coin.links.blockchain_site.first().map(String::as_str), "Explorer"),
        DetailRow::link("Community", coin.links.subreddit_url.as_deref(), "Community"),
    ]
}

/// Network slug from a GeckoTerminal URL such as
/// `https://www.geckoterminal.com/eth/pools/0xabc`: the fourth `/`-separated
/// segment.
pub fn network_from_terminal_url(url: &str) -> Option<String> {
    url.split('/')
        .nth(3)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

/// (network, contract address) of the coin's own asset platform, each
/// `None` when unknown.
pub fn platform_contract(coin: &CoinDetails) -> (Option<String>, Option<String>) {
    let platform = coin
        .asset_platform_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .and_then(|id| coin.detail_platforms.get(id));

    let Some(platform) = platform else {
        return (None, None);
    };

    let network = platform.geckoterminal_url.as_deref().and_then(network_from_terminal_url);
    let contract = platform
        .contract_address
        .as_deref()
        .filter(|a| !a.is_empty())
        .map(str::to_string);
    (network, contract)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub code: String,
    pub value: String,
}

/// `amount` units of the coin expressed in each converter currency the
/// upstream price list knows about.
pub fn conversions(prices: &PriceMap, amount: f64) -> Vec<Conversion> {
    CONVERTER_CURRENCIES
        .iter()
        .filter_map(|code| prices.get(code).map(|price| (*code, price * amount)))
        .map(|(code, value)| Conversion {
            code: code.to_uppercase(),
            value: if code == "usd" {
                format_currency(value)
            } else {
                format!("{} {}", format_number(value, 6), code.to_uppercase())
            },
        })
        .collect()
}
