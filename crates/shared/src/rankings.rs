use serde::Serialize;

use crate::format::{format_change, format_currency_opt};
use crate::types::MarketListItem;

pub const TOP_MOVERS_LIMIT: usize = 5;

/// Gainers and losers derived from one market snapshot.
#[derive(Debug, Clone, Default)]
pub struct TopMovers {
    pub gainers: Vec<MarketListItem>,
    pub losers: Vec<MarketListItem>,
}

/// Ranks coins by 24h change. Entries without a numeric change take part in
/// neither list. Both lists come from the same slice so they always agree.
pub fn top_movers(coins: &[MarketListItem], limit: usize) -> TopMovers {
    let mut ranked: Vec<(f64, &MarketListItem)> = coins
        .iter()
        .filter_map(|coin| {
            coin.price_change_percentage_24h
                .filter(|change| change.is_finite())
                .map(|change| (change, coin))
        })
        .collect();

    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    let gainers = ranked.iter().take(limit).map(|(_, c)| (*c).clone()).collect();

    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
    let losers = ranked.iter().take(limit).map(|(_, c)| (*c).clone()).collect();

    TopMovers { gainers, losers }
}

#[derive(Debug, Clone, Serialize)]
pub struct MoverRow {
    pub rank: usize,
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub image: String,
    pub price: String,
    pub change: String,
    pub positive: bool,
    pub href: String,
}

pub fn mover_rows(coins: &[MarketListItem]) -> Vec<MoverRow> {
    coins
        .iter()
        .enumerate()
        .map(|(index, coin)| MoverRow {
            rank: index + 1,
            id: coin.id.clone(),
            symbol: coin.symbol.to_uppercase(),
            name: coin.name.clone(),
            image: coin.image.clone(),
            price: format_currency_opt(coin.current_price),
            change: format_change(coin.price_change_percentage_24h),
            positive: coin.price_change_percentage_24h.map_or(false, |c| c > 0.0),
            href: format!("/coins/{}", coin.id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(id: &str, change: Option<f64>) -> MarketListItem {
        MarketListItem {
            id: id.to_string(),
            symbol: id.to_string(),
            name: id.to_uppercase(),
            current_price: Some(1.0),
            price_change_percentage_24h: change,
            ..Default::default()
        }
    }

    fn changes(items: &[MarketListItem]) -> Vec<f64> {
        items.iter().filter_map(|c| c.price_change_percentage_24h).collect()
    }

    #[test]
    fn test_gainers_descending_losers_ascending() {
        let coins: Vec<MarketListItem> = [3.0, -7.5, 12.0, 0.5, -1.0, 8.25, -20.0, 4.0]
            .iter()
            .enumerate()
            .map(|(i, c)| coin(&format!("c{}", i), Some(*c)))
            .collect();

        let movers = top_movers(&coins, TOP_MOVERS_LIMIT);

        assert_eq!(changes(&movers.gainers), vec![12.0, 8.25, 4.0, 3.0, 0.5]);
        assert_eq!(changes(&movers.losers), vec![-20.0, -7.5, -1.0, 0.5, 3.0]);
        assert!(changes(&movers.gainers).windows(2).all(|w| w[0] > w[1]));
        assert!(changes(&movers.losers).windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_missing_change_is_excluded() {
        let coins = vec![
            coin("a", Some(1.0)),
            coin("b", None),
            coin("c", Some(-2.0)),
            coin("d", Some(f64::NAN)),
            coin("e", Some(5.0)),
            coin("f", Some(3.0)),
            coin("g", Some(-4.0)),
        ];

        let movers = top_movers(&coins, TOP_MOVERS_LIMIT);

        assert_eq!(movers.gainers.len(), 5);
        assert_eq!(movers.losers.len(), 5);
        assert!(movers.gainers.iter().all(|c| c.id != "b" && c.id != "d"));
        assert!(movers.losers.iter().all(|c| c.id != "b" && c.id != "d"));
    }

    #[test]
    fn test_length_is_bounded_by_valid_entries() {
        let coins = vec![coin("a", Some(1.0)), coin("b", None), coin("c", Some(-2.0))];
        let movers = top_movers(&coins, TOP_MOVERS_LIMIT);
        assert_eq!(movers.gainers.len(), 2);
        assert_eq!(movers.losers.len(), 2);

        let empty = top_movers(&[], TOP_MOVERS_LIMIT);
        assert!(empty.gainers.is_empty());
        assert!(empty.losers.is_empty());
    }

    #[test]
    fn test_mover_rows() {
        let rows = mover_rows(&[coin("solana", Some(6.789)), coin("tron", Some(-0.5))]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[0].symbol, "SOLANA");
        assert_eq!(rows[0].change, "+6.79%");
        assert!(rows[0].positive);
        assert_eq!(rows[0].href, "/coins/solana");
        assert_eq!(rows[1].change, "-0.50%");
        assert!(!rows[1].positive);
        assert_eq!(rows[1].price, "$1.00");
    }
}
