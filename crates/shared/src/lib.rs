// Data model, formatting and view-model derivations for the market-data
// front-end. Nothing in this crate touches the network.

pub mod details;
pub mod exchanges;
pub mod format;
pub mod logging;
pub mod milestones;
pub mod rankings;
pub mod trades;
pub mod types;

pub use format::{format_currency, format_supply, time_ago, PLACEHOLDER};
pub use logging::init_logging;
pub use rankings::{top_movers, TopMovers};
pub use types::{
    CoinDetails, ExchangeTicker, LiveQuote, MarketListItem, OhlcData, OhlcPoint, PoolData, SearchCoin, Trade,
    TradeSide, TrendingCoin,
};
