// Throwaway upstream API for tests: a real actix server on an ephemeral port
// answering the handful of endpoints the client and pages call.

use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::client::CoinGeckoClient;
use crate::live::LiveFeeds;
use crate::render::Templates;
use crate::types::AppState;

pub fn bitcoin_details() -> Value {
    json!({
        "id": "bitcoin",
        "symbol": "btc",
        "name": "Bitcoin",
        "image": {
            "thumb": "https://img.example/bitcoin/thumb.png",
            "small": "https://img.example/bitcoin/small.png",
            "large": "https://img.example/bitcoin/large.png"
        },
        "market_cap_rank": 1,
        "asset_platform_id": null,
        "detail_platforms": {"": {"decimal_place": null, "contract_address": ""}},
        "market_data": {
            "current_price": {"usd": 65000.0, "eur": 60000.0, "btc": 1.0},
            "market_cap": {"usd": 950000000000.0},
            "fully_diluted_valuation": {"usd": 1365000000000.0},
            "total_volume": {"usd": 31500000000.0},
            "circulating_supply": 19700000.0,
            "total_supply": 21000000.0,
            "max_supply": 21000000.0,
            "ath": {"usd": 73738.0},
            "ath_change_percentage": {"usd": -11.85},
            "ath_date": {"usd": "2024-03-14T07:10:36.635Z"},
            "atl": {"usd": 67.81},
            "atl_change_percentage": {"usd": 95750.5},
            "atl_date": {"usd": "2013-07-06T00:00:00.000Z"},
            "price_change_24h_in_currency": {"usd": 812.5},
            "price_change_percentage_24h_in_currency": {"usd": 1.27},
            "price_change_percentage_30d_in_currency": {"usd": 9.4}
        },
        "links": {
            "homepage": ["http://www.bitcoin.org"],
            "blockchain_site": ["https://mempool.space/"],
            "subreddit_url": "https://www.reddit.com/r/Bitcoin/"
        },
        "tickers": [
            {
                "base": "BTC", "target": "USDT", "last": 65010.0,
                "converted_last": {"usd": 65010.0}, "converted_volume": {"usd": 100.0},
                "market": {"name": "Binance", "identifier": "binance", "logo": null},
                "trust_score": "green", "bid_ask_spread_percentage": 0.01,
                "last_traded_at": "2024-01-01T00:00:00+00:00", "is_anomaly": false, "is_stale": false
            },
            {
                "base": "BTC", "target": "USD", "last": 64990.0,
                "converted_last": {"usd": 64990.0}, "converted_volume": {"usd": 200.0},
                "market": {"name": "Coinbase Exchange", "identifier": "gdax"},
                "trust_score": "yellow", "bid_ask_spread_percentage": 0.1,
                "last_traded_at": "2024-01-01T00:00:00+00:00", "is_anomaly": false, "is_stale": true
            },
            {
                "base": "BTC", "target": "EUR", "last": 60000.0,
                "converted_last": {"usd": 65100.0}, "converted_volume": {"usd": 700.0},
                "market": {"name": "Kraken", "identifier": "kraken"},
                "trust_score": "red", "bid_ask_spread_percentage": 0.5,
                "last_traded_at": "2024-01-01T00:00:00+00:00", "is_anomaly": true, "is_stale": false
            }
        ]
    })
}

pub fn chainlink_details() -> Value {
    let mut coin = bitcoin_details();
    coin["id"] = json!("chainlink");
    coin["symbol"] = json!("link");
    coin["name"] = json!("Chainlink");
    coin["asset_platform_id"] = json!("ethereum");
    coin["detail_platforms"] = json!({
        "ethereum": {
            "decimal_place": 18,
            "contract_address": "0x514910771af9ca656af840dff83e8264ecf986ca",
            "geckoterminal_url": "https://www.geckoterminal.com/eth/pools/0xa2107fa5"
        }
    });
    coin
}

fn market_item(id: &str, change: Option<f64>) -> Value {
    json!({
        "id": id,
        "symbol": &id[..3.min(id.len())],
        "name": id.to_uppercase(),
        "image": format!("https://img.example/{}.png", id),
        "current_price": 10.0,
        "market_cap": 1000.0,
        "market_cap_rank": 1,
        "price_change_percentage_24h": change
    })
}

pub fn market_list() -> Value {
    json!([
        market_item("bitcoin", Some(1.27)),
        market_item("ethereum", Some(-2.5)),
        market_item("tether", None),
        market_item("solana", Some(8.75)),
        market_item("dogecoin", Some(-6.0)),
        market_item("cardano", Some(3.1)),
        market_item("tron", Some(-0.4)),
        market_item("chainlink", Some(12.0))
    ])
}

#[derive(Deserialize)]
struct MarketsQuery {
    ids: Option<String>,
    per_page: Option<usize>,
}

async fn echo(req: HttpRequest) -> HttpResponse {
    let api_key = req
        .headers()
        .get("x-cg-demo-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    HttpResponse::Ok().json(json!({"api_key": api_key, "query": req.query_string()}))
}

async fn status(path: web::Path<u16>) -> HttpResponse {
    let code = StatusCode::from_u16(path.into_inner()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match code.as_u16() {
        429 => HttpResponse::build(code)
            .json(json!({"status": {"error_code": 429, "error_message": "You've exceeded the Rate Limit"}})),
        _ => HttpResponse::build(code).body("oops"),
    }
}

async fn markets(query: web::Query<MarketsQuery>) -> HttpResponse {
    let all = market_list();
    let items = all.as_array().cloned().unwrap_or_default();

    if let Some(ids) = &query.ids {
        let selected: Vec<Value> = items
            .into_iter()
            .filter(|item| ids.split(',').any(|id| item["id"] == id))
            .collect();
        return HttpResponse::Ok().json(selected);
    }

    let limit = query.per_page.unwrap_or(100);
    HttpResponse::Ok().json(items.into_iter().take(limit).collect::<Vec<_>>())
}

async fn coin(path: web::Path<String>) -> HttpResponse {
    match path.as_str() {
        "bitcoin" => HttpResponse::Ok().json(bitcoin_details()),
        "chainlink" => HttpResponse::Ok().json(chainlink_details()),
        "broken" => HttpResponse::InternalServerError().body("upstream exploded"),
        _ => HttpResponse::NotFound().json(json!({"error": "coin not found"})),
    }
}

async fn ohlc(path: web::Path<String>) -> HttpResponse {
    match path.as_str() {
        "bitcoin" | "chainlink" => HttpResponse::Ok().json(json!([
            [1704067200000i64, 42000.0, 42500.5, 41800.0, 42250.25],
            [1704069000000i64, 42250.25, 42300.0, 42100.0, 42200.0],
            [1704070800000i64, 42200.0, 42900.0, 42150.0, 42800.0]
        ])),
        "broken" => HttpResponse::InternalServerError().body("upstream exploded"),
        _ => HttpResponse::NotFound().json(json!({"error": "coin not found"})),
    }
}

async fn token_pools(path: web::Path<(String, String)>) -> HttpResponse {
    let (network, address) = path.into_inner();
    match address.as_str() {
        "0xempty" => HttpResponse::Ok().json(json!({"data": []})),
        "0xblank" => HttpResponse::Ok().json(json!({"data": [{"id": "", "attributes": null}]})),
        "0xfail" => HttpResponse::ServiceUnavailable().json(json!({"error": "busy"})),
        _ => HttpResponse::Ok().json(json!({"data": [
            {"id": format!("{}_0xpool", network), "attributes": {"address": "0xpool", "name": "LINK / WETH"}}
        ]})),
    }
}

async fn search_pools(query: web::Query<HashMap<String, String>>) -> HttpResponse {
    match query.get("query").map(String::as_str) {
        Some("nopool") => HttpResponse::Ok().json(json!({"data": []})),
        Some("fail") => HttpResponse::ServiceUnavailable().finish(),
        Some(q) => HttpResponse::Ok().json(json!({"data": [
            {"id": format!("{}_pool", q), "address": "0xbtc", "name": "WBTC / USDC", "network": "eth"}
        ]})),
        None => HttpResponse::BadRequest().json(json!({"error": "missing query"})),
    }
}

async fn search(query: web::Query<HashMap<String, String>>) -> HttpResponse {
    match query.get("query").map(String::as_str) {
        Some("fail") => HttpResponse::InternalServerError().finish(),
        Some(q) => HttpResponse::Ok().json(json!({"coins": [
            {"id": q, "name": q.to_uppercase(), "symbol": q, "thumb": "t", "large": "l", "market_cap_rank": 7}
        ]})),
        None => HttpResponse::Ok().json(json!({"coins": []})),
    }
}

async fn trending() -> HttpResponse {
    HttpResponse::Ok().json(json!({"coins": [
        {"item": {"id": "pepe", "name": "Pepe", "symbol": "PEPE", "thumb": "t", "large": "l",
                  "market_cap_rank": 30, "data": {"price": 0.0000123, "price_change_percentage_24h": {"usd": 12.5}}}},
        {"item": {"id": "sui", "name": "Sui", "symbol": "SUI", "thumb": "t", "large": "l",
                  "data": {"price_change_percentage_24h": {"usd": -3.25}}}}
    ]}))
}

async fn stall() -> HttpResponse {
    actix_web::rt::time::sleep(Duration::from_secs(30)).await;
    HttpResponse::Ok().json(json!([]))
}

fn upstream_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/echo", web::get().to(echo))
        .route("/slow/{tail:.*}", web::get().to(stall))
        .route("/status/{code}", web::get().to(status))
        .route("/coins/markets", web::get().to(markets))
        .route("/coins/{id}", web::get().to(coin))
        .route("/coins/{id}/ohlc", web::get().to(ohlc))
        .route("/onchain/networks/{network}/tokens/{address}/pools", web::get().to(token_pools))
        .route("/onchain/search/pools", web::get().to(search_pools))
        .route("/search/trending", web::get().to(trending))
        .route("/search", web::get().to(search));
}

/// Starts the fake upstream and returns its base URL.
pub async fn spawn_upstream() -> String {
    let server = HttpServer::new(|| App::new().configure(upstream_routes))
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .expect("bind fake upstream");
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{}", addr)
}

pub fn test_client(base_url: &str) -> CoinGeckoClient {
    CoinGeckoClient::new(reqwest::Client::new(), base_url, Some("test-key".to_string()))
}

pub fn test_state(base_url: &str) -> web::Data<AppState> {
    let public = CoinGeckoClient::new(reqwest::Client::new(), base_url, None);
    web::Data::new(AppState {
        client: test_client(base_url).with_revalidate(60),
        public: public.clone(),
        live: Arc::new(LiveFeeds::new(public, Duration::from_secs(30), Duration::from_secs(300))),
        templates: Templates::new().expect("templates compile"),
    })
}
