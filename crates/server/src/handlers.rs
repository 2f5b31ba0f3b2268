use actix_web::http::header::{self, ContentType};
use actix_web::http::StatusCode;
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use log::{error, info, warn};

use crate::data::{fetch_ohlc, get_trending, is_valid_coin_id, search_coins, ChartPeriod};
use crate::error::{ApiError, PageError};
use crate::pages::{compose_coin_page, compose_home_page, LIVE_WAIT};
use crate::types::{AppState, CoinPageQuery, OhlcQuery, SearchQuery};

fn html_page(state: &AppState, template: &str, view: &impl serde::Serialize) -> Result<HttpResponse, PageError> {
    match state.templates.render(template, view) {
        Ok(body) => Ok(HttpResponse::Ok()
            .content_type(ContentType::html())
            .append_header(header::CacheControl(vec![
                header::CacheDirective::Public,
                header::CacheDirective::MaxAge(state.revalidate_seconds()),
            ]))
            .body(body)),
        Err(e) => {
            error!("Failed to render {} page: {}", template, e);
            Err(PageError::render(&state.templates, StatusCode::INTERNAL_SERVER_ERROR, "The page could not be rendered."))
        }
    }
}

fn invalid_coin_id(id: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": format!("Invalid coin id: {}", id)
    }))
}

#[get("/")]
pub async fn home(data: web::Data<AppState>) -> Result<HttpResponse, PageError> {
    let page = compose_home_page(&data).await;
    html_page(&data, "home", &page)
}

#[get("/coins/{id}")]
pub async fn coin_page(
    path: web::Path<String>,
    query: web::Query<CoinPageQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, PageError> {
    let id = path.into_inner();
    if !is_valid_coin_id(&id) {
        return Err(PageError::render(&data.templates, StatusCode::NOT_FOUND, "We couldn't find that coin."));
    }

    info!("Coin page request: {}", id);
    match compose_coin_page(&data, &id, query.amount()).await {
        Ok(page) => html_page(&data, "coin", &page),
        Err(e) => {
            warn!("Coin page for {} failed: {}", id, e);
            Err(PageError::from_api(&data.templates, &e))
        }
    }
}

#[get("/api/search")]
pub async fn search(query: web::Query<SearchQuery>, data: web::Data<AppState>) -> impl Responder {
    web::Json(search_coins(&data.client, &query.query).await)
}

#[get("/api/trending")]
pub async fn trending(data: web::Data<AppState>) -> impl Responder {
    web::Json(get_trending(&data.client).await)
}

#[get("/api/coins/{id}/live")]
pub async fn live_snapshot(path: web::Path<String>, data: web::Data<AppState>) -> HttpResponse {
    let id = path.into_inner();
    if !is_valid_coin_id(&id) {
        return invalid_coin_id(&id);
    }

    match data.live.snapshot(&id, LIVE_WAIT).await {
        Some(snapshot) => HttpResponse::Ok().json(snapshot),
        None => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "error": format!("Live data for {} is not available yet", id)
        })),
    }
}

#[get("/api/coins/{id}/ohlc")]
pub async fn ohlc(
    path: web::Path<String>,
    query: web::Query<OhlcQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    if !is_valid_coin_id(&id) {
        return Ok(invalid_coin_id(&id));
    }

    let period = match query.period.as_deref().unwrap_or("daily").parse::<ChartPeriod>() {
        Ok(period) => period,
        Err(message) => return Ok(HttpResponse::BadRequest().json(serde_json::json!({ "error": message }))),
    };

    info!("OHLC request: {} ({})", id, period);
    let candles = fetch_ohlc(&data.client, &id, period).await?;
    Ok(HttpResponse::Ok()
        .append_header(header::CacheControl(vec![
            header::CacheDirective::Public,
            header::CacheDirective::MaxAge(data.revalidate_seconds()),
        ]))
        .json(candles))
}

#[get("/health")]
pub async fn health_check(data: web::Data<AppState>) -> impl Responder {
    web::Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "live_feeds": data.live.active().len(),
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(home)
        .service(coin_page)
        .service(search)
        .service(trending)
        .service(live_snapshot)
        .service(ohlc)
        .service(health_check);
}
