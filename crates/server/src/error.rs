use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use std::fmt;
use thiserror::Error;

use crate::render::{ErrorView, Templates};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Upstream answered with a non-success status.
    #[error("API Error: {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Failed to decode {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid request URL: {0}")]
    Url(String),
}

impl ApiError {
    /// HTTP status reported by the upstream, if it got that far.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.upstream_status() {
            Some(404) => StatusCode::NOT_FOUND,
            Some(429) => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
            "upstream_status": self.upstream_status(),
        }))
    }
}

/// A failed HTML page, already rendered with the error template.
#[derive(Debug)]
pub struct PageError {
    status: StatusCode,
    body: String,
}

impl PageError {
    pub fn render(templates: &Templates, status: StatusCode, message: impl Into<String>) -> Self {
        let view = ErrorView {
            title: status.canonical_reason().unwrap_or("Error").to_string(),
            status: status.as_u16(),
            message: message.into(),
        };
        let body = templates.render("error", &view).unwrap_or_else(|e| {
            error!("Failed to render error page: {}", e);
            format!("{} {}", view.status, view.message)
        });
        PageError { status, body }
    }

    /// 404 when the upstream said so, 502 for every other upstream failure.
    pub fn from_api(templates: &Templates, err: &ApiError) -> Self {
        let status = match err.upstream_status() {
            Some(404) => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_GATEWAY,
        };
        let message = match status {
            StatusCode::NOT_FOUND => "We couldn't find that coin.".to_string(),
            _ => format!("Market data is unavailable right now ({}).", err),
        };
        Self::render(templates, status, message)
    }
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page error {}", self.status.as_u16())
    }
}

impl ResponseError for PageError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status)
            .content_type(ContentType::html())
            .body(self.body.clone())
    }
}
