//! The HTTP front end: shared state, error mapping, CORS, and the route
//! table. The app is built from an `AppState` created once at startup.

use crate::config::Settings;
use crate::render::Typeface;
use crate::source::Role;
use actix_cors::Cors;
use actix_multipart::MultipartError;
use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use anyhow::Result;
use std::fmt::Debug;
use thiserror::Error;
use tracing::error;

pub mod protocol;
pub mod routes;

/// Everything a request handler needs. Immutable once built.
pub struct AppState {
    pub settings: Settings,
    /// Client for `*_url` fetches, with the configured timeout
    pub client: reqwest::Client,
    pub typeface: Typeface,
}

impl Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &self.settings)
            .field("typeface", &self.typeface)
            .finish()
    }
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.fetch.timeout())
            .build()?;
        let typeface = Typeface::discover(
            settings.render.font_paths.as_slice(),
            settings.render.font_size,
        );

        Ok(AppState {
            settings,
            client,
            typeface,
        })
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    /// The caller sent something unusable; reported back verbatim
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl WebError {
    /// Neither the upload nor the URL field was given for `role`
    pub fn missing(role: Role) -> Self {
        WebError::InvalidRequest(format!(
            "{} or {} required",
            role.upload_field(),
            role.url_field()
        ))
    }
}

impl actix_web::error::ResponseError for WebError {
    fn error_response(&self) -> HttpResponse {
        if let WebError::Internal(err) = self {
            error!("request failed: {err:?}");
        }

        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(protocol::ErrorBody {
                detail: self.to_string(),
            })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            WebError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MultipartError> for WebError {
    fn from(err: MultipartError) -> Self {
        WebError::InvalidRequest(err.to_string())
    }
}

/// Any origin, method and header
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .max_age(3600)
}

/// Register every route. Shared by `main` and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::root)
        .service(routes::health)
        .service(routes::vton_idm)
        .default_service(web::route().to(routes::not_found));
}
