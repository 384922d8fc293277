//! Route handlers. `POST /v1/vton/idm` stands in for a real try-on model:
//! it checks the inputs, waits a while, and returns a drawn placeholder.

use super::protocol::{
    Endpoints, ErrorBody, HealthResponse, RootResponse, UrlForm, VtonForm, VtonResponse,
};
use super::{AppState, WebError};
use crate::config::{SERVER_NAME, SERVICE_NAME};
use crate::render;
use crate::source::{probe_dimensions, ImageSource, Role};
use actix_multipart::Multipart;
use actix_web::{get, post, web, FromRequest, HttpMessage, HttpRequest, HttpResponse, Responder};
use anyhow::anyhow;
use chrono::{Local, Utc};
use futures_util::StreamExt as _;
use tracing::*;

type Result<T> = std::result::Result<T, WebError>;

#[post("/v1/vton/idm")]
pub async fn vton_idm(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> Result<impl Responder> {
    let form = read_request(&req, payload).await?;
    info!("received try-on request: {form:?}");

    let person = ImageSource::select(form.person, form.person_url)
        .ok_or_else(|| WebError::missing(Role::Person))?;
    let garment = ImageSource::select(form.garment, form.garment_url)
        .ok_or_else(|| WebError::missing(Role::Garment))?;

    let person_size = measure(Role::Person, person, &state.client).await;
    measure(Role::Garment, garment, &state.client).await;

    let delay = state.settings.latency.sample();
    info!("simulating processing for {:.1}s", delay.as_secs_f64());
    tokio::time::sleep(delay).await;

    let size = person_size.unwrap_or_else(|| state.settings.render.default_size());
    let generated_at = Local::now().format("%H:%M:%S").to_string();

    let image_base64 = {
        let state = state.clone();
        web::block(move || {
            let image = render::placeholder(size, &state.typeface, &generated_at);
            render::encode_png_base64(image)
        })
        .await
        .map_err(|e| anyhow!(e))??
    };

    info!(
        "generated placeholder {}x{}, base64 length {}",
        size.0,
        size.1,
        image_base64.len()
    );

    Ok(web::Json(VtonResponse { image_base64 }))
}

/// Liveness check
#[get("/health")]
pub async fn health() -> impl Responder {
    web::Json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: Utc::now().timestamp_micros() as f64 / 1e6,
    })
}

/// Lists the other routes
#[get("/")]
pub async fn root() -> impl Responder {
    web::Json(RootResponse {
        message: SERVER_NAME.to_string(),
        endpoints: Endpoints {
            vton: "POST /v1/vton/idm".to_string(),
            health: "GET /health".to_string(),
        },
    })
}

pub async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorBody {
        detail: "Not Found".to_string(),
    })
}

/// Read the try-on fields from a multipart or urlencoded body. Any other body
/// (or none) reads as an empty form, so the missing-role check reports it.
async fn read_request(req: &HttpRequest, payload: web::Payload) -> Result<VtonForm> {
    let essence = match req.mime_type() {
        Ok(Some(mime)) => mime.essence_str().to_string(),
        _ => String::new(),
    };

    match essence.as_str() {
        "multipart/form-data" => read_multipart(Multipart::new(req.headers(), payload)).await,
        "application/x-www-form-urlencoded" => {
            let form = web::Form::<UrlForm>::from_request(req, &mut payload.into_inner())
                .await
                .map_err(|err| WebError::InvalidRequest(err.to_string()))?;
            Ok(form.into_inner().into())
        }
        other => {
            debug!("no form in request body (content type {other:?})");
            Ok(VtonForm::default())
        }
    }
}

/// Drain the multipart stream into memory. Fields other than the four known
/// ones are read and dropped. A stream that ends badly between fields keeps
/// what was read so far; only a field cut off mid-way is an error.
async fn read_multipart(mut payload: Multipart) -> Result<VtonForm> {
    let mut form = VtonForm::default();

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            Err(err) => {
                debug!("multipart stream ended early: {err}");
                break;
            }
        };
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .map(str::to_owned);

        let mut data: Vec<u8> = Vec::new();
        while let Some(chunk) = field.next().await {
            data.extend_from_slice(&chunk?);
        }

        match name.as_deref() {
            Some("person") => form.person = Some(data),
            Some("garment") => form.garment = Some(data),
            Some("person_url") => form.person_url = Some(field_text(&data)),
            Some("garment_url") => form.garment_url = Some(field_text(&data)),
            other => debug!("ignoring multipart field {other:?}"),
        }
    }

    Ok(form)
}

fn field_text(data: &[u8]) -> String {
    String::from_utf8_lossy(data).into_owned()
}

/// Resolve a role's image and read its dimensions. Failures are logged and
/// reported as `None`; they never fail the request.
async fn measure(role: Role, source: ImageSource, client: &reqwest::Client) -> Option<(u32, u32)> {
    let from_url = matches!(source, ImageSource::Url(_));

    let bytes = match source.resolve(client).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("error downloading {role} image: {err}");
            return None;
        }
    };
    debug!("{role} data size: {} bytes", bytes.len());

    match probe_dimensions(&bytes) {
        Ok((width, height)) => {
            let origin = if from_url { "downloaded" } else { "uploaded" };
            info!("{origin} {role} image size: {width}x{height}");
            Some((width, height))
        }
        Err(err) => {
            warn!("error processing {role} image: {err}");
            None
        }
    }
}
