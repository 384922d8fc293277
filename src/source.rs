//! Resolving the `person` and `garment` inputs of a try-on request to raw
//! bytes, and measuring them.

use image::io::Reader as ImageReader;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

/// One of the two images a try-on request needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Person,
    Garment,
}

impl Role {
    /// Multipart field carrying the uploaded file
    pub fn upload_field(&self) -> &'static str {
        match self {
            Role::Person => "person",
            Role::Garment => "garment",
        }
    }

    /// Multipart field carrying the remote URL
    pub fn url_field(&self) -> &'static str {
        match self {
            Role::Person => "person_url",
            Role::Garment => "garment_url",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.upload_field())
    }
}

/// Where a role's image comes from
#[derive(Clone, PartialEq, Eq)]
pub enum ImageSource {
    Upload(Vec<u8>),
    Url(String),
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Upload(bytes) => write!(f, "Upload(<{} bytes>)", bytes.len()),
            ImageSource::Url(url) => write!(f, "Url({url:?})"),
        }
    }
}

/// Why a role's image could not be turned into dimensions. These never reach
/// the caller; the handler logs them and carries on with defaults.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },

    #[error("failed to read body of {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("could not decode image: {0}")]
    Io(#[from] std::io::Error),
}

impl ImageSource {
    /// Pick the source for a role. An upload always wins over a URL, and an
    /// empty URL counts as missing.
    pub fn select(upload: Option<Vec<u8>>, url: Option<String>) -> Option<Self> {
        match (upload, url) {
            (Some(bytes), _) => Some(ImageSource::Upload(bytes)),
            (None, Some(url)) if !url.is_empty() => Some(ImageSource::Url(url)),
            _ => None,
        }
    }

    /// Get the image bytes, downloading them if needed
    pub async fn resolve(self, client: &Client) -> Result<Vec<u8>, FetchError> {
        match self {
            ImageSource::Upload(bytes) => Ok(bytes),
            ImageSource::Url(url) => fetch(client, &url).await,
        }
    }
}

/// GET `url` and return the body. The client's own timeout bounds the call.
pub async fn fetch(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    debug!("fetching image from {url}");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let body = response.bytes().await.map_err(|source| FetchError::Body {
        url: url.to_string(),
        source,
    })?;

    debug!("fetched {} bytes from {url}", body.len());
    Ok(body.to_vec())
}

/// Read `(width, height)` from an encoded image without decoding the pixels
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32), FetchError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    Ok(reader.into_dimensions()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, RgbImage};
    use std::time::Duration;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut data = Vec::new();
        RgbImage::new(width, height)
            .write_to(&mut Cursor::new(&mut data), ImageOutputFormat::Png)
            .unwrap();
        data
    }

    #[test]
    fn test_upload_wins_over_url() {
        let source = ImageSource::select(Some(vec![1, 2, 3]), Some("http://x/y.png".into()));
        assert_eq!(source, Some(ImageSource::Upload(vec![1, 2, 3])));
    }

    #[test]
    fn test_select_url_and_missing() {
        assert_eq!(
            ImageSource::select(None, Some("http://x/y.png".into())),
            Some(ImageSource::Url("http://x/y.png".into()))
        );
        assert_eq!(ImageSource::select(None, Some("".into())), None);
        // only the empty string is missing; blanks are a (bad) URL
        assert_eq!(
            ImageSource::select(None, Some("  ".into())),
            Some(ImageSource::Url("  ".into()))
        );
        assert_eq!(ImageSource::select(None, None), None);
    }

    #[test]
    fn test_empty_upload_is_still_a_source() {
        assert_eq!(
            ImageSource::select(Some(vec![]), None),
            Some(ImageSource::Upload(vec![]))
        );
    }

    #[test]
    fn test_probe_png() {
        assert_eq!(probe_dimensions(&png(300, 400)).unwrap(), (300, 400));
    }

    #[test]
    fn test_probe_garbage() {
        assert!(probe_dimensions(b"definitely not an image").is_err());
        assert!(probe_dimensions(&[]).is_err());
    }

    #[tokio::test]
    async fn test_upload_resolves_without_network() {
        let client = Client::new();
        let bytes = ImageSource::Upload(png(2, 2)).resolve(&client).await.unwrap();
        assert_eq!(probe_dimensions(&bytes).unwrap(), (2, 2));
    }

    #[tokio::test]
    async fn test_unreachable_url() {
        let client = Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let err = fetch(&client, "http://127.0.0.1:1/person.png")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let client = Client::new();
        let err = fetch(&client, "not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }), "{err:?}");
    }

    #[test]
    fn test_role_fields() {
        assert_eq!(Role::Person.upload_field(), "person");
        assert_eq!(Role::Person.url_field(), "person_url");
        assert_eq!(Role::Garment.upload_field(), "garment");
        assert_eq!(Role::Garment.url_field(), "garment_url");
        assert_eq!(Role::Garment.to_string(), "garment");
    }
}
