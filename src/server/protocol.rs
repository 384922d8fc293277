use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// The fields of a try-on request, read into memory
#[derive(Default)]
pub struct VtonForm {
    pub person: Option<Vec<u8>>,
    pub garment: Option<Vec<u8>>,
    pub person_url: Option<String>,
    pub garment_url: Option<String>,
}

impl Debug for VtonForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = |data: &Option<Vec<u8>>| data.as_ref().map(Vec::len);
        f.debug_struct("VtonForm")
            .field("person_bytes", &size(&self.person))
            .field("garment_bytes", &size(&self.garment))
            .field("person_url", &self.person_url)
            .field("garment_url", &self.garment_url)
            .finish()
    }
}

/// An `application/x-www-form-urlencoded` try-on request. Files can't be
/// sent this way, so only the URL fields exist.
#[derive(Debug, Default, Deserialize)]
pub struct UrlForm {
    pub person_url: Option<String>,
    pub garment_url: Option<String>,
}

impl From<UrlForm> for VtonForm {
    fn from(form: UrlForm) -> Self {
        VtonForm {
            person_url: form.person_url,
            garment_url: form.garment_url,
            ..VtonForm::default()
        }
    }
}

/// The generated image, PNG encoded as base 64
#[derive(Serialize, Deserialize)]
pub struct VtonResponse {
    pub image_base64: String,
}

impl Debug for VtonResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VtonResponse {{ image_base64: <{} chars> }}", self.image_base64.len())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    /// Seconds since the Unix epoch
    pub timestamp: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub endpoints: Endpoints,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Endpoints {
    pub vton: String,
    pub health: String,
}

/// Body of every error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
