//! crates/tutor_core/src/data_uri.rs
//!
//! Parsing for the `data:<media-type>;base64,<payload>` references used to
//! attach documents to tutor requests.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fmt;

use crate::ports::{PortError, PortResult};

/// A decoded data URI. Only base64 payloads with a declared media type are accepted.
#[derive(Clone, PartialEq, Eq)]
pub struct DataUri {
    media_type: String,
    data: Vec<u8>,
}

impl DataUri {
    /// Parses and decodes a data URI, rejecting anything that is not
    /// `data:<type>/<subtype>[;param=value]*;base64,<payload>`.
    pub fn parse(input: &str) -> PortResult<Self> {
        let rest = input
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| invalid("missing 'data:' scheme"))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| invalid("missing ',' before the payload"))?;

        let mut params = header.split(';');
        let media_type = params.next().unwrap_or_default().trim().to_ascii_lowercase();
        let (kind, subtype) = media_type
            .split_once('/')
            .ok_or_else(|| invalid("media type must look like 'type/subtype'"))?;
        if kind.is_empty() || subtype.is_empty() {
            return Err(invalid("media type must look like 'type/subtype'"));
        }

        if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
            return Err(invalid("payload must be base64 encoded"));
        }

        let data = STANDARD
            .decode(payload.trim())
            .map_err(|e| invalid(&format!("payload is not valid base64: {}", e)))?;
        if data.is_empty() {
            return Err(invalid("payload is empty"));
        }

        Ok(Self { media_type, data })
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }

    /// Re-encodes the document in canonical `data:<type>;base64,<payload>` form.
    pub fn to_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, STANDARD.encode(&self.data))
    }
}

// Payloads can be megabytes, keep them out of logs.
impl fmt::Debug for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataUri")
            .field("media_type", &self.media_type)
            .field("len", &self.data.len())
            .finish()
    }
}

fn invalid(reason: &str) -> PortError {
    PortError::Invalid(format!("Invalid data URI: {}", reason))
}
