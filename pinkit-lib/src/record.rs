//! Protocol record model.
//!
//! A [`ProtocolRecord`] describes one pin: the operation, the path it is
//! written under, the payload and how that payload was supplied. Records
//! are validated at construction so that encoding them into an output
//! script can never fail.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::{PinkitError, Result};

/// Default protocol flag carried in every data output.
pub const PROTOCOL_FLAG: &str = "metaid";

/// Pin operation: create a new record or modify an existing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Create a record under a new path.
    Create,
    /// Modify the record referenced by `@<id>`.
    Modify,
}

impl Operation {
    /// Wire tag as embedded in the data output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Modify => "modify",
        }
    }

    /// Parse a wire tag back into an operation.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "create" => Ok(Self::Create),
            "modify" => Ok(Self::Modify),
            other => Err(PinkitError::invalid_input(
                "operation",
                format!("unknown operation tag '{other}'"),
            )),
        }
    }
}

/// Declared encoding of a record body as supplied by the caller.
///
/// The body is decoded to raw bytes before it is embedded; the tag is
/// still carried in the output so indexers know how to render the
/// content. `Utf8` is the passthrough case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentEncoding {
    /// Plain UTF-8 text, embedded as-is.
    Utf8,
    /// Base64-encoded binary, decoded before embedding.
    Base64,
    /// Hex-encoded binary, decoded before embedding.
    Hex,
}

impl ContentEncoding {
    /// Wire tag as embedded in the data output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Base64 => "base64",
            Self::Hex => "hex",
        }
    }

    /// Parse a wire tag back into an encoding.
    pub fn from_tag(tag: &str) -> Result<Self> {
        match tag {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "base64" => Ok(Self::Base64),
            "hex" => Ok(Self::Hex),
            other => Err(PinkitError::invalid_input(
                "encoding",
                format!("unknown encoding tag '{other}'"),
            )),
        }
    }

    /// Decode a caller-supplied body into the raw bytes that get embedded.
    pub fn decode_body(&self, body: &str) -> Result<Vec<u8>> {
        match self {
            Self::Utf8 => Ok(body.as_bytes().to_vec()),
            Self::Base64 => base64::engine::general_purpose::STANDARD
                .decode(body)
                .map_err(|e| PinkitError::invalid_input("body", format!("invalid base64: {e}"))),
            Self::Hex => hex::decode(body)
                .map_err(|e| PinkitError::invalid_input("body", format!("invalid hex: {e}"))),
        }
    }
}

// Hard cap on a single script push; the practical ledger ceiling checked
// by composers is far below this.
const MAX_PUSH_BYTES: usize = u32::MAX as usize;

/// One pin, validated and ready to encode.
///
/// Immutable once constructed. The payload holds the body bytes after
/// decoding the declared encoding, so [`crate::codec::encode`] is total.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtocolRecord {
    operation: Operation,
    path: String,
    payload: Vec<u8>,
    encoding: ContentEncoding,
    content_type: String,
    flag: String,
}

impl ProtocolRecord {
    /// Build a record from already-validated parts.
    ///
    /// Enforces the path/operation invariant: `Create` requires a
    /// `/`-rooted creation path, `Modify` requires an `@<id>` reference.
    pub fn new(
        operation: Operation,
        path: impl Into<String>,
        body: &str,
        encoding: ContentEncoding,
        content_type: impl Into<String>,
        flag: impl Into<String>,
    ) -> Result<Self> {
        let path = path.into();
        match operation {
            Operation::Create => {
                if !path.starts_with('/') {
                    return Err(PinkitError::invalid_input(
                        "path",
                        "create requires a '/'-rooted path",
                    ));
                }
            }
            Operation::Modify => {
                if path.len() < 2 || !path.starts_with('@') {
                    return Err(PinkitError::invalid_input(
                        "path",
                        "modify requires a non-empty '@<id>' reference",
                    ));
                }
            }
        }
        let payload = encoding.decode_body(body)?;
        if payload.len() > MAX_PUSH_BYTES {
            return Err(PinkitError::invalid_input("body", "payload too large"));
        }
        Ok(Self {
            operation,
            path,
            payload,
            encoding,
            content_type: content_type.into(),
            flag: flag.into(),
        })
    }

    /// Create a record under a new path with the default protocol flag.
    pub fn create(
        path: impl Into<String>,
        body: &str,
        encoding: ContentEncoding,
        content_type: impl Into<String>,
    ) -> Result<Self> {
        Self::new(
            Operation::Create,
            path,
            body,
            encoding,
            content_type,
            PROTOCOL_FLAG,
        )
    }

    /// Modify the existing record with the given id.
    pub fn modify(
        target_id: &str,
        body: &str,
        encoding: ContentEncoding,
        content_type: impl Into<String>,
    ) -> Result<Self> {
        if target_id.is_empty() {
            return Err(PinkitError::invalid_input(
                "target_id",
                "modify requires a record id",
            ));
        }
        Self::new(
            Operation::Modify,
            format!("@{target_id}"),
            body,
            encoding,
            content_type,
            PROTOCOL_FLAG,
        )
    }

    /// Reassemble a record from decoded wire parts. Used by the codec.
    pub(crate) fn from_parts(
        operation: Operation,
        path: String,
        payload: Vec<u8>,
        encoding: ContentEncoding,
        content_type: String,
        flag: String,
    ) -> Self {
        Self {
            operation,
            path,
            payload,
            encoding,
            content_type,
            flag,
        }
    }

    /// The pin operation.
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Creation path or `@<id>` reference.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Body bytes after decoding the declared encoding.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Declared body encoding.
    pub fn encoding(&self) -> ContentEncoding {
        self.encoding
    }

    /// MIME-ish content type (e.g. `text/plain`).
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Protocol flag marker.
    pub fn flag(&self) -> &str {
        &self.flag
    }
}
