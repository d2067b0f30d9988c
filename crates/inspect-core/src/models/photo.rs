//! Photo attachment model

use serde::{Deserialize, Serialize};

/// A photo embedded in an inspection record.
///
/// The payload is kept as the encoded string the client uploaded; it is never
/// decoded or size-checked here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoAttachment {
    /// Client-assigned photo identifier.
    pub id: String,
    /// Encoded image payload.
    pub base64: String,
    /// Capture timestamp as sent by the client.
    pub timestamp: String,
    /// Pixel width, if known.
    #[serde(default)]
    pub width: Option<u32>,
    /// Pixel height, if known.
    #[serde(default)]
    pub height: Option<u32>,
}
