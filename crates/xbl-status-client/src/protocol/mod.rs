// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Protocol layer for status feed messages.
//!
//! The status feed pushes JSON text frames shaped like:
//!
//! ```text
//! { "message_type": "xbl_status", "services": [ { "name": ..., "description": ..., "color": ... } ] }
//! ```
//!
//! `services` is omitted entirely for message kinds that carry no status.

mod envelope;

pub use envelope::StatusEnvelopeParser;

use std::fmt;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Color token the feed uses for a fully-up service.
pub const OPERATIONAL_COLOR: &str = "#0c0";

/// Errors that can occur while decoding a status envelope.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid message format: {0}")]
    InvalidFormat(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Treat an explicit JSON `null` like a missing string field.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One service entry as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawServiceStatus {
    /// Service identifier (e.g. "Core").
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    /// Free-text status, may carry qualifiers like "Mostly".
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Color-code token.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub color: String,
}

impl RawServiceStatus {
    /// Whether the service reports the fully-up color.
    #[must_use]
    pub fn is_operational(&self) -> bool {
        self.color == OPERATIONAL_COLOR
    }
}

/// A single message received from the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusEnvelope {
    /// Raw message tag.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message_type: String,
    /// Service statuses, present only for status-bearing messages.
    #[serde(default)]
    pub services: Option<Vec<RawServiceStatus>>,
}

impl StatusEnvelope {
    /// Classify the raw message tag.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        MessageKind::parse(&self.message_type)
    }

    /// An envelope carries status when its kind is recognized and the
    /// `services` field was present (an empty list still counts).
    #[must_use]
    pub fn status_services(&self) -> Option<&[RawServiceStatus]> {
        if self.kind() == MessageKind::Unknown {
            return None;
        }
        self.services.as_deref()
    }
}

/// Semantic kind of a feed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Stats,
    XblStatus,
    XboxliveStatus,
    Unknown,
}

impl MessageKind {
    const ALL: [Self; 4] = [
        Self::Stats,
        Self::XblStatus,
        Self::XboxliveStatus,
        Self::Unknown,
    ];

    /// Derive the kind from a raw tag.
    ///
    /// Exact case-insensitive matches against the wire tags and the variant
    /// names win first. Anything else containing `status` is treated as
    /// [`MessageKind::XboxliveStatus`]; the rest is [`MessageKind::Unknown`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let exact = Self::ALL.into_iter().find(|kind| {
            raw.eq_ignore_ascii_case(kind.as_str()) || raw.eq_ignore_ascii_case(kind.variant_name())
        });
        if let Some(kind) = exact {
            return kind;
        }

        if raw.contains("status") {
            Self::XboxliveStatus
        } else {
            Self::Unknown
        }
    }

    /// Wire tag for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stats => "stats",
            Self::XblStatus => "xbl_status",
            Self::XboxliveStatus => "xboxlive_status",
            Self::Unknown => "unknown",
        }
    }

    fn variant_name(self) -> &'static str {
        match self {
            Self::Stats => "Stats",
            Self::XblStatus => "XblStatus",
            Self::XboxliveStatus => "XboxliveStatus",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for feed message parsers.
pub trait Protocol {
    /// The message type produced by this parser.
    type Message;
    /// The error type for parsing failures.
    type Error;

    /// Parse input bytes into a message.
    ///
    /// Returns `Ok(Some(message))` if parsing succeeded,
    /// `Ok(None)` if the input is valid but decodes to nothing,
    /// or `Err(error)` if parsing failed.
    fn parse(&mut self, input: &[u8]) -> Result<Option<Self::Message>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_wire_tags() {
        assert_eq!(MessageKind::parse("stats"), MessageKind::Stats);
        assert_eq!(MessageKind::parse("xbl_status"), MessageKind::XblStatus);
        assert_eq!(
            MessageKind::parse("xboxlive_status"),
            MessageKind::XboxliveStatus
        );
    }

    #[test]
    fn test_exact_match_ignores_case() {
        assert_eq!(MessageKind::parse("STATS"), MessageKind::Stats);
        assert_eq!(MessageKind::parse("Xbl_Status"), MessageKind::XblStatus);
        assert_eq!(MessageKind::parse("xblstatus"), MessageKind::XblStatus);
        assert_eq!(MessageKind::parse("UNKNOWN"), MessageKind::Unknown);
    }

    #[test]
    fn test_status_substring_fallback() {
        assert_eq!(
            MessageKind::parse("live_auth_status"),
            MessageKind::XboxliveStatus
        );
        // Fallback is case-sensitive
        assert_eq!(MessageKind::parse("LIVE_STATUS"), MessageKind::Unknown);
    }

    #[test]
    fn test_unrecognized_tags() {
        assert_eq!(MessageKind::parse(""), MessageKind::Unknown);
        assert_eq!(MessageKind::parse("heartbeat"), MessageKind::Unknown);
        // Numeric tags are not mapped to kinds
        assert_eq!(MessageKind::parse("1"), MessageKind::Unknown);
    }

    #[test]
    fn test_operational_color() {
        let mut service = RawServiceStatus {
            name: "Core".to_string(),
            description: String::new(),
            color: "#0c0".to_string(),
        };
        assert!(service.is_operational());

        service.color = "#0C0".to_string();
        assert!(!service.is_operational());
    }

    #[test]
    fn test_status_services_requires_known_kind() {
        let envelope = StatusEnvelope {
            message_type: "heartbeat".to_string(),
            services: Some(Vec::new()),
        };
        assert!(envelope.status_services().is_none());

        let envelope = StatusEnvelope {
            message_type: "stats".to_string(),
            services: None,
        };
        assert!(envelope.status_services().is_none());

        let envelope = StatusEnvelope {
            message_type: "stats".to_string(),
            services: Some(Vec::new()),
        };
        assert_eq!(envelope.status_services().map(<[_]>::len), Some(0));
    }
}
