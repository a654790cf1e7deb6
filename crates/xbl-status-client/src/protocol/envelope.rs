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

//! JSON status envelope parser.

use super::{ParseError, Protocol, StatusEnvelope};

/// Parser for the JSON text frames pushed by the status feed.
#[derive(Debug, Default)]
pub struct StatusEnvelopeParser;

impl StatusEnvelopeParser {
    /// Create a new envelope parser.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Protocol for StatusEnvelopeParser {
    type Message = StatusEnvelope;
    type Error = ParseError;

    /// A literal JSON `null` decodes to `Ok(None)`.
    fn parse(&mut self, input: &[u8]) -> Result<Option<StatusEnvelope>, ParseError> {
        let text = std::str::from_utf8(input)
            .map_err(|e| ParseError::InvalidFormat(format!("invalid UTF-8: {e}")))?;

        let envelope: Option<StatusEnvelope> = serde_json::from_str(text)?;
        Ok(envelope)
    }
}
