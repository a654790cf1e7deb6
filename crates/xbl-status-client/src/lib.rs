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

//! Client library for the Xbox Live service status feed.
//!
//! The feed is a WebSocket endpoint that pushes JSON status messages. This
//! library performs one fetch-and-close cycle per call and reports every
//! service with a normalized operational level. It is split into layers that
//! can be used on their own:
//!
//! - **Protocol layer**: wire types and the envelope parser
//! - **Status layer**: level classification and the caller-facing result
//! - **Connection layer**: the one-shot WebSocket fetcher with a shared deadline
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use xbl_status_client::StatusFetcher;
//!
//! #[tokio::main]
//! async fn main() {
//!     let result = StatusFetcher::default()
//!         .fetch_status(Duration::from_secs(5))
//!         .await;
//!
//!     if result.success {
//!         for service in &result.services {
//!             println!("{}: {}", service.name, service.level_text);
//!         }
//!     } else {
//!         eprintln!("{}", result.error_message.unwrap_or_default());
//!     }
//! }
//! ```
//!
//! # Classifying Without a Connection
//!
//! ```
//! use xbl_status_client::protocol::{Protocol, StatusEnvelopeParser};
//! use xbl_status_client::status::{normalize_services, ServiceLevel};
//!
//! let mut parser = StatusEnvelopeParser::new();
//! let frame = br##"{"message_type":"xbl_status","services":[{"name":"Core","description":"Mostly Up","color":"#0c0"}]}"##;
//! let envelope = parser.parse(frame).unwrap().unwrap();
//! let services = normalize_services(envelope.status_services().unwrap());
//! assert_eq!(services[0].level, ServiceLevel::Mostly);
//! ```

pub mod protocol;
pub mod status;
pub mod ws;

pub use protocol::{MessageKind, ParseError, Protocol, RawServiceStatus, StatusEnvelope};
pub use status::{FetchResult, GaugeColor, NormalizedService, ServiceLevel};
pub use ws::{FetchError, FetcherConfig, StatusFetcher};
