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

//! Normalized service status and fetch results.
//!
//! Raw feed entries are reduced to a [`ServiceLevel`] tier plus a display
//! label. The tier order is significant: callers use it for gauge tiering.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::protocol::RawServiceStatus;

/// Description qualifier that demotes an operational service to [`ServiceLevel::Mostly`].
const MOSTLY_QUALIFIER: &str = "Mostly";

/// Operational tier of a service, ordered by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(u8)]
pub enum ServiceLevel {
    /// Not yet classified.
    #[default]
    Unknown = 0,
    Inoperational = 1,
    Mostly = 2,
    Fully = 3,
}

/// Gauge color associated with each [`ServiceLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeColor {
    Grey,
    Red,
    Amber,
    Green,
}

impl ServiceLevel {
    /// Numeric tier (0-3).
    #[must_use]
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Human-readable label.
    #[must_use]
    pub fn text(self) -> &'static str {
        match self {
            Self::Fully => "Fully Operational",
            Self::Mostly => "Mostly Operational",
            Self::Inoperational => "Inoperational",
            Self::Unknown => "Unknown",
        }
    }

    #[must_use]
    pub fn gauge_color(self) -> GaugeColor {
        match self {
            Self::Unknown => GaugeColor::Grey,
            Self::Inoperational => GaugeColor::Red,
            Self::Mostly => GaugeColor::Amber,
            Self::Fully => GaugeColor::Green,
        }
    }
}

/// Classify a raw service entry.
///
/// Never yields [`ServiceLevel::Unknown`]; that tier only exists as the
/// unclassified default.
#[must_use]
pub fn classify_level(service: &RawServiceStatus) -> ServiceLevel {
    if !service.is_operational() {
        return ServiceLevel::Inoperational;
    }

    if service.description.contains(MOSTLY_QUALIFIER) {
        return ServiceLevel::Mostly;
    }

    ServiceLevel::Fully
}

/// Label for a level. Same as [`ServiceLevel::text`].
#[must_use]
pub fn level_text(level: ServiceLevel) -> &'static str {
    level.text()
}

/// Service status as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedService {
    pub name: String,
    pub description: String,
    pub is_operational: bool,
    pub level: ServiceLevel,
    pub level_text: String,
}

impl Default for NormalizedService {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            is_operational: false,
            level: ServiceLevel::Unknown,
            level_text: ServiceLevel::Unknown.text().to_string(),
        }
    }
}

impl From<&RawServiceStatus> for NormalizedService {
    fn from(raw: &RawServiceStatus) -> Self {
        let level = classify_level(raw);
        Self {
            name: raw.name.clone(),
            description: raw.description.clone(),
            is_operational: raw.is_operational(),
            level,
            level_text: level.text().to_string(),
        }
    }
}

/// Normalize raw entries, preserving input order.
#[must_use]
pub fn normalize_services(raw: &[RawServiceStatus]) -> Vec<NormalizedService> {
    raw.iter().map(NormalizedService::from).collect()
}

/// Outcome of one status fetch. Always populated; check `success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult {
    /// Normalized services in feed order, empty on failure.
    pub services: Vec<NormalizedService>,
    pub success: bool,
    /// First failure encountered, set iff `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Start time of the fetch.
    pub last_updated: DateTime<Utc>,
}

impl FetchResult {
    /// Successful fetch carrying `services`.
    #[must_use]
    pub fn succeeded(services: Vec<NormalizedService>, last_updated: DateTime<Utc>) -> Self {
        Self {
            services,
            success: true,
            error_message: None,
            last_updated,
        }
    }

    /// Failed fetch with no services.
    #[must_use]
    pub fn failed(error_message: impl Into<String>, last_updated: DateTime<Utc>) -> Self {
        Self {
            services: Vec::new(),
            success: false,
            error_message: Some(error_message.into()),
            last_updated,
        }
    }

    /// Lowest tier among the reported services, `None` when there are none.
    #[must_use]
    pub fn worst_level(&self) -> Option<ServiceLevel> {
        self.services.iter().map(|s| s.level).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, description: &str, color: &str) -> RawServiceStatus {
        RawServiceStatus {
            name: name.to_string(),
            description: description.to_string(),
            color: color.to_string(),
        }
    }

    #[test]
    fn test_level_order() {
        assert!(ServiceLevel::Unknown < ServiceLevel::Inoperational);
        assert!(ServiceLevel::Inoperational < ServiceLevel::Mostly);
        assert!(ServiceLevel::Mostly < ServiceLevel::Fully);
        assert_eq!(ServiceLevel::Unknown.value(), 0);
        assert_eq!(ServiceLevel::Fully.value(), 3);
    }

    #[test]
    fn test_level_text_mapping() {
        assert_eq!(level_text(ServiceLevel::Fully), "Fully Operational");
        assert_eq!(level_text(ServiceLevel::Mostly), "Mostly Operational");
        assert_eq!(level_text(ServiceLevel::Inoperational), "Inoperational");
        assert_eq!(level_text(ServiceLevel::Unknown), "Unknown");
    }

    #[test]
    fn test_inoperational_ignores_description() {
        assert_eq!(
            classify_level(&raw("Core", "Mostly Up", "#f00")),
            ServiceLevel::Inoperational
        );
        assert_eq!(
            classify_level(&raw("Core", "", "")),
            ServiceLevel::Inoperational
        );
    }

    #[test]
    fn test_mostly_is_case_sensitive_substring() {
        assert_eq!(
            classify_level(&raw("Core", "Service Mostly Available", "#0c0")),
            ServiceLevel::Mostly
        );
        assert_eq!(
            classify_level(&raw("Core", "mostly up", "#0c0")),
            ServiceLevel::Fully
        );
        assert_eq!(
            classify_level(&raw("Core", "", "#0c0")),
            ServiceLevel::Fully
        );
    }

    #[test]
    fn test_normalize_preserves_order_and_fields() {
        let services = normalize_services(&[
            raw("Core", "", "#0c0"),
            raw("Purchase", "Mostly Up", "#0c0"),
            raw("Social", "Down", "#f00"),
        ]);

        let names: Vec<_> = services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Core", "Purchase", "Social"]);

        assert!(services[0].is_operational);
        assert_eq!(services[0].level_text, "Fully Operational");
        assert_eq!(services[1].description, "Mostly Up");
        assert_eq!(services[1].level, ServiceLevel::Mostly);
        assert!(!services[2].is_operational);
        assert_eq!(services[2].level, ServiceLevel::Inoperational);
    }

    #[test]
    fn test_default_service_is_unknown() {
        let service = NormalizedService::default();
        assert_eq!(service.level, ServiceLevel::Unknown);
        assert_eq!(service.level_text, "Unknown");
        assert_eq!(service.level.gauge_color(), GaugeColor::Grey);
    }

    #[test]
    fn test_worst_level() {
        let now = Utc::now();
        let result = FetchResult::succeeded(
            normalize_services(&[raw("Core", "", "#0c0"), raw("Store", "Mostly", "#0c0")]),
            now,
        );
        assert_eq!(result.worst_level(), Some(ServiceLevel::Mostly));
        assert_eq!(FetchResult::failed("boom", now).worst_level(), None);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let now = Utc::now();
        let result = FetchResult::succeeded(normalize_services(&[raw("Core", "", "#0c0")]), now);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["success"], true);
        assert!(json.get("errorMessage").is_none());
        assert!(json.get("lastUpdated").is_some());
        assert_eq!(json["services"][0]["isOperational"], true);
        assert_eq!(json["services"][0]["level"], "Fully");
        assert_eq!(json["services"][0]["levelText"], "Fully Operational");

        let failed = serde_json::to_value(FetchResult::failed("timed out", now)).unwrap();
        assert_eq!(failed["errorMessage"], "timed out");
        assert_eq!(failed["services"].as_array().map(Vec::len), Some(0));
    }
}
