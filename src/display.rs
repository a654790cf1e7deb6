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

//! Plain-text rendering of a fetch result.

use std::fmt::Write;

use xbl_status_client::{FetchResult, GaugeColor};

/// Get human-readable gauge color name
pub fn gauge_label(color: GaugeColor) -> &'static str {
    match color {
        GaugeColor::Grey => "grey",
        GaugeColor::Red => "red",
        GaugeColor::Amber => "amber",
        GaugeColor::Green => "green",
    }
}

/// Render a result as an aligned table, one service per line.
pub fn render(result: &FetchResult) -> String {
    let mut out = String::new();
    let updated = result.last_updated.format("%Y-%m-%d %H:%M:%S UTC");

    if !result.success {
        let reason = result.error_message.as_deref().unwrap_or("unknown error");
        let _ = writeln!(out, "Status unavailable ({updated}): {reason}");
        return out;
    }

    let _ = writeln!(out, "Xbox Live status ({updated})");

    let width = result
        .services
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(0);
    for service in &result.services {
        let _ = write!(
            out,
            "  {:<width$}  {:<18}  [{}]",
            service.name,
            service.level_text,
            gauge_label(service.level.gauge_color()),
        );
        if !service.description.is_empty() {
            let _ = write!(out, "  {}", service.description);
        }
        out.push('\n');
    }

    match result.worst_level() {
        Some(level) => {
            let _ = writeln!(out, "Overall: {}", level.text());
        }
        None => out.push_str("No services reported\n"),
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use xbl_status_client::protocol::RawServiceStatus;
    use xbl_status_client::status::normalize_services;

    use super::*;

    fn raw(name: &str, description: &str, color: &str) -> RawServiceStatus {
        RawServiceStatus {
            name: name.to_string(),
            description: description.to_string(),
            color: color.to_string(),
        }
    }

    #[test]
    fn test_render_success() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let result = FetchResult::succeeded(
            normalize_services(&[
                raw("Core", "", "#0c0"),
                raw("Marketplace", "Mostly Up", "#0c0"),
            ]),
            at,
        );

        let text = render(&result);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Xbox Live status (2025-01-02 03:04:05 UTC)");
        assert_eq!(
            lines[1],
            "  Core         Fully Operational   [green]"
        );
        assert_eq!(
            lines[2],
            "  Marketplace  Mostly Operational  [amber]  Mostly Up"
        );
        assert_eq!(lines[3], "Overall: Mostly Operational");
    }

    #[test]
    fn test_render_failure() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let result = FetchResult::failed("Operation timed out while receiving data.", at);

        assert_eq!(
            render(&result),
            "Status unavailable (2025-01-02 03:04:05 UTC): Operation timed out while receiving data.\n"
        );
    }

    #[test]
    fn test_render_empty_success() {
        let result = FetchResult::succeeded(Vec::new(), Utc::now());
        assert!(render(&result).ends_with("No services reported\n"));
    }
}
