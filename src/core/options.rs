//! Builds and validates the option payload submitted with a scan.
//!
//! Defaults come from the registry; user overrides are checked against the declared
//! field kind, declared choices and numeric bounds before they reach the backend.

use crate::core::models::{OptionValue, ScanOptions};
use crate::core::registry::{self, OptionField};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;
use url::{Host, Url};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OptionError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),
    #[error("tool '{tool}' has no option '{field}'")]
    UnknownField { tool: String, field: String },
    #[error("option '{tool}.{field}' was set but tool '{tool}' is not selected")]
    ToolNotSelected { tool: String, field: String },
    #[error("option '{tool}.{field}' expects {expected}, got '{value}'")]
    TypeMismatch {
        tool: String,
        field: String,
        expected: &'static str,
        value: String,
    },
    #[error("'{value}' is not a valid choice for '{tool}.{field}' (expected one of: {allowed})")]
    InvalidChoice {
        tool: String,
        field: String,
        value: String,
        allowed: String,
    },
    #[error("option '{tool}.{field}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        tool: String,
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("malformed override '{0}' (expected TOOL.FIELD=VALUE)")]
    MalformedOverride(String),
    #[error("invalid scan target '{0}' (expected a host name, IP address or http(s) URL)")]
    InvalidTarget(String),
}

/// A user-supplied value for one field of one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionOverride {
    pub tool: String,
    pub field: String,
    pub value: OptionValue,
}

/// One line of the pre-submission summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSummary {
    pub tool: String,
    pub field: String,
    pub field_label: String,
    pub value_label: String,
    /// Empty when the value carries no time estimate.
    pub time: String,
    pub requires_root: bool,
}

/// Parses `tool.field=value`, typing the value after the field's declared kind.
pub fn parse_override(raw: &str) -> Result<OptionOverride, OptionError> {
    let malformed = || OptionError::MalformedOverride(raw.to_string());
    let (path, value) = raw.split_once('=').ok_or_else(malformed)?;
    let (tool, field) = path.trim().split_once('.').ok_or_else(malformed)?;
    let (tool, field, value) = (tool.trim(), field.trim(), value.trim());
    if tool.is_empty() || field.is_empty() {
        return Err(malformed());
    }

    let definition = registry::get_tool(tool).ok_or_else(|| OptionError::UnknownTool(tool.to_string()))?;
    let declared = definition.field(field).ok_or_else(|| OptionError::UnknownField {
        tool: tool.to_string(),
        field: field.to_string(),
    })?;

    let mismatch = |expected: &'static str| OptionError::TypeMismatch {
        tool: tool.to_string(),
        field: field.to_string(),
        expected,
        value: value.to_string(),
    };
    let value = match declared {
        OptionField::Choice { .. } => OptionValue::Text(value.to_string()),
        OptionField::Boolean { .. } => match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => OptionValue::Bool(true),
            "false" | "no" | "off" | "0" => OptionValue::Bool(false),
            _ => return Err(mismatch("a boolean")),
        },
        OptionField::Numeric { .. } => OptionValue::Integer(value.parse().map_err(|_| mismatch("an integer"))?),
    };

    Ok(OptionOverride {
        tool: tool.to_string(),
        field: field.to_string(),
        value,
    })
}

/// Checks that a scan target is a host, an IP address or an http(s) URL, and trims it.
pub fn normalize_target(raw: &str) -> Result<String, OptionError> {
    let target = raw.trim();
    let invalid = || OptionError::InvalidTarget(raw.to_string());
    if target.is_empty() || target.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    if target.contains("://") {
        let url = Url::parse(target).map_err(|_| invalid())?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(invalid());
        }
    } else {
        // Allow an optional port on bare hosts.
        let host = match target.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') && port.parse::<u16>().is_ok() => host,
            _ => target,
        };
        Host::parse(host).map_err(|_| invalid())?;
    }
    Ok(target.to_string())
}

/// Merges registry defaults for every selected tool with validated overrides.
///
/// Tools without configurable fields still get an (empty) entry so the backend sees
/// every selected tool in `options`.
pub fn build_scan_options(tools: &[String], overrides: &[OptionOverride]) -> Result<ScanOptions, OptionError> {
    let mut options = ScanOptions::new();
    for tool in tools {
        if registry::get_tool(tool).is_none() {
            return Err(OptionError::UnknownTool(tool.clone()));
        }
        options.insert(tool.clone(), registry::get_tool_defaults(tool));
    }

    for item in overrides {
        validate_override(item)?;
        let tool_options = options.get_mut(&item.tool).ok_or_else(|| OptionError::ToolNotSelected {
            tool: item.tool.clone(),
            field: item.field.clone(),
        })?;
        debug!(tool = %item.tool, field = %item.field, value = %item.value, "Applying option override.");
        tool_options.insert(item.field.clone(), item.value.clone());
    }

    Ok(options)
}

fn validate_override(item: &OptionOverride) -> Result<(), OptionError> {
    let tool = registry::get_tool(&item.tool).ok_or_else(|| OptionError::UnknownTool(item.tool.clone()))?;
    let field = tool.field(&item.field).ok_or_else(|| OptionError::UnknownField {
        tool: item.tool.clone(),
        field: item.field.clone(),
    })?;
    let mismatch = |expected: &'static str| OptionError::TypeMismatch {
        tool: item.tool.clone(),
        field: item.field.clone(),
        expected,
        value: item.value.to_string(),
    };

    match (field, &item.value) {
        (OptionField::Choice { choices, .. }, OptionValue::Text(value)) => {
            if field.choice(value).is_none() {
                return Err(OptionError::InvalidChoice {
                    tool: item.tool.clone(),
                    field: item.field.clone(),
                    value: value.clone(),
                    allowed: choices.iter().map(|c| c.value).collect::<Vec<_>>().join(", "),
                });
            }
        }
        (OptionField::Choice { .. }, _) => return Err(mismatch("a choice")),
        (OptionField::Boolean { .. }, OptionValue::Bool(_)) => {}
        (OptionField::Boolean { .. }, _) => return Err(mismatch("a boolean")),
        (OptionField::Numeric { min, max, .. }, OptionValue::Integer(value)) => {
            if value < min || value > max {
                return Err(OptionError::OutOfRange {
                    tool: item.tool.clone(),
                    field: item.field.clone(),
                    value: *value,
                    min: *min,
                    max: *max,
                });
            }
        }
        (OptionField::Numeric { .. }, _) => return Err(mismatch("an integer")),
    }
    Ok(())
}

/// Describes every configured value in registry order, with labels resolved.
pub fn summarize_selection(options: &ScanOptions) -> Vec<OptionSummary> {
    let mut lines = Vec::new();
    for (tool_id, values) in options {
        let ordered: BTreeMap<(usize, &String), &OptionValue> = values
            .iter()
            .map(|(key, value)| ((field_position(tool_id, key), key), value))
            .collect();

        for ((_, field_key), value) in ordered {
            let raw = value.to_string();
            let field_label = registry::get_tool(tool_id)
                .and_then(|tool| tool.field(field_key))
                .map(|field| field.label().to_string())
                .unwrap_or_else(|| field_key.clone());
            lines.push(OptionSummary {
                tool: tool_id.clone(),
                field: field_key.clone(),
                field_label,
                value_label: registry::get_option_label(tool_id, field_key, &raw),
                time: registry::get_option_time(tool_id, field_key, &raw),
                requires_root: registry::requires_root(tool_id, field_key, &raw),
            });
        }
    }
    lines
}

/// Whether any selected value needs the backend to run with elevated privileges.
pub fn requires_elevation(options: &ScanOptions) -> bool {
    options.iter().any(|(tool_id, values)| {
        values
            .iter()
            .filter_map(|(key, value)| value.as_text().map(|v| (key, v)))
            .any(|(key, value)| registry::requires_root(tool_id, key, value))
    })
}

// Unknown keys sort after declared ones, in key order.
fn field_position(tool_id: &str, key: &str) -> usize {
    registry::get_tool(tool_id)
        .and_then(|tool| tool.fields.iter().position(|f| f.key() == key))
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected(tools: &[&str]) -> Vec<String> {
        tools.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn defaults_are_used_without_overrides() {
        let options = build_scan_options(&selected(&["nmap", "sslscan"]), &[]).unwrap();

        assert_eq!(options.len(), 2);
        assert_eq!(options["nmap"], registry::get_tool_defaults("nmap"));
        assert!(options["sslscan"].is_empty());
    }

    #[test]
    fn overrides_replace_defaults() {
        let overrides = vec![
            parse_override("nmap.scan_type=deep").unwrap(),
            parse_override("nmap.timing=4").unwrap(),
            parse_override("nmap.os_detection=yes").unwrap(),
        ];
        let options = build_scan_options(&selected(&["nmap"]), &overrides).unwrap();

        assert_eq!(options["nmap"]["scan_type"], OptionValue::Text("deep".into()));
        assert_eq!(options["nmap"]["timing"], OptionValue::Integer(4));
        assert_eq!(options["nmap"]["os_detection"], OptionValue::Bool(true));
        assert_eq!(options["nmap"]["service_detection"], OptionValue::Bool(true));
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        assert!(matches!(
            parse_override("nmap.scan_type"),
            Err(OptionError::MalformedOverride(_))
        ));
        assert!(matches!(parse_override("masscan.rate=1"), Err(OptionError::UnknownTool(_))));
        assert!(matches!(
            parse_override("nmap.ports=80"),
            Err(OptionError::UnknownField { .. })
        ));
        assert!(matches!(
            parse_override("nmap.timing=fast"),
            Err(OptionError::TypeMismatch { .. })
        ));

        let bad_choice = parse_override("nmap.scan_type=ludicrous").unwrap();
        assert!(matches!(
            build_scan_options(&selected(&["nmap"]), &[bad_choice]),
            Err(OptionError::InvalidChoice { .. })
        ));

        let too_fast = parse_override("nmap.timing=9").unwrap();
        assert_eq!(
            build_scan_options(&selected(&["nmap"]), &[too_fast]),
            Err(OptionError::OutOfRange {
                tool: "nmap".into(),
                field: "timing".into(),
                value: 9,
                min: 0,
                max: 5,
            })
        );
    }

    #[test]
    fn override_for_unselected_tool_is_rejected() {
        let item = parse_override("nikto.ssl=true").unwrap();
        assert!(matches!(
            build_scan_options(&selected(&["nmap"]), &[item]),
            Err(OptionError::ToolNotSelected { .. })
        ));
    }

    #[test]
    fn unknown_selected_tool_is_rejected() {
        assert_eq!(
            build_scan_options(&selected(&["masscan"]), &[]),
            Err(OptionError::UnknownTool("masscan".into()))
        );
    }

    #[test]
    fn summary_resolves_labels_in_registry_order() {
        let overrides = vec![parse_override("nmap.scan_type=stealth").unwrap()];
        let options = build_scan_options(&selected(&["nmap"]), &overrides).unwrap();
        let summary = summarize_selection(&options);

        let fields: Vec<&str> = summary.iter().map(|s| s.field.as_str()).collect();
        assert_eq!(fields, ["scan_type", "service_detection", "os_detection", "timing"]);

        let scan_type = &summary[0];
        assert_eq!(scan_type.field_label, "Scan Type");
        assert_eq!(scan_type.value_label, "Stealth Scan");
        assert_eq!(scan_type.time, "~5-10m");
        assert!(scan_type.requires_root);
        assert_eq!(summary[3].value_label, "3");
        assert!(requires_elevation(&options));
    }

    #[test]
    fn targets_are_validated() {
        assert_eq!(normalize_target("  scanme.nmap.org ").unwrap(), "scanme.nmap.org");
        assert_eq!(normalize_target("10.0.0.5:8080").unwrap(), "10.0.0.5:8080");
        assert_eq!(normalize_target("https://example.com/login").unwrap(), "https://example.com/login");
        assert_eq!(normalize_target("[::1]").unwrap(), "[::1]");

        for bad in ["", "   ", "exa mple.com", "ftp://example.com", "http://", "bad<host>"] {
            assert!(
                matches!(normalize_target(bad), Err(OptionError::InvalidTarget(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn default_selection_needs_no_elevation() {
        let options = build_scan_options(&selected(&["nmap", "nikto", "nuclei"]), &[]).unwrap();
        assert!(!requires_elevation(&options));
    }
}
