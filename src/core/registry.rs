//! Static registry of the scanning tools the backend can run.
//!
//! Every tool declares its configurable option fields here, together with defaults,
//! bounds and per-choice annotations (time estimate, privilege requirement). Forms and
//! CLI prompts are built from this data, so every lookup is total: an unknown tool,
//! field or value degrades to a safe default instead of failing.

use crate::core::models::{OptionValue, ToolOptions};

/// One selectable value of a choice field.
#[derive(Debug)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    /// Rough wall-clock estimate shown next to the choice (e.g. "~3-5m").
    pub time: &'static str,
    /// Set when the backend needs elevated privileges to honour this choice.
    pub requires: Option<&'static str>,
}

/// A configurable parameter of a tool.
#[derive(Debug)]
pub enum OptionField {
    Choice {
        key: &'static str,
        label: &'static str,
        default: &'static str,
        choices: &'static [Choice],
    },
    Boolean {
        key: &'static str,
        label: &'static str,
        description: &'static str,
        default: bool,
    },
    /// Integer parameter with inclusive bounds.
    Numeric {
        key: &'static str,
        label: &'static str,
        description: &'static str,
        default: i64,
        min: i64,
        max: i64,
    },
}

impl OptionField {
    pub fn key(&self) -> &'static str {
        match self {
            OptionField::Choice { key, .. }
            | OptionField::Boolean { key, .. }
            | OptionField::Numeric { key, .. } => key,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OptionField::Choice { label, .. }
            | OptionField::Boolean { label, .. }
            | OptionField::Numeric { label, .. } => label,
        }
    }

    pub fn default_value(&self) -> OptionValue {
        match self {
            OptionField::Choice { default, .. } => OptionValue::Text(default.to_string()),
            OptionField::Boolean { default, .. } => OptionValue::Bool(*default),
            OptionField::Numeric { default, .. } => OptionValue::Integer(*default),
        }
    }

    /// Looks up a declared choice. Always `None` for boolean and numeric fields.
    pub fn choice(&self, value: &str) -> Option<&'static Choice> {
        match self {
            OptionField::Choice { choices, .. } => choices.iter().find(|c| c.value == value),
            _ => None,
        }
    }
}

/// A scanning tool and the options it accepts.
#[derive(Debug)]
pub struct ToolDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    /// Accent colour used by front ends when listing the tool.
    pub color: &'static str,
    pub configurable: bool,
    pub fields: &'static [OptionField],
}

impl ToolDefinition {
    pub fn field(&self, key: &str) -> Option<&'static OptionField> {
        // `fields` is 'static, so the borrow can outlive `self`.
        let fields: &'static [OptionField] = self.fields;
        fields.iter().find(|f| f.key() == key)
    }
}

/// The ordered list of every tool known to the console.
static TOOLS: &[ToolDefinition] = &[
    ToolDefinition {
        id: "nmap",
        label: "Nmap",
        description: "Network discovery and port scanning with service and OS fingerprinting.",
        color: "#3b82f6",
        configurable: true,
        fields: &[
            OptionField::Choice {
                key: "scan_type",
                label: "Scan Type",
                default: "standard",
                choices: &[
                    Choice {
                        value: "fast",
                        label: "Fast Scan",
                        description: "Top 100 TCP ports only.",
                        time: "~1-2m",
                        requires: None,
                    },
                    Choice {
                        value: "standard",
                        label: "Standard Scan",
                        description: "Top 1000 TCP ports with service detection.",
                        time: "~3-5m",
                        requires: None,
                    },
                    Choice {
                        value: "deep",
                        label: "Deep Scan",
                        description: "All 65535 TCP ports with version detection and default scripts.",
                        time: "~10-30m",
                        requires: None,
                    },
                    Choice {
                        value: "stealth",
                        label: "Stealth Scan",
                        description: "TCP SYN scan that never completes the handshake.",
                        time: "~5-10m",
                        requires: Some("Requires root privileges for raw SYN packets"),
                    },
                    Choice {
                        value: "udp",
                        label: "UDP Scan",
                        description: "Top 100 UDP ports.",
                        time: "~15-45m",
                        requires: Some("Requires root privileges for raw UDP probes"),
                    },
                ],
            },
            OptionField::Boolean {
                key: "service_detection",
                label: "Service Detection",
                description: "Probe open ports to identify service names and versions.",
                default: true,
            },
            OptionField::Boolean {
                key: "os_detection",
                label: "OS Detection",
                description: "Fingerprint the remote operating system.",
                default: false,
            },
            OptionField::Numeric {
                key: "timing",
                label: "Timing Template",
                description: "Nmap timing template, from T0 (paranoid) to T5 (insane).",
                default: 3,
                min: 0,
                max: 5,
            },
        ],
    },
    ToolDefinition {
        id: "nikto",
        label: "Nikto",
        description: "Web server scanner for dangerous files, outdated software and misconfigurations.",
        color: "#ef4444",
        configurable: true,
        fields: &[
            OptionField::Choice {
                key: "tuning",
                label: "Test Tuning",
                default: "standard",
                choices: &[
                    Choice {
                        value: "quick",
                        label: "Quick",
                        description: "Interesting files and misconfigurations only.",
                        time: "~2-5m",
                        requires: None,
                    },
                    Choice {
                        value: "standard",
                        label: "Standard",
                        description: "Default Nikto test set.",
                        time: "~5-15m",
                        requires: None,
                    },
                    Choice {
                        value: "full",
                        label: "Full",
                        description: "Every test category, including injection checks.",
                        time: "~20-60m",
                        requires: None,
                    },
                ],
            },
            OptionField::Boolean {
                key: "ssl",
                label: "Force SSL",
                description: "Connect over TLS even on non-standard ports.",
                default: false,
            },
            OptionField::Numeric {
                key: "timeout",
                label: "Request Timeout (s)",
                description: "Seconds to wait for each request.",
                default: 10,
                min: 1,
                max: 120,
            },
        ],
    },
    ToolDefinition {
        id: "nuclei",
        label: "Nuclei",
        description: "Template-based vulnerability scanner.",
        color: "#8b5cf6",
        configurable: true,
        fields: &[
            OptionField::Choice {
                key: "severity",
                label: "Minimum Severity",
                default: "medium",
                choices: &[
                    Choice {
                        value: "critical",
                        label: "Critical Only",
                        description: "Only templates rated critical.",
                        time: "~1-3m",
                        requires: None,
                    },
                    Choice {
                        value: "high",
                        label: "High and Above",
                        description: "Critical and high severity templates.",
                        time: "~3-8m",
                        requires: None,
                    },
                    Choice {
                        value: "medium",
                        label: "Medium and Above",
                        description: "Critical, high and medium severity templates.",
                        time: "~5-15m",
                        requires: None,
                    },
                    Choice {
                        value: "all",
                        label: "All Templates",
                        description: "Every template, informational ones included.",
                        time: "~15-40m",
                        requires: None,
                    },
                ],
            },
            OptionField::Numeric {
                key: "rate_limit",
                label: "Rate Limit (req/s)",
                description: "Maximum requests per second sent to the target.",
                default: 150,
                min: 1,
                max: 1000,
            },
        ],
    },
    ToolDefinition {
        id: "sqlmap",
        label: "SQLMap",
        description: "Automatic SQL injection detection.",
        color: "#f59e0b",
        configurable: true,
        fields: &[
            OptionField::Numeric {
                key: "level",
                label: "Level",
                description: "Breadth of tests performed (1-5).",
                default: 1,
                min: 1,
                max: 5,
            },
            OptionField::Numeric {
                key: "risk",
                label: "Risk",
                description: "Riskiness of payloads used (1-3).",
                default: 1,
                min: 1,
                max: 3,
            },
            OptionField::Boolean {
                key: "crawl",
                label: "Crawl Target",
                description: "Crawl the site to discover additional injection points.",
                default: false,
            },
        ],
    },
    ToolDefinition {
        id: "gobuster",
        label: "Gobuster",
        description: "Directory and file brute forcing.",
        color: "#10b981",
        configurable: true,
        fields: &[
            OptionField::Choice {
                key: "wordlist",
                label: "Wordlist",
                default: "common",
                choices: &[
                    Choice {
                        value: "common",
                        label: "Common (4.6k entries)",
                        description: "Frequently seen paths.",
                        time: "~1-3m",
                        requires: None,
                    },
                    Choice {
                        value: "medium",
                        label: "Medium (220k entries)",
                        description: "DirBuster medium list.",
                        time: "~15-30m",
                        requires: None,
                    },
                    Choice {
                        value: "big",
                        label: "Big (20k entries)",
                        description: "SecLists big.txt.",
                        time: "~5-10m",
                        requires: None,
                    },
                ],
            },
            OptionField::Numeric {
                key: "threads",
                label: "Threads",
                description: "Concurrent requests.",
                default: 10,
                min: 1,
                max: 50,
            },
        ],
    },
    ToolDefinition {
        id: "whatweb",
        label: "WhatWeb",
        description: "Web technology fingerprinting.",
        color: "#06b6d4",
        configurable: true,
        fields: &[OptionField::Choice {
            key: "aggression",
            label: "Aggression",
            default: "stealthy",
            choices: &[
                Choice {
                    value: "stealthy",
                    label: "Stealthy",
                    description: "One request per target.",
                    time: "~10s",
                    requires: None,
                },
                Choice {
                    value: "aggressive",
                    label: "Aggressive",
                    description: "Additional requests when a plugin matches.",
                    time: "~1m",
                    requires: None,
                },
            ],
        }],
    },
    ToolDefinition {
        id: "sslscan",
        label: "SSLScan",
        description: "TLS protocol and cipher suite enumeration.",
        color: "#64748b",
        configurable: false,
        fields: &[],
    },
];

/// All registered tools, in display order.
pub fn tools() -> &'static [ToolDefinition] {
    TOOLS
}

pub fn get_tool(id: &str) -> Option<&'static ToolDefinition> {
    TOOLS.iter().find(|tool| tool.id == id)
}

/// Default option payload for a tool. Empty when the tool is unknown or has no fields.
pub fn get_tool_defaults(id: &str) -> ToolOptions {
    get_tool(id)
        .map(|tool| {
            tool.fields
                .iter()
                .map(|field| (field.key().to_string(), field.default_value()))
                .collect()
        })
        .unwrap_or_default()
}

pub fn is_configurable(id: &str) -> bool {
    get_tool(id).is_some_and(|tool| tool.configurable)
}

fn find_choice(tool_id: &str, field_key: &str, value: &str) -> Option<&'static Choice> {
    get_tool(tool_id)?.field(field_key)?.choice(value)
}

/// Human label of a chosen value, or the raw value when nothing matches.
pub fn get_option_label(tool_id: &str, field_key: &str, value: &str) -> String {
    find_choice(tool_id, field_key, value)
        .map(|choice| choice.label.to_string())
        .unwrap_or_else(|| value.to_string())
}

/// Time estimate of a chosen value, or an empty string when nothing matches.
pub fn get_option_time(tool_id: &str, field_key: &str, value: &str) -> String {
    find_choice(tool_id, field_key, value)
        .map(|choice| choice.time.to_string())
        .unwrap_or_default()
}

pub fn requires_root(tool_id: &str, field_key: &str, value: &str) -> bool {
    find_choice(tool_id, field_key, value).is_some_and(|choice| choice.requires.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tool_ids_are_unique() {
        let mut seen = HashSet::new();
        for tool in tools() {
            assert!(seen.insert(tool.id), "duplicate tool id {}", tool.id);
        }
    }

    #[test]
    fn non_configurable_tools_declare_no_fields() {
        for tool in tools().iter().filter(|t| !t.configurable) {
            assert!(tool.fields.is_empty(), "{} has fields", tool.id);
        }
    }

    #[test]
    fn field_keys_are_unique_per_tool() {
        for tool in tools() {
            let mut seen = HashSet::new();
            for field in tool.fields {
                assert!(seen.insert(field.key()), "{}.{} declared twice", tool.id, field.key());
            }
        }
    }

    #[test]
    fn choice_defaults_are_declared_choices() {
        for tool in tools() {
            let defaults = get_tool_defaults(tool.id);
            for field in tool.fields {
                if let OptionField::Choice { key, default, choices, .. } = field {
                    assert!(choices.iter().any(|c| c.value == *default), "{}.{}", tool.id, key);
                    assert_eq!(defaults[*key], OptionValue::Text(default.to_string()));
                }
            }
        }
    }

    #[test]
    fn numeric_defaults_are_within_bounds() {
        for tool in tools() {
            for field in tool.fields {
                if let OptionField::Numeric { key, default, min, max, .. } = field {
                    assert!(min <= default && default <= max, "{}.{}", tool.id, key);
                }
            }
        }
    }

    #[test]
    fn every_choice_label_round_trips() {
        for tool in tools() {
            for field in tool.fields {
                if let OptionField::Choice { key, choices, .. } = field {
                    for choice in *choices {
                        assert_eq!(get_option_label(tool.id, key, choice.value), choice.label);
                    }
                }
            }
        }
    }

    #[test]
    fn unknown_input_degrades_to_safe_defaults() {
        assert!(get_tool("masscan").is_none());
        assert!(get_tool_defaults("masscan").is_empty());
        assert!(!is_configurable("masscan"));
        assert_eq!(get_option_label("masscan", "scan_type", "fast"), "fast");
        assert_eq!(get_option_label("nmap", "bogus", "fast"), "fast");
        assert_eq!(get_option_label("nmap", "scan_type", "bogus"), "bogus");
        assert_eq!(get_option_time("masscan", "scan_type", "deep"), "");
        assert_eq!(get_option_time("nmap", "timing", "3"), "");
        assert!(!requires_root("masscan", "scan_type", "stealth"));
        assert!(!requires_root("nmap", "os_detection", "true"));
    }

    #[test]
    fn nmap_annotations() {
        assert_eq!(get_option_time("nmap", "scan_type", "deep"), "~10-30m");
        assert!(requires_root("nmap", "scan_type", "stealth"));
        assert!(!requires_root("nmap", "scan_type", "fast"));
        assert_eq!(get_option_label("nmap", "scan_type", "stealth"), "Stealth Scan");
    }

    #[test]
    fn tools_without_fields_have_empty_defaults() {
        assert!(get_tool("sslscan").is_some());
        assert!(!is_configurable("sslscan"));
        assert!(get_tool_defaults("sslscan").is_empty());
    }

    #[test]
    fn nmap_defaults_cover_every_field() {
        let defaults = get_tool_defaults("nmap");
        assert_eq!(defaults.len(), 4);
        assert_eq!(defaults["scan_type"], OptionValue::Text("standard".into()));
        assert_eq!(defaults["service_detection"], OptionValue::Bool(true));
        assert_eq!(defaults["timing"], OptionValue::Integer(3));
    }
}
