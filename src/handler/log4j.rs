use super::walk::{walk_elements, ClosedElement};
use super::{DocumentHandler, Findings, Probe};
use crate::error::HandlerError;
use crate::schema::DocumentSchema;
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const MAX_LISTED: usize = 50;
const JNDI_LOOKUP: &str = "${jndi:";

/// Log4j 1.x and 2.x XML configurations
pub struct Log4jHandler;

#[derive(Debug, Serialize)]
struct Appender {
    name: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<String>,
}

#[derive(Debug, Serialize)]
struct Logger {
    name: String,
    level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    additivity: Option<String>,
}

/// Appender kind from a 1.x appender class name
fn appender_kind(class: &str) -> &'static str {
    if class.contains("RollingFileAppender") {
        "RollingFile"
    } else if class.contains("FileAppender") {
        "File"
    } else if class.contains("ConsoleAppender") {
        "Console"
    } else if class.contains("SocketAppender") {
        "Socket"
    } else {
        "Other"
    }
}

#[derive(Debug, Default)]
struct Log4jTally {
    is_v2: bool,
    appenders: u64,
    listed_appenders: Vec<Appender>,
    rolling_appenders: u64,
    loggers: u64,
    listed_loggers: Vec<Logger>,
    /// Level of the 1.x logger being read
    pending_level: Option<String>,
    levels: BTreeMap<String, u64>,
    concerns: BTreeSet<&'static str>,
    settings: BTreeMap<&'static str, Option<String>>,
}

impl Log4jTally {
    fn observe(&mut self, element: &ClosedElement<'_>) {
        if element.text.contains(JNDI_LOOKUP)
            || element.attributes.iter().any(|a| a.value.contains(JNDI_LOOKUP))
        {
            self.concerns.insert("Potential JNDI lookup pattern detected");
        }

        if element.ancestors.is_empty() {
            self.observe_root(element);
        } else if self.is_v2 {
            self.observe_v2(element);
        } else {
            self.observe_v1(element);
        }
    }

    fn observe_root(&mut self, element: &ClosedElement<'_>) {
        let attr = |name: &str| element.attr(name).map(str::to_string);
        if self.is_v2 {
            self.settings
                .insert("status", attr("status").or_else(|| Some("ERROR".to_string())));
            self.settings.insert("monitorInterval", attr("monitorInterval"));
        } else {
            self.settings.insert("threshold", attr("threshold"));
            self.settings
                .insert("debug", attr("debug").or_else(|| Some("false".to_string())));
        }
    }

    fn observe_v2(&mut self, element: &ClosedElement<'_>) {
        if let Some(level) = element.attr("level") {
            self.count_level(level);
        }

        match element.parent() {
            Some("Appenders") => {
                let target = match element.tag {
                    "File" | "RollingFile" => element.attr("fileName").map(str::to_string),
                    "Console" => Some(element.attr("target").unwrap_or("SYSTEM_OUT").to_string()),
                    _ => None,
                };
                if element.tag == "Socket" {
                    self.concerns.insert("External socket appender detected");
                }
                self.add_appender(Appender {
                    name: element.attr("name").map(str::to_string),
                    kind: element.tag.to_string(),
                    class: None,
                    target,
                });
            }
            Some("Loggers") => {
                let name = match (element.attr("name"), element.tag) {
                    (Some(name), _) => name.to_string(),
                    (None, "Root" | "AsyncRoot") => "ROOT".to_string(),
                    (None, _) => String::new(),
                };
                self.add_logger(Logger {
                    name,
                    level: element.attr("level").map(str::to_string),
                    additivity: Some(element.attr("additivity").unwrap_or("true").to_string()),
                });
            }
            _ => {}
        }
    }

    fn observe_v1(&mut self, element: &ClosedElement<'_>) {
        match element.tag {
            "level" | "priority" => {
                if let Some(level) = element.attr("value").filter(|v| !v.is_empty()) {
                    self.count_level(level);
                    if matches!(element.parent(), Some("logger" | "root")) {
                        self.pending_level = Some(level.to_string());
                    }
                }
            }
            "appender" => {
                let class = element.attr("class").map(str::to_string);
                let kind = appender_kind(class.as_deref().unwrap_or_default());
                if kind == "Socket" {
                    self.concerns.insert("External socket appender detected");
                }
                self.add_appender(Appender {
                    name: element.attr("name").map(str::to_string),
                    kind: kind.to_string(),
                    class,
                    target: None,
                });
            }
            "logger" | "root" => {
                let name = match element.tag {
                    "root" => "ROOT".to_string(),
                    _ => element.attr("name").unwrap_or_default().to_string(),
                };
                let level = self.pending_level.take();
                self.add_logger(Logger {
                    name,
                    level,
                    additivity: None,
                });
            }
            _ => {}
        }
    }

    fn count_level(&mut self, level: &str) {
        *self.levels.entry(level.to_uppercase()).or_insert(0) += 1;
    }

    fn add_appender(&mut self, appender: Appender) {
        self.appenders += 1;
        if appender.kind.contains("Rolling") {
            self.rolling_appenders += 1;
        }
        if self.listed_appenders.len() < MAX_LISTED {
            self.listed_appenders.push(appender);
        }
    }

    fn add_logger(&mut self, logger: Logger) {
        self.loggers += 1;
        if self.listed_loggers.len() < MAX_LISTED {
            self.listed_loggers.push(logger);
        }
    }
}

impl DocumentHandler for Log4jHandler {
    fn name(&self) -> &str {
        "log4j"
    }

    fn probe(&self, schema: &DocumentSchema) -> Probe {
        match schema.root_element.as_str() {
            // 1.x documents use the `log4j:` prefix
            "configuration"
                if schema
                    .namespace_uris()
                    .iter()
                    .any(|uri| uri.contains("log4j")) =>
            {
                Probe::applicable(1.0)
            }
            "Configuration"
                if schema.element("Appenders").is_some() || schema.element("Loggers").is_some() =>
            {
                Probe::applicable(0.9)
            }
            _ => Probe::not_applicable(),
        }
    }

    fn analyze(&self, schema: &DocumentSchema, path: &Path) -> Result<Findings, HandlerError> {
        let mut tally = Log4jTally {
            is_v2: schema.root_element == "Configuration",
            ..Log4jTally::default()
        };
        walk_elements(path, |element| tally.observe(element))?;

        if tally.appenders == 0 && tally.loggers == 0 {
            return Err(HandlerError::MissingData {
                handler: self.name().to_string(),
                what: "appenders or loggers".to_string(),
            });
        }

        let version = if tally.is_v2 { "2.x" } else { "1.x" };
        let debug_levels = tally.levels.get("DEBUG").copied().unwrap_or(0);

        Ok(Findings::new("Log4j Configuration")
            .finding("version", json!(version))
            .finding("appenders", json!(tally.listed_appenders))
            .finding("loggers", json!(tally.listed_loggers))
            .finding("log_levels", json!(tally.levels))
            .finding("security_concerns", json!(tally.concerns))
            .inventory("appenders", tally.appenders)
            .inventory("loggers", tally.loggers)
            .recommendations(&[
                "Review log levels for production appropriateness",
                "Check for sensitive data in log patterns",
                "Ensure file appenders have proper rotation",
                "Validate external appender destinations",
            ])
            .ai_use_cases(&[
                "Log level optimization",
                "Security configuration analysis",
                "Performance impact assessment",
                "Compliance checking for log retention",
                "Sensitive data detection in patterns",
            ])
            .structured(json!({
                "appender_configs": tally.listed_appenders,
                "logger_configs": tally.listed_loggers,
                "global_settings": tally.settings,
            }))
            .metric(
                "security",
                if tally.concerns.is_empty() { 1.0 } else { 0.3 },
            )
            .metric("production_ready", if debug_levels < 5 { 1.0 } else { 0.5 })
            .metric(
                "reliability",
                if tally.rolling_appenders > 0 { 1.0 } else { 0.6 },
            ))
    }
}
