use super::walk::{walk_elements, ClosedElement};
use super::{DocumentHandler, Findings, Probe};
use crate::error::HandlerError;
use crate::schema::DocumentSchema;
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const SPRING_SCHEMA: &str = "springframework.org/schema";
const MAX_LISTED_BEANS: usize = 20;
const MAX_LISTED: usize = 50;
/// Above this many beans an XML configuration gets hard to maintain
const LARGE_CONFIG_BEANS: u64 = 100;

/// Spring framework XML bean configurations
pub struct SpringHandler;

#[derive(Debug, Serialize)]
struct Bean {
    id: Option<String>,
    class: Option<String>,
    scope: String,
    lazy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
}

#[derive(Debug, Serialize)]
struct PropertySource {
    #[serde(rename = "type")]
    kind: &'static str,
    location: Option<String>,
}

#[derive(Debug, Default)]
struct SpringTally {
    version: Option<String>,
    beans: u64,
    listed_beans: Vec<Bean>,
    scopes: BTreeMap<String, u64>,
    lazy_beans: u64,
    classes: BTreeMap<String, u64>,
    profiles: BTreeSet<String>,
    imports: Vec<String>,
    /// Text of the `<value>` inside the property being read
    pending_value: Option<String>,
    /// `location` property of the bean being read
    pending_location: Option<String>,
    property_sources: Vec<PropertySource>,
    component_scans: Vec<String>,
}

/// Version of the first versioned Spring schema in an `xsi:schemaLocation`
fn schema_version(locations: &str) -> Option<String> {
    locations
        .split_whitespace()
        .filter(|location| location.contains(SPRING_SCHEMA))
        .filter_map(|location| location.strip_suffix(".xsd"))
        .filter_map(|stem| stem.rsplit('-').next())
        .find(|version| {
            version.contains('.') && version.chars().all(|c| c.is_ascii_digit() || c == '.')
        })
        .map(str::to_string)
}

impl SpringTally {
    fn observe(&mut self, element: &ClosedElement<'_>) {
        if let Some(profile) = element.attr("profile") {
            self.profiles.extend(
                profile
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string),
            );
        }

        match element.tag {
            "beans" if element.ancestors.is_empty() => {
                self.version = element.attr("schemaLocation").and_then(schema_version);
            }
            "bean" => self.close_bean(element),
            "value" if element.parent() == Some("property") => {
                self.pending_value = element.text();
            }
            "property" => {
                let value = self.pending_value.take();
                if element.attr("name") == Some("location") {
                    self.pending_location = element.attr("value").map(str::to_string).or(value);
                }
            }
            "property-placeholder" => {
                self.push_property_source(element.attr("location").map(str::to_string));
            }
            "import" => {
                if let Some(resource) = element.attr("resource") {
                    push_capped(&mut self.imports, resource.to_string());
                }
            }
            "component-scan" => {
                if let Some(package) = element.attr("base-package") {
                    push_capped(&mut self.component_scans, package.to_string());
                }
            }
            _ => {}
        }
    }

    fn close_bean(&mut self, element: &ClosedElement<'_>) {
        let location = self.pending_location.take();
        let class = element.attr("class").map(str::to_string);
        if class
            .as_deref()
            .map_or(false, |c| c.contains("PropertyPlaceholderConfigurer"))
        {
            self.push_property_source(location);
        }

        // Anonymous inner beans are not definitions of their own
        let Some(id) = element.attr("id").or_else(|| element.attr("name")) else {
            return;
        };
        let bean = Bean {
            id: Some(id.to_string()),
            scope: element.attr("scope").unwrap_or("singleton").to_string(),
            lazy: element.attr("lazy-init").unwrap_or("false").to_string(),
            parent: element.attr("parent").map(str::to_string),
            class,
        };

        self.beans += 1;
        *self.scopes.entry(bean.scope.clone()).or_insert(0) += 1;
        if bean.lazy == "true" {
            self.lazy_beans += 1;
        }
        if let Some(class) = &bean.class {
            *self.classes.entry(class.clone()).or_insert(0) += 1;
        }
        if self.listed_beans.len() < MAX_LISTED_BEANS {
            self.listed_beans.push(bean);
        }
    }

    fn push_property_source(&mut self, location: Option<String>) {
        push_capped(
            &mut self.property_sources,
            PropertySource {
                kind: "properties",
                location,
            },
        );
    }
}

fn push_capped<T>(items: &mut Vec<T>, item: T) {
    if items.len() < MAX_LISTED {
        items.push(item);
    }
}

/// True when a tag name or a bound namespace mentions one of `needles`
fn uses(schema: &DocumentSchema, needles: &[&str]) -> bool {
    let uris = schema.namespace_uris();
    needles.iter().any(|needle| {
        schema.elements.keys().any(|tag| tag.contains(needle))
            || uris.iter().any(|uri| uri.contains(needle))
    })
}

impl DocumentHandler for SpringHandler {
    fn name(&self) -> &str {
        "spring"
    }

    fn probe(&self, schema: &DocumentSchema) -> Probe {
        let indicators = ["schema/beans", "schema/context", "schema/mvc"];
        if schema.namespace_uris().iter().any(|uri| {
            uri.contains(SPRING_SCHEMA) && indicators.iter().any(|i| uri.contains(i))
        }) {
            Probe::applicable(1.0)
        } else if schema.root_element == "beans" {
            Probe::applicable(0.7)
        } else {
            Probe::not_applicable()
        }
    }

    fn analyze(&self, schema: &DocumentSchema, path: &Path) -> Result<Findings, HandlerError> {
        let mut tally = SpringTally::default();
        walk_elements(path, |element| tally.observe(element))?;

        if tally.beans == 0 && tally.imports.is_empty() && tally.component_scans.is_empty() {
            return Err(HandlerError::MissingData {
                handler: self.name().to_string(),
                what: "bean definitions".to_string(),
            });
        }

        let common_classes: BTreeMap<_, _> = tally
            .classes
            .iter()
            .filter(|(_, count)| **count > 1)
            .collect();
        let security = json!({
            "present": uses(schema, &["security"]),
            "authentication": uses(schema, &["authentication"]),
            "authorization": uses(schema, &["authorization", "access"]),
        });
        let configurations = json!({
            "transaction_management": uses(schema, &["transaction", "schema/tx"]),
            "caching": uses(schema, &["cache"]),
            "scheduling": uses(schema, &["task", "scheduling"]),
        });

        Ok(Findings::new("Spring Configuration")
            .finding("version", json!(tally.version))
            .finding(
                "beans",
                json!({
                    "count": tally.beans,
                    "by_scope": tally.scopes,
                    "lazy_count": tally.lazy_beans,
                    "common_classes": common_classes,
                }),
            )
            .finding("profiles", json!(tally.profiles))
            .finding("imports", json!(tally.imports))
            .finding("property_sources", json!(tally.property_sources))
            .finding("aop_config", json!(uses(schema, &["schema/aop", "aspect"])))
            .finding("security_config", security)
            .inventory("beans", tally.beans)
            .inventory("profiles", tally.profiles.len() as u64)
            .inventory("property_sources", tally.property_sources.len() as u64)
            .recommendations(&[
                "Review bean dependencies for circular references",
                "Check for hardcoded values that should be externalized",
                "Validate security configurations",
                "Consider migrating to annotation-based config",
            ])
            .ai_use_cases(&[
                "Dependency graph visualization",
                "Security misconfiguration detection",
                "Migration to modern Spring Boot",
                "Configuration optimization",
                "Circular dependency detection",
            ])
            .structured(json!({
                "bean_definitions": tally.listed_beans,
                "component_scans": tally.component_scans,
                "configurations": configurations,
            }))
            .metric(
                "maintainability",
                if tally.beans < LARGE_CONFIG_BEANS { 0.8 } else { 0.3 },
            )
            .metric(
                "flexibility",
                if tally.profiles.is_empty() { 0.5 } else { 1.0 },
            )
            .metric(
                "configuration_management",
                if tally.property_sources.is_empty() { 0.4 } else { 1.0 },
            ))
    }
}
