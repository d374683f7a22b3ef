use super::walk::{walk_elements, ClosedElement};
use super::{ratio, DocumentHandler, Findings, Probe};
use crate::error::HandlerError;
use crate::schema::DocumentSchema;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;

const MAX_LISTED_DEPENDENCIES: usize = 20;

/// Maven project object models
pub struct MavenHandler;

#[derive(Debug, Default, Clone, Serialize)]
struct Coordinates {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
}

impl Coordinates {
    fn set(&mut self, element: &ClosedElement<'_>) -> bool {
        let slot = match element.tag {
            "groupId" => &mut self.group_id,
            "artifactId" => &mut self.artifact_id,
            "version" => &mut self.version,
            _ => return false,
        };
        *slot = element.text();
        true
    }
}

#[derive(Debug, Default, Serialize)]
struct Dependency {
    #[serde(flatten)]
    coordinates: Coordinates,
    scope: Option<String>,
}

#[derive(Debug, Default)]
struct PomTally {
    project: Coordinates,
    packaging: Option<String>,
    model_version: Option<String>,
    name: Option<String>,
    description: Option<String>,
    url: Option<String>,
    parent: Option<Coordinates>,
    pending_parent: Coordinates,
    pending_dependency: Dependency,
    dependencies: Vec<Dependency>,
    managed_dependencies: u64,
    pending_plugin: Coordinates,
    plugins: Vec<Coordinates>,
    pending_repository: (Option<String>, Option<String>),
    repositories: Vec<(Option<String>, Option<String>)>,
    properties: BTreeMap<String, String>,
}

impl PomTally {
    fn observe(&mut self, element: &ClosedElement<'_>) {
        match element.parent() {
            Some("project") if element.ancestors.len() == 1 => {
                if !self.project.set(element) {
                    match element.tag {
                        "packaging" => self.packaging = element.text(),
                        "modelVersion" => self.model_version = element.text(),
                        "name" => self.name = element.text(),
                        "description" => self.description = element.text(),
                        "url" => self.url = element.text(),
                        "parent" => self.parent = Some(std::mem::take(&mut self.pending_parent)),
                        _ => {}
                    }
                }
            }
            Some("parent") => {
                self.pending_parent.set(element);
            }
            Some("dependency") => {
                if element.tag == "scope" {
                    self.pending_dependency.scope = element.text();
                } else {
                    self.pending_dependency.coordinates.set(element);
                }
            }
            Some("plugin") => {
                self.pending_plugin.set(element);
            }
            Some("repository") | Some("pluginRepository") => match element.tag {
                "id" => self.pending_repository.0 = element.text(),
                "url" => self.pending_repository.1 = element.text(),
                _ => {}
            },
            Some("properties") => {
                self.properties
                    .insert(element.tag.to_string(), element.text.to_string());
            }
            _ => {}
        }

        match element.tag {
            "dependency" => {
                let dependency = std::mem::take(&mut self.pending_dependency);
                if element.within("dependencyManagement") {
                    self.managed_dependencies += 1;
                } else {
                    self.dependencies.push(dependency);
                }
            }
            "plugin" => {
                let plugin = std::mem::take(&mut self.pending_plugin);
                self.plugins.push(plugin);
            }
            "repository" | "pluginRepository" => {
                let repository = std::mem::take(&mut self.pending_repository);
                self.repositories.push(repository);
            }
            _ => {}
        }
    }

    fn scopes(&self) -> BTreeMap<String, u64> {
        let mut scopes = BTreeMap::new();
        for dependency in &self.dependencies {
            let scope = dependency.scope.clone().unwrap_or_else(|| "compile".to_string());
            *scopes.entry(scope).or_insert(0) += 1;
        }
        scopes
    }
}

impl DocumentHandler for MavenHandler {
    fn name(&self) -> &str {
        "maven"
    }

    fn probe(&self, schema: &DocumentSchema) -> Probe {
        if schema.root_element != "project" {
            return Probe::not_applicable();
        }
        if schema
            .namespace_uris()
            .iter()
            .any(|uri| uri.contains("maven.apache.org"))
        {
            Probe::applicable(1.0)
        } else if schema.element("groupId").is_some() && schema.element("artifactId").is_some() {
            Probe::applicable(0.8)
        } else {
            Probe::not_applicable()
        }
    }

    fn analyze(&self, _schema: &DocumentSchema, path: &Path) -> Result<Findings, HandlerError> {
        let mut tally = PomTally::default();
        walk_elements(path, |element| tally.observe(element))?;

        // A child module may inherit its coordinates from the parent
        let group_id = tally
            .project
            .group_id
            .clone()
            .or_else(|| tally.parent.as_ref().and_then(|p| p.group_id.clone()));
        if group_id.is_none() || tally.project.artifact_id.is_none() {
            return Err(HandlerError::MissingData {
                handler: self.name().to_string(),
                what: "project coordinates".to_string(),
            });
        }

        let dependency_count = tally.dependencies.len() as u64;
        let versioned = tally
            .dependencies
            .iter()
            .filter(|d| d.coordinates.version.is_some())
            .count() as u64;
        let documented = [&tally.description, &tally.url]
            .iter()
            .filter(|field| field.is_some())
            .count() as u64;

        let repositories: Vec<_> = tally
            .repositories
            .iter()
            .map(|(id, url)| json!({"id": id, "url": url}))
            .collect();
        let listed: Vec<_> = tally
            .dependencies
            .iter()
            .take(MAX_LISTED_DEPENDENCIES)
            .collect();

        Ok(Findings::new("Maven POM")
            .finding(
                "project_info",
                json!({
                    "name": tally.name,
                    "description": tally.description,
                    "url": tally.url,
                    "parent": tally.parent,
                    "model_version": tally.model_version,
                }),
            )
            .finding(
                "dependencies",
                json!({
                    "count": dependency_count,
                    "by_scope": tally.scopes(),
                    "management": tally.managed_dependencies,
                }),
            )
            .finding("plugins", json!(tally.plugins))
            .finding("repositories", json!(repositories))
            .finding("properties", json!(tally.properties))
            .inventory("dependencies", dependency_count)
            .inventory("plugins", tally.plugins.len() as u64)
            .inventory("properties", tally.properties.len() as u64)
            .recommendations(&[
                "Analyze the dependency tree for known vulnerabilities",
                "Check for outdated dependencies",
                "Extract for software composition analysis",
                "Monitor for license compliance",
            ])
            .ai_use_cases(&[
                "Dependency vulnerability detection",
                "License compliance checking",
                "Build optimization recommendations",
                "Dependency update suggestions",
            ])
            .structured(json!({
                "coordinates": {
                    "group_id": group_id,
                    "artifact_id": tally.project.artifact_id,
                    "version": tally.project.version,
                    "packaging": tally.packaging.clone().unwrap_or_else(|| "jar".to_string()),
                },
                "dependencies": listed,
            }))
            .metric("completeness", documented as f64 / 2.0)
            .metric("dependency_management", ratio(versioned, dependency_count, 1.0))
            .metric(
                "best_practices",
                if tally.managed_dependencies > 0 { 0.8 } else { 0.4 },
            ))
    }
}
