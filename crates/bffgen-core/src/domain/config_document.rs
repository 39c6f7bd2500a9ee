//! Raw config documents and their conversion into a [`ConfigModel`].
//!
//! Two dialects exist and either may be written as YAML or JSON:
//!
//! ```yaml
//! # services dialect (Go projects)
//! services:
//!   users:
//!     baseUrl: http://localhost:4000
//!     endpoints:
//!       - name: list-users
//!         path: /users
//!         method: GET
//!         exposeAs: /api/users
//! settings:
//!   port: 8080
//!   timeout: 30s
//!   retries: 3
//! ```
//!
//! ```json
//! { "project": { "name": "web-bff" },
//!   "backends": [
//!     { "name": "users", "baseUrl": "http://localhost:4000",
//!       "endpoints": [ { "name": "list-users", "path": "/users",
//!                        "method": "GET", "exposeAs": "/api/users" } ] } ] }
//! ```
//!
//! A top-level `backends` key selects the backends dialect. Fields are
//! deserialized leniently (`Option` + `default`) and then validated here so
//! every failure can name the exact field that caused it.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::config_model::{
    ConfigFormat, ConfigModel, Endpoint, HttpMethod, ProjectType, ServiceConfig, Settings,
    parse_duration, validate_base_url, validate_route_path, validate_service_name,
};
use crate::domain::error::DomainError;

/// A parsed but not yet validated config document.
#[derive(Debug, Clone)]
pub enum ConfigDocument {
    Services(ServicesDocument),
    Backends(BackendsDocument),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicesDocument {
    #[serde(default)]
    pub project: Option<RawProject>,
    #[serde(default)]
    pub services: BTreeMap<String, RawService>,
    #[serde(default)]
    pub settings: RawSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendsDocument {
    #[serde(default)]
    pub project: Option<RawProject>,
    #[serde(default)]
    pub backends: Vec<RawService>,
    #[serde(default)]
    pub server: RawSettings,
    #[serde(default)]
    pub settings: RawSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProject {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawService {
    /// Only read in the backends dialect; services are keyed by map key.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<RawEndpoint>,
    #[serde(default)]
    pub timeout: Option<RawDuration>,
    #[serde(default)]
    pub retries: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEndpoint {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub expose_as: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSettings {
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub timeout: Option<RawDuration>,
    #[serde(default)]
    pub retries: Option<u32>,
}

/// Either `"30s"`-style text or a bare millisecond count.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDuration {
    Millis(u64),
    Text(String),
}

impl RawDuration {
    fn resolve(&self, field: &str) -> Result<Duration, DomainError> {
        match self {
            Self::Millis(ms) => Ok(Duration::from_millis(*ms)),
            Self::Text(text) => parse_duration(field, text),
        }
    }
}

impl ConfigDocument {
    /// Parse text into the dialect it declares.
    pub fn parse(text: &str, format: ConfigFormat) -> Result<Self, DomainError> {
        if text.trim().is_empty() {
            return Ok(Self::Services(ServicesDocument::default()));
        }
        let value: serde_json::Value = match format {
            ConfigFormat::Json => serde_json::from_str(text)
                .map_err(|e| DomainError::parse(format!("malformed JSON: {e}")))?,
            ConfigFormat::Yaml => serde_yaml::from_str(text)
                .map_err(|e| DomainError::parse(format!("malformed YAML: {e}")))?,
        };

        let value = match value {
            serde_json::Value::Object(_) => value,
            // A comment-only YAML file: no services.
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            _ => return Err(DomainError::parse("top level must be a mapping")),
        };

        if value.get("backends").is_some() {
            serde_json::from_value(value)
                .map(Self::Backends)
                .map_err(|e| DomainError::parse(e.to_string()))
        } else {
            serde_json::from_value(value)
                .map(Self::Services)
                .map_err(|e| DomainError::parse(e.to_string()))
        }
    }

    pub fn project_type(&self) -> ProjectType {
        match self {
            Self::Services(_) => ProjectType::Go,
            Self::Backends(_) => ProjectType::NodeJs,
        }
    }

    /// Validate every field and build the model. Stops at the first error.
    pub fn into_model(self) -> Result<ConfigModel, DomainError> {
        let project_type = self.project_type();
        match self {
            Self::Services(doc) => {
                let settings = resolve_settings("settings", &doc.settings, Settings::default())?;
                let mut services = BTreeMap::new();
                for (name, raw) in &doc.services {
                    let field = format!("services.{}", name.escape_debug());
                    validate_service_name(&field, name)?;
                    let service = build_service(&field, name, raw)?;
                    services.insert(name.clone(), service);
                }
                Ok(ConfigModel {
                    project_name: doc.project.and_then(|p| p.name),
                    project_type,
                    services,
                    settings,
                })
            }
            Self::Backends(doc) => {
                let settings = resolve_settings("settings", &doc.settings, Settings::default())?;
                let settings = resolve_settings("server", &doc.server, settings)?;
                let mut services = BTreeMap::new();
                for (idx, raw) in doc.backends.iter().enumerate() {
                    let field = format!("backends[{idx}]");
                    let name = raw
                        .name
                        .as_deref()
                        .map(str::trim)
                        .filter(|n| !n.is_empty())
                        .ok_or_else(|| {
                            DomainError::field(format!("{field}.name"), "must not be empty")
                        })?;
                    validate_service_name(&format!("{field}.name"), name)?;
                    if services.contains_key(name) {
                        return Err(DomainError::field(
                            format!("{field}.name"),
                            format!("duplicate backend '{name}'"),
                        ));
                    }
                    let service = build_service(&field, name, raw)?;
                    services.insert(name.to_string(), service);
                }
                Ok(ConfigModel {
                    project_name: doc.project.and_then(|p| p.name),
                    project_type,
                    services,
                    settings,
                })
            }
        }
    }
}

fn resolve_settings(
    field: &str,
    raw: &RawSettings,
    base: Settings,
) -> Result<Settings, DomainError> {
    let timeout = match &raw.timeout {
        Some(t) => t.resolve(&format!("{field}.timeout"))?,
        None => base.timeout,
    };
    if raw.port == Some(0) {
        return Err(DomainError::field(format!("{field}.port"), "must be greater than 0"));
    }
    Ok(Settings {
        port: raw.port.unwrap_or(base.port),
        timeout,
        retries: raw.retries.unwrap_or(base.retries),
    })
}

fn build_service(field: &str, name: &str, raw: &RawService) -> Result<ServiceConfig, DomainError> {
    let base_url = validate_base_url(
        &format!("{field}.baseUrl"),
        raw.base_url.as_deref().unwrap_or_default(),
    )?;
    let timeout = raw
        .timeout
        .as_ref()
        .map(|t| t.resolve(&format!("{field}.timeout")))
        .transpose()?;

    let mut seen: HashSet<(HttpMethod, String)> = HashSet::new();
    let mut endpoints = Vec::with_capacity(raw.endpoints.len());
    for (idx, ep) in raw.endpoints.iter().enumerate() {
        let endpoint = build_endpoint(&format!("{field}.endpoints[{idx}]"), ep)?;
        if !seen.insert((endpoint.method, endpoint.expose_as.clone())) {
            return Err(DomainError::DuplicateRoute {
                service: name.to_string(),
                method: endpoint.method.to_string(),
                expose_as: endpoint.expose_as,
            });
        }
        endpoints.push(endpoint);
    }

    Ok(ServiceConfig {
        name: name.to_string(),
        base_url,
        endpoints,
        timeout,
        retries: raw.retries,
    })
}

fn build_endpoint(field: &str, raw: &RawEndpoint) -> Result<Endpoint, DomainError> {
    let path = validate_route_path(
        &format!("{field}.path"),
        raw.path.as_deref().unwrap_or_default(),
    )?;

    let method = match raw.method.as_deref().map(str::trim) {
        None | Some("") => HttpMethod::Get,
        Some(m) => m.parse().map_err(|_| {
            DomainError::field(format!("{field}.method"), format!("unsupported HTTP method '{m}'"))
        })?,
    };

    let expose_as = validate_route_path(
        &format!("{field}.exposeAs"),
        raw.expose_as.as_deref().unwrap_or_default(),
    )?;

    let name = raw
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| derive_endpoint_name(method, &expose_as));

    Ok(Endpoint {
        name,
        path,
        method,
        expose_as,
    })
}

/// `GET /api/users/{id}` becomes `get-api-users-id`.
fn derive_endpoint_name(method: HttpMethod, expose_as: &str) -> String {
    let mut name = method.as_str().to_ascii_lowercase();
    for segment in expose_as
        .split('/')
        .map(|s| s.trim_matches(|c| c == '{' || c == '}' || c == ':'))
        .filter(|s| !s.is_empty())
    {
        name.push('-');
        name.push_str(segment);
    }
    name
}
