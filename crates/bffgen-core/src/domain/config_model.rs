//! Canonical route model: services, endpoints, settings.
//!
//! A [`ConfigModel`] is an immutable snapshot of one successful config load.
//! It is only ever built through [`ConfigModel::parse`] (or the application
//! loader on top of it), so every instance already satisfies the route
//! identity invariant: within a service, `(method, expose_as)` is unique.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::config_document::ConfigDocument;
use crate::domain::error::DomainError;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRIES: u32 = 3;

// ── ProjectType ──────────────────────────────────────────────────────────────

/// Project family a config describes.
///
/// The YAML services dialect describes a Go project; the JSON backends
/// dialect describes a Node.js one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    Go,
    NodeJs,
}

impl ProjectType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Go => "go",
            Self::NodeJs => "nodejs",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── HttpMethod ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Head,
        Self::Options,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = DomainError;

    /// Case-insensitive. Callers treat an absent method as `GET` before
    /// reaching this parser; an empty string here is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == upper)
            .ok_or_else(|| DomainError::parse(format!("unsupported HTTP method '{s}'")))
    }
}

// ── RouteKey ─────────────────────────────────────────────────────────────────

/// Identity of a generated route: `(service, method, exposeAs)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteKey {
    pub service: String,
    pub method: HttpMethod,
    pub expose_as: String,
}

impl RouteKey {
    pub fn new(
        service: impl Into<String>,
        method: HttpMethod,
        expose_as: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            method,
            expose_as: expose_as.into(),
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.service, self.method, self.expose_as)
    }
}

// ── Model ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    /// Path on the upstream service.
    pub path: String,
    pub method: HttpMethod,
    /// Path the composition layer exposes to its clients.
    pub expose_as: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub name: String,
    pub base_url: String,
    /// Declaration order is kept; renderers emit routes in this order.
    pub endpoints: Vec<Endpoint>,
    pub timeout: Option<Duration>,
    pub retries: Option<u32>,
}

impl ServiceConfig {
    pub fn route_key(&self, endpoint: &Endpoint) -> RouteKey {
        RouteKey::new(&self.name, endpoint.method, &endpoint.expose_as)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub port: u16,
    pub timeout: Duration,
    pub retries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            retries: DEFAULT_RETRIES,
        }
    }
}

/// Immutable snapshot of a loaded config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigModel {
    pub project_name: Option<String>,
    pub project_type: ProjectType,
    /// Keyed by service name, so output order never depends on how the
    /// document happened to list its services.
    pub services: BTreeMap<String, ServiceConfig>,
    pub settings: Settings,
}

impl ConfigModel {
    /// Parse a config document. All-or-nothing: any error rejects the whole
    /// document.
    pub fn parse(text: &str, format: ConfigFormat) -> Result<Self, DomainError> {
        ConfigDocument::parse(text, format)?.into_model()
    }

    /// Every route of every service, in service-name then declaration order.
    pub fn routes(&self) -> impl Iterator<Item = RouteKey> + '_ {
        self.services
            .values()
            .flat_map(|svc| svc.endpoints.iter().map(|ep| svc.route_key(ep)))
    }

    pub fn route_count(&self) -> usize {
        self.services.values().map(|s| s.endpoints.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

// ── Format ───────────────────────────────────────────────────────────────────

/// Surface syntax of a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}

impl ConfigFormat {
    /// `.json` is JSON; everything else is read as YAML, which also
    /// accepts JSON documents.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

// ── Field validation ─────────────────────────────────────────────────────────

/// Validate an upstream base URL: absolute, http(s), non-empty host.
pub(crate) fn validate_base_url(field: &str, raw: &str) -> Result<String, DomainError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DomainError::field(field, "must not be empty"));
    }
    let url = url::Url::parse(raw)
        .map_err(|e| DomainError::field(field, format!("invalid URL '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(DomainError::field(
            field,
            format!("scheme must be http or https, got '{}'", url.scheme()),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(DomainError::field(field, "URL has no host"));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Service names end up inside string literals and comments of generated
/// code, so line breaks, other control characters, quotes and backslashes
/// are rejected.
pub(crate) fn validate_service_name(field: &str, name: &str) -> Result<(), DomainError> {
    if let Some(bad) = name
        .chars()
        .find(|c| c.is_control() || matches!(c, '"' | '\'' | '`' | '\\'))
    {
        return Err(DomainError::field(
            field,
            format!("service name contains invalid character {bad:?}"),
        ));
    }
    Ok(())
}

/// Validate a route path such as `/api/users/{id}`.
pub(crate) fn validate_route_path(field: &str, raw: &str) -> Result<String, DomainError> {
    if raw.is_empty() {
        return Err(DomainError::field(field, "must not be empty"));
    }
    if !raw.starts_with('/') {
        return Err(DomainError::field(field, format!("'{raw}' must start with '/'")));
    }
    if let Some(bad) = raw
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || "/_-:.{}".contains(*c)))
    {
        return Err(DomainError::field(
            field,
            format!("'{raw}' contains invalid character {bad:?}"),
        ));
    }
    Ok(raw.to_string())
}

/// Parse `"30s"`, `"500ms"`, `"2m"`, `"1h"`; a bare number is milliseconds.
pub(crate) fn parse_duration(field: &str, raw: &str) -> Result<Duration, DomainError> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let value: u64 = digits
        .parse()
        .map_err(|_| DomainError::field(field, format!("invalid duration '{raw}'")))?;
    match unit.trim() {
        "" | "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 3600)),
        other => Err(DomainError::field(
            field,
            format!("unknown duration unit '{other}' (use ms, s, m or h)"),
        )),
    }
}
