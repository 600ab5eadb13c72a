//! Per-tool release manifests.
//!
//! A manifest names the GitHub repository that publishes a tool and describes how a
//! (platform, architecture) pair maps onto one of its release assets. Two forms exist:
//!
//! - the direct form, an `assets` table of filename templates keyed by OS then arch
//! - the legacy pattern form, a single `pattern` plus optional `mappings` tables
//!
//! Validation happens here so the resolver only ever sees well-typed data.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::errors::ManifestError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Display name, if the manifest declares one.
    pub name: Option<String>,
    /// `owner/name` of the repository publishing the releases.
    pub repository: String,
    pub strategy: Strategy,
    /// Member-name substrings selecting what to extract. Empty means everything.
    pub extract_filters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    Pattern(PatternStrategy),
    Direct(DirectStrategy),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternStrategy {
    pub pattern: String,
    pub arch_map: BTreeMap<String, String>,
    pub os_map: BTreeMap<String, String>,
    /// Only consider `.zip`, `.tar.gz` and `.tar.xz` assets when matching.
    pub archives_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectStrategy {
    /// OS -> arch -> filename (or URL) template.
    pub assets: BTreeMap<String, BTreeMap<String, String>>,
}

impl Manifest {
    /// Parse and validate a manifest from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ManifestError> {
        let value: Value = serde_json::from_str(text).map_err(|e| ManifestError::Malformed {
            path: None,
            message: e.to_string(),
        })?;
        Self::from_value(&value)
    }

    /// Validate an already-parsed JSON document.
    pub fn from_value(value: &Value) -> Result<Self, ManifestError> {
        let root = value
            .as_object()
            .ok_or_else(|| violation("<root>", "must be an object"))?;

        let repository = match root.get("repo") {
            Some(Value::String(repo)) => repo.clone(),
            Some(_) => return Err(violation("repo", "must be a string")),
            None => return Err(violation("repo", "is required")),
        };

        let name = match root.get("name") {
            Some(Value::String(name)) => Some(name.clone()),
            Some(Value::Null) | None => None,
            Some(_) => return Err(violation("name", "must be a string")),
        };

        let strategy = if let Some(assets) = root.get("assets") {
            Strategy::Direct(parse_direct(assets)?)
        } else if let Some(pattern) = root.get("pattern") {
            Strategy::Pattern(parse_pattern(pattern, root)?)
        } else {
            return Err(violation(
                "assets",
                "is required (or the legacy 'pattern' form)",
            ));
        };

        let extract_filters = match root.get("extract_patterns") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| violation("extract_patterns", "must contain only strings"))
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(_) => return Err(violation("extract_patterns", "must be a list")),
        };

        Ok(Self {
            name,
            repository,
            strategy,
            extract_filters,
        })
    }

    /// Name shown to users: the declared name, else the repository's project name.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| {
            self.repository
                .rsplit('/')
                .next()
                .unwrap_or(&self.repository)
        })
    }
}

fn parse_direct(value: &Value) -> Result<DirectStrategy, ManifestError> {
    let table = value
        .as_object()
        .ok_or_else(|| violation("assets", "must be a dictionary"))?;

    let mut assets = BTreeMap::new();
    for (os, arches) in table {
        let field = format!("assets.{os}");
        let arches = arches
            .as_object()
            .ok_or_else(|| violation(&field, "must be a dictionary"))?;
        if arches.is_empty() {
            return Err(violation(&field, "must not be empty"));
        }
        assets.insert(os.clone(), string_map(arches, &field)?);
    }

    Ok(DirectStrategy { assets })
}

fn parse_pattern(value: &Value, root: &Map<String, Value>) -> Result<PatternStrategy, ManifestError> {
    let pattern = value
        .as_str()
        .ok_or_else(|| violation("pattern", "must be a string"))?
        .to_string();

    let (arch_map, os_map) = match root.get("mappings") {
        None | Some(Value::Null) => (BTreeMap::new(), BTreeMap::new()),
        Some(Value::Object(mappings)) => (
            optional_string_map(mappings.get("arch"), "mappings.arch")?,
            optional_string_map(mappings.get("os"), "mappings.os")?,
        ),
        Some(_) => return Err(violation("mappings", "must be a dictionary")),
    };

    let archives_only = match root.get("archives_only") {
        None | Some(Value::Null) => true,
        Some(Value::Bool(flag)) => *flag,
        Some(_) => return Err(violation("archives_only", "must be a boolean")),
    };

    Ok(PatternStrategy {
        pattern,
        arch_map,
        os_map,
        archives_only,
    })
}

fn optional_string_map(
    value: Option<&Value>,
    field: &str,
) -> Result<BTreeMap<String, String>, ManifestError> {
    match value {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Object(map)) => string_map(map, field),
        Some(_) => Err(violation(field, "must be a dictionary")),
    }
}

fn string_map(map: &Map<String, Value>, field: &str) -> Result<BTreeMap<String, String>, ManifestError> {
    map.iter()
        .map(|(key, value)| match value {
            Value::String(s) => Ok((key.clone(), s.clone())),
            _ => Err(violation(&format!("{field}.{key}"), "must be a string")),
        })
        .collect()
}

fn violation(field: &str, message: &str) -> ManifestError {
    ManifestError::SchemaViolation {
        field: field.to_string(),
        message: message.to_string(),
    }
}
