//! Asset resolution: manifest + query -> one concrete release asset.
//!
//! Resolution is split in two so that everything answerable from the manifest alone
//! fails before any network traffic. [`prepare`] renders the target name and
//! returns an [`AssetSelector`]; the selector then picks from the release listing.

use std::collections::BTreeMap;

use crate::errors::ResolutionError;
use crate::manifest::{DirectStrategy, Manifest, PatternStrategy, Strategy};
use crate::release::{ReleaseAsset, ReleaseQuery};

/// Suffixes treated as installable archives by pattern matching.
pub const ARCHIVE_EXTENSIONS: &[&str] = &[".zip", ".tar.gz", ".tar.xz"];

/// Canonical OS names, mapped to themselves unless a manifest overrides them.
const DEFAULT_OS_NAMES: &[(&str, &str)] = &[
    ("Linux", "Linux"),
    ("Windows", "Windows"),
    ("macOS", "macOS"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub filename: String,
    pub download_url: String,
}

/// How to pick the asset out of a release listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSelector {
    /// First asset whose name contains `pattern`.
    Substring { pattern: String, archives_only: bool },
    /// The asset named exactly `name`.
    Exact { name: String },
    /// A fully rendered download URL; no listing needed.
    Url { url: String },
}

impl AssetSelector {
    pub fn needs_listing(&self) -> bool {
        !matches!(self, AssetSelector::Url { .. })
    }

    /// The rendered pattern, filename or URL, for diagnostics.
    pub fn target(&self) -> &str {
        match self {
            AssetSelector::Substring { pattern, .. } => pattern,
            AssetSelector::Exact { name } => name,
            AssetSelector::Url { url } => url,
        }
    }

    /// Pick the asset from a release listing. Listing order is preserved, so ties
    /// between several substring matches go to the first published.
    pub fn select(&self, assets: &[ReleaseAsset]) -> Result<ResolvedAsset, ResolutionError> {
        let found = match self {
            AssetSelector::Url { url } => {
                return Ok(ResolvedAsset {
                    filename: filename_from_url(url),
                    download_url: url.clone(),
                });
            }
            AssetSelector::Substring {
                pattern,
                archives_only,
            } => assets.iter().find(|a| {
                a.name.contains(pattern.as_str()) && (!archives_only || is_archive(&a.name))
            }),
            AssetSelector::Exact { name } => assets.iter().find(|a| &a.name == name),
        };

        found
            .map(|a| ResolvedAsset {
                filename: a.name.clone(),
                download_url: a.browser_download_url.clone(),
            })
            .ok_or_else(|| ResolutionError::NoMatchingAsset {
                target: self.target().to_string(),
                exact: matches!(self, AssetSelector::Exact { .. }),
                available: assets.iter().map(|a| a.name.clone()).collect(),
            })
    }
}

/// Validate the manifest against the query and render the selection target.
pub fn prepare(manifest: &Manifest, query: &ReleaseQuery) -> Result<AssetSelector, ResolutionError> {
    if manifest.repository.trim().is_empty() {
        return Err(ResolutionError::NoRepo);
    }

    match &manifest.strategy {
        Strategy::Pattern(strategy) => prepare_pattern(strategy, query),
        Strategy::Direct(strategy) => prepare_direct(strategy, query),
    }
}

/// Resolve in one step against an already fetched listing.
pub fn resolve(
    manifest: &Manifest,
    query: &ReleaseQuery,
    assets: &[ReleaseAsset],
) -> Result<ResolvedAsset, ResolutionError> {
    prepare(manifest, query)?.select(assets)
}

fn prepare_pattern(
    strategy: &PatternStrategy,
    query: &ReleaseQuery,
) -> Result<AssetSelector, ResolutionError> {
    if strategy.pattern.is_empty() {
        return Err(ResolutionError::NoStrategyConfig { field: "pattern" });
    }

    let release = query.release_tag();
    let os = map_os(&query.os, &strategy.os_map);
    let arch = map_arch(&query.arch, &strategy.arch_map);

    let pattern = expand_template(
        &strategy.pattern,
        &[
            ("version", query.version.as_str()),
            ("release", release.as_str()),
            ("os", os.as_str()),
            ("arch", arch.as_str()),
            ("ext", archive_extension(&query.os)),
        ],
    );

    Ok(AssetSelector::Substring {
        pattern,
        archives_only: strategy.archives_only,
    })
}

fn prepare_direct(
    strategy: &DirectStrategy,
    query: &ReleaseQuery,
) -> Result<AssetSelector, ResolutionError> {
    if strategy.assets.is_empty() {
        return Err(ResolutionError::NoStrategyConfig { field: "assets" });
    }

    let arches = strategy
        .assets
        .get(&query.os)
        .ok_or_else(|| ResolutionError::NoOsEntry {
            os: query.os.clone(),
            available: strategy.assets.keys().cloned().collect(),
        })?;

    let template = arches
        .get(&query.arch)
        .ok_or_else(|| ResolutionError::NoArchEntry {
            os: query.os.clone(),
            arch: query.arch.clone(),
            available: arches.keys().cloned().collect(),
        })?;

    let release = query.release_tag();
    let rendered = expand_template(
        template,
        &[
            ("version", query.version.as_str()),
            ("release", release.as_str()),
        ],
    );

    if is_url(&rendered) {
        Ok(AssetSelector::Url { url: rendered })
    } else {
        Ok(AssetSelector::Exact { name: rendered })
    }
}

/// Map an architecture name through the manifest's table; unknown names pass through.
pub fn map_arch(arch: &str, overrides: &BTreeMap<String, String>) -> String {
    overrides
        .get(arch)
        .cloned()
        .unwrap_or_else(|| arch.to_string())
}

/// Map an OS name: canonical defaults first, then manifest overrides.
pub fn map_os(os: &str, overrides: &BTreeMap<String, String>) -> String {
    if let Some(mapped) = overrides.get(os) {
        return mapped.clone();
    }

    DEFAULT_OS_NAMES
        .iter()
        .find(|(name, _)| *name == os)
        .map(|(_, mapped)| mapped.to_string())
        .unwrap_or_else(|| os.to_string())
}

/// Archive suffix (without the dot) conventionally published for an OS.
pub fn archive_extension(os: &str) -> &'static str {
    if os == "Windows" { "zip" } else { "tar.gz" }
}

pub fn is_archive(name: &str) -> bool {
    ARCHIVE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Replace each `{key}` with its value in a single left-to-right pass, so
/// substituted values are never expanded again. Unknown placeholders are left alone.
pub fn expand_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });

        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn is_url(s: &str) -> bool {
    s.starts_with("https://") || s.starts_with("http://")
}

fn filename_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
        .to_string()
}
