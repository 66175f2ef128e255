//! Release lookup on a GitHub-compatible API.

use super::transport::{Transport, TransportError};
use serde::Deserialize;
use thiserror::Error;

/// Content types accepted as zip archives.
pub const ZIP_CONTENT_TYPES: [&str; 2] = ["application/zip", "application/x-zip-compressed"];

/// Release lookup error types.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Release list request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Release list is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("No releases found")]
    NoReleases,

    #[error("No zip file containing '{needle}' in release {tag}")]
    NoMatchingAsset { needle: String, tag: String },
}

/// A downloadable asset picked from a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub name: String,
    pub download_url: String,
    pub content_type: String,
    pub is_prerelease: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Asset {
    pub name: String,
    #[serde(default)]
    pub content_type: String,
    pub browser_download_url: String,
}

/// Pick the asset from a newest-first release list.
///
/// Only the first eligible release is inspected. A newer release without a
/// matching asset hides older releases that have one.
pub fn select_asset(
    releases: &[Release],
    needle: &str,
    include_prerelease: bool,
) -> Result<ReleaseAsset, ResolveError> {
    let release = releases
        .iter()
        .find(|release| include_prerelease || !release.prerelease)
        .ok_or(ResolveError::NoReleases)?;

    release
        .assets
        .iter()
        .find(|asset| {
            asset.name.contains(needle) && ZIP_CONTENT_TYPES.contains(&asset.content_type.as_str())
        })
        .map(|asset| ReleaseAsset {
            name: asset.name.clone(),
            download_url: asset.browser_download_url.clone(),
            content_type: asset.content_type.clone(),
            is_prerelease: release.prerelease,
        })
        .ok_or_else(|| ResolveError::NoMatchingAsset {
            needle: needle.to_string(),
            tag: release.tag_name.clone(),
        })
}

/// Resolves download URLs from a repository's release list.
pub struct ReleaseResolver<'a> {
    transport: &'a dyn Transport,
    api_base: String,
}

impl<'a> ReleaseResolver<'a> {
    pub fn new(transport: &'a dyn Transport, api_base: &str) -> Self {
        Self {
            transport,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn releases_url(&self, repo: &str) -> String {
        format!("{}/repos/{}/releases", self.api_base, repo)
    }

    /// Newest matching zip asset of `repo` (`owner/name`). No retries.
    pub fn resolve(
        &self,
        repo: &str,
        needle: &str,
        include_prerelease: bool,
    ) -> Result<ReleaseAsset, ResolveError> {
        let body = self.transport.get(&self.releases_url(repo))?;
        let releases: Vec<Release> = serde_json::from_slice(&body)?;
        let asset = select_asset(&releases, needle, include_prerelease)?;
        tracing::debug!("Resolved {repo} asset {} -> {}", asset.name, asset.download_url);
        Ok(asset)
    }
}
