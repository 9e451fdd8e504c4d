//! Rotation sources: discovery from config and loading of rotation bytes.
//!
//! Sources are rediscovered and reloaded on every request so that edits to
//! rotation files are picked up without a restart.

use std::fmt;
use std::path::{Path, PathBuf};

use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use oncall_core::config::{SourceList, SourceSpec};
use oncall_core::{Config, ConfigError, Rotation, RotationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Oncall rotation rendered as a support tier.
    Support,
    /// Rotation whose entries are scheduled events.
    Event,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    File(PathBuf),
    Url(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::File(path) => write!(f, "{}", path.display()),
            Location::Url(url) => write!(f, "{url}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RotationSource {
    pub name: String,
    pub kind: SourceKind,
    pub location: Location,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Parse(#[from] RotationError),
}

impl RotationSource {
    /// Fetch the source to completion, then parse it.
    pub async fn load(&self, client: &reqwest::Client) -> Result<Rotation, SourceError> {
        match &self.location {
            Location::File(path) => {
                let bytes = tokio::fs::read(path).await?;
                Ok(Rotation::read(bytes.as_slice())?)
            }
            Location::Url(url) => {
                let body = client
                    .get(url)
                    .send()
                    .await?
                    .error_for_status()?
                    .bytes()
                    .await?;
                Ok(Rotation::read(body.as_ref())?)
            }
        }
    }
}

/// Load every source concurrently. Results keep the order of `sources`.
pub async fn load_all<'a>(
    sources: &'a [RotationSource],
    client: &reqwest::Client,
) -> Vec<(&'a RotationSource, Result<Rotation, SourceError>)> {
    join_all(
        sources
            .iter()
            .map(|source| async move { (source, source.load(client).await) }),
    )
    .await
}

/// Load and log: failed sources are dropped from the result.
pub async fn load_ok<'a>(
    sources: &'a [RotationSource],
    client: &reqwest::Client,
) -> Vec<(&'a RotationSource, Rotation)> {
    load_all(sources, client)
        .await
        .into_iter()
        .filter_map(|(source, result)| match result {
            Ok(rotation) => Some((source, rotation)),
            Err(e) => {
                warn!(source = %source.name, location = %source.location, error = %e, "Unable to read rotation");
                None
            }
        })
        .collect()
}

/// Resolve the configured sources: the YAML source list when `SOURCES_FILE`
/// is set, otherwise the rotation and event directories plus `ROTATION_URLS`.
pub fn discover(config: &Config) -> Result<Vec<RotationSource>, ConfigError> {
    if let Some(file) = &config.site.sources_file {
        let list = SourceList::from_file(&config.resolve(file))?;
        let support = list
            .rotations
            .iter()
            .map(|spec| from_spec(config, spec, SourceKind::Support));
        let events = list
            .events
            .iter()
            .map(|spec| from_spec(config, spec, SourceKind::Event));
        return support.chain(events).collect();
    }

    let mut sources = scan_dir(&config.resolve(&config.site.rotations_dir), SourceKind::Support);
    sources.extend(config.site.rotation_urls.iter().map(|url| RotationSource {
        name: name_from_url(url),
        kind: SourceKind::Support,
        location: Location::Url(url.clone()),
    }));
    sources.extend(scan_dir(&config.resolve(&config.site.events_dir), SourceKind::Event));
    Ok(sources)
}

fn from_spec(
    config: &Config,
    spec: &SourceSpec,
    kind: SourceKind,
) -> Result<RotationSource, ConfigError> {
    let (location, default_name) = match (&spec.path, &spec.url) {
        (Some(path), None) => {
            let path = config.resolve(path);
            let name = name_from_path(&path);
            (Location::File(path), name)
        }
        (None, Some(url)) => (Location::Url(url.clone()), name_from_url(url)),
        _ => {
            return Err(ConfigError::InvalidSource(
                "source must set exactly one of `path` or `url`".to_string(),
            ))
        }
    };
    Ok(RotationSource {
        name: spec.name.clone().unwrap_or(default_name),
        kind,
        location,
    })
}

fn scan_dir(dir: &Path, kind: SourceKind) -> Vec<RotationSource> {
    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            warn!("Unable to open {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = read_dir
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            !p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with('.'))
                .unwrap_or(true)
        })
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| RotationSource {
            name: name_from_path(&path),
            kind,
            location: Location::File(path),
        })
        .collect()
}

fn name_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("rotation")
        .to_string()
}

fn name_from_url(raw: &str) -> String {
    url::Url::parse(raw)
        .ok()
        .and_then(|u| {
            u.path_segments()?
                .filter(|s| !s.is_empty())
                .last()
                .map(|s| name_from_path(Path::new(s)))
        })
        .unwrap_or_else(|| raw.to_string())
}
