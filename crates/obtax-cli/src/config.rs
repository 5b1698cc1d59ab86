//! Taxonomy location.
//!
//! Resolution order: `--taxonomy <PATH>`, then `$OBTAX_TAXONOMY`, then
//! `references/Master-OB-OpenAPI.json` relative to the working directory.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use obtax_schema::TaxonomyStore;

/// Environment variable naming the taxonomy document.
pub const TAXONOMY_ENV: &str = "OBTAX_TAXONOMY";

/// Taxonomy document used when nothing else is configured.
pub const DEFAULT_TAXONOMY: &str = "references/Master-OB-OpenAPI.json";

/// Where the taxonomy path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Flag,
    Env,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyConfig {
    pub path: PathBuf,
    pub source: ConfigSource,
}

impl TaxonomyConfig {
    /// Resolve from the command line and the process environment.
    pub fn resolve(flag: Option<&Path>) -> Self {
        Self::resolve_with(flag, std::env::var_os(TAXONOMY_ENV))
    }

    /// Resolve from explicit inputs. An empty environment value counts as unset.
    pub fn resolve_with(flag: Option<&Path>, env: Option<OsString>) -> Self {
        let config = if let Some(path) = flag {
            Self {
                path: path.to_path_buf(),
                source: ConfigSource::Flag,
            }
        } else if let Some(path) = env.filter(|v| !v.is_empty()) {
            Self {
                path: PathBuf::from(path),
                source: ConfigSource::Env,
            }
        } else {
            Self {
                path: PathBuf::from(DEFAULT_TAXONOMY),
                source: ConfigSource::Default,
            }
        };

        if config.source == ConfigSource::Default && !config.path.exists() {
            tracing::warn!(
                path = %config.path.display(),
                "no taxonomy configured and the default document does not exist; \
                 pass --taxonomy or set {TAXONOMY_ENV}"
            );
        }
        config
    }

    /// Load the configured document.
    pub fn load(&self) -> Result<TaxonomyStore> {
        let store = TaxonomyStore::load(&self.path)
            .with_context(|| format!("loading taxonomy from {}", self.path.display()))?;
        tracing::info!(
            path = %self.path.display(),
            source = ?self.source,
            schemas = store.schema_count(),
            "taxonomy loaded"
        );
        Ok(store)
    }
}
