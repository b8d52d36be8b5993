//! Engine configuration.
//!
//! [`CharacteryConfig`] carries everything tunable about the engine: the
//! chunk delimiter, the debounce window, the routing pack, the managed
//! property table, and the vote emoji. `Default` reproduces the built-in
//! pack; [`CharacteryConfig::load`] reads a TOML file and falls back to the
//! defaults only when the file is missing. Any other failure, including a
//! route spec that does not parse, is an error at load time rather than a
//! silent fallback.

use std::io;
use std::path::Path;
use std::time::Duration;

use charactery_types::error::TemplateError;
use charactery_types::policy::{ManagedProperty, default_properties};
use charactery_types::vote::VoteTable;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consensus::debounce::DEFAULT_WINDOW;
use crate::route::{DEFAULT_DELIMITER, Router};

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// One route table: a property key and its template specs, in match order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub key: String,
    pub specs: Vec<String>,
}

/// Top-level engine configuration.
///
/// Every field has a default, so a TOML file only needs to spell out what
/// it changes. A `routes` or `properties` table in the file replaces the
/// built-in set wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacteryConfig {
    /// Chunk delimiter for routed text.
    pub delimiter: char,
    /// Quiet period in milliseconds between the last queued change and the
    /// flush that resolves it.
    pub debounce_ms: u64,
    /// Route tables, scanned in order when extracting.
    pub routes: Vec<RouteConfig>,
    /// Managed property policies, resolved in order at each flush.
    pub properties: Vec<ManagedProperty>,
    /// Emoji recognized as up/down votes at the platform boundary.
    pub votes: VoteTable,
}

impl Default for CharacteryConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            debounce_ms: DEFAULT_WINDOW.as_millis() as u64,
            routes: default_routes(),
            properties: default_properties(),
            votes: VoteTable::default(),
        }
    }
}

impl CharacteryConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults. Unreadable files, malformed
    /// TOML, and route specs that fail to parse are all errors: a broken
    /// pack should stop startup, not limp along extracting nothing.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        // Surface template mistakes at load time.
        config.build_router()?;

        tracing::debug!(
            path = %path.display(),
            tables = config.routes.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Build the router described by `routes`.
    pub fn build_router(&self) -> Result<Router, TemplateError> {
        let mut router = Router::with_delimiter(self.delimiter);
        for route in &self.routes {
            router = router.add(&route.key, &route.specs)?;
        }
        Ok(router)
    }

    /// The managed property table.
    pub fn managed_properties(&self) -> &[ManagedProperty] {
        &self.properties
    }

    /// The debounce window as a duration.
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// The built-in routing pack.
///
/// Table order doubles as match precedence, so the bare `*response`
/// catch-all comes last: anything the name, alias, and avatar tables
/// reject becomes a candidate canned response.
fn default_routes() -> Vec<RouteConfig> {
    fn table(key: &str, specs: &[&str]) -> RouteConfig {
        RouteConfig {
            key: key.to_string(),
            specs: specs.iter().map(|s| s.to_string()).collect(),
        }
    }

    vec![
        table(
            "name",
            &[
                "my name is :name",
                "call me :name",
                "i am :name",
                r"name\: :name",
            ],
        ),
        table(
            "alias",
            &[
                r"i respond to(\:) :alias",
                r"alias(\:) :alias",
                r"aka(\:) :alias",
            ],
        ),
        table(
            "avatar",
            &[
                r"this is me(\:) *avatar",
                r"avatar(\:) *avatar",
                r"(this is )(my )photo( is)(\:) *avatar",
            ],
        ),
        table("response", &["*response"]),
    ]
}
