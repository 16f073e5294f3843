//! Configuration loading and typed config structures for the catalog server.
//!
//! The canonical configuration lives in `coursewatch-config.yaml` next to
//! the server binary. Every field has a default, so an absent file or an
//! empty document yields a runnable demo setup (synthetic seed, one tick
//! per second).

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Upstream course-query endpoint the catalog can be seeded from.
pub const DEFAULT_UPSTREAM_URL: &str = "https://querycourse.ntust.edu.tw/QueryCourse/api//courses";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level catalog configuration.
///
/// Mirrors the structure of `coursewatch-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Where the initial record set comes from.
    #[serde(default)]
    pub seed: SeedConfig,

    /// Enrollment simulation parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl CatalogConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `SEMESTER` overrides `seed.semester`
    /// - `COURSEWATCH_PORT` overrides `server.port`
    /// - `COURSEWATCH_SEED_URL` switches the seed source to upstream
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SEMESTER`, `COURSEWATCH_PORT` and `COURSEWATCH_SEED_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `COURSEWATCH_PORT` is not a port.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("SEMESTER") {
            self.seed.semester = val;
        }
        if let Ok(val) = std::env::var("COURSEWATCH_PORT") {
            self.server.port = val
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("COURSEWATCH_PORT={val}: {e}")))?;
        }
        if let Ok(url) = std::env::var("COURSEWATCH_SEED_URL") {
            self.seed.source = SeedSource::Upstream { url };
        }
        Ok(())
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        if let SeedSource::Upstream { url } = &self.seed.source
            && self.seed.semester.trim().is_empty()
        {
            return Err(ConfigError::Invalid(format!(
                "seeding from {url} requires a semester"
            )));
        }
        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    /// The host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Seed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedConfig {
    /// Source of the initial record set.
    #[serde(default)]
    pub source: SeedSource,

    /// Semester to load (required for upstream seeding).
    #[serde(default)]
    pub semester: String,

    /// Upstream request timeout in milliseconds.
    #[serde(default = "default_seed_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            source: SeedSource::default(),
            semester: String::new(),
            timeout_ms: default_seed_timeout_ms(),
        }
    }
}

/// Where the catalog's records come from at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeedSource {
    /// POST the semester query to the upstream course API.
    Upstream {
        /// Endpoint URL.
        #[serde(default = "default_upstream_url")]
        url: String,
    },
    /// Read a JSON array of records from disk.
    File {
        /// Path to the JSON file.
        path: PathBuf,
    },
    /// Generate demo courses.
    Synthetic {
        /// Number of courses to generate.
        #[serde(default = "default_synthetic_count")]
        count: usize,
        /// Optional RNG seed for reproducible catalogs.
        #[serde(default)]
        rng_seed: Option<u64>,
    },
}

impl Default for SeedSource {
    fn default() -> Self {
        Self::Synthetic {
            count: default_synthetic_count(),
            rng_seed: None,
        }
    }
}

/// Enrollment simulation parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Real-time milliseconds between ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Each tick visits `ceil(courses / batch_divisor)` courses.
    #[serde(default = "default_batch_divisor")]
    pub batch_divisor: usize,

    /// Hard cap on courses per tick. `0` disables mutation.
    #[serde(default)]
    pub max_batch: Option<usize>,

    /// Chance (percent) that a bounded course fills to its ceiling.
    #[serde(default = "default_fill_percent")]
    pub fill_percent: u8,

    /// Chance (percent) that a bounded course drops one student.
    /// The remainder drops two.
    #[serde(default = "default_drop_one_percent")]
    pub drop_one_percent: u8,

    /// Treatment of courses without a declared capacity.
    #[serde(default)]
    pub unbounded: UnboundedPolicy,

    /// Optional RNG seed for reproducible runs.
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            batch_divisor: default_batch_divisor(),
            max_batch: None,
            fill_percent: default_fill_percent(),
            drop_one_percent: default_drop_one_percent(),
            unbounded: UnboundedPolicy::default(),
            rng_seed: None,
        }
    }
}

impl SimulationConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "simulation.tick_interval_ms must be positive".to_owned(),
            ));
        }
        if self.batch_divisor == 0 {
            return Err(ConfigError::Invalid(
                "simulation.batch_divisor must be positive".to_owned(),
            ));
        }
        if u16::from(self.fill_percent).saturating_add(u16::from(self.drop_one_percent)) > 100 {
            return Err(ConfigError::Invalid(format!(
                "simulation.fill_percent ({}) + drop_one_percent ({}) exceeds 100",
                self.fill_percent, self.drop_one_percent
            )));
        }
        Ok(())
    }
}

/// How the simulation treats courses with no capacity ceiling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum UnboundedPolicy {
    /// Leave them untouched.
    #[default]
    Skip,
    /// Random walk of at most `max_step` per tick, floored at zero.
    Walk {
        /// Largest absolute change per tick.
        max_step: u32,
    },
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_host() -> String {
    String::from("127.0.0.1")
}

const fn default_port() -> u16 {
    8000
}

const fn default_seed_timeout_ms() -> u64 {
    30_000
}

fn default_upstream_url() -> String {
    DEFAULT_UPSTREAM_URL.to_owned()
}

const fn default_synthetic_count() -> usize {
    120
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_batch_divisor() -> usize {
    60
}

const fn default_fill_percent() -> u8 {
    50
}

const fn default_drop_one_percent() -> u8 {
    40
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CatalogConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.simulation.tick_interval_ms, 1000);
        assert_eq!(config.simulation.batch_divisor, 60);
        assert_eq!(config.simulation.unbounded, UnboundedPolicy::Skip);
        assert!(matches!(config.seed.source, SeedSource::Synthetic { count: 120, .. }));
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
server:
  host: "0.0.0.0"
  port: 9000

seed:
  semester: "1142"
  timeout_ms: 5000
  source:
    kind: file
    path: "courses.json"

simulation:
  tick_interval_ms: 2500
  batch_divisor: 10
  max_batch: 4
  fill_percent: 30
  drop_one_percent: 30
  rng_seed: 7
  unbounded:
    mode: walk
    max_step: 3
"#;
        let config: CatalogConfig = serde_yml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.seed.source,
            SeedSource::File {
                path: PathBuf::from("courses.json")
            }
        );
        assert_eq!(config.simulation.max_batch, Some(4));
        assert_eq!(config.simulation.unbounded, UnboundedPolicy::Walk { max_step: 3 });
        assert_eq!(config.simulation.rng_seed, Some(7));
    }

    #[test]
    fn partial_yaml_uses_defaults() {
        let yaml = "simulation:\n  tick_interval_ms: 200\n";
        let config: CatalogConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.simulation.tick_interval_ms, 200);
        assert_eq!(config.simulation.fill_percent, 50);
        assert_eq!(config.server, ServerSettings::default());
    }

    #[test]
    fn upstream_source_defaults_url() {
        let yaml = "seed:\n  semester: \"1142\"\n  source:\n    kind: upstream\n";
        let config: CatalogConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(
            config.seed.source,
            SeedSource::Upstream {
                url: DEFAULT_UPSTREAM_URL.to_owned()
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn upstream_without_semester_is_invalid() {
        let config = CatalogConfig {
            seed: SeedConfig {
                source: SeedSource::Upstream {
                    url: DEFAULT_UPSTREAM_URL.to_owned(),
                },
                ..SeedConfig::default()
            },
            ..CatalogConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn probabilities_over_100_are_invalid() {
        let sim = SimulationConfig {
            fill_percent: 70,
            drop_one_percent: 40,
            ..SimulationConfig::default()
        };
        assert!(sim.validate().is_err());
    }

    #[test]
    fn zero_divisor_is_invalid() {
        let sim = SimulationConfig {
            batch_divisor: 0,
            ..SimulationConfig::default()
        };
        assert!(sim.validate().is_err());
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let result: Result<CatalogConfig, _> = serde_yml::from_str("server: [unclosed");
        assert!(result.is_err());
    }
}
