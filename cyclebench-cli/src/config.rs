//! Configuration loading from cyclebench.toml
//!
//! cyclebench configuration can be specified in a `cyclebench.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.
//! Values from the file sit between the built-in defaults and command-line flags.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of timed repetitions per benchmark
pub const DEFAULT_NUMRUNS: u32 = 128;

/// Name of the configuration file looked up by [`CycleConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "cyclebench.toml";

/// cyclebench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CycleConfig {
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Filter configuration
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Runner configuration for benchmark execution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunnerConfig {
    /// Core to pin the process to before measuring
    #[serde(default)]
    pub pincore: i64,
    /// Timed repetitions per benchmark (or per table value)
    #[serde(default = "default_numruns")]
    pub numruns: u32,
    /// Force the CPUID+RDTSC end read even when RDTSCP is available
    #[serde(default)]
    pub rdtsc: bool,
    /// Print progress notices and full statistics
    #[serde(default)]
    pub verbose: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            pincore: 0,
            numruns: default_numruns(),
            rdtsc: false,
            verbose: false,
        }
    }
}

fn default_numruns() -> u32 {
    DEFAULT_NUMRUNS
}

/// Default benchmark selection
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FilterConfig {
    /// Name filters (regular expressions, full match)
    #[serde(default)]
    pub names: Vec<String>,
    /// Group filters (regular expressions, full match)
    #[serde(default)]
    pub groups: Vec<String>,
}

impl CycleConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => {
                        tracing::debug!("Loaded configuration from {}", config_path.display());
                        Some(config)
                    }
                    Err(e) => {
                        tracing::warn!("Ignoring {}: {:#}", config_path.display(), e);
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# cyclebench Configuration

[runner]
# Core to pin the benchmark process to
pincore = 0
# Timed repetitions per benchmark (must be at least 1)
numruns = 128
# Use CPUID+RDTSC for the end timestamp instead of RDTSCP
rdtsc = false
# Print progress notices and full statistics
verbose = false

[filter]
# Only run benchmarks whose name fully matches one of these patterns
names = []
# Only run benchmarks whose group fully matches one of these patterns
groups = []
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CycleConfig::default();
        assert_eq!(config.runner.pincore, 0);
        assert_eq!(config.runner.numruns, 128);
        assert!(!config.runner.rdtsc);
        assert!(!config.runner.verbose);
        assert!(config.filter.names.is_empty());
        assert!(config.filter.groups.is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [runner]
            numruns = 1000
            rdtsc = true

            [filter]
            groups = ["sort.*"]
        "#;

        let config: CycleConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.runner.numruns, 1000);
        assert!(config.runner.rdtsc);
        assert_eq!(config.filter.groups, vec!["sort.*".to_string()]);
        // Defaults should still apply
        assert_eq!(config.runner.pincore, 0);
        assert!(config.filter.names.is_empty());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: CycleConfig = toml::from_str("").unwrap();
        assert_eq!(config, CycleConfig::default());
    }

    #[test]
    fn test_unknown_types_rejected() {
        let result: Result<CycleConfig, _> = toml::from_str("[runner]\nnumruns = \"many\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_default_toml_parses() {
        let default_toml = CycleConfig::default_toml();
        let config: CycleConfig = toml::from_str(&default_toml).unwrap();
        assert_eq!(config, CycleConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("cyclebench-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[runner]\npincore = 3\n").unwrap();
        let config = CycleConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.runner.pincore, 3);
        assert_eq!(config.runner.numruns, DEFAULT_NUMRUNS);
    }
}
