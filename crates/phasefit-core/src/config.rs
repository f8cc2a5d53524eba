//! # Configuration
//!
//! YAML configuration for misfit evaluations.
//!
//! ## Search Path
//!
//! [`PhasefitConfig::load`] uses the first file found:
//! 1. Path in the `PHASEFIT_CONFIG` environment variable
//! 2. `./phasefit.yaml`
//! 3. `~/.config/phasefit/config.yaml` (platform user config dir)
//! 4. `/etc/phasefit/config.yaml`
//!
//! Defaults are used when none exists. Missing keys take their defaults.
//!
//! ## Example
//!
//! ```yaml
//! misfit:
//!   phase_jump_threshold: 0.7
//!   misfit_upper_bound: 2.0
//!   weighting:
//!     lowpass_corner: 0.005
//! transform:
//!   dt_new: 20.0
//!   width: 200.0
//! logging:
//!   level: debug
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::misfit::MisfitConfig;
use crate::observe::LogConfig;
use crate::transform::{InverseConfig, TransformParams};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "PHASEFIT_CONFIG";

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhasefitConfig {
    /// Gates and weighting constants
    pub misfit: MisfitConfig,
    /// Time-frequency sampling
    pub transform: TransformParams,
    /// Inverse transform refinement
    pub inverse: InverseConfig,
    /// Subscriber settings
    pub logging: LogConfig,
}

impl PhasefitConfig {
    /// Load from the search path, falling back to defaults.
    ///
    /// A `PHASEFIT_CONFIG` that points at a missing file is an error.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::NotFound(format!(
                    "{CONFIG_ENV}={}",
                    path.display()
                )));
            }
            return Self::load_from(&path);
        }

        match Self::config_search_paths().iter().find(|p| p.exists()) {
            Some(path) => Self::load_from(path),
            None => Ok(Self::default()),
        }
    }

    /// Load and validate a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse and validate YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))
    }

    /// Candidate files in search order, excluding `PHASEFIT_CONFIG`.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./phasefit.yaml")];
        if let Some(dirs) = directories::ProjectDirs::from("", "", "phasefit") {
            paths.push(dirs.config_dir().join("config.yaml"));
        }
        paths.push(PathBuf::from("/etc/phasefit/config.yaml"));
        paths
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.misfit.validate()?;
        self.transform.validate()?;
        self.inverse.validate()?;
        if self.transform.width < self.transform.dt_new {
            return Err(ConfigError::ValidationError(format!(
                "transform.width ({}) is narrower than transform.dt_new ({})",
                self.transform.width, self.transform.dt_new
            )));
        }
        Ok(())
    }

    /// Annotated example file with the default values.
    pub fn example_yaml() -> String {
        r#"# phasefit configuration

misfit:
  # criterion above which the weighted phase is assumed to wrap
  phase_jump_threshold: 0.7
  # larger misfits discard the adjoint source
  misfit_upper_bound: 2.0
  concurrent_transforms: false
  weighting:
    noise_divisor: 10.0
    highpass_corner: 0.002
    lowpass_corner: 0.005

transform:
  dt_new: 20.0
  width: 200.0
  threshold: 0.01

inverse:
  max_iterations: 5
  tolerance: 0.001

logging:
  level: info
  format: pretty
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::{LogFormat, LogLevel};

    #[test]
    fn test_defaults_are_valid() {
        let config = PhasefitConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.misfit.phase_jump_threshold, 0.7);
        assert_eq!(config.transform.dt_new, 20.0);
    }

    #[test]
    fn test_parse_partial_yaml() {
        let config = PhasefitConfig::parse(
            "misfit:\n  misfit_upper_bound: 3.5\n  weighting:\n    lowpass_corner: 0.01\nlogging:\n  level: warn\n",
        )
        .unwrap();
        assert_eq!(config.misfit.misfit_upper_bound, 3.5);
        assert_eq!(config.misfit.weighting.lowpass_corner, 0.01);
        assert_eq!(config.misfit.weighting.highpass_corner, 0.002);
        assert_eq!(config.misfit.phase_jump_threshold, 0.7);
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(config.transform, TransformParams::default());
    }

    #[test]
    fn test_example_yaml_matches_defaults() {
        let config = PhasefitConfig::parse(&PhasefitConfig::example_yaml()).unwrap();
        assert_eq!(config, PhasefitConfig::default());
    }

    #[test]
    fn test_validation_errors() {
        let err = PhasefitConfig::parse("transform:\n  dt_new: -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        let err = PhasefitConfig::parse("transform:\n  dt_new: 50.0\n  width: 10.0\n").unwrap_err();
        assert!(err.to_string().contains("narrower"));

        let err = PhasefitConfig::parse("inverse:\n  tolerance: -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_parse_error() {
        let err = PhasefitConfig::parse("misfit: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phasefit.yaml");
        let mut config = PhasefitConfig::default();
        config.misfit.concurrent_transforms = true;
        config.logging.format = LogFormat::Json;
        config.save(&path).unwrap();

        let loaded = PhasefitConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PhasefitConfig::load_from(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(_)));
    }

    #[test]
    fn test_search_paths() {
        let paths = PhasefitConfig::config_search_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from("./phasefit.yaml")));
        assert_eq!(
            paths.last(),
            Some(&PathBuf::from("/etc/phasefit/config.yaml"))
        );
    }
}
