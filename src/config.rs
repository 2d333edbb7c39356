//! Runtime settings loaded from `~/.campus-locator/config.toml`.
//!
//! Resolution: explicit path (CLI flag or env var) → default path → built-in
//! defaults. Every field is optional in the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::fusion::FusionWeights;
use crate::location::{builtin_catalog, Catalog, CatalogError, DEFAULT_MAX_DISTANCE_M};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// JSON catalog shared with the map client. Built-in campus data if unset.
    pub catalog: Option<PathBuf>,
    pub server: ServerSettings,
    pub fusion: FusionSettings,
    pub classifier: ClassifierSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionSettings {
    pub gps_weight: u32,
    pub ai_weight: u32,
    pub max_distance_m: f64,
}

impl Default for FusionSettings {
    fn default() -> Self {
        let w = FusionWeights::default();
        Self {
            gps_weight: w.gps,
            ai_weight: w.ai,
            max_distance_m: DEFAULT_MAX_DISTANCE_M,
        }
    }
}

impl FusionSettings {
    pub fn weights(&self) -> FusionWeights {
        FusionWeights::new(self.gps_weight, self.ai_weight)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    #[default]
    None,
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub backend: ClassifierBackend,
    pub endpoint: Option<String>,
    pub model_id: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub top_k: Option<usize>,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::None,
            endpoint: None,
            model_id: None,
            api_key: None,
            timeout_secs: 15,
            top_k: None,
        }
    }
}

impl Settings {
    /// Load from `explicit` if given (must exist), else the default path if
    /// present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("no config file found, using defaults");
                    Self::default()
                }
            },
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loaded config");
        Self::from_toml_str(&data)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".campus-locator").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let max = self.fusion.max_distance_m;
        if !(max.is_finite() && max > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "fusion.max_distance_m must be a positive number, got {}",
                max
            )));
        }
        if self.classifier.top_k == Some(0) {
            return Err(ConfigError::Invalid("classifier.top_k must be at least 1".into()));
        }
        if self.classifier.backend == ClassifierBackend::Remote {
            if self.classifier.endpoint.is_none() {
                return Err(ConfigError::Invalid("classifier.endpoint is required for the remote backend".into()));
            }
            if self.classifier.model_id.is_none() {
                return Err(ConfigError::Invalid("classifier.model_id is required for the remote backend".into()));
            }
        }
        Ok(())
    }

    /// The configured catalog file, or the built-in campus data.
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog {
            Some(path) => Catalog::from_json_file(path),
            None => Ok(builtin_catalog()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.fusion.gps_weight, 40);
        assert_eq!(s.fusion.ai_weight, 60);
        assert_eq!(s.fusion.max_distance_m, 200.0);
        assert_eq!(s.server.port, 5000);
        assert_eq!(s.classifier.backend, ClassifierBackend::None);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let s = Settings::from_toml_str(
            r#"
            [fusion]
            gps_weight = 70

            [classifier]
            backend = "remote"
            endpoint = "https://classify.roboflow.com"
            model_id = "c-tracker-gehfu/1"
            top_k = 3
            "#,
        )
        .unwrap();
        assert_eq!(s.fusion.gps_weight, 70);
        assert_eq!(s.fusion.ai_weight, 60);
        assert_eq!(s.classifier.backend, ClassifierBackend::Remote);
        assert_eq!(s.classifier.timeout_secs, 15);
        assert_eq!(s.classifier.top_k, Some(3));
        assert_eq!(s.server.host, "127.0.0.1");
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_remote_without_endpoint_is_invalid() {
        let s = Settings::from_toml_str("[classifier]\nbackend = \"remote\"\nmodel_id = \"m/1\"\n").unwrap();
        assert!(matches!(s.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_bad_cutoff_is_invalid() {
        let s = Settings::from_toml_str("[fusion]\nmax_distance_m = 0.0\n").unwrap();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_zero_top_k_is_invalid() {
        let s = Settings::from_toml_str("[classifier]\ntop_k = 0\n").unwrap();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_unknown_backend_fails_to_parse() {
        assert!(matches!(
            Settings::from_toml_str("[classifier]\nbackend = \"tflite\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_with_catalog_file() {
        let dir = TempDir::new().unwrap();
        let catalog_path = dir.path().join("locations.json");
        fs::write(&catalog_path, r#"[{"name": "Main Gate", "lat": 12.863788, "lng": 77.434897}]"#).unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(
            &config_path,
            format!("catalog = {:?}\n\n[server]\nport = 8080\n", catalog_path.display().to_string()),
        )
        .unwrap();

        let s = Settings::load(Some(&config_path)).unwrap();
        assert_eq!(s.server.port, 8080);
        let catalog = s.load_catalog().unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_builtin_catalog_when_unset() {
        assert_eq!(Settings::default().load_catalog().unwrap().len(), 11);
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut s = Settings::default();
        s.classifier.api_key = Some("secret".into());
        let out = toml::to_string(&s).unwrap();
        assert!(!out.contains("secret"));
    }
}
