// src/config.rs
//! Runtime configuration: `config/predictor.toml` (or `$PREDICTOR_CONFIG_PATH`),
//! then env overrides. Missing file ⇒ defaults.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::rank::{RankEncoder, DEFAULT_RANKED_THRESHOLD, DEFAULT_UNRANKED};

pub const DEFAULT_CONFIG_PATH: &str = "config/predictor.toml";

pub const ENV_CONFIG_PATH: &str = "PREDICTOR_CONFIG_PATH";
pub const ENV_MODEL_PATH: &str = "PREDICTOR_MODEL_PATH";
pub const ENV_FIGHTS_PATH: &str = "PREDICTOR_FIGHTS_PATH";
pub const ENV_BIND: &str = "PREDICTOR_BIND";
pub const ENV_DEBUG_ROUTES: &str = "PREDICTOR_DEBUG_ROUTES";

fn default_model_path() -> PathBuf {
    PathBuf::from("model.json")
}
fn default_fights_path() -> PathBuf {
    PathBuf::from("ufc-master.csv")
}
fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}
fn default_unranked() -> f64 {
    DEFAULT_UNRANKED
}
fn default_ranked_threshold() -> f64 {
    DEFAULT_RANKED_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    #[serde(default = "default_fights_path")]
    pub fights_path: PathBuf,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Rank given to unranked fighters.
    #[serde(default = "default_unranked")]
    pub unranked_rank: f64,
    /// Opponent rank (inclusive) that counts as a ranked win.
    #[serde(default = "default_ranked_threshold")]
    pub ranked_win_threshold: f64,
    /// Expose `/metrics`.
    #[serde(default)]
    pub debug_routes: bool,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            fights_path: default_fights_path(),
            bind_addr: default_bind_addr(),
            unranked_rank: default_unranked(),
            ranked_win_threshold: default_ranked_threshold(),
            debug_routes: false,
        }
    }
}

impl PredictorConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading predictor config from {}", path.display()))?;
        Self::from_toml_str(&data)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: PredictorConfig = toml::from_str(s)?;
        // Sanitize
        if !cfg.unranked_rank.is_finite() {
            cfg.unranked_rank = default_unranked();
        }
        if !cfg.ranked_win_threshold.is_finite() {
            cfg.ranked_win_threshold = default_ranked_threshold();
        }
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $PREDICTOR_CONFIG_PATH (must exist)
    /// 2) config/predictor.toml
    /// 3) defaults
    ///
    /// Then apply the per-field env overrides.
    pub fn from_env() -> Result<Self> {
        let mut cfg = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_CONFIG_PATH)?
        } else {
            Self::default()
        };

        if let Ok(p) = env::var(ENV_MODEL_PATH) {
            cfg.model_path = PathBuf::from(p);
        }
        if let Ok(p) = env::var(ENV_FIGHTS_PATH) {
            cfg.fights_path = PathBuf::from(p);
        }
        if let Ok(b) = env::var(ENV_BIND) {
            cfg.bind_addr = b;
        }
        if let Ok(v) = env::var(ENV_DEBUG_ROUTES) {
            cfg.debug_routes = v.trim() == "1";
        }
        Ok(cfg)
    }

    pub fn rank_encoder(&self) -> RankEncoder {
        RankEncoder::new(self.unranked_rank)
    }
}

/// Gradient-descent settings for `fightctl train`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub learning_rate: f64,
    pub iterations: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            iterations: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = PredictorConfig::from_toml_str(
            r#"
            model_path = "artifacts/model.json"
            debug_routes = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.model_path, PathBuf::from("artifacts/model.json"));
        assert_eq!(cfg.fights_path, PathBuf::from("ufc-master.csv"));
        assert_eq!(cfg.unranked_rank, 20.0);
        assert_eq!(cfg.ranked_win_threshold, 15.0);
        assert!(cfg.debug_routes);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(PredictorConfig::from_toml_str("model_path = [").is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_and_missing_config_path() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();

        env::remove_var(ENV_CONFIG_PATH);
        env::set_var(ENV_MODEL_PATH, "m.json");
        env::set_var(ENV_DEBUG_ROUTES, "1");
        let cfg = PredictorConfig::from_env().unwrap();
        assert_eq!(cfg.model_path, PathBuf::from("m.json"));
        assert!(cfg.debug_routes);
        env::remove_var(ENV_MODEL_PATH);
        env::remove_var(ENV_DEBUG_ROUTES);

        // File-backed config
        let p = tmp.path().join("predictor.toml");
        fs::write(&p, "bind_addr = \"127.0.0.1:9000\"\nunranked_rank = 25.0\n").unwrap();
        env::set_var(ENV_CONFIG_PATH, p.display().to_string());
        let cfg = PredictorConfig::from_env().unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.rank_encoder().encode(""), 25.0);

        env::set_var(ENV_CONFIG_PATH, tmp.path().join("nope.toml").display().to_string());
        assert!(PredictorConfig::from_env().is_err());
        env::remove_var(ENV_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
