//! Model configuration loaded from TOML.
//!
//! # File Format
//!
//! ```toml
//! precision = "single"
//! debug = true
//! dx = 0.1
//! N = 3
//! c1 = 1.0
//! nu = 5e-8
//! k0 = 0.15
//! grid_size = 64
//!
//! [metrics]
//! enabled = true
//! output = "runs/metrics.jsonl"
//! ```
//!
//! Every key is optional. `precision` is kept as the raw label here and only
//! validated when a model is built from the config, so a bad label surfaces as
//! the model's construction error.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::metrics::MetricsConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HwConfig {
    /// Precision label, `"double"` or `"single"`.
    pub precision: String,
    /// Log resolved types and solver identity; re-check output precision.
    pub debug: bool,
    /// Grid spacing.
    pub dx: f64,
    /// Hyperdiffusion order.
    #[serde(rename = "N")]
    pub n: u32,
    /// Adiabaticity coefficient.
    pub c1: f64,
    /// Hyperdiffusion coefficient.
    pub nu: f64,
    /// Lowest wavenumber of the box, `2π / L`.
    pub k0: f64,
    /// Points per side of the square grid.
    pub grid_size: usize,
    pub metrics: MetricsConfig,
}

impl Default for HwConfig {
    fn default() -> Self {
        Self {
            precision: "double".to_string(),
            debug: false,
            dx: 0.1,
            n: 3,
            c1: 1.0,
            nu: 5e-8,
            k0: 0.15,
            grid_size: 64,
            metrics: MetricsConfig::default(),
        }
    }
}

impl HwConfig {
    /// Load configuration from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        let config: HwConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dx.is_finite() && self.dx > 0.0) {
            return Err(ConfigError::InvalidParameter(format!(
                "dx must be positive and finite, got {}",
                self.dx
            )));
        }
        if self.grid_size == 0 {
            return Err(ConfigError::InvalidParameter(
                "grid_size must be non-zero".to_string(),
            ));
        }
        if self.metrics.enabled && self.metrics.output.is_none() {
            return Err(ConfigError::InvalidParameter(
                "metrics.output must be set when metrics are enabled".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_precision(mut self, label: impl Into<String>) -> Self {
        self.precision = label.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

// ============================================================================
// Tests
// ============================================================================
