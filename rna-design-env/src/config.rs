//! Environment configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use rna_design_core::{DesignError, ObservationSpace, Result};

use crate::structure::{EncodingMode, EncodingSpec, Layout, WindowSpace};

/// Configuration shared by every episode of one environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Repair search runs when `0 < distance < threshold`; `None` or 0 disables it
    pub mutation_threshold: Option<usize>,
    /// Curvature of `(1 - fractional_distance) ^ exponent`
    pub reward_exponent: f64,
    /// Half-width of the observation window
    pub state_radius: usize,
    /// Wrap each observation element as a single-element group
    pub use_windowed_layout: bool,
    /// 4-way categorical codes instead of 2-way structural codes
    pub use_categorical_encoding: bool,
    /// Seed for the target draw order; entropy when absent
    pub seed: Option<u64>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            mutation_threshold: Some(5),
            reward_exponent: 1.0,
            state_radius: 5,
            use_windowed_layout: true,
            use_categorical_encoding: false,
            seed: None,
        }
    }
}

impl EnvironmentConfig {
    /// Parse a JSON document; missing keys take their defaults
    ///
    /// # Errors
    /// `Serialization` for invalid JSON, `InvalidConfig` for out-of-domain values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    ///
    /// # Errors
    /// `Io` if the file cannot be read, otherwise as [`Self::from_json_str`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Build from a loose parameter map, as handed over by an optimizer
    ///
    /// # Errors
    /// `Serialization` for mistyped values, `InvalidConfig` for out-of-domain values.
    pub fn from_params(params: serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let config: Self = serde_json::from_value(serde_json::Value::Object(params))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values outside their domain
    ///
    /// # Errors
    /// `InvalidConfig` if `reward_exponent` is not a positive finite number.
    pub fn validate(&self) -> Result<()> {
        if !(self.reward_exponent.is_finite() && self.reward_exponent > 0.0) {
            return Err(DesignError::InvalidConfig(format!(
                "reward_exponent must be positive and finite, got {}",
                self.reward_exponent
            )));
        }
        Ok(())
    }

    /// Threshold in effect, `None` when repair is disabled
    #[must_use]
    pub fn effective_mutation_threshold(&self) -> Option<usize> {
        self.mutation_threshold.filter(|&t| t > 0)
    }

    /// Encoding parameters for target structures
    #[must_use]
    pub fn encoding_spec(&self) -> EncodingSpec {
        EncodingSpec::new(
            self.state_radius,
            self.use_windowed_layout,
            self.use_categorical_encoding,
        )
    }

    /// Symbol to code mapping in effect
    #[must_use]
    pub fn encoding_mode(&self) -> EncodingMode {
        self.encoding_spec().mode
    }

    /// Observation element arrangement in effect
    #[must_use]
    pub fn layout(&self) -> Layout {
        self.encoding_spec().layout
    }

    /// Width of one observation window
    #[must_use]
    pub fn window_width(&self) -> usize {
        self.encoding_spec().window_width()
    }

    /// Space every observation belongs to
    #[must_use]
    pub fn observation_space(&self) -> WindowSpace {
        self.encoding_spec().observation_space()
    }

    /// Shape of every observation
    #[must_use]
    pub fn observation_shape(&self) -> Vec<usize> {
        self.observation_space().shape()
    }
}
