/*
 *  Copyright 2025 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Configuration for the dispatcher and workflow engine.
//!
//! [`WeldflowConfig`] can be built in code or loaded from a TOML file. All
//! fields have defaults, so a config file only needs to name what it changes:
//!
//! ```toml
//! wcr_prefix = "WCR"
//! max_coupons_per_request = 4
//! default_wpq_expiration_months = 6
//! incoming_dir = "jobs/incoming"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Runtime configuration for weldflow.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeldflowConfig {
    /// Prefix for generated request numbers (`<PREFIX>-<YEAR>-<SEQ>`)
    pub wcr_prefix: String,

    /// Validation ceiling on coupons per certification request
    pub max_coupons_per_request: usize,

    /// Default qualification validity window, in months
    pub default_wpq_expiration_months: u32,

    /// Optional cap on how many retest requests may chain off one origin.
    /// `None` leaves the chain unbounded.
    pub max_retest_depth: Option<u32>,

    /// Directory scanned for incoming job files
    pub incoming_dir: PathBuf,

    /// Directory successful job files are moved to
    pub processed_dir: PathBuf,

    /// Directory unparsable or errored job files are moved to
    pub failed_dir: PathBuf,

    /// Number of database connections in the pool
    pub db_pool_size: u32,
}

impl Default for WeldflowConfig {
    fn default() -> Self {
        Self {
            wcr_prefix: "WCR".to_string(),
            max_coupons_per_request: 4,
            default_wpq_expiration_months: 6,
            max_retest_depth: None,
            incoming_dir: PathBuf::from("jobs/incoming"),
            processed_dir: PathBuf::from("jobs/processed"),
            failed_dir: PathBuf::from("jobs/failed"),
            db_pool_size: 4,
        }
    }
}

impl WeldflowConfig {
    /// Loads configuration from a TOML file, filling unspecified fields with
    /// defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks internal consistency of the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wcr_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("wcr_prefix must not be empty".into()));
        }
        if self.max_coupons_per_request == 0 {
            return Err(ConfigError::Invalid(
                "max_coupons_per_request must be at least 1".into(),
            ));
        }
        if self.default_wpq_expiration_months == 0 {
            return Err(ConfigError::Invalid(
                "default_wpq_expiration_months must be at least 1".into(),
            ));
        }
        if self.db_pool_size == 0 {
            return Err(ConfigError::Invalid("db_pool_size must be at least 1".into()));
        }
        Ok(())
    }
}
