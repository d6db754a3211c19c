// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration types for the OCSP responder.
//!
//! This module defines the TOML configuration schema covering transport
//! limits, status-resolution policy, CRL installation behavior, registry
//! persistence, and the audit log.
//!
//! # Configuration File
//!
//! ```toml
//! [limits]
//! max_request_size = 5000
//!
//! [policy]
//! not_found_as_good = false
//!
//! [ingest]
//! install_mode = "background"
//!
//! [admin]
//! chain_selection = "self_signed_root"
//!
//! [store]
//! directory = "/var/lib/ocsp/points"
//!
//! [audit]
//! path = "/var/log/ocsp/audit.log"
//! ```
//!
//! Every section is optional; an empty file yields the defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{OcspError, Result};

/// Complete responder configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponderConfig {
    /// Transport request limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Status resolution policy.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// CRL ingestion configuration.
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Registry admin configuration.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Registry persistence configuration.
    #[serde(default)]
    pub store: StoreConfig,

    /// Audit log configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl ResponderConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ResponderConfigBuilder {
        ResponderConfigBuilder::default()
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or contains unknown fields.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| OcspError::config(format!("Invalid TOML: {e}")))
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| OcspError::config(format!("TOML serialize: {e}")))
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Validate the configuration for completeness and consistency.
    ///
    /// # Errors
    ///
    /// Returns an error describing any validation failures.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.limits.max_request_size == 0 {
            errors.push("limits.max_request_size must be > 0".to_string());
        }

        if let Some(dir) = &self.store.directory
            && dir.as_os_str().is_empty()
        {
            errors.push("store.directory must not be empty when set".to_string());
        }

        if let Some(path) = &self.audit.path
            && path.as_os_str().is_empty()
        {
            errors.push("audit.path must not be empty when set".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(OcspError::config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Builder for [`ResponderConfig`].
#[derive(Debug, Default)]
pub struct ResponderConfigBuilder {
    config: ResponderConfig,
}

impl ResponderConfigBuilder {
    /// Set the maximum accepted OCSP request size in bytes.
    pub fn max_request_size(mut self, bytes: usize) -> Self {
        self.config.limits.max_request_size = bytes;
        self
    }

    /// Set whether a serial absent from an installed CRL is reported good.
    pub fn not_found_as_good(mut self, enabled: bool) -> Self {
        self.config.policy.not_found_as_good = enabled;
        self
    }

    /// Set how CRL installation runs relative to the submission call.
    pub fn install_mode(mut self, mode: InstallMode) -> Self {
        self.config.ingest.install_mode = mode;
        self
    }

    /// Set how the effective issuer is chosen from a submitted chain.
    pub fn chain_selection(mut self, selection: ChainSelection) -> Self {
        self.config.admin.chain_selection = selection;
        self
    }

    /// Set the directory for persisted issuing-point manifests.
    pub fn store_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.store.directory = Some(dir.into());
        self
    }

    /// Set the audit log file path.
    pub fn audit_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.audit.path = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn build(self) -> Result<ResponderConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Transport request limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum accepted OCSP request size in bytes.
    ///
    /// POST bodies larger than this are rejected at the transport layer
    /// before any decoding.
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_request_size: default_max_request_size(),
        }
    }
}

fn default_max_request_size() -> usize {
    5000
}

/// Status resolution policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Report a serial absent from an installed CRL as `good` instead of
    /// `unknown`.
    ///
    /// This flips the trust posture for certificates the responder has no
    /// record of; leave disabled unless every issuing point always carries a
    /// complete CRL.
    #[serde(default)]
    pub not_found_as_good: bool,
}

/// CRL ingestion configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    /// How CRL installation runs relative to the submission call.
    #[serde(default)]
    pub install_mode: InstallMode,
}

/// When a validated CRL is installed into the registry.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InstallMode {
    /// Install before the submission call returns.
    #[default]
    Synchronous,

    /// Install on a background task; the submission reports acceptance once
    /// validation passes, and installation completes shortly after.
    Background,
}

/// Registry admin configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    /// How the effective issuer certificate is chosen when an add-issuing-point
    /// submission contains a chain.
    #[serde(default)]
    pub chain_selection: ChainSelection,
}

/// Policy for picking the issuer certificate out of a submitted chain.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChainSelection {
    /// Require exactly one certificate; reject chains outright.
    ///
    /// The strictest policy and the default: the caller must identify the
    /// issuer explicitly rather than have it inferred.
    #[default]
    SingleOnly,

    /// From a chain, pick the self-signed entry; reject chains without
    /// exactly one.
    SelfSignedRoot,

    /// From a chain, pick the self-signed entry if there is one, otherwise
    /// the first entry.
    FirstEntry,
}

/// Registry persistence configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory for issuing-point manifests.
    ///
    /// When unset, the registry lives in memory only and starts empty on
    /// each restart.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Audit log configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Audit log file path.
    ///
    /// When unset, audit records are discarded.
    #[serde(default)]
    pub path: Option<PathBuf>,
}
