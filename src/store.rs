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

//! Durable persistence for the issuing-point registry.
//!
//! The registry itself is in-memory; a [`RegistryStore`] mirrors it to disk
//! so revocation state survives restarts. Persistence always runs after the
//! in-memory swap succeeds. A crash between the swap and the write loses at
//! most that one update; on restart the store is the source of truth and the
//! registry is rebuilt from it.
//!
//! [`FileStore`] keeps one TOML manifest per issuing point, with the issuer
//! certificate and installed CRL as base64 DER. Manifests are written to a
//! temporary file and renamed into place so a manifest on disk is always
//! complete.

use async_trait::async_trait;
use base64::prelude::*;
use der::{Decode, Encode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use x509_cert::Certificate;

use crate::error::{OcspError, Result};
use crate::registry::{IssuingPoint, Registry};
use crate::types::crl::ParsedCrl;

/// Durable mirror of the registry.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Persist the current state of one issuing point.
    async fn persist_point(&self, point: &IssuingPoint) -> Result<()>;

    /// Remove the persisted state for an issuer.
    ///
    /// Removing an issuer that was never persisted is not an error.
    async fn remove_point(&self, issuer_name: &str) -> Result<()>;

    /// Load all persisted issuing points into a registry, returning how many
    /// were loaded.
    async fn load_into(&self, registry: &Registry) -> Result<usize>;
}

/// A store that persists nothing.
///
/// Used when no store directory is configured; the registry then starts
/// empty on every restart.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

#[async_trait]
impl RegistryStore for NullStore {
    async fn persist_point(&self, _point: &IssuingPoint) -> Result<()> {
        Ok(())
    }

    async fn remove_point(&self, _issuer_name: &str) -> Result<()> {
        Ok(())
    }

    async fn load_into(&self, _registry: &Registry) -> Result<usize> {
        Ok(0)
    }
}

/// One issuing point's on-disk manifest.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PointManifest {
    /// Issuer distinguished name.
    issuer: String,

    /// Issuer certificate as base64 DER.
    #[serde(default)]
    certificate: Option<String>,

    /// Installed CRL as base64 DER.
    #[serde(default)]
    crl: Option<String>,
}

/// File-backed registry store: one TOML manifest per issuing point.
#[derive(Debug)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    /// Open a store rooted at the given directory, creating it as needed.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self { directory })
    }

    /// Manifest path for an issuer.
    ///
    /// Distinguished names contain characters that are not filesystem-safe,
    /// so the file name is a sanitized form plus a hash suffix that keeps
    /// distinct issuers from colliding.
    fn manifest_path(&self, issuer_name: &str) -> PathBuf {
        use sha2::{Digest, Sha256};

        let sanitized: String = issuer_name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .take(48)
            .collect();
        let digest = Sha256::digest(issuer_name.as_bytes());
        let suffix: String = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();

        self.directory.join(format!("{}-{}.toml", sanitized, suffix))
    }

    fn read_manifest(&self, path: &Path) -> Result<PointManifest> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| {
            OcspError::store(format!("Invalid manifest {}: {}", path.display(), e))
        })
    }

    fn point_from_manifest(&self, manifest: &PointManifest) -> Result<(IssuingPoint, Option<ParsedCrl>)> {
        let point = match &manifest.certificate {
            Some(b64) => {
                let der = BASE64_STANDARD.decode(b64)?;
                let cert = Certificate::from_der(&der).map_err(|e| {
                    OcspError::store(format!(
                        "Invalid certificate in manifest for '{}': {}",
                        manifest.issuer, e
                    ))
                })?;
                IssuingPoint::from_certificate(cert)?
            }
            None => IssuingPoint::new(&manifest.issuer),
        };

        let crl = match &manifest.crl {
            Some(b64) => {
                let der = BASE64_STANDARD.decode(b64)?;
                Some(ParsedCrl::from_der(&der)?)
            }
            None => None,
        };

        Ok((point, crl))
    }
}

#[async_trait]
impl RegistryStore for FileStore {
    async fn persist_point(&self, point: &IssuingPoint) -> Result<()> {
        let manifest = PointManifest {
            issuer: point.issuer_name().to_string(),
            certificate: match point.certificate() {
                Some(cert) => Some(BASE64_STANDARD.encode(cert.to_der()?)),
                None => None,
            },
            crl: point
                .crl()
                .map(|state| BASE64_STANDARD.encode(state.as_der())),
        };

        let contents = toml::to_string_pretty(&manifest)
            .map_err(|e| OcspError::store(format!("Manifest serialize: {}", e)))?;

        let path = self.manifest_path(point.issuer_name());
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &path)?;

        debug!(
            "Persisted issuing point {} to {}",
            point.issuer_name(),
            path.display()
        );
        Ok(())
    }

    async fn remove_point(&self, issuer_name: &str) -> Result<()> {
        let path = self.manifest_path(issuer_name);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed manifest {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_into(&self, registry: &Registry) -> Result<usize> {
        let mut loaded = 0;

        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }

            let manifest = self.read_manifest(&path)?;
            let (point, crl) = self.point_from_manifest(&manifest)?;

            registry.register(point).await?;
            if let Some(parsed) = crl {
                registry.install_crl(&parsed).await?;
            }
            loaded += 1;
        }

        info!(
            "Loaded {} issuing points from {}",
            loaded,
            self.directory.display()
        );
        Ok(loaded)
    }
}
