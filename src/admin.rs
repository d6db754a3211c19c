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

//! Registry admin operations: onboarding and offboarding issuers.
//!
//! Adding an issuing point takes a certificate submission (a single
//! certificate or a PKCS#7 chain, marker-framed or raw DER), picks the
//! effective issuer per the configured [`ChainSelection`] policy, and
//! registers a fresh point. The default policy rejects chains outright: the
//! caller must name the issuer explicitly rather than have one inferred.
//! Removal deletes the point and with it all revocation state for that
//! issuer; subsequent queries for its certificates answer `unknown`.
//!
//! Both operations are audit-logged and mirrored to the registry store.

use std::sync::Arc;
use tracing::{info, warn};
use x509_cert::Certificate;

use crate::audit::AuditLog;
use crate::config::ChainSelection;
use crate::error::{OcspError, Result};
use crate::pem::{decode_submission, parse_pkcs7_chain, ISSUER_LABELS};
use crate::registry::{IssuingPoint, Registry};
use crate::store::{NullStore, RegistryStore};
use crate::types::crl::name_string;

/// Outcome of a successful add-issuing-point operation.
#[derive(Debug, Clone)]
pub struct AddedIssuer {
    /// Issuer distinguished name the point was registered under.
    pub issuer: String,

    /// Number of certificates in the submission the issuer was chosen from.
    pub chain_length: usize,
}

/// Administrative operations on the issuing-point registry.
pub struct RegistryAdmin {
    registry: Arc<Registry>,
    audit: Arc<AuditLog>,
    store: Arc<dyn RegistryStore>,
    chain_selection: ChainSelection,
}

impl RegistryAdmin {
    /// Create an admin surface over the given registry, without persistence.
    pub fn new(registry: Arc<Registry>, audit: Arc<AuditLog>) -> Self {
        Self {
            registry,
            audit,
            store: Arc::new(NullStore),
            chain_selection: ChainSelection::default(),
        }
    }

    /// Mirror admin changes to a durable store.
    pub fn with_store(mut self, store: Arc<dyn RegistryStore>) -> Self {
        self.store = store;
        self
    }

    /// Set how the effective issuer is chosen from a chain submission.
    pub fn with_chain_selection(mut self, selection: ChainSelection) -> Self {
        self.chain_selection = selection;
        self
    }

    /// Register a new issuing point from a certificate submission.
    ///
    /// The submission is a single certificate or a PKCS#7 chain, either
    /// marker-framed (`CERTIFICATE` / `PKCS7`) or raw DER. Fails with
    /// [`OcspError::PointExists`] if the effective issuer already has a
    /// point.
    pub async fn add_issuing_point(&self, input: &[u8]) -> Result<AddedIssuer> {
        let certificates = self.parse_submission(input)?;
        let chain_length = certificates.len();
        let certificate = self.select_issuer(certificates)?;
        let issuer = name_string(&certificate.tbs_certificate.subject);

        let point = IssuingPoint::from_certificate(certificate)?;
        self.registry.register(point).await?;

        info!(
            "Added issuing point for {} (from {} certificate(s))",
            issuer, chain_length
        );
        if let Err(e) = self.audit.point_added(&issuer, true) {
            warn!("Audit write failed for added issuing point: {}", e);
        }
        if let Some(point) = self.registry.lookup(&issuer).await
            && let Err(e) = self.store.persist_point(&point).await
        {
            warn!("Failed to persist issuing point {}: {}", issuer, e);
        }

        Ok(AddedIssuer {
            issuer,
            chain_length,
        })
    }

    /// Remove an issuing point by issuer distinguished name.
    ///
    /// Fails with [`OcspError::PointNotFound`] if the issuer has no point.
    pub async fn remove_issuing_point(&self, issuer_name: &str) -> Result<()> {
        let point = self.registry.remove(issuer_name).await?;

        if let Err(e) = self.audit.point_removed(issuer_name, point.has_crl()) {
            warn!("Audit write failed for removed issuing point: {}", e);
        }
        if let Err(e) = self.store.remove_point(issuer_name).await {
            warn!(
                "Failed to remove persisted issuing point {}: {}",
                issuer_name, e
            );
        }

        Ok(())
    }

    fn parse_submission(&self, input: &[u8]) -> Result<Vec<Certificate>> {
        use der::Decode;

        let decoded = decode_submission(input, ISSUER_LABELS)?;

        let certificates = match decoded.label.as_deref() {
            Some("CERTIFICATE") => vec![Certificate::from_der(&decoded.der)
                .map_err(|e| OcspError::certificate_parsing(e.to_string()))?],
            Some("PKCS7") => parse_pkcs7_chain(&decoded.der)?,
            // Raw DER: a certificate and a PKCS#7 blob are both SEQUENCEs,
            // so try the certificate reading first and fall back to CMS.
            _ => match Certificate::from_der(&decoded.der) {
                Ok(cert) => vec![cert],
                Err(cert_err) => parse_pkcs7_chain(&decoded.der).map_err(|_| {
                    OcspError::certificate_parsing(format!(
                        "neither a certificate ({}) nor a PKCS#7 chain",
                        cert_err
                    ))
                })?,
            },
        };

        if certificates.is_empty() {
            return Err(OcspError::certificate_parsing(
                "submission contains no certificates",
            ));
        }
        Ok(certificates)
    }

    /// Pick the effective issuer certificate per the configured policy.
    fn select_issuer(&self, mut certificates: Vec<Certificate>) -> Result<Certificate> {
        if certificates.len() == 1 {
            return Ok(certificates.swap_remove(0));
        }

        match self.chain_selection {
            ChainSelection::SingleOnly => Err(OcspError::certificate_parsing(format!(
                "chain of {} certificates submitted, but policy requires a single certificate",
                certificates.len()
            ))),
            ChainSelection::SelfSignedRoot => {
                let mut roots: Vec<Certificate> =
                    certificates.into_iter().filter(is_self_signed).collect();
                match roots.len() {
                    1 => Ok(roots.remove(0)),
                    0 => Err(OcspError::certificate_parsing(
                        "chain contains no self-signed certificate",
                    )),
                    n => Err(OcspError::certificate_parsing(format!(
                        "chain contains {} self-signed certificates; issuer is ambiguous",
                        n
                    ))),
                }
            }
            ChainSelection::FirstEntry => {
                let position = certificates.iter().position(is_self_signed).unwrap_or(0);
                Ok(certificates.swap_remove(position))
            }
        }
    }
}

fn is_self_signed(cert: &Certificate) -> bool {
    cert.tbs_certificate.subject == cert.tbs_certificate.issuer
}

/// Render an admin operation outcome in the minimal machine-readable form
/// used by the administrative endpoints' `noui` mode.
pub fn render_admin_result<T>(result: &Result<T>) -> String {
    match result {
        Ok(_) => "status=0\n".to_string(),
        Err(err) => format!("status=1\nerror={}\n", err),
    }
}
