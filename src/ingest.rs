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

//! CRL ingestion pipeline.
//!
//! Validates a submitted CRL end-to-end and installs it into the registry.
//! Validation runs in a fixed order and the first failure aborts the
//! submission with a classified error, leaving the registry untouched:
//!
//! 1. Unwrap the textual framing (or accept raw DER) and decode the CRL.
//! 2. Resolve the target issuing point by the CRL's issuer name.
//! 3. Verify the CRL signature against the issuer certificate on file.
//!    Points registered without a certificate skip this step; the skip is
//!    logged as a warning since it leaves submissions for that issuer
//!    unauthenticated.
//! 4. Reject CRLs whose thisUpdate is not strictly newer than the installed
//!    one.
//! 5. Reject delta CRLs; only full CRLs are accepted.
//! 6. Install, either inline or on a background task depending on the
//!    configured [`InstallMode`].
//!
//! Every terminal outcome is written to the audit log.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use usg_ocsp_responder::audit::AuditLog;
//! use usg_ocsp_responder::config::InstallMode;
//! use usg_ocsp_responder::ingest::CrlIngest;
//! use usg_ocsp_responder::provider::SoftwareVerifier;
//! use usg_ocsp_responder::registry::Registry;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(Registry::new());
//! let ingest = CrlIngest::new(
//!     registry,
//!     Arc::new(SoftwareVerifier::new()),
//!     Arc::new(AuditLog::disabled()),
//!     InstallMode::Synchronous,
//! );
//!
//! let submission = std::fs::read("ca.crl.pem")?;
//! let accepted = ingest.submit(&submission).await?;
//! accepted.install.wait().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::audit::{format_timestamp, AuditLog};
use crate::config::InstallMode;
use crate::error::{OcspError, Result};
use crate::pem::{decode_submission, CRL_LABELS};
use crate::provider::SignatureVerifier;
use crate::registry::{IssuingPoint, Registry};
use crate::store::{NullStore, RegistryStore};
use crate::types::crl::{CrlNumber, ParsedCrl};

/// Issuer placeholder used in audit records when the submission never
/// decoded far enough to name one.
const UNDECODED_ISSUER: &str = "<undecoded>";

/// Outcome of an accepted CRL submission.
#[derive(Debug)]
pub struct CrlAccepted {
    /// Issuer distinguished name of the accepted CRL.
    pub issuer: String,

    /// CRL number, when the CRL carries one.
    pub crl_number: Option<CrlNumber>,

    /// Number of revoked entries on the CRL.
    pub revoked_count: usize,

    /// Handle to the installation, already complete in synchronous mode.
    pub install: InstallHandle,
}

/// Handle to a CRL installation.
///
/// In synchronous mode the installation finished before the submission
/// returned and [`InstallHandle::wait`] resolves immediately. In background
/// mode it resolves when the install task completes; dropping the handle
/// detaches the task without cancelling it.
#[derive(Debug)]
pub struct InstallHandle {
    task: Option<JoinHandle<Result<()>>>,
}

impl InstallHandle {
    fn completed() -> Self {
        Self { task: None }
    }

    fn background(task: JoinHandle<Result<()>>) -> Self {
        Self { task: Some(task) }
    }

    /// Whether the installation has finished (successfully or not).
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the installation to finish and return its outcome.
    pub async fn wait(self) -> Result<()> {
        match self.task {
            None => Ok(()),
            Some(task) => task
                .await
                .map_err(|e| OcspError::install(format!("install task aborted: {e}")))?,
        }
    }
}

/// The CRL ingestion pipeline.
pub struct CrlIngest {
    registry: Arc<Registry>,
    verifier: Arc<dyn SignatureVerifier>,
    audit: Arc<AuditLog>,
    install_mode: InstallMode,
    store: Arc<dyn RegistryStore>,
}

impl CrlIngest {
    /// Create a pipeline over the given registry, without persistence.
    pub fn new(
        registry: Arc<Registry>,
        verifier: Arc<dyn SignatureVerifier>,
        audit: Arc<AuditLog>,
        install_mode: InstallMode,
    ) -> Self {
        Self {
            registry,
            verifier,
            audit,
            install_mode,
            store: Arc::new(NullStore),
        }
    }

    /// Mirror installed CRLs to a durable store.
    ///
    /// Persistence runs after the in-memory swap; a write failure is logged
    /// but does not fail the submission, and is reconciled from the store on
    /// the next restart.
    pub fn with_store(mut self, store: Arc<dyn RegistryStore>) -> Self {
        self.store = store;
        self
    }

    /// Submit a CRL for validation and installation.
    ///
    /// Accepts the DER bytes either raw or wrapped in
    /// `CERTIFICATE REVOCATION LIST` / `X509 CRL` markers.
    pub async fn submit(&self, submission: &[u8]) -> Result<CrlAccepted> {
        let parsed = match self.decode(submission) {
            Ok(parsed) => parsed,
            Err(err) => {
                self.audit_rejection(UNDECODED_ISSUER, &err);
                return Err(err);
            }
        };

        match self.validate(&parsed).await {
            Ok(()) => {}
            Err(err) => {
                self.audit_rejection(parsed.issuer(), &err);
                return Err(err);
            }
        }

        let install = match self.install(parsed.clone()).await {
            Ok(install) => install,
            Err(err) => {
                self.audit_rejection(parsed.issuer(), &err);
                return Err(err);
            }
        };

        info!(
            "Accepted CRL for {} ({} revoked entries)",
            parsed.issuer(),
            parsed.revoked_count()
        );
        if let Err(e) =
            self.audit
                .crl_accepted(parsed.issuer(), parsed.crl_number(), parsed.revoked_count())
        {
            warn!("Audit write failed for accepted CRL: {}", e);
        }

        Ok(CrlAccepted {
            issuer: parsed.issuer().to_string(),
            crl_number: parsed.crl_number().cloned(),
            revoked_count: parsed.revoked_count(),
            install,
        })
    }

    fn decode(&self, submission: &[u8]) -> Result<ParsedCrl> {
        let decoded = decode_submission(submission, CRL_LABELS)?;
        debug!("Decoded CRL submission ({} bytes DER)", decoded.der.len());
        ParsedCrl::from_der(&decoded.der)
    }

    async fn validate(&self, parsed: &ParsedCrl) -> Result<()> {
        let point = self
            .registry
            .lookup(parsed.issuer())
            .await
            .ok_or_else(|| OcspError::unknown_issuer(parsed.issuer()))?;

        self.verify_signature(&point, parsed).await?;

        if let Some(current) = point.crl()
            && parsed.this_update() <= current.this_update()
        {
            return Err(OcspError::stale_crl(
                parsed.issuer(),
                format_timestamp(parsed.this_update()),
                format_timestamp(current.this_update()),
            ));
        }

        if parsed.is_delta() {
            return Err(OcspError::delta_crl(parsed.issuer()));
        }

        Ok(())
    }

    async fn verify_signature(&self, point: &IssuingPoint, parsed: &ParsedCrl) -> Result<()> {
        let Some(cert) = point.certificate() else {
            warn!(
                "No issuer certificate on file for {}; accepting CRL without signature verification",
                parsed.issuer()
            );
            return Ok(());
        };

        let tbs = parsed.tbs_bytes()?;
        self.verifier
            .verify(
                cert,
                parsed.signature_algorithm(),
                &tbs,
                parsed.signature_bits(),
            )
            .await?;
        debug!("CRL signature verified for {}", parsed.issuer());
        Ok(())
    }

    /// Install a validated CRL per the configured mode.
    ///
    /// The registry re-checks freshness under its write lock, so a CRL that
    /// was fresh at validation time but lost a race to a newer one still
    /// cannot roll revocation state backwards.
    async fn install(&self, parsed: ParsedCrl) -> Result<InstallHandle> {
        match self.install_mode {
            InstallMode::Synchronous => {
                let point = self.registry.install_crl(&parsed).await?;
                Self::persist(self.store.as_ref(), &point).await;
                Ok(InstallHandle::completed())
            }
            InstallMode::Background => {
                let registry = self.registry.clone();
                let audit = self.audit.clone();
                let store = self.store.clone();
                let task = tokio::spawn(async move {
                    match registry.install_crl(&parsed).await {
                        Ok(point) => {
                            Self::persist(store.as_ref(), &point).await;
                            Ok(())
                        }
                        Err(err) => {
                            warn!(
                                "Background CRL install for {} failed: {}",
                                parsed.issuer(),
                                err
                            );
                            if let Err(e) = audit.crl_rejected(
                                parsed.issuer(),
                                err.status_token(),
                                &err.to_string(),
                            ) {
                                warn!("Audit write failed for rejected CRL: {}", e);
                            }
                            Err(err)
                        }
                    }
                });
                Ok(InstallHandle::background(task))
            }
        }
    }

    async fn persist(store: &dyn RegistryStore, point: &IssuingPoint) {
        if let Err(e) = store.persist_point(point).await {
            error!(
                "Failed to persist issuing point {}: {}",
                point.issuer_name(),
                e
            );
        }
    }

    fn audit_rejection(&self, issuer: &str, err: &OcspError) {
        warn!("Rejected CRL submission for {}: {}", issuer, err);
        if let Err(e) = self
            .audit
            .crl_rejected(issuer, err.status_token(), &err.to_string())
        {
            warn!("Audit write failed for rejected CRL: {}", e);
        }
    }
}

/// Render a submission outcome in the minimal machine-readable form used by
/// the administrative endpoint's `noui` mode.
pub fn render_submission_result(result: &Result<CrlAccepted>) -> String {
    match result {
        Ok(_) => "status=0\n".to_string(),
        Err(err) => format!("status=1\nerror={}\n", err),
    }
}
