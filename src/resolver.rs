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

//! Certificate status resolution against the issuing-point registry.
//!
//! The resolver answers one question: given the issuer hashes and serial
//! number from an OCSP request, what does the currently installed revocation
//! state say about that certificate? It never consults anything outside the
//! registry, so resolution is a pure read with no partial state to unwind.

use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;
use x509_cert::ext::pkix::CrlReason;

use crate::registry::Registry;
use crate::types::crl::normalize_serial;
use crate::types::ocsp::CertId;

/// A certificate identified the way OCSP requests identify them: hashes of
/// the issuer name and key, plus the certificate serial number.
#[derive(Clone, Debug)]
pub struct CertificateIdentifier {
    cert_id: CertId,
    serial: Vec<u8>,
}

impl CertificateIdentifier {
    /// Build an identifier from a request CertID, normalizing the serial.
    pub fn from_cert_id(cert_id: CertId) -> Self {
        let serial = normalize_serial(cert_id.serial_number.as_bytes());
        Self { cert_id, serial }
    }

    /// The underlying CertID.
    pub fn cert_id(&self) -> &CertId {
        &self.cert_id
    }

    /// The serial number in normalized form.
    pub fn serial(&self) -> &[u8] {
        &self.serial
    }
}

/// Status of one certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertVerdict {
    /// No revocation record found and the deployment treats that as good.
    Good,

    /// The certificate appears on the installed CRL.
    Revoked {
        /// When the certificate was revoked.
        time: SystemTime,
        /// Reason code from the CRL entry, when present.
        reason: Option<CrlReason>,
    },

    /// Status cannot be asserted from the installed revocation state.
    Unknown,
}

impl CertVerdict {
    /// Check if the certificate is revoked.
    pub fn is_revoked(&self) -> bool {
        matches!(self, Self::Revoked { .. })
    }

    /// Check if the certificate is good.
    pub fn is_good(&self) -> bool {
        matches!(self, Self::Good)
    }

    /// Check if the status is unknown.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

/// A verdict together with the validity window of the CRL it came from.
///
/// The window is absent when no issuing point matched or the matching point
/// has no CRL installed; a policy `Unknown` for a serial missing from an
/// installed CRL still carries that CRL's window.
#[derive(Debug, Clone, Copy)]
pub struct StatusVerdict {
    /// The status verdict.
    pub verdict: CertVerdict,
    /// thisUpdate of the consulted CRL.
    pub this_update: Option<SystemTime>,
    /// nextUpdate of the consulted CRL.
    pub next_update: Option<SystemTime>,
}

impl StatusVerdict {
    fn unknown_without_window() -> Self {
        Self {
            verdict: CertVerdict::Unknown,
            this_update: None,
            next_update: None,
        }
    }
}

/// Resolves certificate identifiers to status verdicts.
pub struct StatusResolver {
    registry: Arc<Registry>,
    not_found_as_good: bool,
}

impl StatusResolver {
    /// Create a resolver with the default policy: a serial absent from the
    /// installed CRL is `Unknown`.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            not_found_as_good: false,
        }
    }

    /// Set whether a serial absent from an installed CRL resolves to `Good`.
    ///
    /// This flips the trust posture of "no record found" for the whole
    /// deployment; it is deliberately not a per-request option.
    pub fn with_not_found_as_good(mut self, enabled: bool) -> Self {
        self.not_found_as_good = enabled;
        self
    }

    /// Resolve a single certificate identifier.
    pub async fn resolve(&self, identifier: &CertificateIdentifier) -> StatusVerdict {
        let Some(point) = self.registry.find_by_cert_id(identifier.cert_id()).await else {
            debug!("No issuing point matches request CertID");
            return StatusVerdict::unknown_without_window();
        };

        let Some(state) = point.crl() else {
            debug!("Issuing point {} has no CRL installed", point.issuer_name());
            return StatusVerdict::unknown_without_window();
        };

        let verdict = match state.lookup_serial(identifier.serial()) {
            Some(entry) => CertVerdict::Revoked {
                time: entry.revoked_at,
                reason: entry.reason,
            },
            None if self.not_found_as_good => CertVerdict::Good,
            None => CertVerdict::Unknown,
        };

        StatusVerdict {
            verdict,
            this_update: Some(state.this_update()),
            next_update: state.next_update(),
        }
    }

    /// Resolve a batch of identifiers in request order.
    pub async fn resolve_all(&self, identifiers: &[CertificateIdentifier]) -> Vec<StatusVerdict> {
        let mut verdicts = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            verdicts.push(self.resolve(identifier).await);
        }
        verdicts
    }
}
