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

//! Issuing-point registry: per-issuer revocation state.
//!
//! The registry maps issuer distinguished names to [`IssuingPoint`]s. Each
//! point holds the issuer certificate (when one was supplied at registration)
//! and the currently installed CRL as an immutable [`CrlState`]. Installing a
//! newer CRL swaps the whole point atomically, so readers always see either
//! the old revocation state or the new one, never a mixture.
//!
//! # Example
//!
//! ```no_run
//! use usg_ocsp_responder::registry::{IssuingPoint, Registry};
//! use usg_ocsp_responder::types::ParsedCrl;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::new();
//! registry.register(IssuingPoint::new("CN=Example CA")).await?;
//!
//! let crl_der = std::fs::read("example-ca.crl")?;
//! let parsed = ParsedCrl::from_der(&crl_der)?;
//! registry.install_crl(&parsed).await?;
//!
//! assert!(registry.lookup("CN=Example CA").await.is_some());
//! # Ok(())
//! # }
//! ```

use der::Encode;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;
use tracing::{debug, info};
use x509_cert::Certificate;

use const_oid::db::rfc5912::{ID_SHA_1, ID_SHA_256};

use crate::audit::format_timestamp;
use crate::error::{OcspError, Result};
use crate::types::crl::{name_string, normalize_serial, CrlNumber, ParsedCrl, RevokedEntry};
use crate::types::ocsp::CertId;

/// Precomputed issuer hashes for OCSP CertID matching.
///
/// A CertID carries hashes of the issuer's distinguished name and public key
/// under a client-chosen algorithm. Computing both supported algorithms once
/// at registration keeps per-request matching to two byte comparisons.
#[derive(Clone, Debug)]
struct CertIdHashes {
    name_sha1: Vec<u8>,
    name_sha256: Vec<u8>,
    key_sha1: Vec<u8>,
    key_sha256: Vec<u8>,
}

impl CertIdHashes {
    fn compute(cert: &Certificate) -> Result<Self> {
        let name_der = cert.tbs_certificate.subject.to_der()?;
        let key_bits = cert
            .tbs_certificate
            .subject_public_key_info
            .subject_public_key
            .raw_bytes();

        Ok(Self {
            name_sha1: Sha1::digest(&name_der).to_vec(),
            name_sha256: Sha256::digest(&name_der).to_vec(),
            key_sha1: Sha1::digest(key_bits).to_vec(),
            key_sha256: Sha256::digest(key_bits).to_vec(),
        })
    }

    fn matches(&self, cert_id: &CertId) -> bool {
        let (name, key) = match cert_id.hash_algorithm.oid {
            oid if oid == ID_SHA_1 => (&self.name_sha1, &self.key_sha1),
            oid if oid == ID_SHA_256 => (&self.name_sha256, &self.key_sha256),
            _ => return false,
        };

        cert_id.issuer_name_hash.as_bytes() == name.as_slice()
            && cert_id.issuer_key_hash.as_bytes() == key.as_slice()
    }
}

/// The revocation state derived from one installed CRL.
///
/// Immutable once built; the registry replaces the whole state on each
/// successful install.
#[derive(Clone, Debug)]
pub struct CrlState {
    this_update: SystemTime,
    next_update: Option<SystemTime>,
    crl_number: Option<CrlNumber>,
    der: Vec<u8>,
    revoked: HashMap<Vec<u8>, RevokedEntry>,
}

impl CrlState {
    /// Build the state from a decoded CRL, indexing entries by normalized
    /// serial number.
    pub fn from_parsed(parsed: &ParsedCrl) -> Self {
        let revoked = parsed
            .revoked_entries()
            .into_iter()
            .map(|entry| (entry.serial.clone(), entry))
            .collect();

        Self {
            this_update: parsed.this_update(),
            next_update: parsed.next_update(),
            crl_number: parsed.crl_number().cloned(),
            der: parsed.as_der().to_vec(),
            revoked,
        }
    }

    /// thisUpdate of the installed CRL.
    pub fn this_update(&self) -> SystemTime {
        self.this_update
    }

    /// nextUpdate of the installed CRL, when present.
    pub fn next_update(&self) -> Option<SystemTime> {
        self.next_update
    }

    /// CRL number of the installed CRL, when present.
    pub fn crl_number(&self) -> Option<&CrlNumber> {
        self.crl_number.as_ref()
    }

    /// Number of revoked entries.
    pub fn revoked_count(&self) -> usize {
        self.revoked.len()
    }

    /// The DER bytes the state was built from.
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// Look up a serial number, tolerating zero-padded encodings.
    pub fn lookup_serial(&self, serial: &[u8]) -> Option<&RevokedEntry> {
        self.revoked.get(&normalize_serial(serial))
    }
}

/// One issuer's entry in the registry.
///
/// Holds the issuer identity, the optional issuer certificate, and the
/// currently installed CRL. Points are immutable; the registry swaps in a
/// replacement when a new CRL is installed.
#[derive(Clone, Debug)]
pub struct IssuingPoint {
    issuer_name: String,
    certificate: Option<Certificate>,
    hashes: Option<CertIdHashes>,
    crl: Option<Arc<CrlState>>,
}

impl IssuingPoint {
    /// Create an issuing point identified by distinguished name only.
    ///
    /// Without a certificate the point cannot be matched by OCSP CertID and
    /// CRL signatures for it cannot be verified; it still accepts CRLs and
    /// serves lookups by issuer name.
    pub fn new(issuer_name: impl Into<String>) -> Self {
        Self {
            issuer_name: issuer_name.into(),
            certificate: None,
            hashes: None,
            crl: None,
        }
    }

    /// Create an issuing point from the issuer's certificate.
    ///
    /// The issuer name is taken from the certificate subject; CertID hashes
    /// are precomputed from the subject and public key.
    pub fn from_certificate(certificate: Certificate) -> Result<Self> {
        let issuer_name = name_string(&certificate.tbs_certificate.subject);
        let hashes = CertIdHashes::compute(&certificate)?;

        Ok(Self {
            issuer_name,
            certificate: Some(certificate),
            hashes: Some(hashes),
            crl: None,
        })
    }

    /// The issuer distinguished name in RFC 4514 string form.
    pub fn issuer_name(&self) -> &str {
        &self.issuer_name
    }

    /// The issuer certificate, when one was supplied at registration.
    pub fn certificate(&self) -> Option<&Certificate> {
        self.certificate.as_ref()
    }

    /// The currently installed CRL state, when one has been installed.
    pub fn crl(&self) -> Option<Arc<CrlState>> {
        self.crl.clone()
    }

    /// Whether a CRL has been installed for this point.
    pub fn has_crl(&self) -> bool {
        self.crl.is_some()
    }

    /// Whether this point's issuer matches the CertID from an OCSP request.
    ///
    /// Always false for points registered without a certificate.
    pub fn matches_cert_id(&self, cert_id: &CertId) -> bool {
        self.hashes
            .as_ref()
            .is_some_and(|hashes| hashes.matches(cert_id))
    }

    fn with_state(&self, state: Arc<CrlState>) -> Self {
        Self {
            issuer_name: self.issuer_name.clone(),
            certificate: self.certificate.clone(),
            hashes: self.hashes.clone(),
            crl: Some(state),
        }
    }
}

/// Registry of issuing points, keyed by issuer distinguished name.
#[derive(Debug, Default)]
pub struct Registry {
    points: RwLock<HashMap<String, Arc<IssuingPoint>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new issuing point.
    ///
    /// Fails with [`OcspError::PointExists`] if the issuer already has one.
    pub async fn register(&self, point: IssuingPoint) -> Result<()> {
        let mut points = self.points.write().await;
        match points.entry(point.issuer_name.clone()) {
            Entry::Occupied(entry) => Err(OcspError::point_exists(entry.key())),
            Entry::Vacant(entry) => {
                info!("Registered issuing point for {}", point.issuer_name);
                entry.insert(Arc::new(point));
                Ok(())
            }
        }
    }

    /// Remove an issuing point, returning its final state.
    ///
    /// Fails with [`OcspError::PointNotFound`] if the issuer has none.
    pub async fn remove(&self, issuer_name: &str) -> Result<Arc<IssuingPoint>> {
        let mut points = self.points.write().await;
        let point = points
            .remove(issuer_name)
            .ok_or_else(|| OcspError::point_not_found(issuer_name))?;
        info!("Removed issuing point for {}", issuer_name);
        Ok(point)
    }

    /// Look up an issuing point by issuer distinguished name.
    pub async fn lookup(&self, issuer_name: &str) -> Option<Arc<IssuingPoint>> {
        self.points.read().await.get(issuer_name).cloned()
    }

    /// Find the issuing point matching the CertID from an OCSP request.
    pub async fn find_by_cert_id(&self, cert_id: &CertId) -> Option<Arc<IssuingPoint>> {
        self.points
            .read()
            .await
            .values()
            .find(|point| point.matches_cert_id(cert_id))
            .cloned()
    }

    /// Install a CRL into its issuer's point, atomically replacing the
    /// previous revocation state.
    ///
    /// The freshness check runs inside the write lock: even if two installs
    /// for the same issuer race, whichever commits second must carry a
    /// strictly newer thisUpdate or fail with [`OcspError::StaleCrl`].
    pub async fn install_crl(&self, parsed: &ParsedCrl) -> Result<Arc<IssuingPoint>> {
        let issuer = parsed.issuer();
        let mut points = self.points.write().await;

        let point = points
            .get(issuer)
            .ok_or_else(|| OcspError::unknown_issuer(issuer))?;

        if let Some(current) = &point.crl
            && parsed.this_update() <= current.this_update()
        {
            return Err(OcspError::stale_crl(
                issuer,
                format_timestamp(parsed.this_update()),
                format_timestamp(current.this_update()),
            ));
        }

        let state = Arc::new(CrlState::from_parsed(parsed));
        let replacement = Arc::new(point.with_state(state.clone()));
        points.insert(issuer.to_string(), replacement.clone());

        info!(
            "Installed CRL for {} ({} revoked entries)",
            issuer,
            state.revoked_count()
        );
        Ok(replacement)
    }

    /// All registered issuer names, sorted.
    pub async fn issuer_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.points.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Snapshot of all issuing points, sorted by issuer name.
    pub async fn snapshot(&self) -> Vec<Arc<IssuingPoint>> {
        let mut points: Vec<Arc<IssuingPoint>> =
            self.points.read().await.values().cloned().collect();
        points.sort_by(|a, b| a.issuer_name.cmp(&b.issuer_name));
        debug!("Registry snapshot: {} issuing points", points.len());
        points
    }

    /// Number of registered issuing points.
    pub async fn len(&self) -> usize {
        self.points.read().await.len()
    }

    /// Whether the registry has no issuing points.
    pub async fn is_empty(&self) -> bool {
        self.points.read().await.is_empty()
    }
}
