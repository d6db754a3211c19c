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

//! Parsed certificate revocation lists.
//!
//! [`ParsedCrl`] wraps an RFC 5280 `CertificateList` and exposes the fields
//! the ingestion pipeline and registry act on: the issuer, the update window,
//! the CRL number, the delta indicator, and the revoked entries with their
//! reason codes.

use der::asn1::Uint;
use der::{Decode, Encode};
use std::fmt;
use std::time::SystemTime;
use x509_cert::crl::CertificateList;
use x509_cert::ext::pkix::CrlReason;
use x509_cert::ext::Extension;
use x509_cert::name::Name;

use crate::error::{OcspError, Result};

use const_oid::db::rfc5280::{ID_CE_CRL_NUMBER, ID_CE_CRL_REASONS, ID_CE_DELTA_CRL_INDICATOR};

/// Normalize a serial number to its minimal big-endian magnitude.
///
/// CRL entries and request CertIDs may encode the same serial with different
/// amounts of zero padding; both sides of a lookup go through this so the
/// comparison is on value, not encoding.
pub fn normalize_serial(bytes: &[u8]) -> Vec<u8> {
    match bytes.iter().position(|&b| b != 0) {
        Some(first) => bytes[first..].to_vec(),
        None => vec![0],
    }
}

/// A CRL number: the monotonically increasing sequence number a CA assigns
/// to each CRL it issues (RFC 5280 Section 5.2.3).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CrlNumber(Vec<u8>);

impl CrlNumber {
    fn from_magnitude(bytes: &[u8]) -> Self {
        Self(normalize_serial(bytes))
    }

    /// Minimal big-endian magnitude of the number.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Ord for CrlNumber {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Magnitudes are already minimal, so a longer one is larger.
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for CrlNumber {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CrlNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.len() <= 16 {
            let mut value = 0u128;
            for &b in &self.0 {
                value = (value << 8) | u128::from(b);
            }
            write!(f, "{}", value)
        } else {
            write!(f, "0x")?;
            for b in &self.0 {
                write!(f, "{:02x}", b)?;
            }
            Ok(())
        }
    }
}

/// One revoked certificate from a CRL.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RevokedEntry {
    /// Serial number, normalized via [`normalize_serial`].
    pub serial: Vec<u8>,

    /// When the certificate was revoked.
    pub revoked_at: SystemTime,

    /// Reason code from the entry's cRLReasons extension, when present and
    /// decodable.
    pub reason: Option<CrlReason>,
}

/// A decoded CRL with the fields relevant to ingestion and status resolution.
#[derive(Clone, Debug)]
pub struct ParsedCrl {
    crl: CertificateList,
    der: Vec<u8>,
    issuer: String,
    this_update: SystemTime,
    next_update: Option<SystemTime>,
    crl_number: Option<CrlNumber>,
    is_delta: bool,
}

impl ParsedCrl {
    /// Decode a DER-encoded CRL.
    ///
    /// Anything that does not decode as a complete `CertificateList` is
    /// rejected, including trailing garbage after a valid prefix.
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let crl = CertificateList::from_der(bytes)
            .map_err(|e| OcspError::malformed_crl(e.to_string()))?;

        let issuer = name_string(&crl.tbs_cert_list.issuer);
        let this_update = crl.tbs_cert_list.this_update.to_system_time();
        let next_update = crl.tbs_cert_list.next_update.map(|t| t.to_system_time());
        let crl_number = crl_extension(&crl, ID_CE_CRL_NUMBER)
            .and_then(|ext| Uint::from_der(ext.extn_value.as_bytes()).ok())
            .map(|n| CrlNumber::from_magnitude(n.as_bytes()));
        let is_delta = crl_extension(&crl, ID_CE_DELTA_CRL_INDICATOR).is_some();

        Ok(Self {
            crl,
            der: bytes.to_vec(),
            issuer,
            this_update,
            next_update,
            crl_number,
            is_delta,
        })
    }

    /// The issuer distinguished name in RFC 4514 string form.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The issuer distinguished name.
    pub fn issuer_name(&self) -> &Name {
        &self.crl.tbs_cert_list.issuer
    }

    /// thisUpdate of the CRL.
    pub fn this_update(&self) -> SystemTime {
        self.this_update
    }

    /// nextUpdate of the CRL, when present.
    pub fn next_update(&self) -> Option<SystemTime> {
        self.next_update
    }

    /// The cRLNumber extension value, when present and decodable.
    pub fn crl_number(&self) -> Option<&CrlNumber> {
        self.crl_number.as_ref()
    }

    /// Whether the CRL carries the delta CRL indicator extension.
    pub fn is_delta(&self) -> bool {
        self.is_delta
    }

    /// Number of revoked entries on the CRL.
    pub fn revoked_count(&self) -> usize {
        self.crl
            .tbs_cert_list
            .revoked_certificates
            .as_ref()
            .map_or(0, Vec::len)
    }

    /// Extract the revoked entries with normalized serials and reason codes.
    ///
    /// An entry whose cRLReasons extension does not decode keeps its place on
    /// the list with no reason; the revocation itself is what matters.
    pub fn revoked_entries(&self) -> Vec<RevokedEntry> {
        let Some(revoked) = &self.crl.tbs_cert_list.revoked_certificates else {
            return Vec::new();
        };

        revoked
            .iter()
            .map(|rc| {
                let reason = rc
                    .crl_entry_extensions
                    .iter()
                    .flatten()
                    .find(|ext| ext.extn_id == ID_CE_CRL_REASONS)
                    .and_then(|ext| CrlReason::from_der(ext.extn_value.as_bytes()).ok());

                RevokedEntry {
                    serial: normalize_serial(rc.serial_number.as_bytes()),
                    revoked_at: rc.revocation_date.to_system_time(),
                    reason,
                }
            })
            .collect()
    }

    /// DER encoding of the TBS certificate list, the input to signature
    /// verification.
    pub fn tbs_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.crl.tbs_cert_list.to_der()?)
    }

    /// The CRL's signature algorithm.
    pub fn signature_algorithm(&self) -> &spki::AlgorithmIdentifierOwned {
        &self.crl.signature_algorithm
    }

    /// The raw signature bits.
    pub fn signature_bits(&self) -> &[u8] {
        self.crl.signature.raw_bytes()
    }

    /// The original DER encoding of the whole CRL.
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// The underlying certificate list.
    pub fn certificate_list(&self) -> &CertificateList {
        &self.crl
    }
}

/// Render a distinguished name in its RFC 4514 string form.
///
/// Every place that keys or reports on issuer names routes through this, so
/// a CRL issuer and a certificate subject for the same DN compare equal.
pub fn name_string(name: &Name) -> String {
    name.to_string()
}

fn crl_extension(crl: &CertificateList, oid: der::asn1::ObjectIdentifier) -> Option<&Extension> {
    crl.tbs_cert_list
        .crl_extensions
        .iter()
        .flatten()
        .find(|ext| ext.extn_id == oid)
}
