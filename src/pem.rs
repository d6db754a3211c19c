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

//! Textual framing for administrative submissions.
//!
//! CRLs and issuer certificates arrive on the admin surfaces either as raw
//! DER or wrapped in begin/end markers with base64 between them. This module
//! unwraps both forms and parses PKCS#7 chains carried in certificate
//! submissions.

use base64::prelude::*;
use cms::content_info::ContentInfo;
use cms::signed_data::SignedData;
use der::{Decode, Encode};
use x509_cert::Certificate;

use crate::error::{OcspError, Result};

/// Marker labels accepted for CRL submissions. The first is the label the
/// legacy administrative forms produce; the second is the RFC 7468 label.
pub const CRL_LABELS: &[&str] = &["CERTIFICATE REVOCATION LIST", "X509 CRL"];

/// Marker labels accepted for issuer submissions: a single certificate or a
/// PKCS#7 certificate chain.
pub const ISSUER_LABELS: &[&str] = &["CERTIFICATE", "PKCS7"];

/// A submission decoded to DER, remembering the marker label it arrived
/// under when the input was marker-framed.
#[derive(Debug, Clone)]
pub struct DecodedSubmission {
    /// The decoded DER bytes.
    pub der: Vec<u8>,

    /// The marker label, `None` when the input was raw DER.
    pub label: Option<String>,
}

/// Decode a submission that is either raw DER or a marker-framed base64
/// block with one of the accepted labels.
///
/// Marker handling is tolerant of text surrounding the block, but a begin
/// marker without its end marker (or no markers at all on textual input) is
/// rejected.
pub fn decode_submission(input: &[u8], labels: &[&str]) -> Result<DecodedSubmission> {
    // DER SEQUENCE tag; every submission type this crate accepts is a SEQUENCE.
    if input.first() == Some(&0x30) {
        return Ok(DecodedSubmission {
            der: input.to_vec(),
            label: None,
        });
    }

    let text = std::str::from_utf8(input)
        .map_err(|_| OcspError::missing_pem_markers(expected_label(labels)))?;

    for label in labels {
        let begin = format!("-----BEGIN {}-----", label);
        let end = format!("-----END {}-----", label);

        let Some(begin_at) = text.find(&begin) else {
            continue;
        };
        let body_start = begin_at + begin.len();

        let Some(end_at) = text[body_start..].find(&end) else {
            return Err(OcspError::missing_pem_markers(format!(
                "{} (end marker not found)",
                label
            )));
        };

        let body = &text[body_start..body_start + end_at];
        let der = decode_base64(body.as_bytes())?;
        return Ok(DecodedSubmission {
            der,
            label: Some((*label).to_string()),
        });
    }

    Err(OcspError::missing_pem_markers(expected_label(labels)))
}

fn expected_label(labels: &[&str]) -> String {
    labels.first().copied().unwrap_or("PEM").to_string()
}

/// Decode base64 data, tolerating interior whitespace and line endings.
pub(crate) fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    BASE64_STANDARD.decode(&cleaned).map_err(OcspError::Base64)
}

/// Parse the certificates out of a DER-encoded PKCS#7 SignedData blob.
///
/// Certificate chains submitted to the issuer admin endpoint use the CMS
/// "certs-only" layout; signer info is ignored, only the certificate set
/// matters here.
pub fn parse_pkcs7_chain(der: &[u8]) -> Result<Vec<Certificate>> {
    let content_info = ContentInfo::from_der(der)
        .map_err(|e| OcspError::cms_parsing(format!("Failed to parse ContentInfo: {}", e)))?;

    let signed_data = extract_signed_data(&content_info)?;
    extract_certificates(&signed_data)
}

/// Extract SignedData from ContentInfo.
fn extract_signed_data(content_info: &ContentInfo) -> Result<SignedData> {
    // OID for SignedData: 1.2.840.113549.1.7.2
    const SIGNED_DATA_OID: &str = "1.2.840.113549.1.7.2";

    let oid_str = content_info.content_type.to_string();
    if oid_str != SIGNED_DATA_OID {
        return Err(OcspError::cms_parsing(format!(
            "Expected SignedData OID, got {}",
            oid_str
        )));
    }

    let content = content_info
        .content
        .to_der()
        .map_err(|e| OcspError::cms_parsing(format!("Failed to encode content: {}", e)))?;

    SignedData::from_der(&content)
        .map_err(|e| OcspError::cms_parsing(format!("Failed to parse SignedData: {}", e)))
}

/// Extract X.509 certificates from SignedData, skipping other choices.
fn extract_certificates(signed_data: &SignedData) -> Result<Vec<Certificate>> {
    let cert_set = match &signed_data.certificates {
        Some(certs) => certs,
        None => return Ok(Vec::new()),
    };

    let mut certificates = Vec::new();

    for cert_choice in cert_set.0.iter() {
        let cert_der = cert_choice
            .to_der()
            .map_err(|e| OcspError::cms_parsing(format!("Failed to encode certificate: {}", e)))?;

        match Certificate::from_der(&cert_der) {
            Ok(cert) => certificates.push(cert),
            Err(e) => {
                tracing::warn!("Skipping non-X.509 entry in PKCS#7 chain: {}", e);
            }
        }
    }

    Ok(certificates)
}
