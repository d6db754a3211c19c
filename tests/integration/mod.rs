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

//! Shared fixtures for the end-to-end tests: generated CAs, signed CRLs,
//! and a fully wired responder stack.

mod lifecycle_test;
mod persistence_test;
mod transport_test;

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use base64::prelude::*;
use const_oid::db::rfc5280::{ID_CE_CRL_REASONS, ID_CE_DELTA_CRL_INDICATOR};
use const_oid::db::rfc5912::{ECDSA_WITH_SHA_256, ID_SHA_1};
use der::asn1::{BitString, OctetString, Uint};
use der::{Decode, Encode};
use p256::pkcs8::DecodePrivateKey;
use sha1::{Digest, Sha1};
use signature::Signer;
use spki::AlgorithmIdentifierOwned;
use x509_cert::crl::{CertificateList, RevokedCert, TbsCertList};
use x509_cert::ext::pkix::CrlReason;
use x509_cert::ext::Extension;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::Time;
use x509_cert::{Certificate, Version};

use usg_ocsp_responder::audit::AuditLog;
use usg_ocsp_responder::config::InstallMode;
use usg_ocsp_responder::ingest::CrlIngest;
use usg_ocsp_responder::provider::{SoftwareSigner, SoftwareVerifier};
use usg_ocsp_responder::registry::Registry;
use usg_ocsp_responder::resolver::StatusResolver;
use usg_ocsp_responder::responder::{OcspResponder, TransportResponse};
use usg_ocsp_responder::types::ocsp::{
    CertId, OcspRequest, OcspResponse, Request, TbsRequest, Version as OcspVersion,
};
use usg_ocsp_responder::RegistryAdmin;

/// Generate a self-signed CA and the key that signs its CRLs.
pub fn test_ca(cn: &str) -> (Certificate, p256::ecdsa::SigningKey) {
    let key_pair = rcgen::KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256).unwrap();
    let mut params = rcgen::CertificateParams::default();
    params.distinguished_name.push(rcgen::DnType::CommonName, cn);
    params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    let cert = params.self_signed(&key_pair).unwrap();

    let cert = Certificate::from_der(cert.der().as_ref()).unwrap();
    let key = p256::ecdsa::SigningKey::from_pkcs8_der(&key_pair.serialize_der()).unwrap();
    (cert, key)
}

/// Wrap DER bytes in begin/end markers, 64-column base64 between them.
pub fn pem_wrap(der: &[u8], label: &str) -> Vec<u8> {
    let b64 = BASE64_STANDARD.encode(der);
    let mut out = format!("-----BEGIN {label}-----\n");
    for chunk in b64.as_bytes().chunks(64) {
        out.push_str(std::str::from_utf8(chunk).unwrap());
        out.push('\n');
    }
    out.push_str(&format!("-----END {label}-----\n"));
    out.into_bytes()
}

/// Build a CRL for `ca`, signed with `key`, listing `revoked` serials.
pub fn signed_crl(
    ca: &Certificate,
    key: &p256::ecdsa::SigningKey,
    revoked: &[(&[u8], Option<CrlReason>)],
    this_update: SystemTime,
    delta: bool,
) -> Vec<u8> {
    let revoked_certificates = if revoked.is_empty() {
        None
    } else {
        Some(
            revoked
                .iter()
                .map(|(serial, reason)| RevokedCert {
                    serial_number: SerialNumber::new(serial).unwrap(),
                    revocation_date: Time::try_from(this_update).unwrap(),
                    crl_entry_extensions: reason.map(|r| {
                        vec![Extension {
                            extn_id: ID_CE_CRL_REASONS,
                            critical: false,
                            extn_value: OctetString::new(r.to_der().unwrap()).unwrap(),
                        }]
                    }),
                })
                .collect(),
        )
    };

    let crl_extensions = delta.then(|| {
        vec![Extension {
            extn_id: ID_CE_DELTA_CRL_INDICATOR,
            critical: true,
            extn_value: OctetString::new(Uint::new(&[0x01]).unwrap().to_der().unwrap()).unwrap(),
        }]
    });

    let tbs = TbsCertList {
        version: Version::V2,
        signature: AlgorithmIdentifierOwned {
            oid: ECDSA_WITH_SHA_256,
            parameters: None,
        },
        issuer: ca.tbs_certificate.subject.clone(),
        this_update: Time::try_from(this_update).unwrap(),
        next_update: Some(Time::try_from(this_update + Duration::from_secs(86400)).unwrap()),
        revoked_certificates,
        crl_extensions,
    };

    let signature: p256::ecdsa::Signature = key.sign(&tbs.to_der().unwrap());
    CertificateList {
        tbs_cert_list: tbs,
        signature_algorithm: AlgorithmIdentifierOwned {
            oid: ECDSA_WITH_SHA_256,
            parameters: None,
        },
        signature: BitString::from_bytes(signature.to_der().as_bytes()).unwrap(),
    }
    .to_der()
    .unwrap()
}

/// SHA-1 CertID for a certificate issued by `ca` with the given serial.
pub fn cert_id_for(ca: &Certificate, serial: &[u8]) -> CertId {
    let name_der = ca.tbs_certificate.subject.to_der().unwrap();
    let key_bits = ca
        .tbs_certificate
        .subject_public_key_info
        .subject_public_key
        .raw_bytes();

    CertId {
        hash_algorithm: AlgorithmIdentifierOwned {
            oid: ID_SHA_1,
            parameters: Some(der::Any::null()),
        },
        issuer_name_hash: OctetString::new(Sha1::digest(&name_der).to_vec()).unwrap(),
        issuer_key_hash: OctetString::new(Sha1::digest(key_bits).to_vec()).unwrap(),
        serial_number: SerialNumber::new(serial).unwrap(),
    }
}

/// Encode an unsigned OCSP request for the given CertIDs.
pub fn request_der(cert_ids: Vec<CertId>) -> Vec<u8> {
    OcspRequest {
        tbs_request: TbsRequest {
            version: OcspVersion::V1,
            requestor_name: None,
            request_list: cert_ids
                .into_iter()
                .map(|req_cert| Request {
                    req_cert,
                    single_request_extensions: None,
                })
                .collect(),
            request_extensions: None,
        },
        optional_signature: None,
    }
    .to_der()
    .unwrap()
}

/// Decode a transport reply that is expected to carry an OCSP response.
pub fn decode_ocsp(response: &TransportResponse) -> OcspResponse {
    assert_eq!(response.status, 200);
    assert!(response.is_ocsp());
    OcspResponse::from_der(&response.body).unwrap()
}

/// A fully wired responder stack sharing one registry.
pub struct Stack {
    pub registry: Arc<Registry>,
    pub admin: RegistryAdmin,
    pub ingest: CrlIngest,
    pub responder: OcspResponder,
}

impl Stack {
    /// Wire a stack with no persistence and audit disabled.
    pub fn new() -> Self {
        Self::with_audit(Arc::new(AuditLog::disabled()))
    }

    /// Wire a stack writing audit records through the given log.
    pub fn with_audit(audit: Arc<AuditLog>) -> Self {
        let registry = Arc::new(Registry::new());
        let admin = RegistryAdmin::new(registry.clone(), audit.clone());
        let ingest = CrlIngest::new(
            registry.clone(),
            Arc::new(SoftwareVerifier::new()),
            audit,
            InstallMode::Synchronous,
        );
        let responder = Self::responder_for(registry.clone());

        Self {
            registry,
            admin,
            ingest,
            responder,
        }
    }

    /// A responder answering from the given registry with a fixed signing
    /// key.
    pub fn responder_for(registry: Arc<Registry>) -> OcspResponder {
        let signer =
            SoftwareSigner::new(p256::ecdsa::SigningKey::from_slice(&[0x42; 32]).unwrap()).unwrap();
        OcspResponder::new(StatusResolver::new(registry), Arc::new(signer))
    }

    /// POST one CertID and decode the reply.
    pub async fn query(&self, cert_id: CertId) -> OcspResponse {
        let body = request_der(vec![cert_id]);
        let reply = self.responder.handle_post(Some(body.len() as u64), &body).await;
        decode_ocsp(&reply)
    }
}
