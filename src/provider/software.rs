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

//! Software (in-memory) signature providers.
//!
//! [`SoftwareVerifier`] checks CRL signatures with the RustCrypto
//! implementations of RSA PKCS#1 v1.5 and ECDSA on P-256/P-384.
//! [`SoftwareSigner`] signs response data with an in-memory ECDSA P-256 key.
//!
//! # Security Considerations
//!
//! **WARNING**: [`SoftwareSigner`] holds the responder's private key in
//! process memory. The key:
//!
//! - Is not protected by a hardware security boundary
//! - May be swapped to disk by the operating system
//! - Can be extracted via memory dumps or debugging tools
//!
//! For production responders, back [`ResponseSigner`] with an HSM, TPM, or
//! KMS instead. Verification has no such concern; [`SoftwareVerifier`] only
//! ever handles public keys.

use async_trait::async_trait;
use const_oid::db::rfc5912::{
    ECDSA_WITH_SHA_256, ECDSA_WITH_SHA_384, SHA_1_WITH_RSA_ENCRYPTION,
    SHA_256_WITH_RSA_ENCRYPTION, SHA_384_WITH_RSA_ENCRYPTION, SHA_512_WITH_RSA_ENCRYPTION,
};
use der::asn1::OctetString;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use signature::{Signer, Verifier};
use spki::AlgorithmIdentifierOwned;
use x509_cert::name::Name;
use x509_cert::Certificate;

use super::{ProviderInfo, ResponseSigner, SignatureVerifier};
use crate::error::{OcspError, Result};
use crate::types::crl::name_string;
use crate::types::ocsp::ResponderId;

/// Software-based CRL signature verifier.
///
/// Stateless; dispatch is on the signature algorithm OID of the submitted
/// CRL. ECDSA-with-SHA256 requires a P-256 issuer key and ECDSA-with-SHA384
/// a P-384 key, matching how CAs pair curves with digests in practice.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftwareVerifier;

impl SoftwareVerifier {
    /// Create a new software verifier.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SignatureVerifier for SoftwareVerifier {
    async fn verify(
        &self,
        signer: &Certificate,
        algorithm: &AlgorithmIdentifierOwned,
        message: &[u8],
        signature: &[u8],
    ) -> Result<()> {
        let issuer = name_string(&signer.tbs_certificate.subject);
        let key_bits = signer
            .tbs_certificate
            .subject_public_key_info
            .subject_public_key
            .raw_bytes();

        match algorithm.oid {
            oid if oid == ECDSA_WITH_SHA_256 => {
                let key = p256::ecdsa::VerifyingKey::from_sec1_bytes(key_bits).map_err(|e| {
                    OcspError::signature_invalid(&issuer, format!("P-256 key: {}", e))
                })?;
                let sig = p256::ecdsa::Signature::from_der(signature).map_err(|e| {
                    OcspError::signature_invalid(&issuer, format!("signature encoding: {}", e))
                })?;
                key.verify(message, &sig)
                    .map_err(|_| OcspError::signature_invalid(&issuer, "signature mismatch"))
            }
            oid if oid == ECDSA_WITH_SHA_384 => {
                let key = p384::ecdsa::VerifyingKey::from_sec1_bytes(key_bits).map_err(|e| {
                    OcspError::signature_invalid(&issuer, format!("P-384 key: {}", e))
                })?;
                let sig = p384::ecdsa::Signature::from_der(signature).map_err(|e| {
                    OcspError::signature_invalid(&issuer, format!("signature encoding: {}", e))
                })?;
                key.verify(message, &sig)
                    .map_err(|_| OcspError::signature_invalid(&issuer, "signature mismatch"))
            }
            oid if oid == SHA_1_WITH_RSA_ENCRYPTION => {
                verify_rsa(&issuer, key_bits, message, signature, RsaDigest::Sha1)
            }
            oid if oid == SHA_256_WITH_RSA_ENCRYPTION => {
                verify_rsa(&issuer, key_bits, message, signature, RsaDigest::Sha256)
            }
            oid if oid == SHA_384_WITH_RSA_ENCRYPTION => {
                verify_rsa(&issuer, key_bits, message, signature, RsaDigest::Sha384)
            }
            oid if oid == SHA_512_WITH_RSA_ENCRYPTION => {
                verify_rsa(&issuer, key_bits, message, signature, RsaDigest::Sha512)
            }
            oid => Err(OcspError::unsupported_algorithm(format!(
                "signature algorithm {}",
                oid
            ))),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Software Signature Verifier".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            manufacturer: "usg-ocsp-responder".to_string(),
            algorithms: vec![
                "ecdsa-with-sha256",
                "ecdsa-with-sha384",
                "sha1-with-rsa",
                "sha256-with-rsa",
                "sha384-with-rsa",
                "sha512-with-rsa",
            ],
        }
    }
}

enum RsaDigest {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

fn verify_rsa(
    issuer: &str,
    key_bits: &[u8],
    message: &[u8],
    signature: &[u8],
    digest: RsaDigest,
) -> Result<()> {
    // The subjectPublicKey bits of an rsaEncryption SPKI hold a PKCS#1
    // RSAPublicKey.
    let key = RsaPublicKey::from_pkcs1_der(key_bits)
        .map_err(|e| OcspError::signature_invalid(issuer, format!("RSA key: {}", e)))?;

    let result = match digest {
        RsaDigest::Sha1 => key.verify(
            Pkcs1v15Sign::new::<Sha1>(),
            &Sha1::digest(message),
            signature,
        ),
        RsaDigest::Sha256 => key.verify(
            Pkcs1v15Sign::new::<Sha256>(),
            &Sha256::digest(message),
            signature,
        ),
        RsaDigest::Sha384 => key.verify(
            Pkcs1v15Sign::new::<Sha384>(),
            &Sha384::digest(message),
            signature,
        ),
        RsaDigest::Sha512 => key.verify(
            Pkcs1v15Sign::new::<Sha512>(),
            &Sha512::digest(message),
            signature,
        ),
    };

    result.map_err(|_| OcspError::signature_invalid(issuer, "signature mismatch"))
}

/// Software-based response signer using an in-memory ECDSA P-256 key.
#[derive(Clone)]
pub struct SoftwareSigner {
    key: p256::ecdsa::SigningKey,
    responder_id: ResponderId,
    certs: Vec<Certificate>,
}

impl SoftwareSigner {
    /// Create a signer from a P-256 signing key.
    ///
    /// The responder identifies itself by key hash: the SHA-1 of its public
    /// key bits, as RFC 6960 defines `KeyHash`.
    pub fn new(key: p256::ecdsa::SigningKey) -> Result<Self> {
        let point = key.verifying_key().to_encoded_point(false);
        let key_hash = Sha1::digest(point.as_bytes());

        Ok(Self {
            key,
            responder_id: ResponderId::ByKey(OctetString::new(key_hash.to_vec())?),
            certs: Vec::new(),
        })
    }

    /// Identify the responder by distinguished name instead of key hash.
    pub fn with_responder_name(mut self, name: Name) -> Self {
        self.responder_id = ResponderId::ByName(name);
        self
    }

    /// Attach a certificate to embed in responses, typically the responder's
    /// own signing certificate.
    pub fn with_certificate(mut self, cert: Certificate) -> Self {
        self.certs.push(cert);
        self
    }
}

#[async_trait]
impl ResponseSigner for SoftwareSigner {
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let signature: p256::ecdsa::Signature = self.key.sign(message);
        Ok(signature.to_der().as_bytes().to_vec())
    }

    fn algorithm_identifier(&self) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: ECDSA_WITH_SHA_256,
            parameters: None,
        }
    }

    fn responder_id(&self) -> ResponderId {
        self.responder_id.clone()
    }

    fn certificates(&self) -> Vec<Certificate> {
        self.certs.clone()
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Software Response Signer".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            manufacturer: "usg-ocsp-responder".to_string(),
            algorithms: vec!["ecdsa-with-sha256"],
        }
    }
}

impl std::fmt::Debug for SoftwareSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareSigner")
            .field("responder_id", &self.responder_id)
            .field("certs", &self.certs.len())
            .finish_non_exhaustive()
    }
}
