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

//! Cryptographic provider abstraction for CRL verification and response
//! signing.
//!
//! This module provides trait-based seams for the two places the responder
//! touches key material: verifying the signature on a submitted CRL against
//! the issuer certificate on file, and signing the response data it produces.
//! Deployments back these with whatever holds their keys; the in-memory
//! [`SoftwareVerifier`] and [`SoftwareSigner`] cover development, testing,
//! and software-key deployments.
//!
//! # Key Features
//!
//! - **Async-first design**: Signing may leave the process (HSM, KMS), so
//!   both traits are async
//! - **Provider-agnostic**: The pipeline and responder only see the traits
//! - **Algorithm-checked**: Unsupported algorithm OIDs are reported, never
//!   silently accepted
//!
//! # Example
//!
//! ```no_run
//! use usg_ocsp_responder::provider::{ResponseSigner, SoftwareSigner};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let signing_key = p256::ecdsa::SigningKey::from_slice(&[0x17; 32])?;
//! let signer = SoftwareSigner::new(signing_key)?;
//! println!("signing with {}", signer.provider_info().name);
//! # Ok(())
//! # }
//! ```

mod software;

pub use software::{SoftwareSigner, SoftwareVerifier};

use async_trait::async_trait;
use spki::AlgorithmIdentifierOwned;
use x509_cert::Certificate;

use crate::error::Result;
use crate::types::ocsp::ResponderId;

/// Information about a provider implementation.
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    /// Provider name.
    pub name: String,

    /// Provider version.
    pub version: String,

    /// Provider manufacturer or origin.
    pub manufacturer: String,

    /// Names of the signature algorithms the provider handles.
    pub algorithms: Vec<&'static str>,
}

/// Verifies signatures made by certificate subjects.
///
/// The ingestion pipeline hands this the issuer certificate on file for an
/// issuing point together with a submitted CRL's TBS bytes and signature.
#[async_trait]
pub trait SignatureVerifier: Send + Sync {
    /// Verify `signature` over `message` against the public key of `signer`,
    /// using the signature algorithm identified by `algorithm`.
    ///
    /// Returns `Ok(())` only when the signature verifies. Failures
    /// distinguish an algorithm the provider does not handle
    /// ([`OcspError::UnsupportedAlgorithm`]) from a signature that does not
    /// check out ([`OcspError::SignatureInvalid`]).
    ///
    /// [`OcspError::UnsupportedAlgorithm`]: crate::error::OcspError::UnsupportedAlgorithm
    /// [`OcspError::SignatureInvalid`]: crate::error::OcspError::SignatureInvalid
    async fn verify(
        &self,
        signer: &Certificate,
        algorithm: &AlgorithmIdentifierOwned,
        message: &[u8],
        signature: &[u8],
    ) -> Result<()>;

    /// Get provider information.
    fn provider_info(&self) -> ProviderInfo;
}

/// Signs OCSP response data on behalf of the responder identity.
#[async_trait]
pub trait ResponseSigner: Send + Sync {
    /// Sign `message`, returning the signature bytes ready to wrap in the
    /// response's BIT STRING (DER form for ECDSA, PKCS#1 for RSA).
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;

    /// Algorithm identifier describing the signatures this signer produces.
    fn algorithm_identifier(&self) -> AlgorithmIdentifierOwned;

    /// The responder identity to place in `ResponseData`.
    fn responder_id(&self) -> ResponderId;

    /// Certificates to embed alongside the response so relying parties can
    /// verify it. Empty when the deployment distributes the responder
    /// certificate out of band.
    fn certificates(&self) -> Vec<Certificate>;

    /// Get provider information.
    fn provider_info(&self) -> ProviderInfo;
}
