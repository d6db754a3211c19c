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

//! Error types for the OCSP responder core.
//!
//! This module defines all error types that can occur while decoding CRLs and
//! OCSP requests, enforcing ingestion policy, operating on the issuing point
//! registry, and producing signed responses.

use thiserror::Error;

/// Result type alias using [`OcspError`].
pub type Result<T> = std::result::Result<T, OcspError>;

/// Errors that can occur during revocation authority operations.
#[derive(Debug, Error)]
pub enum OcspError {
    /// Submitted bytes do not decode as a CRL.
    #[error("Malformed CRL: {0}")]
    MalformedCrl(String),

    /// Request bytes do not decode as an OCSP request.
    #[error("Malformed OCSP request: {0}")]
    MalformedRequest(String),

    /// Failed to parse X.509 certificate input.
    #[error("Certificate parsing error: {0}")]
    CertificateParsing(String),

    /// Failed to parse CMS/PKCS#7 structure.
    #[error("CMS/PKCS#7 parsing error: {0}")]
    CmsParsing(String),

    /// CRL issuer has no issuing point in the registry.
    #[error("No issuing point registered for '{issuer}'")]
    UnknownIssuer {
        /// Issuer distinguished name from the submitted CRL.
        issuer: String,
    },

    /// Submitted CRL is not newer than the CRL already installed.
    #[error("Stale CRL for '{issuer}': thisUpdate {incoming} is not newer than {current}")]
    StaleCrl {
        /// Issuer distinguished name.
        issuer: String,
        /// thisUpdate of the submitted CRL.
        incoming: String,
        /// thisUpdate of the installed CRL.
        current: String,
    },

    /// Submitted CRL carries the delta CRL indicator extension.
    #[error("Delta CRL for '{issuer}' rejected: delta CRLs are not supported")]
    DeltaCrl {
        /// Issuer distinguished name.
        issuer: String,
    },

    /// CRL signature did not verify against the issuer certificate on file.
    #[error("CRL signature verification failed for '{issuer}': {reason}")]
    SignatureInvalid {
        /// Issuer distinguished name.
        issuer: String,
        /// Underlying verification failure.
        reason: String,
    },

    /// Signature or hash algorithm is not supported by the provider.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// An issuing point already exists for the issuer.
    #[error("Issuing point for '{issuer}' already exists")]
    PointExists {
        /// Issuer distinguished name.
        issuer: String,
    },

    /// No issuing point exists for the issuer.
    #[error("Issuing point for '{issuer}' not found")]
    PointNotFound {
        /// Issuer distinguished name.
        issuer: String,
    },

    /// Textual submission is missing the expected begin/end markers.
    #[error("Missing PEM markers: expected '{expected}' block")]
    MissingPemMarkers {
        /// The marker label that was expected.
        expected: String,
    },

    /// Invalid PEM data.
    #[error("Invalid PEM data: {0}")]
    InvalidPem(String),

    /// Response signing failed.
    #[error("Response signing error: {0}")]
    Signing(String),

    /// Invalid responder configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Registry persistence error.
    #[error("Store error: {0}")]
    Store(String),

    /// Background CRL installation did not run to completion.
    #[error("Install task error: {0}")]
    Install(String),

    /// Base64 decoding error.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// DER encoding/decoding error.
    #[error("DER error: {0}")]
    Der(#[from] der::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OcspError {
    /// Create a malformed CRL error with the given message.
    pub fn malformed_crl(msg: impl Into<String>) -> Self {
        Self::MalformedCrl(msg.into())
    }

    /// Create a malformed request error with the given message.
    pub fn malformed_request(msg: impl Into<String>) -> Self {
        Self::MalformedRequest(msg.into())
    }

    /// Create a certificate parsing error with the given message.
    pub fn certificate_parsing(msg: impl Into<String>) -> Self {
        Self::CertificateParsing(msg.into())
    }

    /// Create a CMS parsing error with the given message.
    pub fn cms_parsing(msg: impl Into<String>) -> Self {
        Self::CmsParsing(msg.into())
    }

    /// Create an unknown issuer error.
    pub fn unknown_issuer(issuer: impl Into<String>) -> Self {
        Self::UnknownIssuer {
            issuer: issuer.into(),
        }
    }

    /// Create a stale CRL error.
    pub fn stale_crl(
        issuer: impl Into<String>,
        incoming: impl Into<String>,
        current: impl Into<String>,
    ) -> Self {
        Self::StaleCrl {
            issuer: issuer.into(),
            incoming: incoming.into(),
            current: current.into(),
        }
    }

    /// Create a delta CRL rejection error.
    pub fn delta_crl(issuer: impl Into<String>) -> Self {
        Self::DeltaCrl {
            issuer: issuer.into(),
        }
    }

    /// Create a signature verification error.
    pub fn signature_invalid(issuer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SignatureInvalid {
            issuer: issuer.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported algorithm error.
    pub fn unsupported_algorithm(msg: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm(msg.into())
    }

    /// Create an issuing point exists error.
    pub fn point_exists(issuer: impl Into<String>) -> Self {
        Self::PointExists {
            issuer: issuer.into(),
        }
    }

    /// Create an issuing point not found error.
    pub fn point_not_found(issuer: impl Into<String>) -> Self {
        Self::PointNotFound {
            issuer: issuer.into(),
        }
    }

    /// Create a missing PEM markers error.
    pub fn missing_pem_markers(expected: impl Into<String>) -> Self {
        Self::MissingPemMarkers {
            expected: expected.into(),
        }
    }

    /// Create an invalid PEM error.
    pub fn invalid_pem(msg: impl Into<String>) -> Self {
        Self::InvalidPem(msg.into())
    }

    /// Create a response signing error.
    pub fn signing(msg: impl Into<String>) -> Self {
        Self::Signing(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create an install task error.
    pub fn install(msg: impl Into<String>) -> Self {
        Self::Install(msg.into())
    }

    /// Returns true if the error rejects a submission rather than reporting
    /// an internal failure.
    ///
    /// Rejections are terminal outcomes of the submission itself (bad input,
    /// policy violation) and are reported to the submitter; everything else
    /// indicates a fault inside the responder or its storage.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::MalformedCrl(_)
                | Self::MalformedRequest(_)
                | Self::CertificateParsing(_)
                | Self::CmsParsing(_)
                | Self::UnknownIssuer { .. }
                | Self::StaleCrl { .. }
                | Self::DeltaCrl { .. }
                | Self::SignatureInvalid { .. }
                | Self::UnsupportedAlgorithm(_)
                | Self::PointExists { .. }
                | Self::PointNotFound { .. }
                | Self::MissingPemMarkers { .. }
                | Self::InvalidPem(_)
                | Self::Base64(_)
                | Self::Der(_)
        )
    }

    /// Short stable token identifying the error class, used in audit records
    /// and machine-readable operation results.
    pub fn status_token(&self) -> &'static str {
        match self {
            Self::MalformedCrl(_) => "malformed-crl",
            Self::MalformedRequest(_) => "malformed-request",
            Self::CertificateParsing(_) => "malformed-certificate",
            Self::CmsParsing(_) => "malformed-chain",
            Self::UnknownIssuer { .. } => "unknown-issuer",
            Self::StaleCrl { .. } => "stale-crl",
            Self::DeltaCrl { .. } => "delta-crl",
            Self::SignatureInvalid { .. } => "signature-invalid",
            Self::UnsupportedAlgorithm(_) => "unsupported-algorithm",
            Self::PointExists { .. } => "point-exists",
            Self::PointNotFound { .. } => "point-not-found",
            Self::MissingPemMarkers { .. } => "missing-pem-markers",
            Self::InvalidPem(_) => "invalid-pem",
            Self::Signing(_) => "signing-error",
            Self::Config(_) => "config-error",
            Self::Store(_) => "store-error",
            Self::Install(_) => "install-error",
            Self::Base64(_) => "invalid-base64",
            Self::Der(_) => "invalid-der",
            Self::Io(_) => "io-error",
        }
    }
}
