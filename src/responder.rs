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

//! The network-facing OCSP responder.
//!
//! [`OcspResponder`] accepts a request over either RFC 6960 transport
//! binding: a POST body carrying the raw DER request, or a GET path segment
//! carrying it base64-encoded. Oversized, zero-length and length-less POST
//! bodies are rejected at the transport layer before any decoding. Once the
//! bytes are in hand, every outcome is a well-formed `OCSPResponse`: a
//! request that does not decode, or that lists no certificates, gets a
//! `malformedRequest` response rather than a dropped connection, and a
//! signing failure gets `internalError`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use usg_ocsp_responder::provider::SoftwareSigner;
//! use usg_ocsp_responder::registry::Registry;
//! use usg_ocsp_responder::resolver::StatusResolver;
//! use usg_ocsp_responder::responder::OcspResponder;
//!
//! # async fn example(body: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(Registry::new());
//! let signing_key = p256::ecdsa::SigningKey::from_slice(&[0x17; 32])?;
//! let responder = OcspResponder::new(
//!     StatusResolver::new(registry),
//!     Arc::new(SoftwareSigner::new(signing_key)?),
//! );
//!
//! let response = responder.handle_post(Some(body.len() as u64), body).await;
//! assert_eq!(response.status, 200);
//! # Ok(())
//! # }
//! ```

use base64::prelude::*;
use der::asn1::{BitString, GeneralizedTime};
use der::{Decode, Encode};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::provider::ResponseSigner;
use crate::resolver::{CertVerdict, CertificateIdentifier, StatusResolver, StatusVerdict};
use crate::types::ocsp::{
    BasicOcspResponse, CertStatus, OcspRequest, OcspResponse, ResponseData, SingleResponse,
    Version,
};

use crate::types::content_types::OCSP_RESPONSE;

/// A transport-level reply ready to hand to the HTTP layer.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,

    /// Content type of the body, when there is one.
    pub content_type: Option<&'static str>,

    /// Response body.
    pub body: Vec<u8>,
}

impl TransportResponse {
    fn ocsp(body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: Some(OCSP_RESPONSE),
            body,
        }
    }

    fn rejected(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: Some("text/plain"),
            body: message.as_bytes().to_vec(),
        }
    }

    /// Whether this reply carries an encoded OCSP response.
    pub fn is_ocsp(&self) -> bool {
        self.content_type == Some(OCSP_RESPONSE)
    }
}

/// The OCSP query entry point.
pub struct OcspResponder {
    resolver: StatusResolver,
    signer: Arc<dyn ResponseSigner>,
    max_request_size: usize,
}

impl OcspResponder {
    /// Default maximum request size in bytes, matching the configuration
    /// default.
    pub const DEFAULT_MAX_REQUEST_SIZE: usize = 5000;

    /// Create a responder answering from the given resolver and signing
    /// responses with the given signer.
    pub fn new(resolver: StatusResolver, signer: Arc<dyn ResponseSigner>) -> Self {
        Self {
            resolver,
            signer,
            max_request_size: Self::DEFAULT_MAX_REQUEST_SIZE,
        }
    }

    /// Set the maximum accepted request size in bytes.
    pub fn with_max_request_size(mut self, bytes: usize) -> Self {
        self.max_request_size = bytes;
        self
    }

    /// Handle a POST-transported request.
    ///
    /// `content_length` is the request's Content-Length header, which must be
    /// present, non-zero and within the configured maximum; the size gate
    /// runs before the body is looked at, so an oversized request costs no
    /// decoding work.
    pub async fn handle_post(&self, content_length: Option<u64>, body: &[u8]) -> TransportResponse {
        let length = match content_length {
            None => {
                debug!("POST rejected: no Content-Length");
                return TransportResponse::rejected(411, "Content-Length required");
            }
            Some(0) => {
                debug!("POST rejected: empty body");
                return TransportResponse::rejected(400, "Empty request body");
            }
            Some(length) => length,
        };

        if length > self.max_request_size as u64 {
            warn!(
                "POST rejected: Content-Length {} exceeds maximum {}",
                length, self.max_request_size
            );
            return TransportResponse::rejected(413, "Request too large");
        }

        self.answer(body).await
    }

    /// Handle a GET-transported request.
    ///
    /// The path segment is the base64 encoding of the DER request; the
    /// standard alphabet is tried first and the URL-safe alphabet as a
    /// fallback, since clients use both in practice. An undecodable segment
    /// is a malformed request, answered at the protocol level.
    pub async fn handle_get(&self, path_segment: &str) -> TransportResponse {
        let trimmed = path_segment.trim_matches('/');

        // Gate on the encoded length before decoding so an oversized
        // segment is never allocated; the decoded-size check below stays
        // authoritative.
        if trimmed.len() / 4 * 3 > self.max_request_size {
            warn!(
                "GET rejected: encoded segment of {} bytes exceeds maximum {}",
                trimmed.len(),
                self.max_request_size
            );
            return TransportResponse::rejected(413, "Request too large");
        }

        let decoded = BASE64_STANDARD
            .decode(trimmed)
            .or_else(|_| BASE64_URL_SAFE.decode(trimmed));
        let bytes = match decoded {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("GET path segment is not base64: {}", e);
                return self.malformed();
            }
        };

        if bytes.len() > self.max_request_size {
            warn!(
                "GET rejected: decoded request of {} bytes exceeds maximum {}",
                bytes.len(),
                self.max_request_size
            );
            return TransportResponse::rejected(413, "Request too large");
        }

        self.answer(&bytes).await
    }

    /// Decode and answer a raw DER request.
    pub async fn answer(&self, bytes: &[u8]) -> TransportResponse {
        let request = match OcspRequest::from_der(bytes) {
            Ok(request) => request,
            Err(e) => {
                debug!("Request does not decode: {}", e);
                return self.malformed();
            }
        };

        if request.tbs_request.request_list.is_empty() {
            debug!("Request lists no certificates");
            return self.malformed();
        }

        let identifiers: Vec<CertificateIdentifier> = request
            .tbs_request
            .request_list
            .into_iter()
            .map(|req| CertificateIdentifier::from_cert_id(req.req_cert))
            .collect();

        debug!("Resolving {} certificate identifier(s)", identifiers.len());
        let verdicts = self.resolver.resolve_all(&identifiers).await;

        match self.build_signed_response(&identifiers, &verdicts).await {
            Ok(response) => self.encode(response),
            Err(e) => {
                error!("Failed to produce signed response: {}", e);
                self.encode(OcspResponse::internal_error())
            }
        }
    }

    async fn build_signed_response(
        &self,
        identifiers: &[CertificateIdentifier],
        verdicts: &[StatusVerdict],
    ) -> Result<OcspResponse> {
        let produced_at = GeneralizedTime::from_system_time(SystemTime::now())?;

        let mut responses = Vec::with_capacity(identifiers.len());
        for (identifier, verdict) in identifiers.iter().zip(verdicts) {
            responses.push(single_response(identifier, verdict, produced_at)?);
        }

        let tbs_response_data = ResponseData {
            version: Version::V1,
            responder_id: self.signer.responder_id(),
            produced_at,
            responses,
            response_extensions: None,
        };

        let signature = self.signer.sign(&tbs_response_data.to_der()?).await?;
        let certs = self.signer.certificates();

        let basic = BasicOcspResponse {
            tbs_response_data,
            signature_algorithm: self.signer.algorithm_identifier(),
            signature: BitString::from_bytes(&signature)?,
            certs: (!certs.is_empty()).then_some(certs),
        };

        OcspResponse::successful(&basic)
    }

    fn malformed(&self) -> TransportResponse {
        self.encode(OcspResponse::malformed_request())
    }

    /// Encode a protocol response for the transport.
    ///
    /// Status-only responses always encode; a failure here means the signed
    /// payload itself would not serialize, which is reported as a bare 500
    /// since there is nothing left to say in-protocol.
    fn encode(&self, response: OcspResponse) -> TransportResponse {
        match response.to_der() {
            Ok(der) => TransportResponse::ocsp(der),
            Err(e) => {
                error!("Failed to encode OCSP response: {}", e);
                TransportResponse {
                    status: 500,
                    content_type: None,
                    body: Vec::new(),
                }
            }
        }
    }
}

fn single_response(
    identifier: &CertificateIdentifier,
    verdict: &StatusVerdict,
    produced_at: GeneralizedTime,
) -> Result<SingleResponse> {
    let cert_status = match verdict.verdict {
        CertVerdict::Good => CertStatus::good(),
        CertVerdict::Revoked { time, reason } => CertStatus::revoked(time, reason)?,
        CertVerdict::Unknown => CertStatus::unknown(),
    };

    // ASN.1 requires thisUpdate; with no consulted CRL the answer is only as
    // fresh as the moment it was produced.
    let this_update = match verdict.this_update {
        Some(time) => GeneralizedTime::from_system_time(time)?,
        None => produced_at,
    };
    let next_update = verdict
        .next_update
        .map(GeneralizedTime::from_system_time)
        .transpose()?;

    Ok(SingleResponse {
        cert_id: identifier.cert_id().clone(),
        cert_status,
        this_update,
        next_update,
        single_extensions: None,
    })
}
