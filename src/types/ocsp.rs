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

//! OCSP request and response structures from [RFC 6960].
//!
//! These are owned encodings of the wire structures the responder consumes
//! and produces. Requests arrive unauthenticated from relying parties, so
//! decoding is strictly bounds-checked by [`der`] and never panics on
//! malformed input; callers translate decode failures into protocol-level
//! `malformedRequest` responses rather than dropping the exchange.
//!
//! [RFC 6960]: https://datatracker.ietf.org/doc/html/rfc6960

use der::asn1::{GeneralizedTime, Null, ObjectIdentifier, OctetString};
use der::{Choice, Decode, Encode, Enumerated, Sequence};
use spki::AlgorithmIdentifierOwned;
use std::time::SystemTime;
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::CrlReason;
use x509_cert::ext::Extensions;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::Certificate;

use crate::error::Result;

/// OID identifying the basic OCSP response type carried in `ResponseBytes`.
pub const ID_PKIX_OCSP_BASIC: ObjectIdentifier = const_oid::db::rfc6960::ID_PKIX_OCSP_BASIC;

/// OCSPRequest ([RFC 6960 Section 4.1.1]).
///
/// ```text
/// OCSPRequest ::= SEQUENCE {
///    tbsRequest              TBSRequest,
///    optionalSignature   [0] EXPLICIT Signature OPTIONAL }
/// ```
///
/// [RFC 6960 Section 4.1.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.1.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct OcspRequest {
    /// Request body.
    pub tbs_request: TbsRequest,

    /// Optional requestor signature over the request body.
    #[asn1(context_specific = "0", optional = "true", tag_mode = "EXPLICIT")]
    pub optional_signature: Option<Signature>,
}

/// TBSRequest ([RFC 6960 Section 4.1.1]).
///
/// ```text
/// TBSRequest ::= SEQUENCE {
///    version             [0] EXPLICIT Version DEFAULT v1,
///    requestorName       [1] EXPLICIT GeneralName OPTIONAL,
///    requestList             SEQUENCE OF Request,
///    requestExtensions   [2] EXPLICIT Extensions OPTIONAL }
/// ```
///
/// [RFC 6960 Section 4.1.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.1.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct TbsRequest {
    /// Protocol version, always v1.
    #[asn1(
        context_specific = "0",
        default = "Default::default",
        tag_mode = "EXPLICIT"
    )]
    pub version: Version,

    /// Optional requestor identity.
    #[asn1(context_specific = "1", optional = "true", tag_mode = "EXPLICIT")]
    pub requestor_name: Option<GeneralName>,

    /// The certificates whose status is requested.
    pub request_list: Vec<Request>,

    /// Optional request extensions (nonce and friends).
    #[asn1(context_specific = "2", optional = "true", tag_mode = "EXPLICIT")]
    pub request_extensions: Option<Extensions>,
}

/// Signature ([RFC 6960 Section 4.1.1]).
///
/// ```text
/// Signature ::= SEQUENCE {
///    signatureAlgorithm      AlgorithmIdentifier,
///    signature               BIT STRING,
///    certs                  [0] EXPLICIT SEQUENCE OF Certificate OPTIONAL }
/// ```
///
/// [RFC 6960 Section 4.1.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.1.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct Signature {
    /// Algorithm used to sign the request.
    pub signature_algorithm: AlgorithmIdentifierOwned,

    /// Signature over the DER encoding of `tbsRequest`.
    pub signature: der::asn1::BitString,

    /// Certificates the responder may need to verify the signature.
    #[asn1(context_specific = "0", optional = "true", tag_mode = "EXPLICIT")]
    pub certs: Option<Vec<Certificate>>,
}

/// OCSP protocol version ([RFC 6960 Section 4.1.1]).
///
/// ```text
/// Version ::= INTEGER { v1(0) }
/// ```
///
/// [RFC 6960 Section 4.1.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.1.1
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Enumerated)]
#[asn1(type = "INTEGER")]
#[repr(u8)]
pub enum Version {
    /// Version 1 (the only defined version).
    #[default]
    V1 = 0,
}

/// Request ([RFC 6960 Section 4.1.1]).
///
/// ```text
/// Request ::= SEQUENCE {
///    reqCert                     CertID,
///    singleRequestExtensions     [0] EXPLICIT Extensions OPTIONAL }
/// ```
///
/// [RFC 6960 Section 4.1.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.1.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct Request {
    /// Identifier of the certificate in question.
    pub req_cert: CertId,

    /// Optional per-certificate extensions.
    #[asn1(context_specific = "0", optional = "true", tag_mode = "EXPLICIT")]
    pub single_request_extensions: Option<Extensions>,
}

/// CertID ([RFC 6960 Section 4.1.1]).
///
/// Identifies a certificate by hashes of its issuer's distinguished name and
/// public key together with its serial number, without naming the issuer
/// directly.
///
/// ```text
/// CertID ::= SEQUENCE {
///    hashAlgorithm           AlgorithmIdentifier,
///    issuerNameHash          OCTET STRING,
///    issuerKeyHash           OCTET STRING,
///    serialNumber            CertificateSerialNumber }
/// ```
///
/// [RFC 6960 Section 4.1.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.1.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct CertId {
    /// Hash algorithm used for both issuer hashes.
    pub hash_algorithm: AlgorithmIdentifierOwned,

    /// Hash of the DER encoding of the issuer's distinguished name.
    pub issuer_name_hash: OctetString,

    /// Hash of the issuer's public key bits (excluding tag, length and
    /// unused-bits octets).
    pub issuer_key_hash: OctetString,

    /// Serial number of the certificate in question.
    pub serial_number: SerialNumber,
}

/// OCSPResponse ([RFC 6960 Section 4.2.1]).
///
/// ```text
/// OCSPResponse ::= SEQUENCE {
///    responseStatus          OCSPResponseStatus,
///    responseBytes           [0] EXPLICIT ResponseBytes OPTIONAL }
/// ```
///
/// [RFC 6960 Section 4.2.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.2.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct OcspResponse {
    /// Outcome of processing the request.
    pub response_status: OcspResponseStatus,

    /// Response payload, present only for successful responses.
    #[asn1(context_specific = "0", optional = "true", tag_mode = "EXPLICIT")]
    pub response_bytes: Option<ResponseBytes>,
}

impl OcspResponse {
    /// Build a successful response wrapping the DER encoding of `basic`.
    pub fn successful(basic: &BasicOcspResponse) -> Result<Self> {
        Ok(Self {
            response_status: OcspResponseStatus::Successful,
            response_bytes: Some(ResponseBytes {
                response_type: ID_PKIX_OCSP_BASIC,
                response: OctetString::new(basic.to_der()?)?,
            }),
        })
    }

    /// Build a `malformedRequest` error response.
    ///
    /// Error responses carry no response bytes, only the status.
    pub fn malformed_request() -> Self {
        Self {
            response_status: OcspResponseStatus::MalformedRequest,
            response_bytes: None,
        }
    }

    /// Build an `internalError` error response.
    pub fn internal_error() -> Self {
        Self {
            response_status: OcspResponseStatus::InternalError,
            response_bytes: None,
        }
    }

    /// Build a `tryLater` error response.
    pub fn try_later() -> Self {
        Self {
            response_status: OcspResponseStatus::TryLater,
            response_bytes: None,
        }
    }

    /// Build an `unauthorized` error response.
    pub fn unauthorized() -> Self {
        Self {
            response_status: OcspResponseStatus::Unauthorized,
            response_bytes: None,
        }
    }

    /// Decode the inner basic response, if one is present and of the basic
    /// response type.
    pub fn basic_response(&self) -> Result<Option<BasicOcspResponse>> {
        match &self.response_bytes {
            Some(rb) if rb.response_type == ID_PKIX_OCSP_BASIC => {
                Ok(Some(BasicOcspResponse::from_der(rb.response.as_bytes())?))
            }
            _ => Ok(None),
        }
    }
}

/// OCSPResponseStatus ([RFC 6960 Section 4.2.1]).
///
/// ```text
/// OCSPResponseStatus ::= ENUMERATED {
///    successful          (0),
///    malformedRequest    (1),
///    internalError       (2),
///    tryLater            (3),
///    sigRequired         (5),
///    unauthorized        (6) }
/// ```
///
/// [RFC 6960 Section 4.2.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.2.1
#[derive(Clone, Copy, Debug, Eq, PartialEq, Enumerated)]
#[repr(u32)]
pub enum OcspResponseStatus {
    /// Response has valid confirmations.
    Successful = 0,
    /// Illegal confirmation request.
    MalformedRequest = 1,
    /// Internal error in the responder.
    InternalError = 2,
    /// Responder is temporarily unable to answer.
    TryLater = 3,
    /// Responder requires signed requests.
    SigRequired = 5,
    /// Request was not authorized.
    Unauthorized = 6,
}

impl OcspResponseStatus {
    /// Short name of the status, for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::MalformedRequest => "malformedRequest",
            Self::InternalError => "internalError",
            Self::TryLater => "tryLater",
            Self::SigRequired => "sigRequired",
            Self::Unauthorized => "unauthorized",
        }
    }
}

/// ResponseBytes ([RFC 6960 Section 4.2.1]).
///
/// ```text
/// ResponseBytes ::= SEQUENCE {
///    responseType            OBJECT IDENTIFIER,
///    response                OCTET STRING }
/// ```
///
/// [RFC 6960 Section 4.2.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.2.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct ResponseBytes {
    /// OID identifying the response syntax.
    pub response_type: ObjectIdentifier,

    /// DER encoding of the response identified by `response_type`.
    pub response: OctetString,
}

/// BasicOCSPResponse ([RFC 6960 Section 4.2.1]).
///
/// ```text
/// BasicOCSPResponse ::= SEQUENCE {
///   tbsResponseData          ResponseData,
///   signatureAlgorithm       AlgorithmIdentifier,
///   signature                BIT STRING,
///   certs                [0] EXPLICIT SEQUENCE OF Certificate OPTIONAL }
/// ```
///
/// [RFC 6960 Section 4.2.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.2.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct BasicOcspResponse {
    /// The signed response body.
    pub tbs_response_data: ResponseData,

    /// Algorithm used to produce `signature`.
    pub signature_algorithm: AlgorithmIdentifierOwned,

    /// Signature over the DER encoding of `tbsResponseData`.
    pub signature: der::asn1::BitString,

    /// Certificates helping the relying party verify the signature.
    #[asn1(context_specific = "0", optional = "true", tag_mode = "EXPLICIT")]
    pub certs: Option<Vec<Certificate>>,
}

/// ResponseData ([RFC 6960 Section 4.2.1]).
///
/// ```text
/// ResponseData ::= SEQUENCE {
///    version              [0] EXPLICIT Version DEFAULT v1,
///    responderID             ResponderID,
///    producedAt              GeneralizedTime,
///    responses               SEQUENCE OF SingleResponse,
///    responseExtensions   [1] EXPLICIT Extensions OPTIONAL }
/// ```
///
/// [RFC 6960 Section 4.2.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.2.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct ResponseData {
    /// Protocol version, always v1.
    #[asn1(
        context_specific = "0",
        default = "Default::default",
        tag_mode = "EXPLICIT"
    )]
    pub version: Version,

    /// Identity of the responder that signed this response.
    pub responder_id: ResponderId,

    /// Time at which the response was produced.
    pub produced_at: GeneralizedTime,

    /// One entry per certificate in the request.
    pub responses: Vec<SingleResponse>,

    /// Optional response extensions.
    #[asn1(context_specific = "1", optional = "true", tag_mode = "EXPLICIT")]
    pub response_extensions: Option<Extensions>,
}

/// ResponderID ([RFC 6960 Section 4.2.1]).
///
/// ```text
/// ResponderID ::= CHOICE {
///    byName              [1] Name,
///    byKey               [2] KeyHash }
/// ```
///
/// [RFC 6960 Section 4.2.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.2.1
#[derive(Clone, Debug, Eq, PartialEq, Choice)]
pub enum ResponderId {
    /// Responder identified by distinguished name.
    #[asn1(context_specific = "1", tag_mode = "EXPLICIT", constructed = "true")]
    ByName(Name),

    /// Responder identified by SHA-1 hash of its public key bits.
    #[asn1(context_specific = "2", tag_mode = "EXPLICIT", constructed = "true")]
    ByKey(KeyHash),
}

/// KeyHash ([RFC 6960 Section 4.2.1]): SHA-1 hash of the responder's public
/// key bits, excluding the tag, length and unused-bits octets.
///
/// [RFC 6960 Section 4.2.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.2.1
pub type KeyHash = OctetString;

/// SingleResponse ([RFC 6960 Section 4.2.1]).
///
/// ```text
/// SingleResponse ::= SEQUENCE {
///    certID                  CertID,
///    certStatus              CertStatus,
///    thisUpdate              GeneralizedTime,
///    nextUpdate          [0] EXPLICIT GeneralizedTime OPTIONAL,
///    singleExtensions    [1] EXPLICIT Extensions OPTIONAL }
/// ```
///
/// [RFC 6960 Section 4.2.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.2.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct SingleResponse {
    /// The certificate this entry answers for, echoed from the request.
    pub cert_id: CertId,

    /// Revocation status of the certificate.
    pub cert_status: CertStatus,

    /// Start of the validity window of this answer.
    pub this_update: GeneralizedTime,

    /// End of the validity window, when known.
    #[asn1(context_specific = "0", optional = "true", tag_mode = "EXPLICIT")]
    pub next_update: Option<GeneralizedTime>,

    /// Optional per-entry extensions.
    #[asn1(context_specific = "1", optional = "true", tag_mode = "EXPLICIT")]
    pub single_extensions: Option<Extensions>,
}

/// CertStatus ([RFC 6960 Section 4.2.1]).
///
/// ```text
/// CertStatus ::= CHOICE {
///    good                [0] IMPLICIT NULL,
///    revoked             [1] IMPLICIT RevokedInfo,
///    unknown             [2] IMPLICIT UnknownInfo }
/// ```
///
/// [RFC 6960 Section 4.2.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.2.1
#[derive(Clone, Debug, Eq, PartialEq, Choice)]
pub enum CertStatus {
    /// Certificate is not on the consulted CRL.
    #[asn1(context_specific = "0", tag_mode = "IMPLICIT")]
    Good(Null),

    /// Certificate appears on the consulted CRL.
    #[asn1(context_specific = "1", tag_mode = "IMPLICIT", constructed = "true")]
    Revoked(RevokedInfo),

    /// The responder has no revocation data for the certificate.
    #[asn1(context_specific = "2", tag_mode = "IMPLICIT")]
    Unknown(UnknownInfo),
}

impl CertStatus {
    /// `good` status.
    pub fn good() -> Self {
        Self::Good(Null)
    }

    /// `revoked` status at the given time, with an optional reason code.
    pub fn revoked(time: SystemTime, reason: Option<CrlReason>) -> Result<Self> {
        Ok(Self::Revoked(RevokedInfo {
            revocation_time: GeneralizedTime::from_system_time(time)?,
            revocation_reason: reason,
        }))
    }

    /// `unknown` status.
    pub fn unknown() -> Self {
        Self::Unknown(Null)
    }
}

/// RevokedInfo ([RFC 6960 Section 4.2.1]).
///
/// ```text
/// RevokedInfo ::= SEQUENCE {
///    revocationTime          GeneralizedTime,
///    revocationReason    [0] EXPLICIT CRLReason OPTIONAL }
/// ```
///
/// [RFC 6960 Section 4.2.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.2.1
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct RevokedInfo {
    /// When the certificate was revoked.
    pub revocation_time: GeneralizedTime,

    /// Why the certificate was revoked, when the CRL entry said.
    #[asn1(context_specific = "0", optional = "true", tag_mode = "EXPLICIT")]
    pub revocation_reason: Option<CrlReason>,
}

/// UnknownInfo ([RFC 6960 Section 4.2.1]): `NULL`.
///
/// [RFC 6960 Section 4.2.1]: https://datatracker.ietf.org/doc/html/rfc6960#section-4.2.1
pub type UnknownInfo = Null;

#[cfg(test)]
mod tests {
    use super::*;
    use const_oid::db::rfc5912::ID_SHA_1;
    use der::{Decode, Encode};

    fn sample_cert_id() -> CertId {
        CertId {
            hash_algorithm: AlgorithmIdentifierOwned {
                oid: ID_SHA_1,
                parameters: Some(der::Any::null()),
            },
            issuer_name_hash: OctetString::new(vec![0xAA; 20]).unwrap(),
            issuer_key_hash: OctetString::new(vec![0xBB; 20]).unwrap(),
            serial_number: SerialNumber::new(&[0x01, 0x02, 0x03]).unwrap(),
        }
    }

    #[test]
    fn test_request_encoding_round_trip() {
        let req = OcspRequest {
            tbs_request: TbsRequest {
                version: Version::V1,
                requestor_name: None,
                request_list: vec![Request {
                    req_cert: sample_cert_id(),
                    single_request_extensions: None,
                }],
                request_extensions: None,
            },
            optional_signature: None,
        };

        let der = req.to_der().unwrap();
        let decoded = OcspRequest::from_der(&der).unwrap();
        assert_eq!(decoded, req);
        assert_eq!(decoded.tbs_request.request_list.len(), 1);
    }

    #[test]
    fn test_error_response_has_no_bytes() {
        let resp = OcspResponse::malformed_request();
        assert_eq!(resp.response_status, OcspResponseStatus::MalformedRequest);
        assert!(resp.response_bytes.is_none());

        let der = resp.to_der().unwrap();
        let decoded = OcspResponse::from_der(&der).unwrap();
        assert_eq!(decoded.response_status, OcspResponseStatus::MalformedRequest);
        assert!(decoded.basic_response().unwrap().is_none());
    }

    #[test]
    fn test_cert_status_tags() {
        // good is primitive [0], revoked constructed [1], unknown primitive [2]
        let good = CertStatus::good().to_der().unwrap();
        assert_eq!(good[0], 0x80);

        let revoked = CertStatus::revoked(SystemTime::now(), Some(CrlReason::KeyCompromise))
            .unwrap()
            .to_der()
            .unwrap();
        assert_eq!(revoked[0], 0xA1);

        let unknown = CertStatus::unknown().to_der().unwrap();
        assert_eq!(unknown[0], 0x82);
    }

    #[test]
    fn test_garbage_input_is_rejected() {
        assert!(OcspRequest::from_der(&[0xFF, 0x00, 0x41]).is_err());
        assert!(OcspRequest::from_der(&[]).is_err());
        // Truncated SEQUENCE header claiming more content than present.
        assert!(OcspRequest::from_der(&[0x30, 0x82, 0xFF, 0xFF, 0x00]).is_err());
    }

    #[test]
    fn test_response_status_as_str() {
        assert_eq!(OcspResponseStatus::Successful.as_str(), "successful");
        assert_eq!(OcspResponseStatus::TryLater.as_str(), "tryLater");
    }
}
