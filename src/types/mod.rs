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

//! Wire types for the revocation authority.
//!
//! This module provides the OCSP request/response structures from RFC 6960
//! and the parsed CRL wrapper the ingestion pipeline works with.

pub mod crl;
pub mod ocsp;

pub use crl::{name_string, normalize_serial, CrlNumber, ParsedCrl, RevokedEntry};
pub use ocsp::{
    BasicOcspResponse, CertId, CertStatus, OcspRequest, OcspResponse, OcspResponseStatus,
    ResponderId, ResponseData, SingleResponse,
};

/// Content types used on the OCSP HTTP binding (RFC 6960 Appendix A).
pub mod content_types {
    /// OCSP request content type.
    pub const OCSP_REQUEST: &str = "application/ocsp-request";

    /// OCSP response content type.
    pub const OCSP_RESPONSE: &str = "application/ocsp-response";
}
