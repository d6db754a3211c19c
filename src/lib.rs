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

//! # usg-ocsp-responder
//!
//! The revocation authority core of an OCSP responder: CRL ingestion, the
//! per-issuer issuing-point registry, and RFC 6960 status responses.
//!
//! This library sits behind an HTTP front end and an authorization layer,
//! which are deliberately out of scope: callers hand it already-authorized
//! request bytes and it hands back encoded responses. Within that boundary
//! it owns the security-critical path end to end: decoding attacker-reachable
//! DER, verifying CRL signatures, enforcing freshness and delta policy, and
//! answering status queries from atomically swapped revocation state.
//!
//! ## Features
//!
//! - **Async-first design** using Tokio
//! - **CRL ingestion pipeline**: marker or raw-DER submissions, signature
//!   verification, stale and delta CRL rejection, synchronous or background
//!   installation
//! - **Lock-free-read registry**: per-issuer copy-and-swap revocation state,
//!   matched against request CertIDs by SHA-1 or SHA-256 issuer hashes
//! - **Both RFC 6960 transports**: size-gated POST bodies and base64 GET
//!   path segments, with protocol-level `malformedRequest` answers
//! - **Durable registry**: optional per-issuer TOML manifests reloaded on
//!   restart
//! - **Audit trail** of every revocation-state change
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use usg_ocsp_responder::audit::AuditLog;
//! use usg_ocsp_responder::config::ResponderConfig;
//! use usg_ocsp_responder::ingest::CrlIngest;
//! use usg_ocsp_responder::provider::{SoftwareSigner, SoftwareVerifier};
//! use usg_ocsp_responder::registry::Registry;
//! use usg_ocsp_responder::resolver::StatusResolver;
//! use usg_ocsp_responder::responder::OcspResponder;
//! use usg_ocsp_responder::RegistryAdmin;
//!
//! # async fn example(ocsp_body: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ResponderConfig::from_file("/etc/ocsp/responder.toml")?;
//! let registry = Arc::new(Registry::new());
//! let audit = Arc::new(AuditLog::disabled());
//!
//! // Onboard an issuer.
//! let admin = RegistryAdmin::new(registry.clone(), audit.clone());
//! admin.add_issuing_point(&std::fs::read("ca.pem")?).await?;
//!
//! // Install its CRL.
//! let ingest = CrlIngest::new(
//!     registry.clone(),
//!     Arc::new(SoftwareVerifier::new()),
//!     audit,
//!     config.ingest.install_mode,
//! );
//! ingest.submit(&std::fs::read("ca.crl.pem")?).await?;
//!
//! // Answer queries.
//! let signing_key = p256::ecdsa::SigningKey::from_slice(&[0x17; 32])?;
//! let responder = OcspResponder::new(
//!     StatusResolver::new(registry)
//!         .with_not_found_as_good(config.policy.not_found_as_good),
//!     Arc::new(SoftwareSigner::new(signing_key)?),
//! )
//! .with_max_request_size(config.limits.max_request_size);
//!
//! let reply = responder
//!     .handle_post(Some(ocsp_body.len() as u64), ocsp_body)
//!     .await;
//! assert_eq!(reply.content_type, Some("application/ocsp-response"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Cargo Features
//!
//! - `metrics`: In-process operation counters and latency summaries
//!
//! ## RFC 6960 Compliance
//!
//! This library implements the responder side:
//! - Section 4.1.1: Request syntax (`types::ocsp::OcspRequest`)
//! - Section 4.2.1: Response syntax, including error statuses
//!   (`types::ocsp::OcspResponse`)
//! - Appendix A: HTTP transport semantics (POST bodies and base64 GET path
//!   segments, `application/ocsp-response` replies)
//!
//! Delta CRLs (RFC 5280 Section 5.2.4) are detected and rejected; only full
//! CRLs feed the registry.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod admin;
pub mod audit;
pub mod config;
pub mod error;
pub mod ingest;
pub mod pem;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod responder;
pub mod store;
pub mod types;

#[cfg(feature = "metrics")]
pub mod metrics;

// Re-export main types at crate root for convenience
pub use admin::{AddedIssuer, RegistryAdmin};
pub use config::{ChainSelection, InstallMode, ResponderConfig, ResponderConfigBuilder};
pub use error::{OcspError, Result};
pub use ingest::{CrlAccepted, CrlIngest, InstallHandle};
pub use registry::{IssuingPoint, Registry};
pub use resolver::{CertVerdict, CertificateIdentifier, StatusResolver, StatusVerdict};
pub use responder::{OcspResponder, TransportResponse};
pub use types::{OcspRequest, OcspResponse, ParsedCrl};

// Re-export x509_cert::Certificate for convenience
pub use x509_cert::Certificate;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
