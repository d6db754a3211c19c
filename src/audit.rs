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

//! Audit trail for revocation-state changes.
//!
//! Every terminal outcome that changes (or refuses to change) what the
//! responder will assert about certificate status is recorded: CRL
//! submissions accepted or rejected, issuing points added or removed. The
//! log is a plain append-only text file, one record per line; unlike
//! diagnostic logging it is never rotated or truncated by this crate.
//!
//! # Example
//!
//! ```no_run
//! use usg_ocsp_responder::audit::AuditLog;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let audit = AuditLog::to_file("/var/log/ocsp/audit.log")?;
//! audit.point_added("CN=Example CA", true)?;
//! # Ok(())
//! # }
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::SystemTime;

use crate::error::Result;
use crate::types::crl::CrlNumber;

/// Render a timestamp as an RFC 3339 UTC string.
///
/// Falls back to a placeholder for times outside the representable range
/// rather than failing the operation being recorded.
pub(crate) fn format_timestamp(time: SystemTime) -> String {
    der::DateTime::from_system_time(time)
        .map(|dt| dt.to_string())
        .unwrap_or_else(|_| "<out-of-range>".to_string())
}

/// The kind of event being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    /// A submitted CRL passed validation and was installed.
    CrlAccepted,
    /// A submitted CRL was rejected.
    CrlRejected,
    /// An issuing point was added to the registry.
    PointAdded,
    /// An issuing point was removed from the registry.
    PointRemoved,
}

impl AuditEvent {
    /// Get the event token used in record lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CrlAccepted => "crl-accepted",
            Self::CrlRejected => "crl-rejected",
            Self::PointAdded => "point-added",
            Self::PointRemoved => "point-removed",
        }
    }
}

impl std::fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One audit record.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    /// Event kind.
    pub event: AuditEvent,
    /// Issuer distinguished name the event concerns.
    pub issuer: String,
    /// Timestamp (RFC 3339).
    pub timestamp: String,
    /// Additional key/value detail fields.
    pub fields: Vec<(String, String)>,
}

impl AuditRecord {
    /// Create a new record stamped with the current time.
    pub fn new(event: AuditEvent, issuer: impl Into<String>) -> Self {
        Self {
            event,
            issuer: issuer.into(),
            timestamp: format_timestamp(SystemTime::now()),
            fields: Vec::new(),
        }
    }

    /// Add a detail field to the record.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    /// Format as a single record line.
    ///
    /// The issuer is quoted since distinguished names contain spaces and
    /// commas; detail fields are bare `key=value` pairs.
    pub fn format_line(&self) -> String {
        let mut parts = vec![
            format!("[{}]", self.timestamp),
            format!("[{}]", self.event),
            format!("issuer=\"{}\"", self.issuer.replace('"', "\\\"")),
        ];

        for (k, v) in &self.fields {
            parts.push(format!("{}={}", k, v));
        }

        parts.join(" ")
    }
}

/// Append-only audit log.
///
/// A disabled log accepts records and discards them, so call sites do not
/// branch on whether auditing is configured.
#[derive(Debug)]
pub struct AuditLog {
    writer: Option<Mutex<BufWriter<File>>>,
}

impl AuditLog {
    /// Create a disabled audit log that discards all records.
    pub fn disabled() -> Self {
        Self { writer: None }
    }

    /// Open an audit log backed by the given file, creating parent
    /// directories as needed and appending to an existing file.
    pub fn to_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            writer: Some(Mutex::new(BufWriter::new(file))),
        })
    }

    /// Whether records are actually being written anywhere.
    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Append a record to the log.
    pub fn record(&self, record: &AuditRecord) -> Result<()> {
        let Some(writer) = &self.writer else {
            return Ok(());
        };

        let line = format!("{}\n", record.format_line());
        let mut writer = writer.lock().unwrap();
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    // Convenience constructors for the events the responder emits.

    /// Record an accepted CRL installation.
    pub fn crl_accepted(
        &self,
        issuer: &str,
        crl_number: Option<&CrlNumber>,
        entries: usize,
    ) -> Result<()> {
        let mut record = AuditRecord::new(AuditEvent::CrlAccepted, issuer)
            .with_field("entries", entries.to_string());
        if let Some(number) = crl_number {
            record = record.with_field("crl_number", number.to_string());
        }
        self.record(&record)
    }

    /// Record a rejected CRL submission.
    pub fn crl_rejected(&self, issuer: &str, reason: &str, detail: &str) -> Result<()> {
        self.record(
            &AuditRecord::new(AuditEvent::CrlRejected, issuer)
                .with_field("reason", reason)
                .with_field("detail", format!("\"{}\"", detail.replace('"', "\\\""))),
        )
    }

    /// Record an issuing point addition.
    pub fn point_added(&self, issuer: &str, has_certificate: bool) -> Result<()> {
        self.record(
            &AuditRecord::new(AuditEvent::PointAdded, issuer)
                .with_field("certificate", has_certificate.to_string()),
        )
    }

    /// Record an issuing point removal.
    pub fn point_removed(&self, issuer: &str, had_crl: bool) -> Result<()> {
        self.record(
            &AuditRecord::new(AuditEvent::PointRemoved, issuer)
                .with_field("had_crl", had_crl.to_string()),
        )
    }
}
