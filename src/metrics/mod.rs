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

//! Metrics collection for responder operations.
//!
//! This module provides in-process metrics for monitoring the revocation
//! authority: OCSP query and CRL submission counts, durations, and error
//! rates, plus the (rarer) admin operations.
//!
//! # Example
//!
//! ```no_run
//! use usg_ocsp_responder::metrics::{MetricsCollector, OperationType};
//! use std::time::Instant;
//!
//! # async fn example() {
//! let metrics = MetricsCollector::new();
//!
//! let start = Instant::now();
//! // ... answer an OCSP query ...
//! metrics.record_operation(OperationType::OcspQuery, start.elapsed(), true).await;
//!
//! let summary = metrics.get_summary().await;
//! println!("Total queries: {}", summary.queries.total);
//! println!("Success rate: {:.2}%", summary.queries.success_rate());
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Types of responder operations that can be measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    /// An OCSP status query (POST or GET transport).
    OcspQuery,
    /// A CRL submission through the ingestion pipeline.
    CrlSubmission,
    /// An add-issuing-point admin operation.
    AddIssuer,
    /// A remove-issuing-point admin operation.
    RemoveIssuer,
}

impl OperationType {
    /// Get a string representation of the operation type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OcspQuery => "ocsp_query",
            Self::CrlSubmission => "crl_submission",
            Self::AddIssuer => "add_issuer",
            Self::RemoveIssuer => "remove_issuer",
        }
    }
}

/// Metrics for a specific operation type.
#[derive(Debug, Default, Clone)]
pub struct OperationMetrics {
    /// Total number of operations attempted.
    pub total: u64,
    /// Number of successful operations.
    pub success: u64,
    /// Number of failed operations.
    pub failed: u64,
    /// Total duration of all operations (nanoseconds).
    pub total_duration_nanos: u64,
    /// Minimum operation duration (nanoseconds).
    pub min_duration_nanos: u64,
    /// Maximum operation duration (nanoseconds).
    pub max_duration_nanos: u64,
}

impl OperationMetrics {
    /// Calculate the success rate as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// Calculate the average operation duration.
    pub fn average_duration(&self) -> Duration {
        if self.total == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_duration_nanos / self.total)
        }
    }

    /// Get the minimum operation duration.
    pub fn min_duration(&self) -> Duration {
        Duration::from_nanos(self.min_duration_nanos)
    }

    /// Get the maximum operation duration.
    pub fn max_duration(&self) -> Duration {
        Duration::from_nanos(self.max_duration_nanos)
    }
}

/// Complete metrics summary for all operations.
#[derive(Debug, Default, Clone)]
pub struct MetricsSummary {
    /// Metrics for OCSP status queries.
    pub queries: OperationMetrics,
    /// Metrics for CRL submissions.
    pub submissions: OperationMetrics,
    /// Metrics for add-issuing-point operations.
    pub issuer_adds: OperationMetrics,
    /// Metrics for remove-issuing-point operations.
    pub issuer_removes: OperationMetrics,
}

impl MetricsSummary {
    /// Get total number of operations across all types.
    pub fn total_operations(&self) -> u64 {
        self.queries.total
            + self.submissions.total
            + self.issuer_adds.total
            + self.issuer_removes.total
    }

    /// Get total number of successful operations.
    pub fn total_successful(&self) -> u64 {
        self.queries.success
            + self.submissions.success
            + self.issuer_adds.success
            + self.issuer_removes.success
    }

    /// Get overall success rate.
    pub fn overall_success_rate(&self) -> f64 {
        let total = self.total_operations();
        if total == 0 {
            0.0
        } else {
            (self.total_successful() as f64 / total as f64) * 100.0
        }
    }
}

/// Thread-safe metrics collector.
#[derive(Clone)]
pub struct MetricsCollector {
    inner: Arc<MetricsCollectorInner>,
}

struct MetricsCollectorInner {
    queries: RwLock<OperationMetrics>,
    submissions: RwLock<OperationMetrics>,
    issuer_adds: RwLock<OperationMetrics>,
    issuer_removes: RwLock<OperationMetrics>,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsCollectorInner {
                queries: RwLock::new(OperationMetrics::default()),
                submissions: RwLock::new(OperationMetrics::default()),
                issuer_adds: RwLock::new(OperationMetrics::default()),
                issuer_removes: RwLock::new(OperationMetrics::default()),
            }),
        }
    }

    /// Record a responder operation.
    ///
    /// # Arguments
    ///
    /// * `op_type` - The type of operation
    /// * `duration` - How long the operation took
    /// * `success` - Whether the operation succeeded
    pub async fn record_operation(
        &self,
        op_type: OperationType,
        duration: Duration,
        success: bool,
    ) {
        let metrics_lock = match op_type {
            OperationType::OcspQuery => &self.inner.queries,
            OperationType::CrlSubmission => &self.inner.submissions,
            OperationType::AddIssuer => &self.inner.issuer_adds,
            OperationType::RemoveIssuer => &self.inner.issuer_removes,
        };

        let mut metrics = metrics_lock.write().await;
        metrics.total += 1;

        if success {
            metrics.success += 1;
        } else {
            metrics.failed += 1;
        }

        let duration_nanos = duration.as_nanos() as u64;
        metrics.total_duration_nanos += duration_nanos;

        if metrics.min_duration_nanos == 0 || duration_nanos < metrics.min_duration_nanos {
            metrics.min_duration_nanos = duration_nanos;
        }

        if duration_nanos > metrics.max_duration_nanos {
            metrics.max_duration_nanos = duration_nanos;
        }
    }

    /// Get a summary of all collected metrics.
    pub async fn get_summary(&self) -> MetricsSummary {
        MetricsSummary {
            queries: self.inner.queries.read().await.clone(),
            submissions: self.inner.submissions.read().await.clone(),
            issuer_adds: self.inner.issuer_adds.read().await.clone(),
            issuer_removes: self.inner.issuer_removes.read().await.clone(),
        }
    }

    /// Reset all metrics to zero.
    pub async fn reset(&self) {
        *self.inner.queries.write().await = OperationMetrics::default();
        *self.inner.submissions.write().await = OperationMetrics::default();
        *self.inner.issuer_adds.write().await = OperationMetrics::default();
        *self.inner.issuer_removes.write().await = OperationMetrics::default();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Format metrics summary as a human-readable string.
pub fn format_metrics_summary(summary: &MetricsSummary) -> String {
    let mut output = String::new();

    output.push_str("=== OCSP Responder Metrics Summary ===\n\n");

    output.push_str(&format!(
        "Total Operations: {}\n",
        summary.total_operations()
    ));
    output.push_str(&format!(
        "Overall Success Rate: {:.2}%\n\n",
        summary.overall_success_rate()
    ));

    output.push_str(&format_operation_metrics("OCSP Queries", &summary.queries));
    output.push_str(&format_operation_metrics(
        "CRL Submissions",
        &summary.submissions,
    ));
    output.push_str(&format_operation_metrics(
        "Issuing Points Added",
        &summary.issuer_adds,
    ));
    output.push_str(&format_operation_metrics(
        "Issuing Points Removed",
        &summary.issuer_removes,
    ));

    output
}

fn format_operation_metrics(name: &str, metrics: &OperationMetrics) -> String {
    if metrics.total == 0 {
        return String::new(); // Skip operations with no data
    }

    let mut output = String::new();
    output.push_str(&format!("--- {} ---\n", name));
    output.push_str(&format!("Total: {}\n", metrics.total));
    output.push_str(&format!("Success: {}\n", metrics.success));
    output.push_str(&format!("Failed: {}\n", metrics.failed));
    output.push_str(&format!("Success Rate: {:.2}%\n", metrics.success_rate()));
    output.push_str(&format!("Avg Duration: {:?}\n", metrics.average_duration()));
    output.push_str(&format!("Min Duration: {:?}\n", metrics.min_duration()));
    output.push_str(&format!("Max Duration: {:?}\n\n", metrics.max_duration()));
    output
}
