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

//! Full lifecycle scenarios: onboard an issuer, feed it CRLs, and watch
//! query answers track the installed revocation state.

use super::*;

use std::time::{Duration, SystemTime};

use x509_cert::ext::pkix::CrlReason;

use usg_ocsp_responder::types::ocsp::{CertStatus, OcspResponseStatus, SingleResponse};
use usg_ocsp_responder::OcspError;

const REVOKED_SERIAL: &[u8] = &[0x0A, 0x42];

fn single(response: &OcspResponse) -> SingleResponse {
    assert_eq!(response.response_status, OcspResponseStatus::Successful);
    let basic = response.basic_response().unwrap().unwrap();
    assert_eq!(basic.tbs_response_data.responses.len(), 1);
    basic.tbs_response_data.responses[0].clone()
}

#[tokio::test]
async fn test_onboard_ingest_and_answer_revoked() {
    let (ca, key) = test_ca("Lifecycle CA");
    let stack = Stack::new();

    let added = stack
        .admin
        .add_issuing_point(&pem_wrap(&ca.to_der().unwrap(), "CERTIFICATE"))
        .await
        .unwrap();
    assert_eq!(added.issuer, "CN=Lifecycle CA");

    let crl = signed_crl(
        &ca,
        &key,
        &[(REVOKED_SERIAL, Some(CrlReason::KeyCompromise))],
        SystemTime::now(),
        false,
    );
    let accepted = stack
        .ingest
        .submit(&pem_wrap(&crl, "CERTIFICATE REVOCATION LIST"))
        .await
        .unwrap();
    assert_eq!(accepted.revoked_count, 1);

    let response = stack.query(cert_id_for(&ca, REVOKED_SERIAL)).await;
    let entry = single(&response);
    match entry.cert_status {
        CertStatus::Revoked(info) => {
            assert_eq!(info.revocation_reason, Some(CrlReason::KeyCompromise));
        }
        other => panic!("expected revoked, got {:?}", other),
    }
    // The answer's validity window comes from the installed CRL.
    assert!(entry.next_update.is_some());

    // A serial not on the CRL is unknown under the default policy.
    let response = stack.query(cert_id_for(&ca, &[0x77])).await;
    assert!(matches!(single(&response).cert_status, CertStatus::Unknown(_)));
}

#[tokio::test]
async fn test_stale_crl_rejected_and_prior_state_served() {
    let (ca, key) = test_ca("Lifecycle CA");
    let stack = Stack::new();
    stack
        .admin
        .add_issuing_point(&ca.to_der().unwrap())
        .await
        .unwrap();

    let t1 = SystemTime::now();
    let current = signed_crl(&ca, &key, &[(REVOKED_SERIAL, None)], t1, false);
    stack.ingest.submit(&current).await.unwrap();

    let older = signed_crl(
        &ca,
        &key,
        &[(&[0x55], None)],
        t1 - Duration::from_secs(3600),
        false,
    );
    let err = stack.ingest.submit(&older).await.unwrap_err();
    assert!(matches!(err, OcspError::StaleCrl { .. }));

    // Queries still answer from the retained CRL.
    let response = stack.query(cert_id_for(&ca, REVOKED_SERIAL)).await;
    assert!(matches!(single(&response).cert_status, CertStatus::Revoked(_)));
    let response = stack.query(cert_id_for(&ca, &[0x55])).await;
    assert!(matches!(single(&response).cert_status, CertStatus::Unknown(_)));
}

#[tokio::test]
async fn test_delta_crl_rejected_and_base_retained() {
    let (ca, key) = test_ca("Lifecycle CA");
    let stack = Stack::new();
    stack
        .admin
        .add_issuing_point(&ca.to_der().unwrap())
        .await
        .unwrap();

    let t1 = SystemTime::now();
    let base = signed_crl(&ca, &key, &[(REVOKED_SERIAL, None)], t1, false);
    stack.ingest.submit(&base).await.unwrap();

    // A fresher delta is still refused; only full CRLs are installed.
    let delta = signed_crl(
        &ca,
        &key,
        &[(&[0x55], None)],
        t1 + Duration::from_secs(3600),
        true,
    );
    let err = stack.ingest.submit(&delta).await.unwrap_err();
    assert!(matches!(err, OcspError::DeltaCrl { .. }));

    let response = stack.query(cert_id_for(&ca, REVOKED_SERIAL)).await;
    assert!(matches!(single(&response).cert_status, CertStatus::Revoked(_)));
}

#[tokio::test]
async fn test_remove_and_readd_issuing_point() {
    let (ca, key) = test_ca("Lifecycle CA");
    let stack = Stack::new();
    stack
        .admin
        .add_issuing_point(&ca.to_der().unwrap())
        .await
        .unwrap();

    let t1 = SystemTime::now();
    stack
        .ingest
        .submit(&signed_crl(&ca, &key, &[(REVOKED_SERIAL, None)], t1, false))
        .await
        .unwrap();

    let response = stack.query(cert_id_for(&ca, REVOKED_SERIAL)).await;
    assert!(matches!(single(&response).cert_status, CertStatus::Revoked(_)));

    // Removal discards the revocation state with the point.
    stack
        .admin
        .remove_issuing_point("CN=Lifecycle CA")
        .await
        .unwrap();
    assert!(stack.registry.is_empty().await);
    let response = stack.query(cert_id_for(&ca, REVOKED_SERIAL)).await;
    let entry = single(&response);
    assert!(matches!(entry.cert_status, CertStatus::Unknown(_)));
    assert!(entry.next_update.is_none());

    // Re-adding starts from a clean point; answers recover once a CRL
    // arrives.
    stack
        .admin
        .add_issuing_point(&ca.to_der().unwrap())
        .await
        .unwrap();
    let response = stack.query(cert_id_for(&ca, REVOKED_SERIAL)).await;
    assert!(matches!(single(&response).cert_status, CertStatus::Unknown(_)));

    stack
        .ingest
        .submit(&signed_crl(
            &ca,
            &key,
            &[(REVOKED_SERIAL, None)],
            t1 + Duration::from_secs(60),
            false,
        ))
        .await
        .unwrap();
    let response = stack.query(cert_id_for(&ca, REVOKED_SERIAL)).await;
    assert!(matches!(single(&response).cert_status, CertStatus::Revoked(_)));
}

#[tokio::test]
async fn test_bad_signature_rejected_across_stack() {
    let (ca, _) = test_ca("Lifecycle CA");
    let (_, wrong_key) = test_ca("Imposter CA");
    let stack = Stack::new();
    stack
        .admin
        .add_issuing_point(&ca.to_der().unwrap())
        .await
        .unwrap();

    let forged = signed_crl(
        &ca,
        &wrong_key,
        &[(REVOKED_SERIAL, None)],
        SystemTime::now(),
        false,
    );
    let err = stack.ingest.submit(&forged).await.unwrap_err();
    assert!(matches!(err, OcspError::SignatureInvalid { .. }));

    // Nothing was installed, so the serial stays unknown.
    let response = stack.query(cert_id_for(&ca, REVOKED_SERIAL)).await;
    assert!(matches!(single(&response).cert_status, CertStatus::Unknown(_)));
}
