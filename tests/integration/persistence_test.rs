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

//! Durability across restarts and the audit trail the admin surfaces
//! leave behind.

use super::*;

use std::time::SystemTime;

use usg_ocsp_responder::store::{FileStore, RegistryStore};
use usg_ocsp_responder::types::ocsp::{CertStatus, OcspResponseStatus};

#[tokio::test]
async fn test_registry_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path()).unwrap());
    let (ca, key) = test_ca("Durable CA");

    // First process lifetime: onboard and install.
    {
        let registry = Arc::new(Registry::new());
        let audit = Arc::new(AuditLog::disabled());
        let admin =
            RegistryAdmin::new(registry.clone(), audit.clone()).with_store(store.clone());
        admin.add_issuing_point(&ca.to_der().unwrap()).await.unwrap();

        let ingest = CrlIngest::new(
            registry,
            Arc::new(SoftwareVerifier::new()),
            audit,
            InstallMode::Synchronous,
        )
        .with_store(store.clone());
        ingest
            .submit(&signed_crl(
                &ca,
                &key,
                &[(&[0x33], None)],
                SystemTime::now(),
                false,
            ))
            .await
            .unwrap();
    }

    // Second lifetime: reload from disk and answer from the restored state.
    let registry = Arc::new(Registry::new());
    assert_eq!(store.load_into(&registry).await.unwrap(), 1);

    let responder = Stack::responder_for(registry);
    let body = request_der(vec![cert_id_for(&ca, &[0x33])]);
    let reply = responder.handle_post(Some(body.len() as u64), &body).await;
    let basic = decode_ocsp(&reply).basic_response().unwrap().unwrap();
    assert!(matches!(
        basic.tbs_response_data.responses[0].cert_status,
        CertStatus::Revoked(_)
    ));
}

#[tokio::test]
async fn test_removed_point_stays_removed_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path()).unwrap());
    let (ca, _) = test_ca("Durable CA");

    let registry = Arc::new(Registry::new());
    let admin = RegistryAdmin::new(registry, Arc::new(AuditLog::disabled()))
        .with_store(store.clone());
    admin.add_issuing_point(&ca.to_der().unwrap()).await.unwrap();
    admin.remove_issuing_point("CN=Durable CA").await.unwrap();

    let restored = Registry::new();
    assert_eq!(store.load_into(&restored).await.unwrap(), 0);
    assert!(restored.is_empty().await);
}

#[tokio::test]
async fn test_audit_trail_covers_full_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let audit_path = dir.path().join("audit.log");
    let (ca, key) = test_ca("Audited CA");

    let stack = Stack::with_audit(Arc::new(AuditLog::to_file(&audit_path).unwrap()));
    stack
        .admin
        .add_issuing_point(&ca.to_der().unwrap())
        .await
        .unwrap();

    let t1 = SystemTime::now();
    let crl = signed_crl(&ca, &key, &[(&[0x44], None)], t1, false);
    stack.ingest.submit(&crl).await.unwrap();
    stack.ingest.submit(&crl).await.unwrap_err();
    stack
        .admin
        .remove_issuing_point("CN=Audited CA")
        .await
        .unwrap();

    let contents = std::fs::read_to_string(&audit_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].contains("[point-added]"));
    assert!(lines[0].contains("issuer=\"CN=Audited CA\""));
    assert!(lines[1].contains("[crl-accepted]"));
    assert!(lines[2].contains("[crl-rejected]"));
    assert!(lines[2].contains("reason=stale-crl"));
    assert!(lines[3].contains("[point-removed]"));
}

#[tokio::test]
async fn test_query_unaffected_by_rejected_submission() {
    let (ca, key) = test_ca("Durable CA");
    let stack = Stack::new();
    stack
        .admin
        .add_issuing_point(&ca.to_der().unwrap())
        .await
        .unwrap();
    stack
        .ingest
        .submit(&signed_crl(
            &ca,
            &key,
            &[(&[0x33], None)],
            SystemTime::now(),
            false,
        ))
        .await
        .unwrap();

    // A garbage submission is rejected without disturbing live answers.
    stack.ingest.submit(b"not a crl").await.unwrap_err();

    let response = stack.query(cert_id_for(&ca, &[0x33])).await;
    assert_eq!(response.response_status, OcspResponseStatus::Successful);
    let basic = response.basic_response().unwrap().unwrap();
    assert!(matches!(
        basic.tbs_response_data.responses[0].cert_status,
        CertStatus::Revoked(_)
    ));
}
