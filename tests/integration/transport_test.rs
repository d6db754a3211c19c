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

//! Transport behavior over the full stack: both RFC 6960 bindings, the
//! size gates, and the signature on produced responses.

use super::*;

use std::str::FromStr;
use std::time::SystemTime;

use signature::Verifier;
use x509_cert::name::Name;

use usg_ocsp_responder::registry::IssuingPoint;
use usg_ocsp_responder::types::ocsp::{CertStatus, OcspResponseStatus, ResponderId};

async fn revoked_stack(serial: &[u8]) -> (Stack, Certificate) {
    let (ca, key) = test_ca("Transport CA");
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
            &[(serial, None)],
            SystemTime::now(),
            false,
        ))
        .await
        .unwrap();
    (stack, ca)
}

#[tokio::test]
async fn test_get_and_post_agree() {
    let (stack, ca) = revoked_stack(&[0x21]).await;
    let body = request_der(vec![cert_id_for(&ca, &[0x21])]);

    // produced_at can tick between calls; compare the per-certificate
    // answers rather than whole encodings.
    fn answers(reply: &TransportResponse) -> Vec<CertStatus> {
        decode_ocsp(reply)
            .basic_response()
            .unwrap()
            .unwrap()
            .tbs_response_data
            .responses
            .into_iter()
            .map(|entry| entry.cert_status)
            .collect()
    }

    let via_post = stack
        .responder
        .handle_post(Some(body.len() as u64), &body)
        .await;
    let via_get = stack
        .responder
        .handle_get(&BASE64_STANDARD.encode(&body))
        .await;
    assert_eq!(answers(&via_post), answers(&via_get));
    assert!(matches!(answers(&via_post)[0], CertStatus::Revoked(_)));

    // Clients using the URL-safe alphabet get the same answer.
    let via_urlsafe = stack
        .responder
        .handle_get(&BASE64_URL_SAFE.encode(&body))
        .await;
    assert_eq!(answers(&via_post), answers(&via_urlsafe));
}

#[tokio::test]
async fn test_post_size_gates() {
    let (stack, ca) = revoked_stack(&[0x21]).await;
    let body = request_der(vec![cert_id_for(&ca, &[0x21])]);

    let reply = stack.responder.handle_post(None, &body).await;
    assert_eq!(reply.status, 411);
    assert!(!reply.is_ocsp());

    let reply = stack.responder.handle_post(Some(0), &[]).await;
    assert_eq!(reply.status, 400);
    assert!(!reply.is_ocsp());

    let reply = stack.responder.handle_post(Some(1_000_000), &body).await;
    assert_eq!(reply.status, 413);
    assert!(!reply.is_ocsp());
}

#[tokio::test]
async fn test_oversized_get_segment_rejected() {
    let registry = Arc::new(Registry::new());
    let responder = Stack::responder_for(registry).with_max_request_size(64);

    let oversized = BASE64_STANDARD.encode(vec![0x30; 128]);
    let reply = responder.handle_get(&oversized).await;
    assert_eq!(reply.status, 413);
}

#[tokio::test]
async fn test_undecodable_bytes_get_protocol_answer() {
    let (stack, _) = revoked_stack(&[0x21]).await;

    // Sized like a request, shaped like nothing; still a 200 with a
    // protocol-level malformedRequest.
    let garbage = vec![0xDE, 0xAD, 0xBE, 0xEF];
    let reply = stack
        .responder
        .handle_post(Some(garbage.len() as u64), &garbage)
        .await;
    let response = decode_ocsp(&reply);
    assert_eq!(response.response_status, OcspResponseStatus::MalformedRequest);
    assert!(response.response_bytes.is_none());

    let reply = stack.responder.handle_get("not/base64/at/all!").await;
    let response = decode_ocsp(&reply);
    assert_eq!(response.response_status, OcspResponseStatus::MalformedRequest);
}

#[tokio::test]
async fn test_batched_request_answers_in_order() {
    let (stack, ca) = revoked_stack(&[0x21]).await;
    let body = request_der(vec![
        cert_id_for(&ca, &[0x77]),
        cert_id_for(&ca, &[0x21]),
    ]);

    let reply = stack
        .responder
        .handle_post(Some(body.len() as u64), &body)
        .await;
    let basic = decode_ocsp(&reply).basic_response().unwrap().unwrap();
    let responses = &basic.tbs_response_data.responses;
    assert_eq!(responses.len(), 2);
    assert!(matches!(responses[0].cert_status, CertStatus::Unknown(_)));
    assert!(matches!(responses[1].cert_status, CertStatus::Revoked(_)));
}

#[tokio::test]
async fn test_response_signed_and_attributed() {
    let (ca, key) = test_ca("Transport CA");
    let (responder_cert, _) = test_ca("OCSP Signer");

    let registry = Arc::new(Registry::new());
    registry
        .register(IssuingPoint::from_certificate(ca.clone()).unwrap())
        .await
        .unwrap();
    registry
        .install_crl(
            &usg_ocsp_responder::ParsedCrl::from_der(&signed_crl(
                &ca,
                &key,
                &[(&[0x21], None)],
                SystemTime::now(),
                false,
            ))
            .unwrap(),
        )
        .await
        .unwrap();

    let signing_key = p256::ecdsa::SigningKey::from_slice(&[0x42; 32]).unwrap();
    let signer = SoftwareSigner::new(signing_key.clone())
        .unwrap()
        .with_responder_name(Name::from_str("CN=OCSP Signer").unwrap())
        .with_certificate(responder_cert.clone());
    let responder = OcspResponder::new(StatusResolver::new(registry), Arc::new(signer));

    let body = request_der(vec![cert_id_for(&ca, &[0x21])]);
    let reply = responder.handle_post(Some(body.len() as u64), &body).await;
    let basic = decode_ocsp(&reply).basic_response().unwrap().unwrap();

    // The responder names itself and attaches its certificate.
    assert_eq!(
        basic.tbs_response_data.responder_id,
        ResponderId::ByName(Name::from_str("CN=OCSP Signer").unwrap())
    );
    assert_eq!(basic.certs.as_deref(), Some(&[responder_cert][..]));

    // The signature covers the DER encoding of tbsResponseData.
    let verifying_key = p256::ecdsa::VerifyingKey::from(&signing_key);
    let signature =
        p256::ecdsa::Signature::from_der(basic.signature.raw_bytes()).unwrap();
    verifying_key
        .verify(&basic.tbs_response_data.to_der().unwrap(), &signature)
        .unwrap();
}
