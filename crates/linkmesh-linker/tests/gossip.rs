// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gossip propagation across a linker mesh.

mod common;

use common::{addr_of, register_service, request_service, spawn_mesh, test_config};
use linkmesh::{Envelope, MessageKind, Role, ServiceKind};
use linkmesh_linker::LinkerServer;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// A registration handled by one linker becomes visible at every peer
/// through its own registry, without the origin being queried again.
#[tokio::test]
async fn registration_converges_across_the_mesh() {
    let mesh = spawn_mesh(3).await;
    let (_, l1_addr) = &mesh[0];

    let service = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    register_service(&service, ServiceKind::Time, l1_addr).await;
    let service_addr = addr_of(&service);

    tokio::time::sleep(Duration::from_millis(300)).await;

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    for (_, linker_addr) in &mesh[1..] {
        let answer = request_service(&client, ServiceKind::Time, linker_addr).await;
        assert_eq!(
            answer.as_ref(),
            Some(&service_addr),
            "peer {} did not converge",
            linker_addr
        );
    }

    // The peers hold the entry themselves as well.
    assert_eq!(mesh[1].0.service_count().await, 1);
    assert_eq!(mesh[2].0.service_count().await, 1);
}

/// A linker that applies a gossiped registration must not re-broadcast
/// it: one mutation costs at most peer-count messages, not peer-count
/// squared. A bystander socket standing in both linkers' peer lists
/// counts what actually hits the wire.
#[tokio::test]
async fn gossip_propagates_exactly_one_hop() {
    let bystander = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let bystander_addr = addr_of(&bystander);

    let s1 = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let s2 = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let l1_addr = addr_of(&s1);
    let l2_addr = addr_of(&s2);

    let l1 = LinkerServer::from_socket(
        test_config(vec![l2_addr.clone(), bystander_addr.clone()]),
        s1,
    )
    .unwrap();
    let l2 = LinkerServer::from_socket(
        test_config(vec![l1_addr.clone(), bystander_addr.clone()]),
        s2,
    )
    .unwrap();
    for server in [&l1, &l2] {
        let runner = server.clone();
        tokio::spawn(async move {
            let _ = runner.run().await;
        });
    }
    tokio::time::sleep(Duration::from_millis(700)).await;

    let service = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    register_service(&service, ServiceKind::Sum, &l1_addr).await;

    // Drain everything the bystander sees for a while; bootstrap table
    // requests are expected, repeated registration gossip is the bug.
    let mut registrations = 0;
    let mut buf = [0u8; 512];
    loop {
        match timeout(Duration::from_millis(500), bystander.recv_from(&mut buf)).await {
            Ok(Ok((len, _))) => {
                if let Ok(envelope) = Envelope::decode(&buf[..len]) {
                    if envelope.kind == MessageKind::RegisterService {
                        registrations += 1;
                    }
                }
            }
            _ => break,
        }
    }

    assert_eq!(
        registrations, 1,
        "gossip must reach a bystander once, from the origin linker only"
    );

    // The peer that received the gossip still applied it.
    assert_eq!(l2.service_count().await, 1);
}

/// An eviction gossiped by the probing linker clears the entry at peers
/// that never saw the down report.
#[tokio::test]
async fn removal_gossip_clears_peers() {
    let mesh = spawn_mesh(2).await;
    let (_, l0_addr) = &mesh[0];
    let (l1, l1_addr) = &mesh[1];

    let service = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    register_service(&service, ServiceKind::Reply, l0_addr).await;
    let service_addr = addr_of(&service);
    drop(service); // the service dies silently

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(l1.service_count().await, 1);

    // Report to L0; its probe fails and the eviction is gossiped to L1.
    let reporter = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let report = Envelope::new(
        MessageKind::ServiceDown,
        Role::Client,
        service_addr.encode(),
    )
    .encode();
    reporter.send_to(&report, l0_addr.to_string()).await.unwrap();

    let mut buf = [0u8; 64];
    let (len, _) = timeout(Duration::from_secs(1), reporter.recv_from(&mut buf))
        .await
        .expect("no ack for the down report")
        .unwrap();
    assert_eq!(
        Envelope::decode(&buf[..len]).unwrap().kind,
        MessageKind::Ack
    );

    // Probe timeout (200ms) plus margin.
    tokio::time::sleep(Duration::from_millis(700)).await;

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    assert_eq!(
        request_service(&client, ServiceKind::Reply, l0_addr).await,
        None
    );
    assert_eq!(
        request_service(&client, ServiceKind::Reply, l1_addr).await,
        None
    );
}

/// Registering the same endpoint through two different linkers leaves a
/// single entry everywhere (gossip meets set semantics).
#[tokio::test]
async fn duplicate_registration_via_two_linkers_is_idempotent() {
    let mesh = spawn_mesh(2).await;
    let (l0, l0_addr) = &mesh[0];
    let (l1, l1_addr) = &mesh[1];

    let service = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    register_service(&service, ServiceKind::Time, l0_addr).await;
    register_service(&service, ServiceKind::Time, l1_addr).await;

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(l0.service_count().await, 1);
    assert_eq!(l1.service_count().await, 1);
}
