/********************************************************************************
 * Copyright (c) 2026 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod support;

use amqp_http_bridge::BridgeSettings;
use integration_test_utils::InMemoryBroker;
use reqwest::Method;
use std::time::Duration;
use support::{start_bridge, wait_until, LineReader};

const READ_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::test(flavor = "multi_thread")]
async fn deliveries_from_several_queues_arrive_once_and_in_queue_order() {
    let broker = InMemoryBroker::new();
    let bridge = start_bridge(&broker, BridgeSettings::default()).await;
    bridge.declare_queue("q1").await;
    bridge.declare_queue("q2").await;
    broker.inject("", "q1", "q1-1");
    broker.inject("", "q2", "q2-1");

    let response = bridge.open_stream("/queue?name=q1&name=q2").await;
    assert_eq!(response.status().as_u16(), 200);
    assert!(response.headers().get("content-length").is_none());
    assert_eq!(broker.consumer_count("q1"), 1);
    assert_eq!(broker.consumer_count("q2"), 1);

    broker.inject("", "q1", "q1-2");
    broker.inject("", "q2", "q2-2");
    broker.inject("", "q1", "q1-3");

    let mut reader = LineReader::new(response);
    let mut lines = Vec::new();
    for _ in 0..5 {
        lines.push(
            reader
                .next_line(READ_TIMEOUT)
                .await
                .expect("every injected message should be streamed"),
        );
    }

    let from_q1: Vec<&str> = lines
        .iter()
        .map(String::as_str)
        .filter(|line| line.starts_with("q1-"))
        .collect();
    let from_q2: Vec<&str> = lines
        .iter()
        .map(String::as_str)
        .filter(|line| line.starts_with("q2-"))
        .collect();
    assert_eq!(from_q1, vec!["q1-1", "q1-2", "q1-3"]);
    assert_eq!(from_q2, vec!["q2-1", "q2-2"]);
    assert_eq!(broker.queue_depth("q1"), 0);
    assert_eq!(broker.queue_depth("q2"), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn client_disconnect_cancels_every_consumer() {
    let broker = InMemoryBroker::new();
    let bridge = start_bridge(&broker, BridgeSettings::default()).await;
    bridge.declare_queue("q1").await;
    bridge.declare_queue("q2").await;
    let baseline = broker.open_connections();

    let response = bridge.open_stream("/queue?name=q1&name=q2").await;
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(broker.total_consumers(), 2);
    assert_eq!(broker.open_connections(), baseline + 1);

    drop(response);

    // Writes are what reveal a dead socket, so keep the stream busy.
    let released = wait_until(Duration::from_secs(5), || {
        broker.inject("", "q1", "keepalive");
        broker.total_consumers() == 0 && broker.open_connections() == baseline
    })
    .await;
    assert!(released, "consumers should be cancelled after disconnect");
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_subscription_aborts_the_whole_request() {
    let broker = InMemoryBroker::new();
    let bridge = start_bridge(&broker, BridgeSettings::default()).await;
    bridge.declare_queue("q1").await;

    let (status, text) = bridge
        .send(Method::GET, "/queue?name=q1&name=ghost", "")
        .await;

    assert_eq!(status, 500);
    assert_eq!(text, "NOT_FOUND - no queue 'ghost' in vhost '/'\n");
    assert_eq!(broker.total_consumers(), 0);
    assert_eq!(broker.open_connections(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn broker_side_cancellation_ends_the_response() {
    let broker = InMemoryBroker::new();
    let bridge = start_bridge(&broker, BridgeSettings::default()).await;
    bridge.declare_queue("q1").await;
    bridge.declare_queue("q2").await;

    let response = bridge.open_stream("/queue?name=q1&name=q2").await;
    let mut reader = LineReader::new(response);
    broker.inject("", "q2", "before-cancel");
    assert_eq!(
        reader.next_line(READ_TIMEOUT).await.as_deref(),
        Some("before-cancel")
    );

    broker.cancel_consumers("q1");

    assert!(reader.ended_within(READ_TIMEOUT).await);
    assert!(wait_until(READ_TIMEOUT, || broker.open_connections() == 0).await);
    assert_eq!(broker.total_consumers(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn consumption_without_queue_names_is_a_bad_request() {
    let broker = InMemoryBroker::new();
    let bridge = start_bridge(&broker, BridgeSettings::default()).await;

    let (status, text) = bridge.send(Method::GET, "/queue", "").await;

    assert_eq!(status, 400);
    assert_eq!(text, "at least one queue name is required\n");
    assert_eq!(broker.connections_opened(), 0);
}
