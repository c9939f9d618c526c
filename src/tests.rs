// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! End-to-end scenarios exercised against the in-process `LocalTransport` harness.

use crate::{
    config::{BusynessEntry, MeshConfig, TaskLatencies},
    event::Outcome,
    node::{CallOptions, MeshNode},
    node_name::NodeName,
    test_support::LocalTransport,
    value::Value,
};

use std::sync::Arc;
use std::sync::Once;
use std::time::Duration;

static LOGGER_INIT: Once = Once::new();

fn init_logger() {
    LOGGER_INIT.call_once(|| {
        fern::Dispatch::new()
            .level(log::LevelFilter::Info)
            .chain(std::io::stdout())
            .apply()
            .expect("fern");
    });
}

fn fast_latencies() -> TaskLatencies {
    TaskLatencies { ping: 15, sync: 15, assign_requests: 5, handle_requests: 5 }
}

fn spawn_node(transport: &LocalTransport, name: &str, config: MeshConfig) -> Arc<MeshNode> {
    let mut node = MeshNode::new(NodeName::new(name), config, Arc::new(transport.clone()));
    node.spawn();
    let node = Arc::new(node);
    transport.register(node.clone());
    node
}

fn upcase(args: &[Value]) -> Result<Value, String> {
    let s = args[0].as_str().ok_or("expected a string")?;
    Ok(serde_json::json!(s.to_uppercase()))
}

fn square(args: &[Value]) -> Result<Value, String> {
    let n = args[0].as_i64().ok_or("expected an integer")?;
    Ok(serde_json::json!(n * n))
}

#[tokio::test]
async fn s1_single_node_echo() {
    init_logger();
    let transport = LocalTransport::new();
    let node = spawn_node(&transport, "a@h", MeshConfig::default());
    node.capability_table().register("Strings", "upcase", 1, Arc::new(upcase));

    let outcome = node
        .make_it_so("Strings", "upcase", vec![serde_json::json!("hi")], CallOptions::default())
        .await
        .unwrap();

    match outcome {
        Outcome::Ok { result, executing_node } => {
            assert_eq!(result, serde_json::json!("HI"));
            assert_eq!(executing_node, NodeName::new("a@h"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn s2_delegation() {
    init_logger();
    let transport = LocalTransport::new();

    let a_config = MeshConfig { referrals: "b@h".into(), latencies: fast_latencies(), ..Default::default() };
    let b_config = MeshConfig { referrals: "a@h".into(), latencies: fast_latencies(), ..Default::default() };

    let a = spawn_node(&transport, "a@h", a_config);
    let b = spawn_node(&transport, "b@h", b_config);
    b.capability_table().register("Math", "square", 1, Arc::new(square));

    let outcome = a
        .make_it_so("Math", "square", vec![serde_json::json!(7)], CallOptions { timeout_ms: 2000 })
        .await
        .unwrap();

    match outcome {
        Outcome::Ok { result, executing_node } => {
            assert_eq!(result, serde_json::json!(49));
            assert_eq!(executing_node, NodeName::new("b@h"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn s3_capability_filter_by_reject_offset() {
    init_logger();
    let transport = LocalTransport::new();

    let mut offsets = std::collections::HashMap::new();
    offsets.insert("Math".to_string(), std::collections::HashMap::from([("square".to_string(), BusynessEntry::Reject)]));

    let a_config = MeshConfig {
        referrals: "b@h".into(),
        latencies: fast_latencies(),
        busyness_offsets: offsets,
        ..Default::default()
    };
    let b_config = MeshConfig { referrals: "a@h".into(), latencies: fast_latencies(), ..Default::default() };

    let a = spawn_node(&transport, "a@h", a_config);
    let b = spawn_node(&transport, "b@h", b_config);
    a.capability_table().register("Math", "square", 1, Arc::new(square));
    b.capability_table().register("Math", "square", 1, Arc::new(square));

    let outcome = a
        .make_it_so("Math", "square", vec![serde_json::json!(3)], CallOptions { timeout_ms: 2000 })
        .await
        .unwrap();

    match outcome {
        Outcome::Ok { result, executing_node } => {
            assert_eq!(result, serde_json::json!(9));
            assert_eq!(executing_node, NodeName::new("b@h"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn s4_load_preference() {
    init_logger();
    let transport = LocalTransport::new();

    let a_config = MeshConfig { referrals: "b@h,c@h".into(), latencies: fast_latencies(), ..Default::default() };
    let b_config = MeshConfig { referrals: "a@h,c@h".into(), latencies: fast_latencies(), ..Default::default() };
    let c_config = MeshConfig { referrals: "a@h,b@h".into(), latencies: fast_latencies(), ..Default::default() };

    let a = spawn_node(&transport, "a@h", a_config);
    let b = spawn_node(&transport, "b@h", b_config);
    let c = spawn_node(&transport, "c@h", c_config);

    a.capability_table().register("Math", "square", 1, Arc::new(square));
    b.capability_table().register("Math", "square", 1, Arc::new(square));
    a.request_store().base_busyness_increase(Some(1000));

    // Let membership converge before measuring the scheduling preference.
    tokio::time::sleep(Duration::from_millis(200)).await;

    for _ in 0..10 {
        let outcome = c
            .make_it_so("Math", "square", vec![serde_json::json!(2)], CallOptions { timeout_ms: 2000 })
            .await
            .unwrap();

        match outcome {
            Outcome::Ok { executing_node, .. } => assert_eq!(executing_node, NodeName::new("b@h")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn s5_timeout() {
    init_logger();
    let transport = LocalTransport::new();
    let node = spawn_node(&transport, "a@h", MeshConfig::default());
    node.capability_table().register(
        "Slow",
        "sleep",
        0,
        Arc::new(|_| {
            std::thread::sleep(Duration::from_secs(10));
            Ok(serde_json::json!(null))
        }),
    );

    let outcome = node.make_it_so("Slow", "sleep", vec![], CallOptions { timeout_ms: 100 }).await.unwrap();

    assert_eq!(outcome, Outcome::Timeout);
}

#[tokio::test]
async fn s6_execution_error() {
    init_logger();
    let transport = LocalTransport::new();
    let node = spawn_node(&transport, "a@h", MeshConfig::default());
    node.capability_table().register("Bad", "boom", 0, Arc::new(|_| Err("kaboom".to_string())));

    let outcome = node.make_it_so("Bad", "boom", vec![], CallOptions { timeout_ms: 2000 }).await.unwrap();

    match outcome {
        Outcome::Error { executing_node, error_info } => {
            assert_eq!(executing_node, NodeName::new("a@h"));
            assert!(error_info.contains("kaboom"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn s7_membership_transitivity() {
    init_logger();
    let transport = LocalTransport::new();

    let a_config = MeshConfig { referrals: "b@h".into(), latencies: fast_latencies(), ..Default::default() };
    let b_config = MeshConfig { referrals: "c@h".into(), latencies: fast_latencies(), ..Default::default() };
    let c_config = MeshConfig { latencies: fast_latencies(), ..Default::default() };

    let a = spawn_node(&transport, "a@h", a_config);
    let _b = spawn_node(&transport, "b@h", b_config);
    let _c = spawn_node(&transport, "c@h", c_config);

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(a.registry().get_all().contains_key(&NodeName::new("c@h")));
}
