//! Failover, health accounting and error aggregation across endpoints.

mod common;

use std::collections::HashSet;
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use common::{test_config, FnTransport};
use rpc_router::config::SelectionStrategy;
use rpc_router::transport::{RpcReply, TransportError};
use rpc_router::{CallOptions, RpcError, RpcManager};

const A: &str = "https://a.example";
const B: &str = "https://b.example";
const C: &str = "https://c.example";

fn failing(status: u16) -> Arc<FnTransport> {
    FnTransport::new(move |_, _| async move { Err(TransportError::HttpStatus(status)) })
}

#[tokio::test(start_paused = true)]
async fn test_timeout_fails_over_to_next_endpoint() {
    let transport = FnTransport::new(|url, _| async move {
        if url == A {
            return pending::<Result<RpcReply, TransportError>>().await;
        }
        tokio::time::sleep(Duration::from_millis(120)).await;
        Ok(RpcReply::new(json!("0x2a")))
    });
    let manager = RpcManager::new(test_config(&[A, B, C]), transport.clone()).unwrap();

    let result = manager.call("eth_blockNumber", json!([])).await.unwrap();
    assert_eq!(result, json!("0x2a"));
    assert_eq!(transport.urls(), vec![A, B]);

    let stats = manager.endpoint_stats();
    let (a, b, c) = (&stats[0], &stats[1], &stats[2]);
    assert_eq!(a.request_count, 1);
    assert_eq!(a.error_count, 1);
    assert!(a.is_healthy, "a single timeout stays below the threshold");

    assert_eq!(b.request_count, 1);
    assert_eq!(b.error_count, 0);
    assert!((b.avg_response_time_ms - 120.0).abs() < 1.0);

    assert_eq!(c.request_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_all_endpoints_failing_aggregates_errors() {
    let transport = failing(503);
    let manager = RpcManager::new(test_config(&[A, B, C]), transport.clone()).unwrap();

    let err = manager.call("eth_chainId", json!([])).await.unwrap_err();
    let RpcError::Exhausted { failures } = &err else {
        panic!("unexpected error: {err:?}");
    };
    let endpoints: Vec<_> = failures.iter().map(|f| f.endpoint.as_str()).collect();
    assert_eq!(endpoints, vec![A, B, C]);
    assert!(failures.iter().all(|f| f.error == TransportError::HttpStatus(503)));

    // Each endpoint tried exactly once.
    assert_eq!(transport.urls().len(), 3);
    let distinct: HashSet<_> = transport.urls().into_iter().collect();
    assert_eq!(distinct.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_health_flips_only_at_threshold() {
    let manager = RpcManager::new(test_config(&[A, B, C]), failing(502)).unwrap();

    for round in 1..=2 {
        assert!(manager.call("eth_chainId", json!([])).await.is_err());
        let stats = manager.endpoint_stats();
        assert!(stats.iter().all(|e| e.is_healthy), "unhealthy after round {round}");
        assert!(stats.iter().all(|e| e.consecutive_failures == round));
    }

    assert!(manager.call("eth_chainId", json!([])).await.is_err());
    let stats = manager.endpoint_stats();
    assert!(stats.iter().all(|e| !e.is_healthy));
    assert_eq!(manager.status().healthy_endpoints, 0);

    let err = manager.call("eth_chainId", json!([])).await.unwrap_err();
    assert_eq!(err, RpcError::NoHealthyEndpoint);
}

#[tokio::test(start_paused = true)]
async fn test_error_count_never_exceeds_request_count() {
    let transport = FnTransport::new(|url, request| async move {
        let n = request.id;
        match (url.as_str(), n % 3) {
            (A, 0) => Err(TransportError::Network("connection reset".into())),
            (B, 1) => Err(TransportError::Timeout(Duration::from_secs(10))),
            _ => Ok(RpcReply::new(json!(n))),
        }
    });
    let manager = RpcManager::new(test_config(&[A, B, C]), transport).unwrap();

    for _ in 0..20 {
        let _ = manager.call("eth_gasPrice", json!([])).await;
        for record in manager.endpoint_stats() {
            assert!(record.error_count <= record.request_count);
            assert!(record.avg_response_time_ms >= 0.0);
        }
    }
}

#[tokio::test]
async fn test_request_fault_is_not_retried() {
    let transport = FnTransport::new(|_, _| async {
        Err(TransportError::Rpc {
            code: -32602,
            message: "invalid params".into(),
        })
    });
    let manager = RpcManager::new(test_config(&[A, B]), transport.clone()).unwrap();

    let err = manager
        .call("eth_getBalance", json!(["not-an-address"]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RpcError::Protocol {
            code: -32602,
            message: "invalid params".into()
        }
    );
    assert!(!err.is_retryable());
    assert_eq!(transport.urls(), vec![A]);

    let a = &manager.endpoint_stats()[0];
    assert_eq!(a.request_count, 1);
    assert_eq!(a.error_count, 0);
    assert!(a.is_healthy);
}

#[tokio::test(start_paused = true)]
async fn test_endpoint_side_rpc_error_fails_over() {
    let transport = FnTransport::new(|url, _| async move {
        if url == A {
            Err(TransportError::Rpc {
                code: -32005,
                message: "limit exceeded".into(),
            })
        } else {
            Ok(RpcReply::new(json!("0x1")))
        }
    });
    let manager = RpcManager::new(test_config(&[A, B]), transport.clone()).unwrap();

    let result = manager.call("eth_chainId", json!([])).await.unwrap();
    assert_eq!(result, json!("0x1"));
    assert_eq!(transport.urls(), vec![A, B]);
    assert_eq!(manager.endpoint_stats()[0].error_count, 1);
}

#[tokio::test(start_paused = true)]
async fn test_max_attempts_caps_failover() {
    let transport = failing(500);
    let manager = RpcManager::new(test_config(&[A, B, C]), transport.clone()).unwrap();

    let err = manager
        .call_with(
            "eth_chainId",
            json!([]),
            CallOptions::default().with_max_attempts(2),
        )
        .await
        .unwrap_err();
    assert_eq!(err.failures().len(), 2);
    assert_eq!(transport.urls(), vec![A, B]);
}

#[tokio::test(start_paused = true)]
async fn test_call_deadline_bounds_total_time() {
    let transport =
        FnTransport::new(|_, _| async { pending::<Result<RpcReply, TransportError>>().await });
    let manager = RpcManager::new(test_config(&[A, B]), transport).unwrap();

    let limit = Duration::from_secs(2);
    let err = manager
        .call_with("eth_call", json!([]), CallOptions::default().with_deadline(limit))
        .await
        .unwrap_err();
    assert_eq!(err, RpcError::timeout(limit));

    let queue = manager.queue_status();
    assert_eq!(queue.in_flight, 0);
    assert!(!queue.processing);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_reports_earlier_failures() {
    let transport = FnTransport::new(|url, _| async move {
        if url == A {
            return Err(TransportError::HttpStatus(503));
        }
        pending::<Result<RpcReply, TransportError>>().await
    });
    let manager = RpcManager::new(test_config(&[A, B]), transport).unwrap();

    let limit = Duration::from_secs(2);
    let err = manager
        .call_with("eth_call", json!([]), CallOptions::default().with_deadline(limit))
        .await
        .unwrap_err();
    let RpcError::Timeout { after, failures } = &err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(*after, limit);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].endpoint, A);
    assert_eq!(failures[0].error, TransportError::HttpStatus(503));
}

#[tokio::test(start_paused = true)]
async fn test_no_backoff_when_nothing_left_to_try() {
    // Health checks pass only on A; calls fail on A.
    let transport = FnTransport::new(|url, request| async move {
        match (url.as_str(), request.method.as_str()) {
            (A, "eth_blockNumber") => Ok(RpcReply::new(json!("0x1"))),
            _ => Err(TransportError::HttpStatus(503)),
        }
    });
    let mut config = test_config(&[A, B, C]);
    config.health.consecutive_failure_threshold = 1;
    config.retries.base_delay_ms = 500;
    config.retries.max_delay_ms = 5_000;
    let manager = RpcManager::new(config, transport).unwrap();

    let round = manager.probe_now().await;
    assert_eq!(round.healthy, 1);

    let started = tokio::time::Instant::now();
    let err = manager.call("eth_chainId", json!([])).await.unwrap_err();
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(err.failures().len(), 1);
    assert!(matches!(err, RpcError::Exhausted { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_backoff_precedes_each_failover() {
    let transport = FnTransport::new(|url, _| async move {
        if url == C {
            Ok(RpcReply::new(json!("0x1")))
        } else {
            Err(TransportError::HttpStatus(502))
        }
    });
    let mut config = test_config(&[A, B, C]);
    config.retries.base_delay_ms = 100;
    config.retries.max_delay_ms = 1_000;
    let manager = RpcManager::new(config, transport).unwrap();

    let started = tokio::time::Instant::now();
    manager.call("eth_chainId", json!([])).await.unwrap();
    // 100ms then 200ms, each with up to 10% jitter.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(300), "elapsed = {elapsed:?}");
    assert!(elapsed < Duration::from_millis(330), "elapsed = {elapsed:?}");
}

#[tokio::test]
async fn test_null_result_is_success() {
    let transport = FnTransport::new(|_, _| async { Ok(RpcReply::new(Value::Null)) });
    let manager = RpcManager::new(test_config(&[A]), transport).unwrap();

    let result = manager
        .call("eth_getTransactionReceipt", json!(["0xabc"]))
        .await
        .unwrap();
    assert_eq!(result, Value::Null);
    assert_eq!(manager.endpoint_stats()[0].error_count, 0);
}

#[tokio::test]
async fn test_cors_flag_is_recorded() {
    let transport = FnTransport::new(|url, _| async move {
        Ok(RpcReply {
            result: json!("0x1"),
            cors_allowed: Some(url == A),
        })
    });
    let mut config = test_config(&[A, B]);
    config.strategy = SelectionStrategy::RoundRobin;
    let manager = RpcManager::new(config, transport).unwrap();

    manager.call("eth_chainId", json!([])).await.unwrap();
    manager.call("eth_chainId", json!([])).await.unwrap();

    let stats = manager.endpoint_stats();
    assert_eq!(stats[0].cors_supported, Some(true));
    assert_eq!(stats[1].cors_supported, Some(false));
}

#[tokio::test]
async fn test_round_robin_spreads_load() {
    let transport = FnTransport::new(|_, _| async { Ok(RpcReply::new(json!("0x1"))) });
    let mut config = test_config(&[A, B, C]);
    config.strategy = SelectionStrategy::RoundRobin;
    let manager = RpcManager::new(config, transport.clone()).unwrap();

    for _ in 0..6 {
        manager.call("eth_chainId", json!([])).await.unwrap();
    }
    for url in [A, B, C] {
        assert_eq!(transport.count_for(url), 2);
    }
}

#[tokio::test(start_paused = true)]
async fn test_ranked_prefers_faster_endpoint() {
    let transport = FnTransport::new(|url, _| async move {
        let delay = if url == A { 40 } else { 5 };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        Ok(RpcReply::new(json!("0x1")))
    });
    let manager = RpcManager::new(test_config(&[A, B]), transport.clone()).unwrap();

    // Unsampled endpoints rank last; a probe round samples both.
    let round = manager.probe_now().await;
    assert_eq!(round.probed, 2);
    assert_eq!(round.healthy, 2);

    manager.call("eth_chainId", json!([])).await.unwrap();
    let last = transport.requests().pop().unwrap();
    assert_eq!(last.0, B);
    assert_eq!(last.1.method, "eth_chainId");
}

#[test]
fn test_empty_pool_is_rejected() {
    let transport = FnTransport::new(|_, _| async { Ok(RpcReply::new(json!(null))) });
    let config = test_config(&[]);
    assert!(RpcManager::new(config, transport).is_err());
}
