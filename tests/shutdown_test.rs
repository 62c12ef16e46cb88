//! Interrupt-driven shutdown, simulated through the cancellation token.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{handler, local_plugin, start, wait_until, RecordingEvaluator};
use script_http::server::{LifecycleError, State};
use script_http::{NativePlugin, Object, PluginError};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_idle_server_stops_promptly() {
    let plugin = local_plugin(Arc::new(RecordingEvaluator::new()), Duration::from_secs(30));
    let server = start(plugin.clone()).await;

    let cancelled_at = Instant::now();
    server.shutdown.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), server.task)
        .await
        .expect("listen should return well within the grace period")
        .unwrap();

    assert!(result.is_ok());
    assert!(cancelled_at.elapsed() < Duration::from_secs(5));
    assert_eq!(plugin.lifecycle().state(), State::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_in_flight_request_completes_before_return() {
    let evaluator = Arc::new(RecordingEvaluator::with(Duration::from_millis(500), Object::Null));
    let plugin = local_plugin(evaluator.clone(), Duration::from_secs(10));
    plugin.call("handle", &[Object::from("/slow"), handler("sleep(500)")]);
    let server = start(plugin.clone()).await;

    let request = tokio::spawn(reqwest::get(server.url("/slow")));
    wait_until(|| evaluator.started() == 1).await;

    server.shutdown.cancel();
    let mut states = plugin.lifecycle().subscribe();
    tokio::time::timeout(Duration::from_secs(2), states.wait_for(|s| *s != State::Listening))
        .await
        .expect("server should leave Listening after the interrupt")
        .unwrap();

    let result = tokio::time::timeout(Duration::from_secs(10), server.task)
        .await
        .expect("listen should return within the grace period")
        .unwrap();
    assert!(result.is_ok());

    // 진행 중이던 핸들러가 끝난 뒤에야 반환되어야 함
    assert_eq!(evaluator.finished(), 1);
    let resp = request.await.unwrap().unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_grace_period_bounds_shutdown() {
    let evaluator = Arc::new(RecordingEvaluator::with(Duration::from_millis(1500), Object::Null));
    let plugin = local_plugin(evaluator.clone(), Duration::from_millis(200));
    plugin.call("handle", &[Object::from("/stuck"), handler("sleep(1500)")]);
    let server = start(plugin.clone()).await;

    let _request = tokio::spawn(reqwest::get(server.url("/stuck")));
    wait_until(|| evaluator.started() == 1).await;

    let cancelled_at = Instant::now();
    server.shutdown.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), server.task)
        .await
        .expect("listen should return once the grace period elapses")
        .unwrap();

    assert!(result.is_ok());
    let waited = cancelled_at.elapsed();
    assert!(waited >= Duration::from_millis(150), "returned too early: {:?}", waited);
    assert!(waited < Duration::from_millis(1200), "grace period not enforced: {:?}", waited);
    assert_eq!(evaluator.finished(), 0);
    assert_eq!(plugin.lifecycle().state(), State::Stopped);
}

#[tokio::test]
async fn test_repeated_interrupt_has_no_further_effect() {
    let plugin = local_plugin(Arc::new(RecordingEvaluator::new()), Duration::from_secs(1));
    let server = start(plugin.clone()).await;

    server.shutdown.cancel();
    server.shutdown.cancel();
    server.task.await.unwrap().unwrap();
    server.shutdown.cancel();
    assert_eq!(plugin.lifecycle().state(), State::Stopped);

    // 같은 인스턴스로 다시 listen 할 수 없음
    let err = plugin.listen_with(server.shutdown.clone()).await.unwrap_err();
    assert!(matches!(
        err,
        PluginError::Lifecycle(LifecycleError::AlreadyStarted(State::Stopped))
    ));
    assert!(plugin.call("listen", &[]).is_error());
}
