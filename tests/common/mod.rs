#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use script_http::config::ServerOptions;
use script_http::object::{Environment, Function, FunctionBody, Hash};
use script_http::server::State;
use script_http::{Evaluator, HttpPlugin, Object, PluginError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// 핸들러 평가를 부수 효과로 기록하는 evaluator
pub struct RecordingEvaluator {
    pub started: AtomicUsize,
    pub finished: AtomicUsize,
    pub bodies: Mutex<Vec<String>>,
    delay: Duration,
    result: Object,
}

impl RecordingEvaluator {
    pub fn new() -> Self {
        Self::with(Duration::ZERO, Object::Null)
    }

    pub fn with(delay: Duration, result: Object) -> Self {
        Self {
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
            bodies: Mutex::new(Vec::new()),
            delay,
            result,
        }
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn bodies(&self) -> Vec<String> {
        self.bodies.lock().unwrap().clone()
    }
}

impl Evaluator for RecordingEvaluator {
    fn eval(&self, body: &FunctionBody, env: &mut Environment) -> Object {
        assert!(env.is_empty(), "handlers must run in a fresh environment");
        self.started.fetch_add(1, Ordering::SeqCst);
        self.bodies.lock().unwrap().push(body.source().to_string());
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.finished.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

pub fn handler(body: &str) -> Object {
    Object::Function(Function::new(vec![], body))
}

/// Plugin on an ephemeral loopback port.
pub fn local_plugin(evaluator: Arc<RecordingEvaluator>, grace: Duration) -> Arc<HttpPlugin> {
    let settings: Hash = [("port", Object::from("0"))].into_iter().collect();
    let plugin = HttpPlugin::with_options(
        evaluator,
        &[Object::Hash(settings)],
        ServerOptions {
            bind_host: "127.0.0.1".to_string(),
            grace_period: grace,
        },
    )
    .expect("plugin should construct");
    Arc::new(plugin)
}

pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: CancellationToken,
    pub task: JoinHandle<Result<(), PluginError>>,
}

impl RunningServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub async fn start(plugin: Arc<HttpPlugin>) -> RunningServer {
    let shutdown = CancellationToken::new();
    let mut states = plugin.lifecycle().subscribe();

    let task = tokio::spawn({
        let plugin = plugin.clone();
        let shutdown = shutdown.clone();
        async move { plugin.listen_with(shutdown).await }
    });

    tokio::time::timeout(Duration::from_secs(5), states.wait_for(|s| *s == State::Listening))
        .await
        .expect("server should start listening")
        .expect("state channel closed");

    let addr = plugin.lifecycle().local_addr().expect("bound address");
    RunningServer { addr, shutdown, task }
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 2s");
}
