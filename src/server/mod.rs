//! Listening-server lifecycle.
//!
//! `Idle -> Listening -> Draining -> Stopped`. The accept loop runs on the
//! caller's task; shutdown is driven by a `CancellationToken`, which the
//! blocking entry point wires to the process interrupt signal.

pub mod state_machine;

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Mutex;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::ServerOptions;
pub use state_machine::{State, StateMachine, TransitionError};

#[derive(thiserror::Error, Debug)]
pub enum LifecycleError {
    #[error("Could not listen on {port}: {source}")]
    Bind {
        port: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server on {port} stopped unexpectedly: {source}")]
    Serve {
        port: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server already started (state: {0:?})")]
    AlreadyStarted(State),

    #[error("listen would block inside an async runtime")]
    InsideRuntime,

    #[error("Failed to start server runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Owns the listener for one server lifetime. A manager serves once.
pub struct LifecycleManager {
    options: ServerOptions,
    machine: Mutex<StateMachine>,
    state_tx: watch::Sender<State>,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl LifecycleManager {
    pub fn new(options: ServerOptions) -> Self {
        let (state_tx, _) = watch::channel(State::Idle);
        Self {
            options,
            machine: Mutex::new(StateMachine::new()),
            state_tx,
            local_addr: Mutex::new(None),
        }
    }

    pub fn state(&self) -> State {
        self.machine.lock().unwrap_or_else(|e| e.into_inner()).state
    }

    /// Watch state changes, e.g. to wait for `Listening`.
    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.state_tx.subscribe()
    }

    /// Address actually bound; useful with port `0`.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// `Listening`으로 전이하기 전에 바인딩된 주소를 기록 (구독자가 바로 조회할 수 있도록)
    fn start_listening(&self, bound: Option<SocketAddr>) -> Result<(), TransitionError> {
        let mut machine = self.machine.lock().unwrap_or_else(|e| e.into_inner());
        if !machine.can_transition(&State::Listening) {
            return Err(TransitionError::InvalidTransition(machine.state, State::Listening));
        }
        *self.local_addr.lock().unwrap_or_else(|e| e.into_inner()) = bound;
        machine.transition(State::Listening)?;
        self.state_tx.send_replace(State::Listening);
        Ok(())
    }

    fn transition(&self, to: State) -> Result<(), TransitionError> {
        let mut machine = self.machine.lock().unwrap_or_else(|e| e.into_inner());
        machine.transition(to)?;
        self.state_tx.send_replace(to);
        Ok(())
    }

    /// Binds `<bind_host>:<port>` and serves `app` until `shutdown` fires and
    /// the drain finishes or the grace period elapses.
    pub async fn serve(
        &self,
        port: &str,
        app: Router,
        shutdown: CancellationToken,
    ) -> Result<(), LifecycleError> {
        let state = self.state();
        if state != State::Idle {
            return Err(LifecycleError::AlreadyStarted(state));
        }

        // 빈 포트는 임의 포트로 바인딩
        let bind_port = if port.is_empty() { "0" } else { port };
        let addr = format!("{}:{}", self.options.bind_host, bind_port);
        let listener = TcpListener::bind(&addr).await.map_err(|source| {
            tracing::error!("Could not listen on {}: {}", addr, source);
            LifecycleError::Bind {
                port: port.to_string(),
                source,
            }
        })?;

        // 동시에 serve가 호출된 경우 한쪽만 Listening으로 전이
        let bound = listener.local_addr().ok();
        if self.start_listening(bound).is_err() {
            return Err(LifecycleError::AlreadyStarted(self.state()));
        }

        match bound {
            Some(bound) => tracing::info!("HTTP plugin listening on http://{}", bound),
            None => tracing::info!("HTTP plugin listening on {}", addr),
        }

        let graceful = shutdown.clone();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move { graceful.cancelled().await })
            .into_future();
        tokio::pin!(serve);

        let grace = self.options.grace_period;
        let finished = tokio::select! {
            result = &mut serve => Some(result),
            _ = shutdown.cancelled() => None,
        };

        let result = match finished {
            Some(result) => result,
            None => {
                if let Err(e) = self.transition(State::Draining) {
                    tracing::warn!("{}", e);
                }
                tracing::info!("Draining connections for up to {:?}", grace);
                match tokio::time::timeout(grace, &mut serve).await {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!("Grace period of {:?} elapsed, dropping remaining connections", grace);
                        Ok(())
                    }
                }
            }
        };

        if let Err(e) = self.transition(State::Stopped) {
            tracing::warn!("{}", e);
        }
        tracing::info!("HTTP plugin on port {} stopped", port);

        result.map_err(|source| LifecycleError::Serve {
            port: port.to_string(),
            source,
        })
    }

    /// Blocking entry point: serves on a dedicated runtime until the process
    /// receives an interrupt.
    ///
    /// Returns `InsideRuntime` on any thread with a current runtime handle,
    /// `spawn_blocking` threads included.
    pub fn serve_until_interrupt(&self, port: &str, app: Router) -> Result<(), LifecycleError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(LifecycleError::InsideRuntime);
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(LifecycleError::Runtime)?;

        let shutdown = CancellationToken::new();
        let result = runtime.block_on(async {
            let interrupt = tokio::spawn(forward_interrupt(shutdown.clone()));
            let result = self.serve(port, app, shutdown.clone()).await;
            shutdown.cancel();
            interrupt.abort();
            result
        });

        // 유예 시간이 지난 뒤에도 실행 중인 핸들러를 기다리지 않음
        runtime.shutdown_background();
        result
    }
}

/// Waits for one process interrupt and cancels `token`.
///
/// Returns early if `token` is cancelled by someone else. Later interrupts
/// have no further effect.
pub async fn forward_interrupt(token: CancellationToken) {
    tokio::select! {
        res = tokio::signal::ctrl_c() => match res {
            Ok(()) => {
                tracing::info!("Interrupt signal received, shutting down HTTP plugin");
                token.cancel();
            }
            Err(e) => tracing::warn!("Failed to listen for interrupt signal: {}", e),
        },
        _ = token.cancelled() => {}
    }
}
