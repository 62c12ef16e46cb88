//! HTTP capability plugin, as seen by scripts.
//!
//! ```text
//! let http = HTTP({"port": 9091});
//! http.handle("/ping", fn() { puts("pong"); });
//! http.listen();
//! ```
//!
//! Method names are parsed into [`Method`] once, at the dispatch boundary.
//! Everything past that point is typed.

pub mod error;

use std::str::FromStr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{HttpSettings, ServerOptions};
use crate::object::{Evaluator, NativePlugin, Object, ObjectType};
use crate::router::RouteRegistrar;
use crate::server::LifecycleManager;
use crate::validator::{self, ArgSpec};
pub use error::PluginError;

pub const TYPE_NAME: &str = "HTTP";

/// Methods a script can call on the plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Listen,
    Handle,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Listen => "listen",
            Self::Handle => "handle",
        }
    }
}

impl FromStr for Method {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "listen" => Ok(Self::Listen),
            "handle" => Ok(Self::Handle),
            other => Err(PluginError::UnknownMethod(other.to_string())),
        }
    }
}

pub struct HttpPlugin {
    settings: HttpSettings,
    registrar: Arc<RouteRegistrar>,
    lifecycle: LifecycleManager,
}

impl HttpPlugin {
    /// Script constructor: exactly one hash argument holding the settings.
    pub fn construct(evaluator: Arc<dyn Evaluator>, args: &[Object]) -> Result<Self, PluginError> {
        Self::with_options(evaluator, args, ServerOptions::default())
    }

    pub fn with_options(
        evaluator: Arc<dyn Evaluator>,
        args: &[Object],
        options: ServerOptions,
    ) -> Result<Self, PluginError> {
        let spec = ArgSpec::exact(1).with_types(&[ObjectType::Hash]);
        validator::check("args", args, &spec).map_err(PluginError::Construct)?;
        let hash = validator::expect_hash("args", 1, &args[0]).map_err(PluginError::Construct)?;

        let settings = HttpSettings::from_hash(hash);
        tracing::debug!("HTTP plugin constructed with port {}", settings.port);

        Ok(Self {
            settings,
            registrar: Arc::new(RouteRegistrar::new(evaluator)),
            lifecycle: LifecycleManager::new(options),
        })
    }

    pub fn settings(&self) -> &HttpSettings {
        &self.settings
    }

    pub fn registrar(&self) -> &Arc<RouteRegistrar> {
        &self.registrar
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn dispatch(&self, method: Method, args: &[Object]) -> Result<Object, PluginError> {
        match method {
            Method::Listen => self.listen(args),
            Method::Handle => self.handle(args),
        }
    }

    /// Serves until the process is interrupted. Blocks the caller.
    ///
    /// Must be called from a thread with no tokio runtime context. That
    /// includes `spawn_blocking` threads, which still see the runtime handle:
    /// there the call returns `InsideRuntime`. Async hosts use `listen_with`.
    pub fn listen(&self, args: &[Object]) -> Result<Object, PluginError> {
        validator::check(Method::Listen.as_str(), args, &ArgSpec::exact(0))?;
        let app = self.registrar.clone().into_router();
        self.lifecycle.serve_until_interrupt(&self.settings.port, app)?;
        Ok(Object::Null)
    }

    /// Same as `listen`, with shutdown driven by `shutdown` instead of the
    /// process interrupt.
    pub async fn listen_with(&self, shutdown: CancellationToken) -> Result<(), PluginError> {
        let app = self.registrar.clone().into_router();
        self.lifecycle.serve(&self.settings.port, app, shutdown).await?;
        Ok(())
    }

    /// `handle(path, fn)`: registers a route. Re-registering a path replaces
    /// the earlier handler.
    pub fn handle(&self, args: &[Object]) -> Result<Object, PluginError> {
        let name = Method::Handle.as_str();
        let spec = ArgSpec::exact(2).with_types(&[ObjectType::String, ObjectType::Function]);
        validator::check(name, args, &spec)?;

        let path = validator::expect_non_empty_str(name, 1, &args[0])?;
        let handler = validator::expect_function(name, 2, &args[1])?;
        self.registrar.register(path, handler.clone());
        Ok(Object::Null)
    }
}

impl NativePlugin for HttpPlugin {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn inspect(&self) -> String {
        "plugin<http>".to_string()
    }

    fn call(&self, method: &str, args: &[Object]) -> Object {
        let result = method
            .parse::<Method>()
            .and_then(|method| self.dispatch(method, args));

        match result {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("HTTP plugin call '{}' failed: {}", method, e);
                e.into()
            }
        }
    }
}
