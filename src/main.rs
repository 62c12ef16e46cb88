use std::sync::Arc;

use script_http::config::HostConfig;
use script_http::object::{Environment, Function, FunctionBody};
use script_http::{Evaluator, HttpPlugin, NativePlugin, Object};
use tracing_subscriber::EnvFilter;

/// Stand-in evaluator: logs the handler body instead of running it.
struct TraceEvaluator;

impl Evaluator for TraceEvaluator {
    fn eval(&self, body: &FunctionBody, _env: &mut Environment) -> Object {
        tracing::info!("Evaluating handler body: {}", body.source());
        Object::Null
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::var("SCRIPT_HTTP_CONFIG")
        .unwrap_or_else(|_| "config/http.toml".to_string());
    let cfg = HostConfig::load(&config_path)?;

    let plugin = HttpPlugin::with_options(
        Arc::new(TraceEvaluator),
        &[Object::Hash(cfg.settings())],
        cfg.server_options(),
    )
    .map_err(|e| anyhow::anyhow!("{}", e.to_json()))?;

    for route in &cfg.routes {
        let handler = Object::Function(Function::new(vec![], route.body.as_str()));
        if let Object::Error(message) = plugin.call("handle", &[Object::from(route.path.as_str()), handler]) {
            tracing::warn!("Skipping route '{}': {}", route.path, message);
        }
    }

    if let Object::Error(message) = plugin.call("listen", &[]) {
        tracing::error!("HTTP plugin error: {}", message);
        anyhow::bail!(message);
    }

    tracing::info!("HTTP plugin shut down");
    Ok(())
}
