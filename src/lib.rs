//! HTTP server capability for an embedded script interpreter.
//!
//! Scripts construct the plugin with a settings hash, register handlers with
//! `handle(path, fn)` and block in `listen()` until the process is
//! interrupted. Handler bodies run through the host's [`object::Evaluator`].

pub mod object;
pub mod validator;
pub mod config;
pub mod router;
pub mod server;
pub mod plugin;

pub use object::{Evaluator, NativePlugin, Object};
pub use plugin::{HttpPlugin, Method, PluginError};
