//! Evaluation core for Causal Decision Diagram models.
//!
//! A decision model document declares I/O values, evaluatable assets
//! (scripts or remote endpoints) and elements binding asset invocations to
//! ordered input/output value ids, grouped into runnable models. The engine
//! pools the elements of the active runnable models and sweeps them in
//! passes, evaluating whichever elements have all inputs known, until
//! nothing more can be computed.

pub mod engine;
pub mod error;
pub mod model;
pub mod resolver;
pub mod script;

use std::sync::Arc;

pub use engine::Evaluator;
pub use engine::backend::{HttpTransport, ReqwestTransport};
pub use error::EngineError;
pub use model::{DecisionModel, IoValue, ValueMap};
pub use resolver::{ResolvedMaps, ResolverCache};
pub use script::{FunctionMap, RuntimeRegistry, ScriptFunction, ScriptRuntime};

/// Create a runtime registry with the builtin expression runtime registered.
///
/// Additional runtimes can be registered afterwards, or loaded from dynamic
/// libraries via [`RuntimeRegistry::load_runtimes_from_directory`].
pub fn create_runtime_registry() -> RuntimeRegistry {
    let registry = RuntimeRegistry::new();
    registry.register(Arc::new(script::expr::ExprRuntime::new()));
    registry
}
