//! Tools the model can invoke
//!
//! # Module Structure
//!
//! - [`registry`](crate::tools::registry) - the [`Tool`] trait and name lookup
//! - [`dispatcher`](crate::tools::dispatcher) - request execution with timeouts and ordering
//! - [`function`](crate::tools::function) - wrapping plain closures as tools
//! - [`calculator`](crate::tools::calculator), [`echo`](crate::tools::echo),
//!   [`clock`](crate::tools::clock) - built-in tools
//!
//! # Example
//!
//! ```ignore
//! let registry = Arc::new(ToolRegistry::with_builtin_tools());
//! let dispatcher = ToolDispatcher::new(registry);
//! let outcome = dispatcher.execute(&ToolCallRequest::new("echo", args)).await;
//! ```

/// Calculator tool for arithmetic operations.
pub mod calculator;
/// Current date and time.
pub mod clock;
/// Request execution.
pub mod dispatcher;
/// Text echo tool.
pub mod echo;
/// Closure-backed tools.
pub mod function;
/// Tool trait and registry.
pub mod registry;

pub use dispatcher::{DispatchConfig, ToolDispatcher};
pub use function::FnTool;
pub use registry::{definition_of, Tool, ToolRegistry};

use std::sync::Arc;

/// Names of the tools shipped with the crate.
pub const BUILTIN_TOOLS: [&str; 3] = ["calculator", "current_time", "echo"];

/// Instantiate a built-in tool by name.
pub fn builtin(name: &str) -> Option<Arc<dyn Tool>> {
    match name {
        "calculator" => Some(Arc::new(calculator::Calculator)),
        "current_time" => Some(Arc::new(clock::CurrentTime)),
        "echo" => Some(Arc::new(echo::Echo)),
        _ => None,
    }
}
