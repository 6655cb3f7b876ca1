//! Textual tool-call protocol
//!
//! Models without native function calling are taught a small markup protocol
//! through the system prompt and answer with blocks such as:
//!
//! ```text
//! <tool_call>
//! <name>calculator</name>
//! <arguments>{"operation": "add", "a": 2, "b": 2}</arguments>
//! </tool_call>
//! ```
//!
//! Results are fed back wrapped in `<tool_result name='...'>` markup.
//!
//! # Module Structure
//!
//! - [`codec`](crate::protocol::codec) - decoding calls, stripping markup, formatting results
//! - [`prompt`](crate::protocol::prompt) - rendering the tool catalog into a system prompt

/// Call decoding, markup stripping and result formatting.
pub mod codec;
/// Tool catalog rendering for system prompts.
pub mod prompt;

pub use codec::{decode, format_outcome, strip};
pub use prompt::{compose_system_prompt, encode_catalog};

pub const TOOL_CALL_START: &str = "<tool_call>";
pub const TOOL_CALL_END: &str = "</tool_call>";
pub const NAME_START: &str = "<name>";
pub const NAME_END: &str = "</name>";
pub const ARGUMENTS_START: &str = "<arguments>";
pub const ARGUMENTS_END: &str = "</arguments>";
pub const TOOL_RESULT_START: &str = "<tool_result";
pub const TOOL_RESULT_END: &str = "</tool_result>";
