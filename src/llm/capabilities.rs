//! Native tool-calling capability detection
//!
//! Decides whether a model client can be trusted with structured (native)
//! tool calling, or whether tools have to be taught through the textual
//! protocol instead.
//!
//! The verdict comes from an explicit, ordered list of [`CapabilitySignal`]s
//! read off a [`ModelDescriptor`]. The first signal that resolves wins; when
//! none resolves, or the descriptor cannot be produced at all, the answer is
//! "not supported".
//!
//! # Example
//!
//! ```rust,ignore
//! use promptool::llm::{CapabilityProfile, ModelDescriptor};
//!
//! let descriptor = ModelDescriptor::new("llama3.2").with_parallel_tool_calls(true);
//! let profile = CapabilityProfile::from_descriptor(&descriptor);
//! assert!(profile.native_tool_calling);
//! ```

use crate::types::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Structured model metadata, as published by a provider or set in configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelInfo {
    /// Whether the model supports structured function calling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_calling: Option<bool>,

    /// Whether the model accepts image inputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision: Option<bool>,

    /// Whether the model supports a JSON output mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_output: Option<bool>,

    /// Whether the model honours structured output schemas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_output: Option<bool>,

    /// Model family (e.g., "llama", "gpt", "qwen")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
}

/// Everything a client exposes about itself for capability inspection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Model identifier sent to the provider
    pub model: String,

    /// Structured model metadata, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,

    /// Explicit function-calling flag set on the client itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_calling: Option<bool>,

    /// "Parallel tool calls" client setting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,
}

impl ModelDescriptor {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_model_info(mut self, info: ModelInfo) -> Self {
        self.model_info = Some(info);
        self
    }

    pub fn with_function_calling(mut self, enabled: bool) -> Self {
        self.function_calling = Some(enabled);
        self
    }

    pub fn with_parallel_tool_calls(mut self, enabled: bool) -> Self {
        self.parallel_tool_calls = Some(enabled);
        self
    }
}

/// One named source of evidence about native tool-calling support.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CapabilitySignal {
    /// `function_calling` flag inside the structured model info
    ModelInfoFlag,
    /// `function_calling` flag set directly on the client
    ClientFlag,
    /// "Parallel tool calls" setting, used as a proxy
    ParallelToolCalls,
}

impl CapabilitySignal {
    /// Signals in the order they are consulted.
    pub const ORDER: [CapabilitySignal; 3] = [
        CapabilitySignal::ModelInfoFlag,
        CapabilitySignal::ClientFlag,
        CapabilitySignal::ParallelToolCalls,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CapabilitySignal::ModelInfoFlag => "model_info.function_calling",
            CapabilitySignal::ClientFlag => "client.function_calling",
            CapabilitySignal::ParallelToolCalls => "parallel_tool_calls",
        }
    }

    /// Read this signal; `None` means it is silent for the descriptor.
    pub fn read(&self, descriptor: &ModelDescriptor) -> Option<bool> {
        match self {
            CapabilitySignal::ModelInfoFlag => descriptor
                .model_info
                .as_ref()
                .and_then(|info| info.function_calling),
            CapabilitySignal::ClientFlag => descriptor.function_calling,
            CapabilitySignal::ParallelToolCalls => descriptor.parallel_tool_calls,
        }
    }
}

impl fmt::Display for CapabilitySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Cached verdict on native tool-calling support for one client.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapabilityProfile {
    /// Whether structured tool calling can be used
    pub native_tool_calling: bool,

    /// Signal that produced the verdict; `None` when it defaulted to false
    pub source: Option<CapabilitySignal>,
}

impl CapabilityProfile {
    /// Profile for a client whose inspection failed or resolved nothing.
    pub const UNSUPPORTED: CapabilityProfile = CapabilityProfile {
        native_tool_calling: false,
        source: None,
    };

    /// Walk the signal list in order; the first resolved signal decides.
    pub fn from_descriptor(descriptor: &ModelDescriptor) -> Self {
        for signal in CapabilitySignal::ORDER {
            if let Some(supported) = signal.read(descriptor) {
                debug!(
                    model = %descriptor.model,
                    signal = signal.name(),
                    supported,
                    "Resolved native tool calling capability"
                );
                return Self {
                    native_tool_calling: supported,
                    source: Some(signal),
                };
            }
        }

        debug!(
            model = %descriptor.model,
            "No capability signal resolved, assuming no native tool calling"
        );
        Self::UNSUPPORTED
    }

    /// Build a profile from a possibly failed descriptor lookup.
    pub fn inspect(descriptor: Result<ModelDescriptor>) -> Self {
        match descriptor {
            Ok(descriptor) => Self::from_descriptor(&descriptor),
            Err(e) => {
                warn!("Capability inspection failed, assuming no native tool calling: {}", e);
                Self::UNSUPPORTED
            }
        }
    }
}

/// Whether the descriptor indicates native tool-calling support.
pub fn detect(descriptor: &ModelDescriptor) -> bool {
    CapabilityProfile::from_descriptor(descriptor).native_tool_calling
}
