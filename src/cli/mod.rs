//! CLI module for promptool
//!
//! Provides command-line interface parsing for the `promptool` binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use crate::utils::config::PromptoolConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// promptool - tool calling for any chat model
///
/// Talks to an OpenAI-compatible endpoint and gives the model tools, through
/// native function calling when the model supports it and through a textual
/// tool-call protocol when it does not.
#[derive(Parser, Debug)]
#[command(
    name = "promptool",
    version,
    about = "Tool calling for any chat model, native or prompt-based",
    after_help = "EXAMPLES:\n    \
                  promptool                         # Interactive chat (default)\n    \
                  promptool ask \"What is 17 * 23?\"  # One-shot question\n    \
                  promptool tools                   # List available tools\n    \
                  promptool info --model qwen2.5    # Show the selected agent"
)]
pub struct Cli {
    /// Path to the configuration file (defaults to ./promptool.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Model to use (overrides config)
    #[arg(short, long, global = true)]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible API (overrides config)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Maximum tool iterations per task (overrides config)
    #[arg(long, global = true)]
    pub max_iterations: Option<usize>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Interactive chat session (type 'exit' or 'quit' to leave)
    Chat,

    /// Run a single task and print the events
    Ask {
        /// The task or question for the model
        task: String,
    },

    /// List the enabled tools and their parameters
    Tools,

    /// Show the capability verdict and the selected agent
    Info,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Apply command line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut PromptoolConfig) {
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.llm.base_url = base_url.clone();
        }
        if let Some(max_iterations) = self.max_iterations {
            config.agent.max_tool_iterations = max_iterations;
        }
    }
}
