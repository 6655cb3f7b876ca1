//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the promptool CLI.

use crate::agents::AgentEvent;
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the session banner
    pub fn banner(&self, model: &str, agent_kind: &str) {
        if self.colored {
            println!(
                "\n  {} {}",
                "promptool".bright_cyan().bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
            );
            println!(
                "  {} {}  {} {}\n",
                "model".dimmed(),
                model.bright_white(),
                "agent".dimmed(),
                agent_kind.bright_white()
            );
        } else {
            println!("\n  promptool v{}", env!("CARGO_PKG_VERSION"));
            println!("  model {}  agent {}\n", model, agent_kind);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a list item
    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "💡".dimmed(), message.dimmed().italic());
        } else {
            println!("  [TIP] {}", message);
        }
    }

    /// Print the input prompt without a newline
    pub fn prompt(&self) {
        if self.colored {
            print!("{} ", ">".bright_cyan().bold());
        } else {
            print!("> ");
        }
        io::stdout().flush().ok();
    }

    /// Render one agent event
    pub fn event(&self, event: &AgentEvent) {
        match event {
            AgentEvent::Progress { content, .. } => {
                if self.colored {
                    println!("  {}", content.dimmed());
                } else {
                    println!("  {}", content);
                }
            }
            AgentEvent::FinalAnswer { content } => {
                if self.colored {
                    println!("\n{}\n", content.bright_white());
                } else {
                    println!("\n{}\n", content);
                }
            }
            AgentEvent::Error { message } => self.error(message),
        }
    }

    /// Print newline
    pub fn newline(&self) {
        println!();
    }
}
