//! promptool CLI entry point
//!
//! - `promptool` / `promptool chat` - interactive chat session
//! - `promptool ask <task>` - one-shot task
//! - `promptool tools` - list enabled tools
//! - `promptool info` - capability verdict and selected agent

use anyhow::{Context, Result};
use futures::StreamExt;
use promptool::{
    cli::{output::Output, Cli, Commands},
    select_with, Agent, AgentHandle, AgentSettings, LLMClient, OpenAIClient, PromptoolConfig,
    Termination, ToolRegistry,
};
use promptool::utils::logging;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if let Err(e) = run(cli, &output).await {
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    dotenvy::dotenv().ok();

    let mut config = PromptoolConfig::load_or_default(cli.config.as_ref())
        .context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    logging::init(&config.log_level, config.log_format, cli.verbose);

    let registry = Arc::new(ToolRegistry::with_enabled_tools(&config.tools.enabled)?);
    let command = cli.command.clone().unwrap_or(Commands::Chat);

    if command == Commands::Tools {
        list_tools(&registry, output);
        return Ok(());
    }

    let api_key = config.llm.api_key()?;
    let client: Arc<dyn LLMClient> = Arc::new(
        OpenAIClient::from_config(&config.llm, api_key).context("Failed to create model client")?,
    );
    let settings = AgentSettings::from_config(&config)?;
    let mut agent = select_with(Arc::clone(&client), registry, settings);

    match command {
        Commands::Info => show_info(&agent, client.as_ref(), &config, output),
        Commands::Ask { task } => {
            if run_task(&mut agent, &task, output).await == Termination::Aborted {
                std::process::exit(1);
            }
        }
        Commands::Chat | Commands::Tools => run_chat(&mut agent, client.as_ref(), output).await?,
    }

    Ok(())
}

/// Run one task, rendering events as they arrive. Ctrl-C cancels the run.
async fn run_task(agent: &mut AgentHandle, task: &str, output: &Output) -> Termination {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    {
        let mut events = agent.run_stream(task, cancel);
        while let Some(event) = events.next().await {
            output.event(&event);
        }
    }
    watcher.abort();

    let summary = agent.last_run().unwrap_or_default();
    if summary.termination == Termination::Exhausted {
        output.warning(&format!(
            "No final answer produced after {} tool iterations",
            summary.iterations
        ));
    }
    summary.termination
}

async fn run_chat(agent: &mut AgentHandle, client: &dyn LLMClient, output: &Output) -> Result<()> {
    output.banner(client.model_name(), &agent.kind().to_string());
    output.hint("Type 'exit' or 'quit' to leave, 'reset' to start over.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        output.prompt();
        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        let task = line.trim();
        if task.is_empty() {
            continue;
        }
        match task.to_lowercase().as_str() {
            "exit" | "quit" => break,
            "reset" => {
                agent.reset_conversation();
                output.info("Conversation cleared");
                continue;
            }
            _ => {}
        }

        run_task(agent, task, output).await;
    }

    output.newline();
    Ok(())
}

fn list_tools(registry: &ToolRegistry, output: &Output) {
    output.header("Tools");
    for definition in registry.get_tool_definitions() {
        let description = definition
            .description
            .clone()
            .unwrap_or_else(|| "No description available".to_string());
        output.list_item(&format!("{}: {}", definition.name, description));
        for (name, kind, desc) in definition.parameters() {
            output.kv(&format!("  {}({})", name, kind), &desc);
        }
    }
    output.newline();
}

fn show_info(agent: &AgentHandle, client: &dyn LLMClient, config: &PromptoolConfig, output: &Output) {
    let info = agent.info(client);
    let source = info
        .capability_source
        .map(|signal| signal.to_string())
        .unwrap_or_else(|| "none".to_string());

    output.header("Agent");
    output.kv("name", agent.name());
    output.kv("type", &info.kind.to_string());
    output.kv("function_calling", &info.function_calling.to_string());
    output.kv("tools_count", &info.tools_count.to_string());
    output.kv("max_tool_iterations", &config.agent.max_tool_iterations.to_string());

    output.header("Model");
    output.kv("model", &info.model);
    output.kv("base_url", &config.llm.base_url);
    output.kv("native_tool_calling", &client.capabilities().native_tool_calling.to_string());
    output.kv("capability_signal", &source);
    output.newline();
}
