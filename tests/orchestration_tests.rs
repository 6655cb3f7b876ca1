//! End-to-end tests of agent selection and the tool-calling loops
//!
//! All models are scripted; see `common::mocks`.

mod common;

use common::mocks::{FailingClient, NativeLLMClient, ScriptedLLMClient};
use futures::StreamExt;
use promptool::agents::{AgentEvent, AgentKind, Termination};
use promptool::llm::{LLMClient, ModelDescriptor, ModelInfo};
use promptool::protocol::{decode, format_outcome, strip};
use promptool::tools::{FnTool, ToolRegistry};
use promptool::types::{IterationBudget, Role, ToolCallOutcome};
use promptool::{select, Agent};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const SYSTEM: &str = "You are a helpful assistant.";

fn call_block(name: &str, arguments: &str) -> String {
    format!(
        "<tool_call>\n<name>{}</name>\n<arguments>{}</arguments>\n</tool_call>",
        name, arguments
    )
}

fn builtin_tools() -> Arc<ToolRegistry> {
    Arc::new(ToolRegistry::with_builtin_tools())
}

fn budget(cycles: usize) -> IterationBudget {
    IterationBudget::new(cycles).unwrap()
}

// ============= Protocol =============

#[test]
fn test_plain_text_has_no_calls() {
    let reply = "The answer is 4.\n\n\n\nNothing else.";
    assert!(decode(reply).is_empty());
    assert_eq!(strip(reply), "The answer is 4.\n\nNothing else.");
}

#[test]
fn test_blocks_decode_in_order() {
    let reply = format!(
        "Let me check.\n{}\nand\n{}\n{}",
        call_block("echo", r#"{"text": "a"}"#),
        call_block("calculator", r#"{"operation": "add", "a": 1, "b": 2}"#),
        call_block("echo", r#"{"text": "b"}"#),
    );

    let calls = decode(&reply);
    let names: Vec<&str> = calls.iter().map(|call| call.name.as_str()).collect();
    assert_eq!(names, vec!["echo", "calculator", "echo"]);
    assert_eq!(calls[0].arguments["text"], json!("a"));
    assert_eq!(calls[2].arguments["text"], json!("b"));
    assert_eq!(strip(&reply), "Let me check.\n\nand");
}

#[test]
fn test_invalid_arguments_decode_to_empty_map() {
    let calls = decode(&call_block("echo", "{not json"));
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].name, "echo");
    assert!(calls[0].arguments.is_empty());
}

#[test]
fn test_result_markup() {
    let text = format_outcome("echo", &ToolCallOutcome::Success(json!("hi")));
    assert_eq!(text, "\n<tool_result name='echo'>\nhi\n</tool_result>\n");
    assert_eq!(strip(&format!("Before{}After", text)), "Before\n\nAfter");
}

// ============= Selection =============

#[test]
fn test_native_descriptor_with_tools_selects_native() {
    let descriptor = ModelDescriptor::new("gpt-4o").with_model_info(ModelInfo {
        function_calling: Some(true),
        ..Default::default()
    });
    let client: Arc<dyn LLMClient> =
        Arc::new(ScriptedLLMClient::new(&[]).with_descriptor(descriptor));

    let agent = select(client.clone(), builtin_tools(), SYSTEM, budget(3));
    assert_eq!(agent.kind(), AgentKind::Native);
    assert_eq!(agent.system_prompt(), SYSTEM);

    let agent = select(client, Arc::new(ToolRegistry::new()), SYSTEM, budget(3));
    assert_eq!(agent.kind(), AgentKind::PromptProtocol);
    assert_eq!(agent.system_prompt(), SYSTEM);
}

#[test]
fn test_model_info_outranks_client_flag() {
    let descriptor = ModelDescriptor::new("local")
        .with_model_info(ModelInfo {
            function_calling: Some(false),
            ..Default::default()
        })
        .with_function_calling(true);
    let client: Arc<dyn LLMClient> =
        Arc::new(ScriptedLLMClient::new(&[]).with_descriptor(descriptor));

    let agent = select(client, builtin_tools(), SYSTEM, budget(3));
    assert_eq!(agent.kind(), AgentKind::PromptProtocol);
}

#[test]
fn test_prompt_agent_system_prompt_lists_tools() {
    let client: Arc<dyn LLMClient> = Arc::new(ScriptedLLMClient::new(&[]));
    let agent = select(client, builtin_tools(), SYSTEM, budget(3));

    let prompt = agent.system_prompt();
    assert!(prompt.starts_with(SYSTEM));
    assert!(prompt.contains("- calculator:"));
    assert!(prompt.contains("- echo:"));
    assert!(prompt.contains("<tool_call>"));
}

// ============= Prompt protocol loop =============

#[tokio::test]
async fn test_direct_answer() {
    let client = Arc::new(ScriptedLLMClient::new(&["4"]));
    let mut agent = select(client.clone(), Arc::new(ToolRegistry::new()), SYSTEM, budget(5));

    let response = agent.run("What is 2+2?").await;

    assert_eq!(response.chat_message, "4");
    assert!(response.inner_messages.is_empty());
    assert_eq!(response.termination, Termination::Finished);
    assert_eq!(response.iterations, 1);
    assert_eq!(client.calls(), 1);

    let first = &client.requests()[0];
    assert_eq!(first[0].role, Role::System);
    assert_eq!(first[0].content, SYSTEM);
    assert_eq!(first[1].content, "What is 2+2?");
}

#[tokio::test]
async fn test_tool_call_then_answer() {
    let first_reply = call_block("echo", r#"{"text": "hi"}"#);
    let client = Arc::new(ScriptedLLMClient::new(&[first_reply.as_str(), "Done"]));
    let mut agent = select(client.clone(), builtin_tools(), SYSTEM, budget(5));

    let events: Vec<AgentEvent> = agent
        .run_stream("Say hi", CancellationToken::new())
        .collect()
        .await;

    assert_eq!(
        events,
        vec![AgentEvent::progress("echo"), AgentEvent::final_answer("Done")]
    );
    let summary = agent.last_run().unwrap();
    assert_eq!(summary.termination, Termination::Finished);
    assert_eq!(summary.iterations, 2);

    let second = client.requests()[1].clone();
    let tool_turn = second.last().unwrap();
    assert_eq!(tool_turn.role, Role::Assistant);
    assert_eq!(
        tool_turn.content,
        format!(
            "{}\n{}",
            first_reply,
            format_outcome("echo", &ToolCallOutcome::Success(json!("hi")))
        )
    );
}

#[tokio::test]
async fn test_unknown_tool_is_reported_to_model() {
    let first_reply = call_block("teleport", "{}");
    let client = Arc::new(ScriptedLLMClient::new(&[first_reply.as_str(), "Sorry"]));
    let mut agent = select(client.clone(), builtin_tools(), SYSTEM, budget(5));

    let response = agent.run("Beam me up").await;

    assert_eq!(response.chat_message, "Sorry");
    assert_eq!(response.inner_messages, vec![AgentEvent::progress("teleport")]);
    let tool_turn = client.requests()[1].last().unwrap().content.clone();
    assert!(tool_turn.contains("<tool_result name='teleport'>\nError: unknown tool: teleport\n"));
}

#[tokio::test]
async fn test_empty_tool_name_is_reported_to_model() {
    let first_reply = call_block("", r#"{"a": 1}"#);
    let client = Arc::new(ScriptedLLMClient::new(&[first_reply.as_str(), "Retrying"]));
    let mut agent = select(client.clone(), builtin_tools(), SYSTEM, budget(5));

    let response = agent.run("Do something").await;

    assert_eq!(response.termination, Termination::Finished);
    assert_eq!(response.iterations, 2);
    assert_eq!(response.inner_messages, vec![AgentEvent::progress("")]);
    assert_eq!(response.chat_message, "Retrying");
    let tool_turn = client.requests()[1].last().unwrap().content.clone();
    assert!(tool_turn.contains("<tool_result name=''>\nError: unknown tool: \n"));
}

#[test]
fn test_close_tag_inside_arguments_still_decodes() {
    let reply = call_block("echo", r#"{"text": "</arguments>"}"#);
    let calls = decode(&reply);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].arguments["text"], json!("</arguments>"));
    assert_eq!(strip(&reply), "");
}

#[tokio::test]
async fn test_budget_of_one_exhausts_after_one_cycle() {
    let reply = call_block("echo", r#"{"text": "again"}"#);
    let client = Arc::new(ScriptedLLMClient::new(&[reply.as_str(), reply.as_str()]));
    let mut agent = select(client.clone(), builtin_tools(), SYSTEM, budget(1));

    let response = agent.run("Loop forever").await;

    assert_eq!(response.termination, Termination::Exhausted);
    assert_eq!(response.iterations, 1);
    assert!(response.inner_messages.is_empty());
    assert_eq!(response.chat_message, AgentEvent::progress("echo").content());
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn test_multiple_calls_run_in_order() {
    let reply = format!(
        "{}\n{}",
        call_block("echo", r#"{"text": "first"}"#),
        call_block("calculator", r#"{"operation": "multiply", "a": 6, "b": 7}"#)
    );
    let client = Arc::new(ScriptedLLMClient::new(&[reply.as_str(), "first, 42"]));
    let mut agent = select(client.clone(), builtin_tools(), SYSTEM, budget(5));

    let response = agent.run("Do both").await;

    assert_eq!(
        response.inner_messages,
        vec![AgentEvent::progress("echo"), AgentEvent::progress("calculator")]
    );
    let tool_turn = client.requests()[1].last().unwrap().content.clone();
    let echo_at = tool_turn.find("<tool_result name='echo'>").unwrap();
    let calc_at = tool_turn.find("<tool_result name='calculator'>").unwrap();
    assert!(echo_at < calc_at);
    assert!(tool_turn.contains("42"));
}

#[tokio::test]
async fn test_model_failure_yields_one_error() {
    let mut agent = select(Arc::new(FailingClient), builtin_tools(), SYSTEM, budget(5));

    let events: Vec<AgentEvent> = agent
        .run_stream("Hello", CancellationToken::new())
        .collect()
        .await;

    assert_eq!(events.len(), 1);
    assert!(matches!(&events[0], AgentEvent::Error { message } if message.contains("Mock LLM failure")));
    assert_eq!(agent.last_run().unwrap().termination, Termination::Aborted);
}

#[tokio::test]
async fn test_cancelled_run_never_calls_model() {
    let client = Arc::new(ScriptedLLMClient::new(&["unused"]));
    let mut agent = select(client.clone(), builtin_tools(), SYSTEM, budget(5));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let events: Vec<AgentEvent> = agent.run_stream("Hello", cancel).collect().await;

    assert!(events.is_empty());
    assert_eq!(client.calls(), 0);
    assert_eq!(agent.last_run().unwrap().termination, Termination::Aborted);
}

#[tokio::test]
async fn test_history_carries_into_next_run() {
    let client = Arc::new(ScriptedLLMClient::new(&["Hello Ada", "Your name is Ada"]));
    let mut agent = select(client.clone(), builtin_tools(), SYSTEM, budget(5));

    agent.run("My name is Ada").await;
    agent.run("What is my name?").await;

    let second = client.requests()[1].clone();
    let users: Vec<&str> = second
        .iter()
        .filter(|turn| turn.role == Role::User)
        .map(|turn| turn.content.as_str())
        .collect();
    assert_eq!(users, vec!["My name is Ada", "What is my name?"]);

    agent.reset_conversation();
    assert!(agent.history().is_empty());
    assert!(agent.last_run().is_none());
}

#[tokio::test]
async fn test_custom_function_tool() {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(
        FnTool::new("shout", |args: &Map<String, Value>| {
            let text = args.get("text").and_then(Value::as_str).unwrap_or_default();
            Ok(Value::String(text.to_uppercase()))
        })
        .with_description("Uppercase the given text"),
    ));

    let reply = call_block("shout", r#"{"text": "quiet"}"#);
    let client = Arc::new(ScriptedLLMClient::new(&[reply.as_str(), "QUIET"]));
    let mut agent = select(client.clone(), Arc::new(registry), SYSTEM, budget(5));

    let response = agent.run("Shout quiet").await;

    assert_eq!(response.chat_message, "QUIET");
    assert!(client.requests()[1]
        .last()
        .unwrap()
        .content
        .contains("<tool_result name='shout'>\nQUIET\n"));
    assert!(agent.system_prompt().contains("- shout: Uppercase the given text"));
}

// ============= Native loop =============

#[tokio::test]
async fn test_native_tool_call_then_answer() {
    let client = Arc::new(NativeLLMClient::new(vec![
        NativeLLMClient::call("call_1", "calculator", json!({"operation": "add", "a": 2, "b": 2})),
        NativeLLMClient::answer("4"),
    ]));
    let mut agent = select(client.clone(), builtin_tools(), SYSTEM, budget(5));
    assert_eq!(agent.kind(), AgentKind::Native);

    let response = agent.run("What is 2+2?").await;

    assert_eq!(response.chat_message, "4");
    assert_eq!(response.inner_messages, vec![AgentEvent::progress("calculator")]);
    assert_eq!(response.termination, Termination::Finished);
    assert_eq!(response.iterations, 2);
    assert_eq!(client.seen_tools(), vec!["calculator", "current_time", "echo"]);
}
