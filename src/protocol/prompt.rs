use crate::types::ToolDefinition;
use std::fmt::Write;

const CATALOG_HEADER: &str = "You can use the following tools to help answer the user.";

const CALL_FORMAT: &str = r#"To use a tool, reply with a block in exactly this format:
<tool_call>
<name>TOOL_NAME</name>
<arguments>{"parameter": "value"}</arguments>
</tool_call>"#;

const RULES: &[&str] = &[
    "Only call a tool when it is needed to answer the question.",
    "The arguments must be a valid JSON object.",
    "After receiving tool results, give your final answer based on them.",
    "Always answer in the same language as the user.",
    "If no tool is needed, answer directly without any tool call blocks.",
];

/// Render the catalog as a system-prompt fragment teaching the call format.
///
/// Each tool is listed with its description (or a placeholder) and, when its
/// schema names properties, a `Parameters:` line of `name(type): description`
/// entries. The fragment ends with the call format and usage rules.
pub fn encode_catalog(tools: &[ToolDefinition]) -> String {
    let mut prompt = String::new();
    prompt.push_str(CATALOG_HEADER);
    prompt.push_str("\n\nAvailable tools:\n");

    if tools.is_empty() {
        prompt.push_str("(none)\n");
    }

    for tool in tools {
        let description = tool
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or("No description available");
        let _ = writeln!(prompt, "- {}: {}", tool.name, description);

        let parameters = tool.parameters();
        if !parameters.is_empty() {
            let rendered: Vec<String> = parameters
                .iter()
                .map(|(name, kind, desc)| format!("{}({}): {}", name, kind, desc))
                .collect();
            let _ = writeln!(prompt, "  Parameters: {}", rendered.join(", "));
        }
    }

    prompt.push('\n');
    prompt.push_str(CALL_FORMAT);
    prompt.push_str("\n\nRules:\n");
    for (index, rule) in RULES.iter().enumerate() {
        let _ = writeln!(prompt, "{}. {}", index + 1, rule);
    }

    prompt.trim_end().to_string()
}

/// Combine the agent's system message with the catalog fragment.
///
/// Without tools the system message is used unchanged.
pub fn compose_system_prompt(system_message: &str, tools: &[ToolDefinition]) -> String {
    if tools.is_empty() {
        return system_message.to_string();
    }

    let catalog = encode_catalog(tools);
    if system_message.trim().is_empty() {
        catalog
    } else {
        format!("{}\n\n{}", system_message, catalog)
    }
}
