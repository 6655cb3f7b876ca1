use super::{
    ARGUMENTS_END, ARGUMENTS_START, NAME_END, NAME_START, TOOL_CALL_END, TOOL_CALL_START,
    TOOL_RESULT_END, TOOL_RESULT_START,
};
use crate::types::{ToolCallOutcome, ToolCallRequest};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Raw slices of one `<tool_call>` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RawBlock<'a> {
    name: &'a str,
    arguments: &'a str,
    /// Bytes consumed from the opening tag through the closing tag.
    len: usize,
}

impl RawBlock<'_> {
    /// An empty name still becomes a request; dispatch reports it as an unknown tool.
    fn into_request(self) -> ToolCallRequest {
        let name = self.name.trim();
        if name.is_empty() {
            warn!("Tool call block has an empty name");
        }

        ToolCallRequest::new(name, decode_arguments(name, self.arguments))
    }
}

/// Match one block at the start of `input`.
///
/// Grammar: `<tool_call> ws <name> NAME </name> ws <arguments> ARGS </arguments> ws </tool_call>`.
/// NAME and ARGS may span lines and may themselves contain close tags: each
/// candidate close tag is tried in turn until the rest of the grammar matches.
/// A block never extends past the first `</tool_call>`.
fn parse_block(input: &str) -> Option<RawBlock<'_>> {
    let end = input.find(TOOL_CALL_END)? + TOOL_CALL_END.len();
    let block = &input[..end];

    let rest = block.strip_prefix(TOOL_CALL_START)?;
    let rest = rest.trim_start().strip_prefix(NAME_START)?;

    for (name_end, _) in rest.match_indices(NAME_END) {
        let name = &rest[..name_end];
        let Some(body) = rest[name_end + NAME_END.len()..]
            .trim_start()
            .strip_prefix(ARGUMENTS_START)
        else {
            continue;
        };

        for (arguments_end, _) in body.match_indices(ARGUMENTS_END) {
            let tail = body[arguments_end + ARGUMENTS_END.len()..].trim_start();
            if tail == TOOL_CALL_END {
                return Some(RawBlock {
                    name,
                    arguments: &body[..arguments_end],
                    len: end,
                });
            }
        }
    }

    None
}

/// Parse an argument payload, falling back to an empty map.
///
/// A call with unreadable arguments is still attempted so the tool can report
/// the problem back to the model.
fn decode_arguments(name: &str, payload: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(payload.trim()) {
        Ok(Value::Object(arguments)) => arguments,
        Ok(other) => {
            debug!(
                tool = name,
                "Tool arguments are not a JSON object ({}), using empty arguments", other
            );
            Map::new()
        }
        Err(e) => {
            debug!(
                tool = name,
                "Failed to parse tool arguments, using empty arguments: {}", e
            );
            Map::new()
        }
    }
}

/// Decode every tool call in a model reply, left to right.
///
/// Blocks do not overlap; a malformed opening tag is skipped and scanning
/// resumes right after it. Every complete block yields exactly one request.
pub fn decode(response: &str) -> Vec<ToolCallRequest> {
    let mut calls = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = response[cursor..].find(TOOL_CALL_START) {
        let start = cursor + offset;

        match parse_block(&response[start..]) {
            Some(block) => {
                cursor = start + block.len;
                calls.push(block.into_request());
            }
            None => cursor = start + TOOL_CALL_START.len(),
        }
    }

    calls
}

/// Remove every `open ... close` section, shortest match first.
fn remove_sections(text: &str, open: &str, close: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(open) {
        let Some(end) = rest[start + open.len()..].find(close) else {
            break;
        };
        output.push_str(&rest[..start]);
        rest = &rest[start + open.len() + end + close.len()..];
    }

    output.push_str(rest);
    output
}

/// Replace every newline/whitespace/newline run with exactly one blank line.
fn collapse_blank_lines(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut output = String::with_capacity(text.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\n' {
            let next = text[i..]
                .find('\n')
                .map(|offset| i + offset)
                .unwrap_or(bytes.len());
            output.push_str(&text[i..next]);
            i = next;
            continue;
        }

        let mut j = i + 1;
        let mut last_newline = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            if bytes[j] == b'\n' {
                last_newline = j;
            }
            j += 1;
        }

        if last_newline > i {
            output.push_str("\n\n");
            i = last_newline + 1;
        } else {
            output.push('\n');
            i += 1;
        }
    }

    output
}

/// User-visible remainder of a reply: markup removed, blank runs collapsed, trimmed.
pub fn strip(response: &str) -> String {
    let without_calls = remove_sections(response, TOOL_CALL_START, TOOL_CALL_END);
    let without_results = remove_sections(&without_calls, TOOL_RESULT_START, TOOL_RESULT_END);

    collapse_blank_lines(&without_results).trim().to_string()
}

/// Wrap a tool outcome in result markup for reinjection into the conversation.
pub fn format_outcome(tool_name: &str, outcome: &ToolCallOutcome) -> String {
    format!(
        "\n{} name='{}'>\n{}\n{}\n",
        TOOL_RESULT_START,
        tool_name,
        outcome.to_text(),
        TOOL_RESULT_END
    )
}
