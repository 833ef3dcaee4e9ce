//! Hook-event decoding and the §4.1 validation gates.
//!
//! The outward contract stays one loosely-typed JSON object on stdin (the
//! host integration is fixed); internally, dispatch runs on a closed
//! [`HookEventKind`] enum rather than a dynamic matcher string, and capture
//! paths normalize down to a [`CaptureTask`] the background worker can act
//! on without re-parsing the host's event shape.

use std::collections::HashMap;
use std::io::Read as _;
use std::process::Stdio;
use std::time::Duration;

use memento_domain::constants::budgets::{CAPTURE_HOOK_BUDGET, SESSION_START_BUDGET};
use memento_domain::entities::{ContentType, MemoryType, SourceHook};
use memento_domain::value_objects::GroupId;
use memento_infrastructure::logging::log_event;
use memento_infrastructure::search::{format_context, RetrievalTier};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::AppContext;

/// `tracing`/`log_event` target this module logs under.
const HOOK_TARGET: &str = "hook";

/// Edit-family tools allowed through the post-tool-use capture gate (§4.1 gate 3).
const EDIT_TOOL_WHITELIST: &[&str] = &["Edit", "Write", "MultiEdit", "NotebookEdit"];

/// Phrases that trigger a follow-up decision capture from a user prompt (§4.1).
const DECISION_TRIGGER_PHRASES: &[&str] =
    &["let's go with", "we should", "decided to", "we'll use", "going with"];

/// The raw JSON object read from stdin (§6: "single JSON object with a
/// `hook_event_name` field ... plus event-specific fields"). Every field
/// beyond `hook_event_name` is optional; which ones are required is
/// enforced per event kind in [`build_capture_tasks`].
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawHookEvent {
    pub hook_event_name: String,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Option<Value>,
    #[serde(default)]
    pub tool_response: Option<Value>,
    #[serde(default)]
    pub tool_status: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_message: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub agent_response: Option<String>,
    #[serde(default)]
    pub transcript_path: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub agent_memory: bool,
    #[serde(default)]
    pub turn_number: Option<u32>,
}

/// The closed enum of event kinds this service handles (§9 redesign flag:
/// no dynamic "hook matcher" strings — the adapter dispatches on this enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEventKind {
    PostToolUse,
    UserPromptSubmit,
    Stop,
    SessionStart,
    PreCompact,
    ManualSave,
}

impl HookEventKind {
    /// Parse the fixed set of event names the host emits.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "PostToolUse" => Some(Self::PostToolUse),
            "UserPromptSubmit" => Some(Self::UserPromptSubmit),
            "Stop" => Some(Self::Stop),
            "SessionStart" => Some(Self::SessionStart),
            "PreCompact" => Some(Self::PreCompact),
            "ManualSave" => Some(Self::ManualSave),
            _ => None,
        }
    }

    /// Whether this kind invokes retrieval (runs synchronously, in-process)
    /// rather than capture (fanned out to the background worker).
    #[must_use]
    pub fn is_retrieval(self) -> bool {
        matches!(self, Self::SessionStart | Self::PreCompact)
    }

    /// Wall-clock budget for this event kind (§4.1 hard NFR).
    #[must_use]
    pub fn budget(self) -> Duration {
        if self.is_retrieval() {
            SESSION_START_BUDGET
        } else {
            CAPTURE_HOOK_BUDGET
        }
    }
}

/// One capture request, normalized out of the host's event shape, ready to
/// be chunked, scanned, embedded, and stored by the background worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureTask {
    pub source_hook: SourceHook,
    pub content_type: ContentType,
    pub item_type: MemoryType,
    pub group_id: String,
    pub session_id: Option<String>,
    pub content: String,
    pub source_file: Option<String>,
    pub tags: Vec<String>,
    pub turn_number: Option<u32>,
    pub tool_name: Option<String>,
    pub tool_status: Option<String>,
    /// Structured fields kept around for error-context recomposition
    /// (`command`/`error`/`output`) or for debugging; never re-parsed as the
    /// source of truth once `content` is set.
    #[serde(default)]
    pub raw_metadata: Value,
}

/// Run the §4.1 validation gates and build zero, one, or two [`CaptureTask`]s
/// (a `UserPromptSubmit` event can additionally yield a decision capture).
/// Never returns an error: a gate failure is logged and yields an empty
/// vec, matching the "log and exit 0" contract.
#[must_use]
pub fn build_capture_tasks(kind: HookEventKind, event: &RawHookEvent) -> Vec<CaptureTask> {
    let Some(group_id) = event
        .cwd
        .as_deref()
        .and_then(memento_domain::value_objects::GroupId::from_project_path)
    else {
        log_gate_drop(kind, "missing_or_unusable_cwd");
        return Vec::new();
    };

    match kind {
        HookEventKind::PostToolUse => build_post_tool_use(event, &group_id),
        HookEventKind::UserPromptSubmit => build_user_prompt(event, &group_id),
        HookEventKind::Stop => build_stop(event, &group_id),
        HookEventKind::ManualSave => build_manual_save(event, &group_id),
        HookEventKind::SessionStart | HookEventKind::PreCompact => Vec::new(),
    }
}

fn build_post_tool_use(
    event: &RawHookEvent,
    group_id: &memento_domain::value_objects::GroupId,
) -> Vec<CaptureTask> {
    let Some(tool_name) = event.tool_name.as_deref() else {
        log_gate_drop(HookEventKind::PostToolUse, "missing_tool_name");
        return Vec::new();
    };

    let succeeded = event.tool_status.as_deref() == Some("success");

    if succeeded {
        if !EDIT_TOOL_WHITELIST.contains(&tool_name) {
            return Vec::new();
        }
        let Some((content, source_file)) = compose_edit_content(tool_name, event.tool_input.as_ref())
        else {
            log_gate_drop(HookEventKind::PostToolUse, "unrecognized_edit_shape");
            return Vec::new();
        };
        return task(
            SourceHook::PostToolUse,
            ContentType::Code,
            MemoryType::Implementation,
            group_id,
            event,
            content,
            source_file,
        )
        .into_iter()
        .collect();
    }

    // Failed-tool path: only shell-shaped tools carry a (command, error, output)
    // triple worth capturing as error context (§4.1).
    let Some(command) = event
        .tool_input
        .as_ref()
        .and_then(|v| v.get("command"))
        .and_then(Value::as_str)
    else {
        return Vec::new();
    };
    let error = event
        .tool_response
        .as_ref()
        .and_then(|v| v.get("error").or_else(|| v.get("stderr")))
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let output = event
        .tool_response
        .as_ref()
        .and_then(|v| v.get("output").or_else(|| v.get("stdout")))
        .and_then(Value::as_str)
        .unwrap_or("");

    // The content field carries an unbudgeted draft; the structured
    // `truncate_error_context` pass applied by the capture worker is the
    // authoritative size reduction, keyed off `raw_metadata`.
    let content = format!("Command: {command}\nError: {error}\n{output}");
    task(
        SourceHook::PostToolUseError,
        ContentType::ErrorContext,
        MemoryType::ErrorFix,
        group_id,
        event,
        content,
        None,
    )
    .map(|mut t| {
        t.raw_metadata = serde_json::json!({ "command": command, "error": error, "output": output });
        t
    })
    .into_iter()
    .collect()
}

fn compose_edit_content(tool_name: &str, tool_input: Option<&Value>) -> Option<(String, Option<String>)> {
    let input = tool_input?;
    match tool_name {
        "Edit" | "MultiEdit" => {
            let file_path = input.get("file_path").and_then(Value::as_str)?;
            let new_string = input
                .get("new_string")
                .and_then(Value::as_str)
                .or_else(|| input.get("edits").and_then(|e| e.as_array()).and_then(|a| a.first()).and_then(|e| e.get("new_string")).and_then(Value::as_str))?;
            Some((format!("File: {file_path}\n{new_string}"), Some(file_path.to_owned())))
        }
        "Write" => {
            let file_path = input.get("file_path").and_then(Value::as_str)?;
            let content = input.get("content").and_then(Value::as_str)?;
            Some((format!("File: {file_path}\n{content}"), Some(file_path.to_owned())))
        }
        "NotebookEdit" => {
            let notebook_path = input.get("notebook_path").and_then(Value::as_str)?;
            let new_source = input.get("new_source").and_then(Value::as_str)?;
            Some((
                format!("Notebook: {notebook_path}\n{new_source}"),
                Some(notebook_path.to_owned()),
            ))
        }
        _ => None,
    }
}

fn build_user_prompt(
    event: &RawHookEvent,
    group_id: &memento_domain::value_objects::GroupId,
) -> Vec<CaptureTask> {
    let Some(content) = event.user_message.as_deref().or(event.prompt.as_deref()) else {
        log_gate_drop(HookEventKind::UserPromptSubmit, "missing_user_message");
        return Vec::new();
    };

    let mut tasks: Vec<CaptureTask> = task(
        SourceHook::UserPrompt,
        ContentType::UserMessage,
        MemoryType::UserMessage,
        group_id,
        event,
        content.to_owned(),
        None,
    )
    .into_iter()
    .collect();

    let lower = content.to_ascii_lowercase();
    if DECISION_TRIGGER_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        tasks.extend(task(
            SourceHook::UserPrompt,
            ContentType::Prose,
            MemoryType::Decision,
            group_id,
            event,
            content.to_owned(),
            None,
        ));
    }

    tasks
}

fn build_stop(
    event: &RawHookEvent,
    group_id: &memento_domain::value_objects::GroupId,
) -> Vec<CaptureTask> {
    let content = event
        .agent_response
        .clone()
        .or_else(|| event.transcript_path.as_deref().and_then(last_assistant_message));

    let Some(content) = content else {
        log_gate_drop(HookEventKind::Stop, "no_assistant_message_available");
        return Vec::new();
    };

    task(
        SourceHook::Stop,
        ContentType::AgentResponse,
        MemoryType::AgentResponse,
        group_id,
        event,
        content,
        None,
    )
    .into_iter()
    .collect()
}

/// Pull the text of the last assistant turn out of a Claude-Code-style
/// transcript JSONL file (one JSON object per line, `{"type": "...", "message": {"role": "...", "content": ...}}`).
fn last_assistant_message(transcript_path: &str) -> Option<String> {
    let contents = std::fs::read_to_string(transcript_path).ok()?;
    contents
        .lines()
        .rev()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .find_map(|entry| {
            let role = entry
                .get("message")
                .and_then(|m| m.get("role"))
                .and_then(Value::as_str)?;
            if role != "assistant" {
                return None;
            }
            extract_text_content(entry.get("message")?.get("content")?)
        })
}

fn extract_text_content(content: &Value) -> Option<String> {
    if let Some(text) = content.as_str() {
        return Some(text.to_owned());
    }
    let blocks = content.as_array()?;
    let joined = blocks
        .iter()
        .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|b| b.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("\n");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn build_manual_save(
    event: &RawHookEvent,
    group_id: &memento_domain::value_objects::GroupId,
) -> Vec<CaptureTask> {
    let Some(content) = event.user_message.as_deref().or(event.prompt.as_deref()) else {
        log_gate_drop(HookEventKind::ManualSave, "missing_content");
        return Vec::new();
    };

    let item_type = if event.agent_memory {
        MemoryType::AgentMemory
    } else {
        MemoryType::Preference
    };
    let tags = event.tag.clone().into_iter().collect();

    let mut built = task(
        SourceHook::Manual,
        ContentType::Prose,
        item_type,
        group_id,
        event,
        content.to_owned(),
        None,
    );
    if let Some(t) = built.as_mut() {
        t.tags = tags;
    }
    built.into_iter().collect()
}

/// Build one task after the §4.1 gate-5 length check (short content is
/// dropped; long content is left for the worker's truncation pass).
fn task(
    source_hook: SourceHook,
    content_type: ContentType,
    item_type: MemoryType,
    group_id: &memento_domain::value_objects::GroupId,
    event: &RawHookEvent,
    content: String,
    source_file: Option<String>,
) -> Option<CaptureTask> {
    if content.chars().count() < memento_domain::entities::memory_item::MIN_CONTENT_LEN {
        return None;
    }
    Some(CaptureTask {
        source_hook,
        content_type,
        item_type,
        group_id: group_id.as_str().to_owned(),
        session_id: event.session_id.clone(),
        content,
        source_file,
        tags: Vec::new(),
        turn_number: event.turn_number,
        tool_name: event.tool_name.clone(),
        tool_status: event.tool_status.clone(),
        raw_metadata: Value::Null,
    })
}

fn log_gate_drop(kind: HookEventKind, reason: &str) {
    memento_infrastructure::logging::log_event(
        HOOK_TARGET,
        "capture_gate_dropped",
        &[("kind", kind_label(kind)), ("reason", reason)],
    );
}

fn kind_label(kind: HookEventKind) -> &'static str {
    match kind {
        HookEventKind::PostToolUse => "PostToolUse",
        HookEventKind::UserPromptSubmit => "UserPromptSubmit",
        HookEventKind::Stop => "Stop",
        HookEventKind::SessionStart => "SessionStart",
        HookEventKind::PreCompact => "PreCompact",
        HookEventKind::ManualSave => "ManualSave",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(hook_event_name: &str) -> RawHookEvent {
        RawHookEvent {
            hook_event_name: hook_event_name.to_owned(),
            cwd: Some("/home/dev/demo-project".to_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn parses_every_fixed_event_name() {
        for name in [
            "PostToolUse",
            "UserPromptSubmit",
            "Stop",
            "SessionStart",
            "PreCompact",
            "ManualSave",
        ] {
            assert!(HookEventKind::parse(name).is_some());
        }
    }

    #[test]
    fn unknown_event_name_is_rejected() {
        assert!(HookEventKind::parse("SomeOtherHook").is_none());
    }

    #[test]
    fn session_start_and_pre_compact_are_retrieval() {
        assert!(HookEventKind::SessionStart.is_retrieval());
        assert!(HookEventKind::PreCompact.is_retrieval());
        assert!(!HookEventKind::PostToolUse.is_retrieval());
    }

    #[test]
    fn missing_cwd_drops_every_capture_kind() {
        let mut ev = event("UserPromptSubmit");
        ev.cwd = None;
        ev.user_message = Some("hello there, this is a message".to_owned());
        assert!(build_capture_tasks(HookEventKind::UserPromptSubmit, &ev).is_empty());
    }

    #[test]
    fn post_tool_use_requires_whitelisted_tool() {
        let mut ev = event("PostToolUse");
        ev.tool_name = Some("Bash".to_owned());
        ev.tool_status = Some("success".to_owned());
        ev.tool_input = Some(serde_json::json!({"file_path": "a.rs", "new_string": "fn a() {}"}));
        assert!(build_capture_tasks(HookEventKind::PostToolUse, &ev).is_empty());
    }

    #[test]
    fn post_tool_use_edit_produces_a_code_pattern_task() {
        let mut ev = event("PostToolUse");
        ev.tool_name = Some("Edit".to_owned());
        ev.tool_status = Some("success".to_owned());
        ev.tool_input = Some(serde_json::json!({
            "file_path": "src/lib.rs",
            "old_string": "fn a() {}",
            "new_string": "fn a() { println!(\"hi\"); }"
        }));
        let tasks = build_capture_tasks(HookEventKind::PostToolUse, &ev);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].item_type, MemoryType::Implementation);
        assert_eq!(tasks[0].source_file.as_deref(), Some("src/lib.rs"));
    }

    #[test]
    fn failed_shell_tool_produces_error_context_task() {
        let mut ev = event("PostToolUse");
        ev.tool_name = Some("Bash".to_owned());
        ev.tool_status = Some("error".to_owned());
        ev.tool_input = Some(serde_json::json!({"command": "pytest"}));
        ev.tool_response = Some(serde_json::json!({"error": "AssertionError", "output": "boom"}));
        let tasks = build_capture_tasks(HookEventKind::PostToolUse, &ev);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].source_hook, SourceHook::PostToolUseError);
    }

    #[test]
    fn short_content_is_dropped_by_the_length_gate() {
        let mut ev = event("UserPromptSubmit");
        ev.user_message = Some("hi".to_owned());
        assert!(build_capture_tasks(HookEventKind::UserPromptSubmit, &ev).is_empty());
    }

    #[test]
    fn decision_trigger_phrase_yields_a_second_task() {
        let mut ev = event("UserPromptSubmit");
        ev.user_message = Some("Let's go with the hexagonal architecture for this service".to_owned());
        let tasks = build_capture_tasks(HookEventKind::UserPromptSubmit, &ev);
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().any(|t| t.item_type == MemoryType::Decision));
    }

    #[test]
    fn manual_save_defaults_to_preference_unless_agent_memory_flag_is_set() {
        let mut ev = event("ManualSave");
        ev.user_message = Some("always prefer explicit error types over panics".to_owned());
        let tasks = build_capture_tasks(HookEventKind::ManualSave, &ev);
        assert_eq!(tasks[0].item_type, MemoryType::Preference);

        ev.agent_memory = true;
        let tasks = build_capture_tasks(HookEventKind::ManualSave, &ev);
        assert_eq!(tasks[0].item_type, MemoryType::AgentMemory);
    }
}
