//! Tool-name mapping between Cline's vocabulary and the host's.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// One entry of the mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolMapping {
    /// Tool name as used in Cline prompts.
    pub source: &'static str,
    /// Equivalent host tool.
    pub host: &'static str,
    /// Human-readable description (informational only).
    pub description: &'static str,
}

const fn mapping(
    source: &'static str,
    host: &'static str,
    description: &'static str,
) -> ToolMapping {
    ToolMapping {
        source,
        host,
        description,
    }
}

/// Mapping table, applied in order.
pub const TOOL_MAPPINGS: &[ToolMapping] = &[
    // File operations
    mapping("read_file", "read", "Read file contents"),
    mapping("write_to_file", "write", "Write content to a file"),
    mapping("replace_in_file", "edit", "Edit existing file content"),
    mapping("apply_patch", "edit", "Apply patch to file"),
    mapping("list_files", "glob", "List files in directory"),
    mapping("search_files", "grep", "Search for content in files"),
    mapping("list_code_definition_names", "grep", "List code definitions"),
    // Command execution
    mapping("execute_command", "bash", "Execute shell command"),
    // Web
    mapping("web_search", "google_search", "Search the web"),
    mapping("web_fetch", "webfetch", "Fetch web content"),
    mapping("browser_action", "browser", "Browser automation"),
    // Task management
    mapping("attempt_completion", "attempt_completion", "Complete the task"),
    mapping("ask_followup_question", "ask_followup_question", "Ask user a question"),
    // Mode-specific
    mapping("plan_mode_respond", "plan_mode_respond", "Respond in plan mode"),
    mapping("act_mode_respond", "act_mode_respond", "Respond in act mode"),
    // MCP and skills
    mapping("use_mcp_tool", "use_mcp_tool", "Use MCP tool"),
    mapping("access_mcp_resource", "access_mcp_resource", "Access MCP resource"),
    mapping("load_mcp_documentation", "load_mcp_documentation", "Load MCP documentation"),
    mapping("use_skill", "skill", "Use a skill"),
    // Tasks and focus
    mapping("new_task", "task", "Create new task"),
    mapping("focus_chain", "focus_chain", "Focus chain management"),
];

/// Compiled substitution rules for one table entry.
struct EntryRules {
    literals: Vec<(String, String)>,
    colon: Option<(Regex, String)>,
}

/// Rewrites Cline tool names into host tool names.
pub struct ToolNameMapper {
    lookup: HashMap<&'static str, &'static str>,
    rules: Vec<EntryRules>,
}

impl Default for ToolNameMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolNameMapper {
    /// Build a mapper over [`TOOL_MAPPINGS`].
    #[must_use]
    pub fn new() -> Self {
        let mut lookup = HashMap::new();
        for entry in TOOL_MAPPINGS {
            lookup.entry(entry.source).or_insert(entry.host);
        }

        let rules = TOOL_MAPPINGS
            .iter()
            .filter(|entry| entry.source != entry.host)
            .map(|entry| {
                let (from, to) = (entry.source, entry.host);
                let literals = vec![
                    (format!("<{from}>"), format!("<{to}>")),
                    (format!("</{from}>"), format!("</{to}>")),
                    (format!("'{from}'"), format!("'{to}'")),
                    (format!("\"{from}\""), format!("\"{to}\"")),
                    (format!("`{from}`"), format!("`{to}`")),
                ];
                let colon = Regex::new(&format!(r"\b{}:", regex::escape(from)))
                    .ok()
                    .map(|re| (re, format!("{to}:")));
                EntryRules { literals, colon }
            })
            .collect();

        Self { lookup, rules }
    }

    /// Host equivalent of `name`, or `name` itself when unmapped.
    #[must_use]
    pub fn map<'a>(&self, name: &'a str) -> &'a str {
        self.lookup.get(name).copied().unwrap_or(name)
    }

    /// Rewrite every Cline tool name occurring in tags, quotes, inline code or
    /// before a colon.
    #[must_use]
    pub fn adapt<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut result = Cow::Borrowed(text);

        for entry in &self.rules {
            for (from, to) in &entry.literals {
                if result.contains(from.as_str()) {
                    result = Cow::Owned(result.replace(from.as_str(), to));
                }
            }
            if let Some((pattern, replacement)) = &entry.colon {
                if pattern.is_match(&result) {
                    result = Cow::Owned(
                        pattern
                            .replace_all(&result, regex::NoExpand(replacement))
                            .into_owned(),
                    );
                }
            }
        }

        result
    }
}

static MAPPER: LazyLock<ToolNameMapper> = LazyLock::new(ToolNameMapper::new);

/// Map a Cline tool name to its host equivalent.
#[must_use]
pub fn map_tool_name(name: &str) -> &str {
    MAPPER.map(name)
}

/// Rewrite Cline tool names inside a prompt.
#[must_use]
pub fn adapt_prompt_tool_names(prompt: &str) -> Cow<'_, str> {
    MAPPER.adapt(prompt)
}

/// All Cline tool names, in table order.
#[must_use]
pub fn source_tool_names() -> Vec<&'static str> {
    TOOL_MAPPINGS.iter().map(|m| m.source).collect()
}

/// All host tool names, in table order (may repeat).
#[must_use]
pub fn host_tool_names() -> Vec<&'static str> {
    TOOL_MAPPINGS.iter().map(|m| m.host).collect()
}

/// Check if `name` is a Cline tool name.
#[must_use]
pub fn is_source_tool(name: &str) -> bool {
    TOOL_MAPPINGS.iter().any(|m| m.source == name)
}

/// Check if `name` is a host tool name.
#[must_use]
pub fn is_host_tool(name: &str) -> bool {
    TOOL_MAPPINGS.iter().any(|m| m.host == name)
}

/// First Cline tool that maps onto the host tool `name`.
#[must_use]
pub fn source_name_for(name: &str) -> Option<&'static str> {
    TOOL_MAPPINGS
        .iter()
        .find(|m| m.host == name)
        .map(|m| m.source)
}
