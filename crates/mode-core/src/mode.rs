//! The two operating modes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Agent identifier of the read-only planning mode.
pub const PLAN_AGENT: &str = "cline-plan";

/// Agent identifier of the full-access execution mode.
pub const ACT_AGENT: &str = "cline-act";

/// Operating mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Read-only analysis and planning.
    #[default]
    #[serde(rename = "cline-plan")]
    Plan,
    /// Full tool access to carry out a plan.
    #[serde(rename = "cline-act")]
    Act,
}

impl Mode {
    /// Parse a transcript mode-tag, ignoring case.
    ///
    /// Accepts the agent names (`cline-plan`, `cline-act`) and the short names
    /// (`plan`, `act`). Unknown tags map to `None`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        [Self::Plan, Self::Act].into_iter().find(|mode| {
            tag.eq_ignore_ascii_case(mode.agent_name())
                || tag.eq_ignore_ascii_case(mode.short_name())
        })
    }

    /// Parse a host agent name. Only `cline-plan` and `cline-act` match, so the
    /// host's own `plan` agent is left alone.
    #[must_use]
    pub fn from_agent_name(name: &str) -> Option<Self> {
        let name = name.trim();
        [Self::Plan, Self::Act]
            .into_iter()
            .find(|mode| name.eq_ignore_ascii_case(mode.agent_name()))
    }

    /// Host agent identifier for this mode.
    #[must_use]
    pub const fn agent_name(self) -> &'static str {
        match self {
            Self::Plan => PLAN_AGENT,
            Self::Act => ACT_AGENT,
        }
    }

    /// Short lowercase name (`plan` or `act`).
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Act => "act",
        }
    }

    /// The other mode.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Plan => Self::Act,
            Self::Act => Self::Plan,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.agent_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_tag_ignores_case() {
        assert_eq!(Mode::from_tag("cline-plan"), Some(Mode::Plan));
        assert_eq!(Mode::from_tag("CLINE-Act"), Some(Mode::Act));
        assert_eq!(Mode::from_tag("build"), None);
        assert_eq!(Mode::from_tag(""), None);
    }

    #[test]
    fn from_tag_accepts_short_names() {
        assert_eq!(Mode::from_tag("plan"), Some(Mode::Plan));
        assert_eq!(Mode::from_tag("ACT"), Some(Mode::Act));
        assert_eq!(Mode::from_tag("planner"), None);
    }

    #[test]
    fn agent_names_are_strict() {
        assert_eq!(Mode::from_agent_name("cline-plan"), Some(Mode::Plan));
        assert_eq!(Mode::from_agent_name("Cline-Act"), Some(Mode::Act));
        assert_eq!(Mode::from_agent_name("plan"), None);
    }

    #[test]
    fn serializes_as_agent_name() {
        assert_eq!(
            serde_json::to_string(&Mode::Act).unwrap(),
            format!("\"{ACT_AGENT}\"")
        );
        assert_eq!(Mode::Plan.to_string(), PLAN_AGENT);
        assert_eq!(Mode::Plan.opposite(), Mode::Act);
    }
}
