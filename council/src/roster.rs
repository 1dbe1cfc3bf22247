//! Fixed four-agent roster and agent identity.
//!
//! The roster always holds exactly Alpha and Beta (pro) and Gamma and Delta
//! (con). Transcript speakers are mapped onto it through [`AGENT_NAME_TABLE`];
//! a speaker that matches no entry becomes an [`AgentRef::Unregistered`]
//! label and never touches the roster.

use serde::{Deserialize, Serialize};

/// Side of the debate an agent argues for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Pro,
    Con,
}

impl Team {
    /// Parse a team tag, case-insensitive. Anything but `con` is pro.
    pub fn from_tag(tag: &str) -> Self {
        if tag.trim().eq_ignore_ascii_case("con") {
            Self::Con
        } else {
            Self::Pro
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pro => write!(f, "pro"),
            Self::Con => write!(f, "con"),
        }
    }
}

/// The four registered roster members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    Alpha,
    Beta,
    Gamma,
    Delta,
}

impl AgentId {
    /// All roster members in display order.
    pub const ALL: [AgentId; 4] = [Self::Alpha, Self::Beta, Self::Gamma, Self::Delta];

    /// Fixed team assignment.
    pub fn team(self) -> Team {
        match self {
            Self::Alpha | Self::Beta => Team::Pro,
            Self::Gamma | Self::Delta => Team::Con,
        }
    }

    /// Roster display name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Alpha => "Alpha",
            Self::Beta => "Beta",
            Self::Gamma => "Gamma",
            Self::Delta => "Delta",
        }
    }

    /// Parse the wire form (`alpha`, `beta`, ...).
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|id| raw.trim().eq_ignore_ascii_case(id.as_str()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Beta => "beta",
            Self::Gamma => "gamma",
            Self::Delta => "delta",
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transcript speaker tags and the roster member each one maps to.
/// Matched as substrings of the speaker's display name, first hit wins.
pub const AGENT_NAME_TABLE: [(&str, AgentId); 4] = [
    ("Pro-A", AgentId::Alpha),
    ("Pro-B", AgentId::Beta),
    ("Con-A", AgentId::Gamma),
    ("Con-B", AgentId::Delta),
];

/// Identity of a transcript speaker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum AgentRef {
    /// One of the four roster members.
    Registered(AgentId),
    /// Display-only label derived from an unknown speaker name.
    Unregistered(String),
}

impl AgentRef {
    /// Resolve a speaker display name through [`AGENT_NAME_TABLE`], falling
    /// back to a slug label.
    pub fn from_display_name(name: &str) -> Self {
        AGENT_NAME_TABLE
            .iter()
            .find(|(tag, _)| name.contains(tag))
            .map(|(_, id)| Self::Registered(*id))
            .unwrap_or_else(|| Self::Unregistered(slugify(name)))
    }

    /// Resolve a raw id string (legacy payloads carry ids, not names).
    pub fn from_raw_id(raw: &str) -> Self {
        AgentId::parse(raw)
            .map(Self::Registered)
            .unwrap_or_else(|| Self::Unregistered(slugify(raw)))
    }

    /// The roster member, if registered.
    pub fn registered(&self) -> Option<AgentId> {
        match self {
            Self::Registered(id) => Some(*id),
            Self::Unregistered(_) => None,
        }
    }

    /// Label used by presentation.
    pub fn label(&self) -> &str {
        match self {
            Self::Registered(id) => id.as_str(),
            Self::Unregistered(slug) => slug,
        }
    }
}

impl Default for AgentRef {
    fn default() -> Self {
        Self::Registered(AgentId::Alpha)
    }
}

/// Lowercase, every non `[a-z0-9]` character replaced by `-`.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Live status of a roster agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Idle,
    Thinking,
    Complete,
    Error,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Thinking => write!(f, "thinking"),
            Self::Complete => write!(f, "complete"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A roster entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub status: AgentStatus,
    pub team: Team,
    /// Live reasoning text shown next to the agent.
    pub reasoning: String,
    pub confidence: Option<f32>,
}

impl Agent {
    fn baseline(id: AgentId) -> Self {
        Self {
            id,
            name: id.display_name().to_string(),
            status: AgentStatus::Idle,
            team: id.team(),
            reasoning: String::new(),
            confidence: None,
        }
    }
}

/// The four-agent roster. Construction and reset always yield the same
/// idle baseline; there is no way to add or remove members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    agents: [Agent; 4],
}

impl Roster {
    /// Idle baseline.
    pub fn baseline() -> Self {
        Self {
            agents: AgentId::ALL.map(Agent::baseline),
        }
    }

    /// Reset every agent to the idle baseline.
    pub fn reset(&mut self) {
        *self = Self::baseline();
    }

    /// Every agent thinking with cleared reasoning.
    pub fn begin_thinking(&mut self) {
        for agent in &mut self.agents {
            agent.status = AgentStatus::Thinking;
            agent.reasoning.clear();
        }
    }

    /// Every agent complete. Agents named in `latest` get that text as
    /// their reasoning.
    pub fn complete_with<'a>(&mut self, latest: impl IntoIterator<Item = (AgentId, &'a str)>) {
        for agent in &mut self.agents {
            agent.status = AgentStatus::Complete;
        }
        for (id, text) in latest {
            self.get_mut(id).reasoning = text.to_string();
        }
    }

    /// Every agent in error.
    pub fn fail(&mut self) {
        for agent in &mut self.agents {
            agent.status = AgentStatus::Error;
        }
    }

    pub fn get(&self, id: AgentId) -> &Agent {
        &self.agents[Self::index(id)]
    }

    fn get_mut(&mut self, id: AgentId) -> &mut Agent {
        &mut self.agents[Self::index(id)]
    }

    fn index(id: AgentId) -> usize {
        match id {
            AgentId::Alpha => 0,
            AgentId::Beta => 1,
            AgentId::Gamma => 2,
            AgentId::Delta => 3,
        }
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Whether every agent is idle with no reasoning.
    pub fn is_baseline(&self) -> bool {
        *self == Self::baseline()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::baseline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_teams() {
        assert_eq!(AgentId::Alpha.team(), Team::Pro);
        assert_eq!(AgentId::Beta.team(), Team::Pro);
        assert_eq!(AgentId::Gamma.team(), Team::Con);
        assert_eq!(AgentId::Delta.team(), Team::Con);
    }

    #[test]
    fn test_name_table_lookup() {
        assert_eq!(
            AgentRef::from_display_name("Pro-A"),
            AgentRef::Registered(AgentId::Alpha)
        );
        assert_eq!(
            AgentRef::from_display_name("Con-B (llama3)"),
            AgentRef::Registered(AgentId::Delta)
        );
        assert_eq!(
            AgentRef::from_display_name("Moderator #1"),
            AgentRef::Unregistered("moderator--1".to_string())
        );
    }

    #[test]
    fn test_unregistered_never_indexes_roster() {
        let speaker = AgentRef::from_display_name("Judge");
        assert_eq!(speaker.registered(), None);
        assert_eq!(speaker.label(), "judge");
    }

    #[test]
    fn test_raw_id_parsing() {
        assert_eq!(
            AgentRef::from_raw_id("GAMMA"),
            AgentRef::Registered(AgentId::Gamma)
        );
        assert_eq!(
            AgentRef::from_raw_id("omega"),
            AgentRef::Unregistered("omega".to_string())
        );
    }

    #[test]
    fn test_team_from_tag() {
        assert_eq!(Team::from_tag("CON"), Team::Con);
        assert_eq!(Team::from_tag("con"), Team::Con);
        assert_eq!(Team::from_tag("pro"), Team::Pro);
        assert_eq!(Team::from_tag("neutral"), Team::Pro);
    }

    #[test]
    fn test_roster_lifecycle() {
        let mut roster = Roster::baseline();
        assert_eq!(roster.agents().len(), 4);
        assert!(roster.is_baseline());

        roster.begin_thinking();
        assert!(roster
            .agents()
            .iter()
            .all(|a| a.status == AgentStatus::Thinking));

        roster.complete_with([(AgentId::Gamma, "counterpoint")]);
        assert!(roster
            .agents()
            .iter()
            .all(|a| a.status == AgentStatus::Complete));
        assert_eq!(roster.get(AgentId::Gamma).reasoning, "counterpoint");
        assert_eq!(roster.get(AgentId::Alpha).reasoning, "");

        roster.reset();
        assert!(roster.is_baseline());
    }

    #[test]
    fn test_agent_ref_serde() {
        let json = serde_json::to_string(&AgentRef::Registered(AgentId::Beta)).unwrap();
        assert_eq!(json, r#"{"kind":"registered","id":"beta"}"#);
    }
}
