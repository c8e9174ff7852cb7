//! Enum types for cuesheet entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// AGENT TYPE
// ============================================================================

/// Class of worker agent that executes clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    /// Finds contacts, playlists and opportunities
    Scout,
    /// Plans campaigns and writes follow-ups
    Coach,
    /// Tracks outreach and chases replies
    Tracker,
    /// Analyses the campaign and narrates its story
    Insight,
}

impl AgentType {
    /// All agent types, in declaration order.
    pub const ALL: [AgentType; 4] = [
        AgentType::Scout,
        AgentType::Coach,
        AgentType::Tracker,
        AgentType::Insight,
    ];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            AgentType::Scout => "scout",
            AgentType::Coach => "coach",
            AgentType::Tracker => "tracker",
            AgentType::Insight => "insight",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, AgentTypeParseError> {
        match s.to_lowercase().as_str() {
            "scout" => Ok(AgentType::Scout),
            "coach" => Ok(AgentType::Coach),
            "tracker" => Ok(AgentType::Tracker),
            "insight" => Ok(AgentType::Insight),
            _ => Err(AgentTypeParseError(s.to_string())),
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for AgentType {
    type Err = AgentTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid agent type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentTypeParseError(pub String);

impl fmt::Display for AgentTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid agent type: {}", self.0)
    }
}

impl std::error::Error for AgentTypeParseError {}

// ============================================================================
// BEHAVIOR TYPE
// ============================================================================

/// Kind of task a clip requests.
///
/// Clips arrive from editors and from agents emitting follow-on work, so a
/// behavior string the engine does not know is kept as `Other` instead of
/// failing deserialization. The interpreter reports it as an unknown
/// behavior.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BehaviorType {
    Research,
    Planning,
    Followup,
    Analysis,
    Story,
    Custom,
    /// A behavior string with no schema
    Other(String),
}

impl BehaviorType {
    /// Every behavior type that has a payload schema.
    pub const KNOWN: [BehaviorType; 6] = [
        BehaviorType::Research,
        BehaviorType::Planning,
        BehaviorType::Followup,
        BehaviorType::Analysis,
        BehaviorType::Story,
        BehaviorType::Custom,
    ];

    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &str {
        match self {
            BehaviorType::Research => "research",
            BehaviorType::Planning => "planning",
            BehaviorType::Followup => "followup",
            BehaviorType::Analysis => "analysis",
            BehaviorType::Story => "story",
            BehaviorType::Custom => "custom",
            BehaviorType::Other(raw) => raw,
        }
    }

    /// Parse from database string representation. Never fails; anything
    /// other than an exact lowercase name becomes `Other`, unchanged.
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "research" => BehaviorType::Research,
            "planning" => BehaviorType::Planning,
            "followup" => BehaviorType::Followup,
            "analysis" => BehaviorType::Analysis,
            "story" => BehaviorType::Story,
            "custom" => BehaviorType::Custom,
            _ => BehaviorType::Other(s.to_string()),
        }
    }

    /// Whether a payload schema exists for this behavior.
    pub fn is_known(&self) -> bool {
        !matches!(self, BehaviorType::Other(_))
    }
}

impl From<String> for BehaviorType {
    fn from(s: String) -> Self {
        Self::from_db_str(&s)
    }
}

impl From<&str> for BehaviorType {
    fn from(s: &str) -> Self {
        Self::from_db_str(s)
    }
}

impl From<BehaviorType> for String {
    fn from(behavior: BehaviorType) -> Self {
        behavior.as_db_str().to_string()
    }
}

impl fmt::Display for BehaviorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

// ============================================================================
// EXECUTION MODE
// ============================================================================

/// Policy for what happens when a valid clip comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Dispatch as soon as the playhead enters the clip
    #[default]
    Auto,
    /// Surface only; runs on an explicit run command
    Manual,
    /// Dispatch automatically, but hold the result for approval
    Assist,
}

impl ExecutionMode {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ExecutionMode::Auto => "auto",
            ExecutionMode::Manual => "manual",
            ExecutionMode::Assist => "assist",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, ExecutionModeParseError> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ExecutionMode::Auto),
            "manual" => Ok(ExecutionMode::Manual),
            "assist" => Ok(ExecutionMode::Assist),
            _ => Err(ExecutionModeParseError(s.to_string())),
        }
    }

    /// Whether the scheduler dispatches this mode without a run command.
    pub fn dispatches_automatically(&self) -> bool {
        matches!(self, ExecutionMode::Auto | ExecutionMode::Assist)
    }

    /// Whether agent output needs approval before the clip completes.
    pub fn requires_approval(&self) -> bool {
        matches!(self, ExecutionMode::Assist)
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = ExecutionModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid execution mode string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionModeParseError(pub String);

impl fmt::Display for ExecutionModeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid execution mode: {}", self.0)
    }
}

impl std::error::Error for ExecutionModeParseError {}

// ============================================================================
// CLIP STATUS
// ============================================================================

/// Lifecycle status of a clip. See [`crate::lifecycle`] for transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClipStatus {
    /// Waiting for the playhead or a run command
    #[default]
    Pending,
    /// Dispatched, awaiting the agent result
    Active,
    /// Agent succeeded (and was approved, in assist mode)
    Completed,
    /// Approval step declined the result
    Rejected,
    /// Interpretation or execution failed
    Failed,
}

impl ClipStatus {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ClipStatus::Pending => "pending",
            ClipStatus::Active => "active",
            ClipStatus::Completed => "completed",
            ClipStatus::Rejected => "rejected",
            ClipStatus::Failed => "failed",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, ClipStatusParseError> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ClipStatus::Pending),
            "active" => Ok(ClipStatus::Active),
            "completed" | "complete" => Ok(ClipStatus::Completed),
            "rejected" => Ok(ClipStatus::Rejected),
            "failed" | "failure" => Ok(ClipStatus::Failed),
            _ => Err(ClipStatusParseError(s.to_string())),
        }
    }

    /// Check if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ClipStatus::Completed | ClipStatus::Rejected | ClipStatus::Failed
        )
    }
}

impl fmt::Display for ClipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for ClipStatus {
    type Err = ClipStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid clip status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipStatusParseError(pub String);

impl fmt::Display for ClipStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid clip status: {}", self.0)
    }
}

impl std::error::Error for ClipStatusParseError {}
