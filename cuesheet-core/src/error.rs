//! Error types for cuesheet operations

use crate::{AgentType, BehaviorType, CampaignId, ClipId, ClipStatus, TrackId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// INTERPRETATION ERRORS
// ============================================================================

/// Clip field the interpreter requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClipField {
    Id,
    AgentType,
    BehaviorType,
}

impl ClipField {
    /// Wire name of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipField::Id => "id",
            ClipField::AgentType => "agentType",
            ClipField::BehaviorType => "behaviorType",
        }
    }
}

impl fmt::Display for ClipField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A required clip field is missing.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("Clip missing {field}")]
pub struct StructuralError {
    pub field: ClipField,
}

/// The payload does not match the schema of its behavior type.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("Invalid payload for behavior type \"{behavior_type}\": {path}: {reason}")]
pub struct PayloadValidationError {
    pub behavior_type: BehaviorType,
    /// Dotted/indexed path to the offending field, e.g. `timeRange.start`
    pub path: String,
    pub reason: String,
}

/// The behavior type has no schema.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("Unknown behavior type: {behavior_type}")]
pub struct UnknownBehaviorError {
    pub behavior_type: String,
}

/// The agent type may not execute the behavior type.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error(
    "Agent type \"{agent_type}\" is not compatible with behavior type \"{behavior_type}\". Valid behaviors: {}",
    join_behaviors(.allowed)
)]
pub struct CompatibilityError {
    pub agent_type: AgentType,
    pub behavior_type: BehaviorType,
    /// Behaviors the agent type is permitted to execute
    pub allowed: Vec<BehaviorType>,
}

fn join_behaviors(behaviors: &[BehaviorType]) -> String {
    if behaviors.is_empty() {
        return "none".to_string();
    }
    behaviors
        .iter()
        .map(BehaviorType::as_db_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure of payload schema validation.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaError {
    #[error(transparent)]
    Payload(#[from] PayloadValidationError),

    #[error(transparent)]
    UnknownBehavior(#[from] UnknownBehaviorError),
}

/// One entry in an interpreted instruction's error list.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InstructionError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Payload(#[from] PayloadValidationError),

    #[error(transparent)]
    UnknownBehavior(#[from] UnknownBehaviorError),

    #[error(transparent)]
    Compatibility(#[from] CompatibilityError),
}

impl From<SchemaError> for InstructionError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::Payload(e) => InstructionError::Payload(e),
            SchemaError::UnknownBehavior(e) => InstructionError::UnknownBehavior(e),
        }
    }
}

// ============================================================================
// LIFECYCLE, STORE AND SCHEDULER ERRORS
// ============================================================================

/// Status lifecycle errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Invalid status transition for clip {clip_id}: {from} -> {to}")]
    InvalidTransition {
        clip_id: ClipId,
        from: ClipStatus,
        to: ClipStatus,
    },
}

/// Clip store errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Clip not found: {clip_id}")]
    ClipNotFound { clip_id: ClipId },

    #[error("Track not found: {track_id}")]
    TrackNotFound { track_id: TrackId },

    #[error("Clip already exists: {clip_id}")]
    DuplicateClip { clip_id: ClipId },

    #[error("Invalid timing for clip {clip_id}: start {start_time}, duration {duration}")]
    InvalidTiming {
        clip_id: ClipId,
        start_time: f64,
        duration: f64,
    },

    #[error("Clip {clip_id} is {status}; only terminal clips can be reset")]
    NotResettable { clip_id: ClipId, status: ClipStatus },

    #[error("Clip {clip_id} belongs to campaign {found}, store holds campaign {expected}")]
    CampaignMismatch {
        clip_id: ClipId,
        expected: CampaignId,
        found: CampaignId,
    },
}

/// Agent executor errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Agent executor is closed")]
    ExecutorClosed,

    #[error("Agent executor rejected clip {clip_id}: {reason}")]
    Rejected { clip_id: ClipId, reason: String },
}

/// Scheduler errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Clip {clip_id} is {status}; only pending clips can be run")]
    NotRunnable { clip_id: ClipId, status: ClipStatus },

    #[error("Clip {clip_id} has an invalid instruction: {}", .errors.join("; "))]
    InvalidInstruction { clip_id: ClipId, errors: Vec<String> },

    #[error("Clip {clip_id} is not awaiting approval")]
    NotAwaitingApproval { clip_id: ClipId },

    #[error("Result for unknown clip {clip_id}")]
    UnknownClip { clip_id: ClipId },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to parse configuration: {reason}")]
    Parse { reason: String },
}

/// Master error type for all cuesheet errors.
#[derive(Debug, Clone, Error)]
pub enum CuesheetError {
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// Result type alias for cuesheet operations.
pub type CuesheetResult<T> = Result<T, CuesheetError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityIdType;

    #[test]
    fn test_structural_error_display() {
        let err = StructuralError {
            field: ClipField::AgentType,
        };
        assert_eq!(err.to_string(), "Clip missing agentType");
    }

    #[test]
    fn test_payload_error_display_includes_path() {
        let err = PayloadValidationError {
            behavior_type: BehaviorType::Research,
            path: "query".to_string(),
            reason: "Required".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("\"research\""));
        assert!(msg.contains("query: Required"));
    }

    #[test]
    fn test_compatibility_error_display_lists_allowed() {
        let err = CompatibilityError {
            agent_type: AgentType::Scout,
            behavior_type: BehaviorType::Planning,
            allowed: vec![BehaviorType::Research, BehaviorType::Custom],
        };
        assert_eq!(
            err.to_string(),
            "Agent type \"scout\" is not compatible with behavior type \"planning\". Valid behaviors: research, custom"
        );
    }

    #[test]
    fn test_compatibility_error_display_with_no_allowed() {
        let err = CompatibilityError {
            agent_type: AgentType::Tracker,
            behavior_type: BehaviorType::Story,
            allowed: vec![],
        };
        assert!(err.to_string().ends_with("Valid behaviors: none"));
    }

    #[test]
    fn test_schema_error_converts_to_instruction_error() {
        let err: InstructionError = SchemaError::UnknownBehavior(UnknownBehaviorError {
            behavior_type: "dance".to_string(),
        })
        .into();
        assert!(matches!(err, InstructionError::UnknownBehavior(_)));
        assert_eq!(err.to_string(), "Unknown behavior type: dance");
    }

    #[test]
    fn test_instruction_error_serializes_with_kind_tag() {
        let err = InstructionError::Structural(StructuralError { field: ClipField::Id });
        let json = serde_json::to_value(&err).expect("serialize");
        assert_eq!(json["kind"], "structural");
        assert_eq!(json["field"], "id");
    }

    #[test]
    fn test_lifecycle_error_display() {
        let err = LifecycleError::InvalidTransition {
            clip_id: ClipId::nil(),
            from: ClipStatus::Completed,
            to: ClipStatus::Active,
        };
        let msg = err.to_string();
        assert!(msg.contains("completed -> active"));
    }

    #[test]
    fn test_cuesheet_error_from_variants() {
        let lifecycle = CuesheetError::from(LifecycleError::InvalidTransition {
            clip_id: ClipId::nil(),
            from: ClipStatus::Failed,
            to: ClipStatus::Pending,
        });
        assert!(matches!(lifecycle, CuesheetError::Lifecycle(_)));

        let store = CuesheetError::from(StoreError::TrackNotFound {
            track_id: TrackId::nil(),
        });
        assert!(matches!(store, CuesheetError::Store(_)));

        let dispatch = CuesheetError::from(DispatchError::ExecutorClosed);
        assert!(matches!(dispatch, CuesheetError::Dispatch(_)));

        let config = CuesheetError::from(ConfigError::Parse {
            reason: "eof".to_string(),
        });
        assert!(matches!(config, CuesheetError::Config(_)));
    }
}
