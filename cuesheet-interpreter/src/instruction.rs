//! Interpreted instructions

use cuesheet_core::{AgentType, BehaviorType, Clip, ClipId, ExecutionMode, InstructionError};
use cuesheet_payload::ValidatedPayload;
use serde::Serialize;
use serde_json::Value;

/// Payload carried by an instruction.
///
/// Valid instructions carry the typed payload. Invalid ones keep the clip's
/// raw payload untouched so an editor can still display and fix it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InstructionPayload {
    Validated(ValidatedPayload),
    Raw(Value),
}

impl InstructionPayload {
    pub fn validated(&self) -> Option<&ValidatedPayload> {
        match self {
            InstructionPayload::Validated(payload) => Some(payload),
            InstructionPayload::Raw(_) => None,
        }
    }

    /// JSON form of the payload.
    pub fn to_value(&self) -> Value {
        match self {
            InstructionPayload::Validated(payload) => payload.to_value(),
            InstructionPayload::Raw(raw) => raw.clone(),
        }
    }
}

/// A clip after interpretation: either ready to dispatch or carrying every
/// problem found.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterpretedInstruction {
    pub clip: Clip,
    pub agent_type: Option<AgentType>,
    pub behavior_type: Option<BehaviorType>,
    pub execution_mode: ExecutionMode,
    pub payload: InstructionPayload,
    /// True iff `errors` is empty
    pub is_valid: bool,
    pub errors: Vec<InstructionError>,
}

impl InterpretedInstruction {
    pub fn clip_id(&self) -> Option<ClipId> {
        self.clip.id
    }

    /// Human-readable error list, in the order the problems were found.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    /// All error messages joined into one line, for `Clip::failure_reason`.
    pub fn failure_reason(&self) -> Option<String> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self.error_messages().join("; "))
        }
    }
}
