//! Agent execution boundary
//!
//! Dispatch is fire-and-forget: an executor accepts an instruction and
//! returns immediately. Outcomes come back later as [`AgentResult`]s through
//! the scheduler's result inbox.

use cuesheet_core::{AgentType, BehaviorType, Clip, ClipId, DispatchError};
use cuesheet_interpreter::InterpretedInstruction;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

/// Outcome reported by an agent for one dispatched clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    pub success: bool,
    pub clip_id: ClipId,
    pub agent_type: AgentType,
    pub behavior_type: BehaviorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    pub message: String,
    /// Follow-on clips to merge into the store
    #[serde(default)]
    pub generated_clips: Vec<Clip>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl AgentResult {
    /// A successful result.
    pub fn success(
        clip_id: ClipId,
        agent_type: AgentType,
        behavior_type: BehaviorType,
        message: &str,
    ) -> Self {
        Self {
            success: true,
            clip_id,
            agent_type,
            behavior_type,
            output: None,
            message: message.to_string(),
            generated_clips: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// A failed result.
    pub fn failure(
        clip_id: ClipId,
        agent_type: AgentType,
        behavior_type: BehaviorType,
        message: &str,
        errors: Vec<String>,
    ) -> Self {
        Self {
            success: false,
            errors,
            ..Self::success(clip_id, agent_type, behavior_type, message)
        }
    }

    pub fn with_output(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }

    pub fn with_generated_clips(mut self, clips: Vec<Clip>) -> Self {
        self.generated_clips = clips;
        self
    }

    /// Message and errors as one line, for a failed clip's reason.
    pub fn failure_reason(&self) -> String {
        if self.errors.is_empty() {
            self.message.clone()
        } else {
            format!("{}: {}", self.message, self.errors.join("; "))
        }
    }
}

/// Accepts valid instructions for execution by an agent.
pub trait AgentExecutor {
    /// Hand an instruction to the agent runtime. Must not block on the
    /// agent's work.
    fn dispatch(&mut self, instruction: &InterpretedInstruction) -> Result<(), DispatchError>;
}

// ============================================================================
// CHANNEL EXECUTOR
// ============================================================================

/// Forwards instructions over an unbounded channel to an agent runtime.
#[derive(Debug, Clone)]
pub struct ChannelExecutor {
    tx: mpsc::UnboundedSender<InterpretedInstruction>,
}

impl ChannelExecutor {
    /// Create an executor and the receiving end for the agent runtime.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<InterpretedInstruction>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AgentExecutor for ChannelExecutor {
    fn dispatch(&mut self, instruction: &InterpretedInstruction) -> Result<(), DispatchError> {
        self.tx
            .send(instruction.clone())
            .map_err(|_| DispatchError::ExecutorClosed)
    }
}

// ============================================================================
// RECORDING EXECUTOR
// ============================================================================

/// Keeps every dispatched instruction in memory. Optionally refuses every
/// dispatch, for exercising failure paths.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    dispatched: Vec<InterpretedInstruction>,
    refuse_with: Option<String>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// An executor that rejects every instruction with `reason`.
    pub fn refusing(reason: &str) -> Self {
        Self {
            dispatched: Vec::new(),
            refuse_with: Some(reason.to_string()),
        }
    }

    pub fn dispatched(&self) -> &[InterpretedInstruction] {
        &self.dispatched
    }

    /// Ids of dispatched clips, in dispatch order.
    pub fn dispatched_ids(&self) -> Vec<ClipId> {
        self.dispatched.iter().filter_map(|i| i.clip_id()).collect()
    }
}

impl AgentExecutor for RecordingExecutor {
    fn dispatch(&mut self, instruction: &InterpretedInstruction) -> Result<(), DispatchError> {
        if let Some(reason) = &self.refuse_with {
            return Err(DispatchError::Rejected {
                clip_id: instruction.clip.id_or_nil(),
                reason: reason.clone(),
            });
        }
        self.dispatched.push(instruction.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuesheet_core::{CampaignId, EntityIdType, TrackId};
    use cuesheet_interpreter::ClipInterpreter;

    fn instruction() -> InterpretedInstruction {
        let clip = Clip::new(
            CampaignId::now_v7(),
            TrackId::now_v7(),
            AgentType::Coach,
            BehaviorType::Custom,
            "clip",
        );
        ClipInterpreter::default().interpret(&clip)
    }

    #[test]
    fn test_channel_executor_forwards() {
        let (mut executor, mut rx) = ChannelExecutor::channel();
        let instruction = instruction();
        executor.dispatch(&instruction).expect("dispatch");
        assert_eq!(rx.try_recv().ok(), Some(instruction));
    }

    #[test]
    fn test_channel_executor_closed() {
        let (mut executor, rx) = ChannelExecutor::channel();
        drop(rx);
        assert_eq!(
            executor.dispatch(&instruction()),
            Err(DispatchError::ExecutorClosed)
        );
    }

    #[test]
    fn test_recording_executor_refusing() {
        let mut executor = RecordingExecutor::refusing("quota exceeded");
        let result = executor.dispatch(&instruction());
        assert!(matches!(result, Err(DispatchError::Rejected { .. })));
        assert!(executor.dispatched().is_empty());
    }

    #[test]
    fn test_failure_reason_joins_errors() {
        let result = AgentResult::failure(
            ClipId::nil(),
            AgentType::Scout,
            BehaviorType::Research,
            "Research failed",
            vec!["timeout".to_string(), "no sources".to_string()],
        );
        assert!(!result.success);
        assert_eq!(result.failure_reason(), "Research failed: timeout; no sources");
    }

    #[test]
    fn test_result_deserializes_from_agent_json() {
        let raw = serde_json::json!({
            "success": true,
            "clipId": "0190a5c4-0000-7000-8000-000000000001",
            "agentType": "insight",
            "behaviorType": "story",
            "message": "Logged"
        });
        let result: AgentResult = serde_json::from_value(raw).expect("deserialize");
        assert!(result.success);
        assert_eq!(result.behavior_type, BehaviorType::Story);
        assert!(result.generated_clips.is_empty());
    }
}
