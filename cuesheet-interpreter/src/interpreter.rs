//! Clip interpreter
//!
//! Turns raw clips into [`InterpretedInstruction`]s. Every check runs on
//! every clip and all problems are collected together; interpretation never
//! fails and never touches anything outside its arguments.

use crate::{check_compatibility, CompatibilityMatrix, InstructionPayload, InterpretedInstruction};
use cuesheet_core::{
    Clip, ClipExecutionContext, ClipField, ExecutionMode, InstructionError, Metadata,
    StructuralError, Track, UserId,
};
use cuesheet_payload::validate_payload;

/// Caller-supplied context for [`ClipInterpreter::create_execution_context`].
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOptions {
    pub user_id: UserId,
    pub playhead_position: f64,
    pub metadata: Metadata,
}

impl ExecutionOptions {
    pub fn new(user_id: UserId, playhead_position: f64) -> Self {
        Self {
            user_id,
            playhead_position,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Interprets clips against a compatibility matrix.
#[derive(Debug, Clone, Default)]
pub struct ClipInterpreter {
    matrix: CompatibilityMatrix,
}

impl ClipInterpreter {
    pub fn new(matrix: CompatibilityMatrix) -> Self {
        Self { matrix }
    }

    pub fn matrix(&self) -> &CompatibilityMatrix {
        &self.matrix
    }

    /// Interpret one clip.
    ///
    /// Runs the structural check, payload validation and the compatibility
    /// check, and collects every error. A missing behavior type skips the
    /// payload and compatibility checks; a missing agent type skips only the
    /// compatibility check.
    pub fn interpret(&self, clip: &Clip) -> InterpretedInstruction {
        let mut errors = Vec::new();

        self.check_structure(&mut errors, clip);

        let mut validated = None;
        if let Some(behavior) = &clip.behavior_type {
            match validate_payload(behavior, &clip.payload) {
                Ok(payload) => validated = Some(payload),
                Err(err) => errors.push(InstructionError::from(err)),
            }

            if let Some(agent) = clip.agent_type {
                errors.extend(
                    check_compatibility(&self.matrix, agent, behavior)
                        .into_iter()
                        .map(InstructionError::from),
                );
            }
        }

        let is_valid = errors.is_empty();
        let payload = match validated {
            Some(payload) if is_valid => InstructionPayload::Validated(payload),
            _ => InstructionPayload::Raw(clip.payload.clone()),
        };

        InterpretedInstruction {
            clip: clip.clone(),
            agent_type: clip.agent_type,
            behavior_type: clip.behavior_type.clone(),
            execution_mode: clip.execution_mode,
            payload,
            is_valid,
            errors,
        }
    }

    fn check_structure(&self, errors: &mut Vec<InstructionError>, clip: &Clip) {
        let missing = [
            (clip.id.is_none(), ClipField::Id),
            (clip.agent_type.is_none(), ClipField::AgentType),
            (clip.behavior_type.is_none(), ClipField::BehaviorType),
        ];
        errors.extend(
            missing
                .into_iter()
                .filter(|(absent, _)| *absent)
                .map(|(_, field)| InstructionError::from(StructuralError { field })),
        );
    }

    /// Interpret a batch, one instruction per clip, in input order.
    pub fn interpret_many(&self, clips: &[Clip]) -> Vec<InterpretedInstruction> {
        clips.iter().map(|clip| self.interpret(clip)).collect()
    }

    /// Interpret the clips whose execution mode is `mode`. Invalid
    /// instructions are included.
    pub fn filter_by_execution_mode(
        &self,
        clips: &[Clip],
        mode: ExecutionMode,
    ) -> Vec<InterpretedInstruction> {
        clips
            .iter()
            .filter(|clip| clip.execution_mode == mode)
            .map(|clip| self.interpret(clip))
            .collect()
    }

    /// Interpret the clips whose closed interval contains `position`, in
    /// input order.
    pub fn get_clips_at_playhead(
        &self,
        clips: &[Clip],
        position: f64,
    ) -> Vec<InterpretedInstruction> {
        clips
            .iter()
            .filter(|clip| clip.contains(position))
            .map(|clip| self.interpret(clip))
            .collect()
    }

    /// Bundle a clip with its track and caller context for an executor.
    pub fn create_execution_context(
        &self,
        clip: &Clip,
        track: &Track,
        options: ExecutionOptions,
    ) -> ClipExecutionContext {
        ClipExecutionContext {
            clip: clip.clone(),
            track: track.clone(),
            campaign_id: track.campaign_id,
            user_id: options.user_id,
            playhead_position: options.playhead_position,
            metadata: options.metadata,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
