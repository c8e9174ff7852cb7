//! Cuesheet Test Utilities
//!
//! Centralized test infrastructure for the cuesheet workspace:
//! - Proptest generators for ids, enums, payloads and clips
//! - Test fixtures for common scenarios
//! - Custom assertions for instructions, results and clip status
//! - Log capture for tests via `tracing-subscriber`

// Re-export the types tests reach for most
pub use cuesheet_core::{
    AgentType, BehaviorType, CampaignId, Clip, ClipField, ClipId, ClipStatus, CuesheetError,
    CuesheetResult, EngineConfig, EntityIdType, ExecutionMode, InstructionError, SchedulerError,
    StoreError, Timestamp, Track, TrackId, UserId,
};
pub use cuesheet_interpreter::{ClipInterpreter, CompatibilityMatrix, InterpretedInstruction};
pub use cuesheet_scheduler::{
    AgentResult, ClipStore, InMemoryClipStore, RecordingExecutor, Scheduler,
};

use serde_json::{json, Value};
use uuid::Uuid;

/// Scheduler over the in-memory store and recording executor.
pub type TestScheduler = Scheduler<InMemoryClipStore, RecordingExecutor>;

/// Install a test log subscriber honoring `RUST_LOG`. Safe to call from
/// every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for cuesheet types.

    use super::*;
    use proptest::prelude::*;

    // === Identity Type Generators ===

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    pub fn arb_clip_id() -> impl Strategy<Value = ClipId> {
        arb_uuid().prop_map(ClipId::new)
    }

    pub fn arb_track_id() -> impl Strategy<Value = TrackId> {
        arb_uuid().prop_map(TrackId::new)
    }

    pub fn arb_campaign_id() -> impl Strategy<Value = CampaignId> {
        arb_uuid().prop_map(CampaignId::new)
    }

    // === Enum Generators ===

    pub fn arb_agent_type() -> impl Strategy<Value = AgentType> {
        prop_oneof![
            Just(AgentType::Scout),
            Just(AgentType::Coach),
            Just(AgentType::Tracker),
            Just(AgentType::Insight),
        ]
    }

    /// Generate a behavior type that has a schema.
    pub fn arb_behavior_type() -> impl Strategy<Value = BehaviorType> {
        prop_oneof![
            Just(BehaviorType::Research),
            Just(BehaviorType::Planning),
            Just(BehaviorType::Followup),
            Just(BehaviorType::Analysis),
            Just(BehaviorType::Story),
            Just(BehaviorType::Custom),
        ]
    }

    /// Generate a behavior type, occasionally one without a schema.
    pub fn arb_any_behavior_type() -> impl Strategy<Value = BehaviorType> {
        prop_oneof![
            5 => arb_behavior_type(),
            1 => "[a-z]{3,10}".prop_map(|s| BehaviorType::from(s.as_str())),
        ]
    }

    pub fn arb_execution_mode() -> impl Strategy<Value = ExecutionMode> {
        prop_oneof![
            Just(ExecutionMode::Auto),
            Just(ExecutionMode::Manual),
            Just(ExecutionMode::Assist),
        ]
    }

    pub fn arb_clip_status() -> impl Strategy<Value = ClipStatus> {
        prop_oneof![
            Just(ClipStatus::Pending),
            Just(ClipStatus::Active),
            Just(ClipStatus::Completed),
            Just(ClipStatus::Rejected),
            Just(ClipStatus::Failed),
        ]
    }

    /// Generate a well-formed `(start_time, duration)` pair.
    pub fn arb_timing() -> impl Strategy<Value = (f64, f64)> {
        (0.0f64..250.0, 0.0f64..30.0)
    }

    // === Payload Generators ===

    fn arb_text() -> impl Strategy<Value = String> {
        "[A-Za-z0-9 ]{1,24}"
    }

    /// Generate a payload that satisfies the schema of `behavior`.
    pub fn arb_valid_payload(behavior: BehaviorType) -> BoxedStrategy<Value> {
        match behavior {
            BehaviorType::Research => (
                arb_text(),
                prop::sample::select(vec!["contacts", "playlists", "opportunities", "general"]),
                prop::option::of(prop::collection::vec(arb_text(), 0..3)),
            )
                .prop_map(|(query, target, sources)| {
                    let mut payload = json!({ "query": query, "targetType": target });
                    if let Some(sources) = sources {
                        payload["sources"] = json!(sources);
                    }
                    payload
                })
                .boxed(),
            BehaviorType::Planning => (arb_text(), any::<bool>())
                .prop_map(|(goal, sequence)| json!({ "goal": goal, "generateSequence": sequence }))
                .boxed(),
            BehaviorType::Followup => prop::option::of("[a-z]{3,8}")
                .prop_map(|user| match user {
                    Some(user) => json!({ "contactEmail": format!("{user}@label.com") }),
                    None => json!({}),
                })
                .boxed(),
            BehaviorType::Analysis => prop::sample::select(vec![
                "bottleneck",
                "performance",
                "sentiment",
                "workflow",
            ])
            .prop_map(|kind| json!({ "analysisType": kind }))
            .boxed(),
            BehaviorType::Story => prop::sample::select(vec![
                "excited",
                "worried",
                "blocked",
                "breakthrough",
                "reflective",
            ])
            .prop_map(|sentiment| json!({ "sentiment": sentiment }))
            .boxed(),
            BehaviorType::Custom | BehaviorType::Other(_) => {
                prop::collection::btree_map("[a-z]{1,8}", any::<i32>(), 0..4)
                    .prop_map(|m| json!(m))
                    .boxed()
            }
        }
    }

    /// Generate a clip whose agent may run its behavior and whose payload
    /// is valid. Interpreting it always succeeds under the default matrix.
    pub fn arb_valid_clip(campaign_id: CampaignId, track_id: TrackId) -> impl Strategy<Value = Clip> {
        let matrix = CompatibilityMatrix::default();
        arb_agent_type()
            .prop_flat_map(move |agent| {
                let allowed = matrix.allowed(agent).to_vec();
                (Just(agent), prop::sample::select(allowed))
            })
            .prop_flat_map(|(agent, behavior)| {
                (
                    Just(agent),
                    Just(behavior.clone()),
                    arb_valid_payload(behavior),
                    arb_execution_mode(),
                    arb_timing(),
                )
            })
            .prop_map(move |(agent, behavior, payload, mode, (start, duration))| {
                Clip::new(campaign_id, track_id, agent, behavior, "generated")
                    .with_payload(payload)
                    .with_execution_mode(mode)
                    .with_timing(start, duration)
            })
    }

    /// Generate a clip with arbitrary classification and possibly missing
    /// fields.
    pub fn arb_clip(campaign_id: CampaignId, track_id: TrackId) -> impl Strategy<Value = Clip> {
        (
            prop::option::of(arb_agent_type()),
            prop::option::of(arb_any_behavior_type()),
            any::<bool>(),
            arb_execution_mode(),
            arb_timing(),
        )
            .prop_map(move |(agent, behavior, has_id, mode, (start, duration))| {
                let mut clip = Clip::new(
                    campaign_id,
                    track_id,
                    agent.unwrap_or(AgentType::Scout),
                    behavior.clone().unwrap_or(BehaviorType::Custom),
                    "generated",
                )
                .with_execution_mode(mode)
                .with_timing(start, duration);
                clip.agent_type = agent;
                clip.behavior_type = behavior;
                if !has_id {
                    clip.id = None;
                }
                clip
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;

    /// Scout research clip with a valid payload.
    pub fn valid_research_clip(campaign_id: CampaignId, track_id: TrackId) -> Clip {
        Clip::new(
            campaign_id,
            track_id,
            AgentType::Scout,
            BehaviorType::Research,
            "Research contacts",
        )
        .with_payload(json!({ "query": "test", "targetType": "contacts" }))
    }

    /// Scout asked to plan: a valid planning payload on an agent that may
    /// not plan.
    pub fn scout_planning_clip(campaign_id: CampaignId, track_id: TrackId) -> Clip {
        Clip::new(
            campaign_id,
            track_id,
            AgentType::Scout,
            BehaviorType::Planning,
            "Plan release",
        )
        .with_payload(json!({ "goal": "x" }))
    }

    /// Research clip whose payload is missing `query`.
    pub fn research_missing_query_clip(campaign_id: CampaignId, track_id: TrackId) -> Clip {
        valid_research_clip(campaign_id, track_id).with_payload(json!({ "targetType": "contacts" }))
    }

    /// Coach planning clip with a valid payload.
    pub fn coach_planning_clip(campaign_id: CampaignId, track_id: TrackId) -> Clip {
        Clip::new(
            campaign_id,
            track_id,
            AgentType::Coach,
            BehaviorType::Planning,
            "Plan release",
        )
        .with_payload(json!({ "goal": "Release single", "constraints": ["budget"] }))
    }

    /// Insight story clip with a valid payload.
    pub fn insight_story_clip(campaign_id: CampaignId, track_id: TrackId) -> Clip {
        Clip::new(
            campaign_id,
            track_id,
            AgentType::Insight,
            BehaviorType::Story,
            "Weekly reflection",
        )
        .with_payload(json!({ "sentiment": "reflective" }))
    }

    /// Empty store holding one track per name, in order.
    pub fn store_with_tracks(names: &[&str]) -> (InMemoryClipStore, Vec<TrackId>) {
        let mut store = InMemoryClipStore::new(CampaignId::now_v7());
        let ids = names.iter().map(|n| store.add_track(n, None)).collect();
        (store, ids)
    }

    /// Scheduler with default config, one track and a recording executor.
    pub fn recording_scheduler() -> (TestScheduler, TrackId) {
        recording_scheduler_with(&EngineConfig::default())
    }

    pub fn recording_scheduler_with(config: &EngineConfig) -> (TestScheduler, TrackId) {
        let (store, tracks) = store_with_tracks(&["Main"]);
        let scheduler = Scheduler::new(
            config,
            ClipInterpreter::default(),
            store,
            RecordingExecutor::new(),
        );
        (scheduler, tracks[0])
    }

    /// Successful result for an instruction.
    pub fn success_for(instruction: &InterpretedInstruction) -> AgentResult {
        AgentResult::success(
            instruction.clip.id_or_nil(),
            instruction.agent_type.unwrap_or(AgentType::Scout),
            instruction.behavior_type.clone().unwrap_or(BehaviorType::Custom),
            "done",
        )
    }

    /// Failed result for an instruction.
    pub fn failure_for(instruction: &InterpretedInstruction, error: &str) -> AgentResult {
        AgentResult::failure(
            instruction.clip.id_or_nil(),
            instruction.agent_type.unwrap_or(AgentType::Scout),
            instruction.behavior_type.clone().unwrap_or(BehaviorType::Custom),
            "failed",
            vec![error.to_string()],
        )
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for cuesheet-specific checks.

    use super::*;

    /// Assert that a CuesheetResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &CuesheetResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a CuesheetResult is a Scheduler error.
    #[track_caller]
    pub fn assert_scheduler_error<T: std::fmt::Debug>(result: &CuesheetResult<T>) {
        match result {
            Err(CuesheetError::Scheduler(_)) => {}
            other => panic!("Expected Scheduler error, got: {:?}", other),
        }
    }

    /// Assert that a CuesheetResult is a Store error.
    #[track_caller]
    pub fn assert_store_error<T: std::fmt::Debug>(result: &CuesheetResult<T>) {
        match result {
            Err(CuesheetError::Store(_)) => {}
            other => panic!("Expected Store error, got: {:?}", other),
        }
    }

    #[track_caller]
    pub fn assert_valid(instruction: &InterpretedInstruction) {
        assert!(
            instruction.is_valid && instruction.errors.is_empty(),
            "Expected valid instruction, got errors: {:?}",
            instruction.error_messages()
        );
    }

    #[track_caller]
    pub fn assert_invalid(instruction: &InterpretedInstruction) {
        assert!(!instruction.is_valid, "Expected invalid instruction");
        assert!(!instruction.errors.is_empty(), "Invalid instruction without errors");
    }

    /// Assert a structural error names `field`.
    #[track_caller]
    pub fn assert_structural_error(instruction: &InterpretedInstruction, field: ClipField) {
        let found = instruction
            .errors
            .iter()
            .any(|e| matches!(e, InstructionError::Structural(s) if s.field == field));
        assert!(
            found,
            "Expected structural error for {}, got: {:?}",
            field,
            instruction.error_messages()
        );
    }

    /// Assert a payload error at `path`.
    #[track_caller]
    pub fn assert_payload_error_at(instruction: &InterpretedInstruction, path: &str) {
        let found = instruction
            .errors
            .iter()
            .any(|e| matches!(e, InstructionError::Payload(p) if p.path == path));
        assert!(
            found,
            "Expected payload error at {}, got: {:?}",
            path,
            instruction.error_messages()
        );
    }

    /// Assert a compatibility error for `agent` and `behavior`.
    #[track_caller]
    pub fn assert_compatibility_error(
        instruction: &InterpretedInstruction,
        agent: AgentType,
        behavior: &BehaviorType,
    ) {
        let found = instruction.errors.iter().any(|e| {
            matches!(e, InstructionError::Compatibility(c)
                if c.agent_type == agent && &c.behavior_type == behavior)
        });
        assert!(
            found,
            "Expected compatibility error for {}/{}, got: {:?}",
            agent,
            behavior,
            instruction.error_messages()
        );
    }

    /// Assert the stored status of a clip.
    #[track_caller]
    pub fn assert_status<S: ClipStore>(store: &S, clip_id: ClipId, expected: ClipStatus) {
        match store.clip(clip_id) {
            Some(clip) => assert_eq!(
                clip.status, expected,
                "Clip {} has status {}, expected {}",
                clip_id, clip.status, expected
            ),
            None => panic!("Clip {} not in store", clip_id),
        }
    }
}
