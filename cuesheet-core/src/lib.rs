//! Cuesheet Core - Entity Types
//!
//! Data model for the timeline instruction engine: clips, tracks, playback
//! state, the clip status lifecycle, configuration, and the error taxonomy.
//! All other crates depend on this one.

pub mod config;
mod entities;
mod enums;
mod error;
mod identity;
mod lifecycle;
mod time;
mod timeline;

pub use config::{EngineConfig, SchedulerConfig, TimelineDefaults};
pub use entities::{audible_tracks, Clip, ClipExecutionContext, Metadata, Track};
pub use enums::{
    AgentType, AgentTypeParseError, BehaviorType, ClipStatus, ClipStatusParseError,
    ExecutionMode, ExecutionModeParseError,
};
pub use error::{
    ClipField, CompatibilityError, ConfigError, CuesheetError, CuesheetResult, DispatchError,
    InstructionError, LifecycleError, PayloadValidationError, SchedulerError, SchemaError,
    StoreError, StructuralError, UnknownBehaviorError,
};
pub use identity::{
    CampaignId, ClipId, EntityIdType, IdParseError, Timestamp, TrackId, UserId,
};
pub use time::{beats_to_seconds, seconds_to_beats, snap_to_grid};
pub use timeline::{Advance, LoopRegion, TimelineState};
