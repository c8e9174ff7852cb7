//! Cuesheet Payload - Behavior Schemas
//!
//! Each behavior type defines the shape of the payload its clips carry.
//! [`validate_payload`] checks a raw JSON payload against that shape and
//! returns a typed [`ValidatedPayload`], or the first offending field with
//! its full path.
//!
//! Validation is structural only: presence, JSON type, enum membership,
//! email syntax, uuid syntax and time-range ordering.

mod reader;
mod schemas;

pub use reader::SchemaEnum;
pub use schemas::{
    is_valid_email, AnalysisKind, AnalysisPayload, FollowupPayload, PlanningPayload,
    ResearchPayload, ResearchTarget, StoryPayload, StorySentiment, TimeRange,
};

use cuesheet_core::{BehaviorType, SchemaError, UnknownBehaviorError};
use reader::ObjectReader;
use serde::Serialize;
use serde_json::{Map, Value};

/// A payload that passed its behavior's schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ValidatedPayload {
    Research(ResearchPayload),
    Planning(PlanningPayload),
    Followup(FollowupPayload),
    Analysis(AnalysisPayload),
    Story(StoryPayload),
    /// Any key/value record
    Custom(Map<String, Value>),
}

impl ValidatedPayload {
    /// The behavior type this payload belongs to.
    pub fn behavior_type(&self) -> BehaviorType {
        match self {
            ValidatedPayload::Research(_) => BehaviorType::Research,
            ValidatedPayload::Planning(_) => BehaviorType::Planning,
            ValidatedPayload::Followup(_) => BehaviorType::Followup,
            ValidatedPayload::Analysis(_) => BehaviorType::Analysis,
            ValidatedPayload::Story(_) => BehaviorType::Story,
            ValidatedPayload::Custom(_) => BehaviorType::Custom,
        }
    }

    /// Serialize back to JSON with defaults filled in.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Validate `raw` against the schema of `behavior_type`.
///
/// # Errors
/// - [`SchemaError::UnknownBehavior`] when no schema exists for the behavior.
/// - [`SchemaError::Payload`] naming the first field that does not match.
pub fn validate_payload(
    behavior_type: &BehaviorType,
    raw: &Value,
) -> Result<ValidatedPayload, SchemaError> {
    let root = || ObjectReader::root(behavior_type, raw);
    let payload = match behavior_type {
        BehaviorType::Research => ValidatedPayload::Research(ResearchPayload::read(&root()?)?),
        BehaviorType::Planning => ValidatedPayload::Planning(PlanningPayload::read(&root()?)?),
        BehaviorType::Followup => ValidatedPayload::Followup(FollowupPayload::read(&root()?)?),
        BehaviorType::Analysis => ValidatedPayload::Analysis(AnalysisPayload::read(&root()?)?),
        BehaviorType::Story => ValidatedPayload::Story(StoryPayload::read(&root()?)?),
        BehaviorType::Custom => ValidatedPayload::Custom(root()?.into_map()),
        BehaviorType::Other(name) => {
            return Err(UnknownBehaviorError {
                behavior_type: name.clone(),
            }
            .into())
        }
    };
    Ok(payload)
}

// =============================================================================
// TESTS
// =============================================================================
