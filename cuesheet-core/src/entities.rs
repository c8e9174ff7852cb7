//! Entity types: clips, tracks and the execution context handed to agents

use crate::{
    AgentType, BehaviorType, CampaignId, ClipId, ClipStatus, EntityIdType, ExecutionMode,
    Timestamp, TrackId, UserId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form structured record carried alongside a clip.
pub type Metadata = Map<String, Value>;

// ============================================================================
// CLIP
// ============================================================================

/// A scheduled unit of work on the timeline.
///
/// `id`, `agent_type` and `behavior_type` are optional because clips can be
/// created incomplete by an editor and corrected later; the interpreter
/// reports what is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    #[serde(default)]
    pub id: Option<ClipId>,
    pub campaign_id: CampaignId,
    pub track_id: TrackId,

    #[serde(default)]
    pub agent_type: Option<AgentType>,
    #[serde(default)]
    pub behavior_type: Option<BehaviorType>,
    #[serde(default)]
    pub execution_mode: ExecutionMode,
    #[serde(default)]
    pub status: ClipStatus,

    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,

    /// Start on the timeline axis, in seconds (or beats when a tempo is set)
    pub start_time: f64,
    /// Length in the same unit as `start_time`
    pub duration: f64,

    /// Behavior-specific payload, validated at interpretation time
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub metadata: Metadata,
    /// Rendered error text for failed clips
    #[serde(default)]
    pub failure_reason: Option<String>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub completed_at: Option<Timestamp>,
}

impl Clip {
    /// Create a new pending clip with a fresh id, zero timing and an empty
    /// object payload.
    pub fn new(
        campaign_id: CampaignId,
        track_id: TrackId,
        agent_type: AgentType,
        behavior_type: BehaviorType,
        title: &str,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Some(ClipId::now_v7()),
            campaign_id,
            track_id,
            agent_type: Some(agent_type),
            behavior_type: Some(behavior_type),
            execution_mode: ExecutionMode::default(),
            status: ClipStatus::Pending,
            title: title.to_string(),
            description: None,
            color: None,
            start_time: 0.0,
            duration: 0.0,
            payload: Value::Object(Map::new()),
            metadata: Metadata::new(),
            failure_reason: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Set start time and duration.
    pub fn with_timing(mut self, start_time: f64, duration: f64) -> Self {
        self.start_time = start_time;
        self.duration = duration;
        self
    }

    /// Set the payload.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Set the execution mode.
    pub fn with_execution_mode(mut self, mode: ExecutionMode) -> Self {
        self.execution_mode = mode;
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Set the display color.
    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    /// Set the metadata record.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// End of the clip interval.
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    /// Whether `position` falls within `[start_time, start_time + duration]`.
    /// Both endpoints are inclusive, so a clip ending where the next one
    /// starts shares that instant with its successor.
    pub fn contains(&self, position: f64) -> bool {
        position >= self.start_time && position <= self.end_time()
    }

    /// Whether the closed interval shares any point with `[from, to]`.
    /// A range swept by the playhead selects every clip it touched, even one
    /// shorter than the step.
    pub fn overlaps(&self, from: f64, to: f64) -> bool {
        self.start_time <= to && self.end_time() >= from
    }

    /// Whether the timing interval is well-formed.
    pub fn has_valid_timing(&self) -> bool {
        self.start_time.is_finite()
            && self.duration.is_finite()
            && self.start_time >= 0.0
            && self.duration >= 0.0
    }

    /// Id for logs and errors; the nil id stands in for a missing one.
    pub fn id_or_nil(&self) -> ClipId {
        self.id.unwrap_or_else(ClipId::nil)
    }
}

// ============================================================================
// TRACK
// ============================================================================

/// An ordered container of clips within a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    pub campaign_id: CampaignId,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    /// Stable ordering among the campaign's tracks
    pub order: i32,
    #[serde(default)]
    pub muted: bool,
    #[serde(default)]
    pub solo: bool,
    /// Agent this track is dedicated to, if any
    #[serde(default)]
    pub agent_type: Option<AgentType>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Track {
    /// Create a new track.
    pub fn new(campaign_id: CampaignId, name: &str, order: i32) -> Self {
        let now = Utc::now();
        Self {
            id: TrackId::now_v7(),
            campaign_id,
            name: name.to_string(),
            color: None,
            order,
            muted: false,
            solo: false,
            agent_type: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the display color.
    pub fn with_color(mut self, color: &str) -> Self {
        self.color = Some(color.to_string());
        self
    }

    /// Dedicate the track to one agent type.
    pub fn for_agent(mut self, agent_type: AgentType) -> Self {
        self.agent_type = Some(agent_type);
        self
    }
}

/// Ids of the tracks whose clips should play.
///
/// When any track is soloed only soloed tracks play; otherwise every
/// unmuted track plays.
pub fn audible_tracks(tracks: &[Track]) -> Vec<TrackId> {
    let any_solo = tracks.iter().any(|t| t.solo);
    tracks
        .iter()
        .filter(|t| if any_solo { t.solo } else { !t.muted })
        .map(|t| t.id)
        .collect()
}

// ============================================================================
// EXECUTION CONTEXT
// ============================================================================

/// Everything an agent executor needs to run one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipExecutionContext {
    pub clip: Clip,
    pub track: Track,
    pub campaign_id: CampaignId,
    pub user_id: UserId,
    pub playhead_position: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn clip(start: f64, duration: f64) -> Clip {
        Clip::new(
            CampaignId::now_v7(),
            TrackId::now_v7(),
            AgentType::Scout,
            BehaviorType::Research,
            "Find playlists",
        )
        .with_timing(start, duration)
    }

    #[test]
    fn test_clip_new_defaults() {
        let clip = clip(0.0, 0.0);
        assert!(clip.id.is_some());
        assert_eq!(clip.status, ClipStatus::Pending);
        assert_eq!(clip.execution_mode, ExecutionMode::Auto);
        assert_eq!(clip.payload, json!({}));
        assert!(clip.completed_at.is_none());
    }

    #[test]
    fn test_clip_contains_is_closed_interval() {
        let clip = clip(10.0, 5.0);
        assert!(!clip.contains(9.999));
        assert!(clip.contains(10.0));
        assert!(clip.contains(12.0));
        assert!(clip.contains(15.0));
        assert!(!clip.contains(16.0));
    }

    #[test]
    fn test_zero_duration_clip_contains_its_start() {
        let clip = clip(3.0, 0.0);
        assert!(clip.contains(3.0));
        assert!(!clip.contains(3.1));
    }

    #[test]
    fn test_clip_overlaps_swept_range() {
        let instant = clip(3.0, 0.0);
        assert!(instant.overlaps(2.99, 3.01));
        assert!(instant.overlaps(3.0, 3.0));
        assert!(instant.overlaps(2.0, 3.0));
        assert!(!instant.overlaps(3.01, 4.0));

        let long = clip(10.0, 5.0);
        assert!(long.overlaps(15.0, 20.0));
        assert!(long.overlaps(11.0, 12.0));
        assert!(!long.overlaps(15.5, 20.0));
    }

    #[test]
    fn test_clip_timing_validation() {
        assert!(clip(0.0, 0.0).has_valid_timing());
        assert!(!clip(0.0, -1.0).has_valid_timing());
        assert!(!clip(-2.0, 1.0).has_valid_timing());
        assert!(!clip(f64::NAN, 1.0).has_valid_timing());
    }

    #[test]
    fn test_clip_deserializes_with_missing_fields() {
        let raw = json!({
            "campaignId": "0190a5c4-0000-7000-8000-000000000001",
            "trackId": "0190a5c4-0000-7000-8000-000000000002",
            "title": "Untitled",
            "startTime": 0,
            "duration": 4,
            "createdAt": "2024-06-01T12:00:00Z",
            "updatedAt": "2024-06-01T12:00:00Z"
        });
        let clip: Clip = serde_json::from_value(raw).expect("deserialize");
        assert!(clip.id.is_none());
        assert!(clip.agent_type.is_none());
        assert!(clip.behavior_type.is_none());
        assert_eq!(clip.payload, Value::Null);
        assert_eq!(clip.status, ClipStatus::Pending);
    }

    #[test]
    fn test_audible_tracks_respects_mute() {
        let campaign = CampaignId::now_v7();
        let a = Track::new(campaign, "Scout", 0);
        let mut b = Track::new(campaign, "Coach", 1);
        b.muted = true;

        let audible = audible_tracks(&[a.clone(), b]);
        assert_eq!(audible, vec![a.id]);
    }

    #[test]
    fn test_audible_tracks_solo_wins() {
        let campaign = CampaignId::now_v7();
        let a = Track::new(campaign, "Scout", 0);
        let mut b = Track::new(campaign, "Coach", 1);
        b.solo = true;
        b.muted = true;

        let audible = audible_tracks(&[a, b.clone()]);
        assert_eq!(audible, vec![b.id]);
    }
}
