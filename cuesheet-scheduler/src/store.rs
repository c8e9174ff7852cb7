//! Clip store: the authoritative clip and track collection

use chrono::Utc;
use cuesheet_core::config::MIN_GRID_DIVISION;
use cuesheet_core::{
    snap_to_grid, CampaignId, Clip, ClipId, ClipStatus, CuesheetResult, EntityIdType, StoreError,
    Timestamp, TimelineDefaults, Track, TrackId,
};

/// Default track colors, assigned round-robin by track count.
pub const TRACK_PALETTE: [&str; 7] = [
    "#3AA9BE", "#51CF66", "#F59E0B", "#8B5CF6", "#EF4444", "#EC4899", "#14B8A6",
];

/// Immutable copy of the store taken at the start of a tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub clips: Vec<Clip>,
    pub tracks: Vec<Track>,
}

/// Source of truth for clips and tracks, as seen by the scheduler.
///
/// Implementations own the records; the scheduler reads a snapshot per tick
/// and writes back status transitions and newly generated clips.
pub trait ClipStore {
    /// Copy of every live clip and track.
    fn snapshot(&self) -> StoreSnapshot;

    /// Get a clip by ID.
    fn clip(&self, id: ClipId) -> Option<Clip>;

    /// Apply a lifecycle transition to a stored clip.
    fn transition(&mut self, id: ClipId, next: ClipStatus, at: Timestamp) -> CuesheetResult<()>;

    /// Move a stored clip to `Failed` with a reason.
    fn fail(&mut self, id: ClipId, reason: &str, at: Timestamp) -> CuesheetResult<()>;

    /// Merge clips emitted by an agent. Every kept clip enters as `Pending`
    /// with no outcome, whatever status it arrived with. Clips that cannot
    /// be stored are dropped; returns how many were kept.
    fn insert_generated(&mut self, clips: Vec<Clip>) -> usize;

    /// Retire a terminal clip and replace it with a fresh pending instance.
    /// Returns the new clip's id.
    fn reset(&mut self, id: ClipId, at: Timestamp) -> CuesheetResult<ClipId>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Single-campaign in-memory store with the timeline editing operations.
#[derive(Debug, Clone)]
pub struct InMemoryClipStore {
    campaign_id: CampaignId,
    tracks: Vec<Track>,
    clips: Vec<Clip>,
    /// Terminal instances replaced by `reset`
    history: Vec<Clip>,
    grid_division: f64,
    snap_to_grid: bool,
}

impl InMemoryClipStore {
    /// Create an empty store with the default 1.0 snapping grid.
    pub fn new(campaign_id: CampaignId) -> Self {
        Self::from_defaults(campaign_id, &TimelineDefaults::default())
    }

    /// Create an empty store using the grid settings from `defaults`.
    pub fn from_defaults(campaign_id: CampaignId, defaults: &TimelineDefaults) -> Self {
        Self {
            campaign_id,
            tracks: Vec::new(),
            clips: Vec::new(),
            history: Vec::new(),
            grid_division: defaults.grid_division.max(MIN_GRID_DIVISION),
            snap_to_grid: defaults.snap_to_grid,
        }
    }

    pub fn campaign_id(&self) -> CampaignId {
        self.campaign_id
    }

    /// Tracks in display order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    /// Retired clip instances, oldest first.
    pub fn history(&self) -> &[Clip] {
        &self.history
    }

    pub fn track(&self, id: TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn clips_on_track(&self, id: TrackId) -> impl Iterator<Item = &Clip> {
        self.clips.iter().filter(move |c| c.track_id == id)
    }

    /// Change the snapping grid used by `move_clip` and `resize_clip`.
    pub fn set_grid(&mut self, grid_division: f64, snap_to_grid: bool) {
        self.grid_division = grid_division.max(MIN_GRID_DIVISION);
        self.snap_to_grid = snap_to_grid;
    }

    // === Track Operations ===

    /// Append a track. Without a color, one is taken from [`TRACK_PALETTE`].
    pub fn add_track(&mut self, name: &str, color: Option<&str>) -> TrackId {
        let index = self.tracks.len();
        let color = color.unwrap_or(TRACK_PALETTE[index % TRACK_PALETTE.len()]);
        let track = Track::new(self.campaign_id, name, index as i32).with_color(color);
        let id = track.id;
        self.tracks.push(track);
        tracing::debug!(track_id = %id, name, "Track added");
        id
    }

    /// Remove a track together with all of its clips.
    pub fn remove_track(&mut self, id: TrackId) -> Result<Track, StoreError> {
        let index = self
            .tracks
            .iter()
            .position(|t| t.id == id)
            .ok_or(StoreError::TrackNotFound { track_id: id })?;
        let track = self.tracks.remove(index);
        let before = self.clips.len();
        self.clips.retain(|c| c.track_id != id);
        tracing::debug!(
            track_id = %id,
            removed_clips = before - self.clips.len(),
            "Track removed"
        );
        Ok(track)
    }

    pub fn set_muted(&mut self, id: TrackId, muted: bool) -> Result<(), StoreError> {
        let track = self.track_mut(id)?;
        track.muted = muted;
        track.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_solo(&mut self, id: TrackId, solo: bool) -> Result<(), StoreError> {
        let track = self.track_mut(id)?;
        track.solo = solo;
        track.updated_at = Utc::now();
        Ok(())
    }

    /// Reorder tracks to follow `ids`. Unknown ids are ignored; tracks not
    /// listed keep their relative order after the listed ones.
    pub fn reorder_tracks(&mut self, ids: &[TrackId]) {
        let mut remaining = std::mem::take(&mut self.tracks);
        let mut ordered = Vec::with_capacity(remaining.len());
        for id in ids {
            if let Some(pos) = remaining.iter().position(|t| t.id == *id) {
                ordered.push(remaining.remove(pos));
            }
        }
        ordered.append(&mut remaining);

        let now = Utc::now();
        for (order, track) in ordered.iter_mut().enumerate() {
            track.order = order as i32;
            track.updated_at = now;
        }
        self.tracks = ordered;
        tracing::debug!(tracks = self.tracks.len(), "Tracks reordered");
    }

    fn track_mut(&mut self, id: TrackId) -> Result<&mut Track, StoreError> {
        self.tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StoreError::TrackNotFound { track_id: id })
    }

    // === Clip Operations ===

    /// Add a clip. A clip without an id is given one.
    ///
    /// # Errors
    /// Fails when the clip belongs to another campaign, names an unknown
    /// track, reuses an existing id, or has negative timing.
    pub fn add_clip(&mut self, mut clip: Clip) -> Result<ClipId, StoreError> {
        let id = *clip.id.get_or_insert_with(ClipId::now_v7);

        if clip.campaign_id != self.campaign_id {
            return Err(StoreError::CampaignMismatch {
                clip_id: id,
                expected: self.campaign_id,
                found: clip.campaign_id,
            });
        }
        if self.track(clip.track_id).is_none() {
            return Err(StoreError::TrackNotFound {
                track_id: clip.track_id,
            });
        }
        if self.clips.iter().any(|c| c.id == Some(id)) {
            return Err(StoreError::DuplicateClip { clip_id: id });
        }
        if !clip.has_valid_timing() {
            return Err(StoreError::InvalidTiming {
                clip_id: id,
                start_time: clip.start_time,
                duration: clip.duration,
            });
        }

        self.clips.push(clip);
        tracing::debug!(clip_id = %id, "Clip added");
        Ok(id)
    }

    /// Delete a clip outright.
    pub fn remove_clip(&mut self, id: ClipId) -> Result<Clip, StoreError> {
        let index = self.clip_index(id)?;
        tracing::debug!(clip_id = %id, "Clip removed");
        Ok(self.clips.remove(index))
    }

    /// Move a clip to `track_id` at `start_time`, snapped to the grid when
    /// snapping is on. Negative starts clamp to zero.
    pub fn move_clip(
        &mut self,
        id: ClipId,
        track_id: TrackId,
        start_time: f64,
    ) -> Result<(), StoreError> {
        if self.track(track_id).is_none() {
            return Err(StoreError::TrackNotFound { track_id });
        }
        let (snap, grid) = (self.snap_to_grid, self.grid_division);

        let clip = self.clip_mut(id)?;
        if !start_time.is_finite() {
            return Err(StoreError::InvalidTiming {
                clip_id: id,
                start_time,
                duration: clip.duration,
            });
        }
        let start = if snap { snap_to_grid(start_time, grid) } else { start_time };

        clip.track_id = track_id;
        clip.start_time = start.max(0.0);
        clip.updated_at = Utc::now();
        tracing::debug!(
            clip_id = %id,
            track_id = %track_id,
            start_time = clip.start_time,
            "Clip moved"
        );
        Ok(())
    }

    /// Set a clip's duration. With snapping the duration rounds to the grid
    /// and is at least one grid cell; without it the minimum is
    /// [`MIN_GRID_DIVISION`].
    pub fn resize_clip(&mut self, id: ClipId, duration: f64) -> Result<(), StoreError> {
        let (snap, grid) = (self.snap_to_grid, self.grid_division);

        let clip = self.clip_mut(id)?;
        if !duration.is_finite() {
            return Err(StoreError::InvalidTiming {
                clip_id: id,
                start_time: clip.start_time,
                duration,
            });
        }
        clip.duration = if snap {
            snap_to_grid(duration, grid).max(grid)
        } else {
            duration.max(MIN_GRID_DIVISION)
        };
        clip.updated_at = Utc::now();
        tracing::debug!(clip_id = %id, duration = clip.duration, "Clip resized");
        Ok(())
    }

    fn clip_index(&self, id: ClipId) -> Result<usize, StoreError> {
        self.clips
            .iter()
            .position(|c| c.id == Some(id))
            .ok_or(StoreError::ClipNotFound { clip_id: id })
    }

    fn clip_mut(&mut self, id: ClipId) -> Result<&mut Clip, StoreError> {
        self.clips
            .iter_mut()
            .find(|c| c.id == Some(id))
            .ok_or(StoreError::ClipNotFound { clip_id: id })
    }
}

impl ClipStore for InMemoryClipStore {
    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            clips: self.clips.clone(),
            tracks: self.tracks.clone(),
        }
    }

    fn clip(&self, id: ClipId) -> Option<Clip> {
        self.clips.iter().find(|c| c.id == Some(id)).cloned()
    }

    fn transition(&mut self, id: ClipId, next: ClipStatus, at: Timestamp) -> CuesheetResult<()> {
        self.clip_mut(id)?.transition(next, at)?;
        Ok(())
    }

    fn fail(&mut self, id: ClipId, reason: &str, at: Timestamp) -> CuesheetResult<()> {
        self.clip_mut(id)?.fail(reason, at)?;
        Ok(())
    }

    fn insert_generated(&mut self, clips: Vec<Clip>) -> usize {
        let mut kept = 0;
        for mut clip in clips {
            if clip.status != ClipStatus::Pending {
                tracing::debug!(
                    clip_id = %clip.id_or_nil(),
                    status = %clip.status,
                    "Generated clip reset to pending"
                );
            }
            clip.status = ClipStatus::Pending;
            clip.failure_reason = None;
            clip.completed_at = None;

            let title = clip.title.clone();
            match self.add_clip(clip) {
                Ok(_) => kept += 1,
                Err(e) => {
                    tracing::warn!(error = %e, title = %title, "Dropping generated clip");
                }
            }
        }
        kept
    }

    fn reset(&mut self, id: ClipId, at: Timestamp) -> CuesheetResult<ClipId> {
        let index = self.clip_index(id)?;
        let status = self.clips[index].status;
        if !status.is_terminal() {
            return Err(StoreError::NotResettable {
                clip_id: id,
                status,
            }
            .into());
        }

        let fresh = self.clips[index].fresh_instance(at);
        let fresh_id = fresh.id_or_nil();
        let retired = std::mem::replace(&mut self.clips[index], fresh);
        self.history.push(retired);
        tracing::debug!(clip_id = %id, new_clip_id = %fresh_id, "Clip reset");
        Ok(fresh_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cuesheet_core::{AgentType, BehaviorType};

    fn store_with_track() -> (InMemoryClipStore, TrackId) {
        let mut store = InMemoryClipStore::new(CampaignId::now_v7());
        let track = store.add_track("Scout", None);
        (store, track)
    }

    fn clip_on(store: &InMemoryClipStore, track: TrackId) -> Clip {
        Clip::new(
            store.campaign_id(),
            track,
            AgentType::Scout,
            BehaviorType::Custom,
            "clip",
        )
        .with_timing(2.0, 4.0)
    }

    #[test]
    fn test_add_track_assigns_order_and_palette() {
        let mut store = InMemoryClipStore::new(CampaignId::now_v7());
        let a = store.add_track("A", None);
        let b = store.add_track("B", Some("#000000"));
        let c = store.add_track("C", None);

        assert_eq!(store.track(a).map(|t| t.order), Some(0));
        assert_eq!(store.track(b).map(|t| t.order), Some(1));
        assert_eq!(store.track(a).and_then(|t| t.color.clone()), Some("#3AA9BE".to_string()));
        assert_eq!(store.track(b).and_then(|t| t.color.clone()), Some("#000000".to_string()));
        assert_eq!(store.track(c).and_then(|t| t.color.clone()), Some("#F59E0B".to_string()));
    }

    #[test]
    fn test_remove_track_removes_its_clips() {
        let (mut store, track) = store_with_track();
        let other = store.add_track("Coach", None);
        let clip = clip_on(&store, track);
        store.add_clip(clip).expect("add");
        let kept = clip_on(&store, other);
        store.add_clip(kept).expect("add");

        store.remove_track(track).expect("remove");
        assert_eq!(store.clips().len(), 1);
        assert_eq!(store.clips()[0].track_id, other);
        assert!(matches!(
            store.remove_track(track),
            Err(StoreError::TrackNotFound { .. })
        ));
    }

    #[test]
    fn test_reorder_tracks() {
        let mut store = InMemoryClipStore::new(CampaignId::now_v7());
        let a = store.add_track("A", None);
        let b = store.add_track("B", None);
        let c = store.add_track("C", None);

        store.reorder_tracks(&[c, TrackId::now_v7(), a]);
        let ids: Vec<TrackId> = store.tracks().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![c, a, b]);
        let orders: Vec<i32> = store.tracks().iter().map(|t| t.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_add_clip_assigns_missing_id() {
        let (mut store, track) = store_with_track();
        let mut clip = clip_on(&store, track);
        clip.id = None;
        let id = store.add_clip(clip).expect("add");
        assert_eq!(store.clip(id).and_then(|c| c.id), Some(id));
    }

    #[test]
    fn test_add_clip_rejects_bad_input() {
        let (mut store, track) = store_with_track();

        let clip = clip_on(&store, track);
        store.add_clip(clip.clone()).expect("add");
        assert!(matches!(
            store.add_clip(clip),
            Err(StoreError::DuplicateClip { .. })
        ));

        let orphan = clip_on(&store, TrackId::now_v7());
        assert!(matches!(
            store.add_clip(orphan),
            Err(StoreError::TrackNotFound { .. })
        ));

        let negative = clip_on(&store, track).with_timing(1.0, -1.0);
        assert!(matches!(
            store.add_clip(negative),
            Err(StoreError::InvalidTiming { .. })
        ));

        let mut foreign = clip_on(&store, track);
        foreign.campaign_id = CampaignId::now_v7();
        assert!(matches!(
            store.add_clip(foreign),
            Err(StoreError::CampaignMismatch { .. })
        ));
    }

    #[test]
    fn test_move_clip_snaps_to_grid() {
        let (mut store, track) = store_with_track();
        let other = store.add_track("Coach", None);
        let id = store.add_clip(clip_on(&store, track)).expect("add");

        store.move_clip(id, other, 7.4).expect("move");
        let clip = store.clip(id).expect("clip");
        assert_eq!(clip.start_time, 7.0);
        assert_eq!(clip.track_id, other);

        store.move_clip(id, other, -3.0).expect("move");
        assert_eq!(store.clip(id).map(|c| c.start_time), Some(0.0));
    }

    #[test]
    fn test_move_clip_without_snapping() {
        let (mut store, track) = store_with_track();
        store.set_grid(1.0, false);
        let id = store.add_clip(clip_on(&store, track)).expect("add");
        store.move_clip(id, track, 7.4).expect("move");
        assert_eq!(store.clip(id).map(|c| c.start_time), Some(7.4));
    }

    #[test]
    fn test_resize_clip_minimums() {
        let (mut store, track) = store_with_track();
        let id = store.add_clip(clip_on(&store, track)).expect("add");

        store.resize_clip(id, 0.2).expect("resize");
        assert_eq!(store.clip(id).map(|c| c.duration), Some(1.0));
        store.resize_clip(id, 3.6).expect("resize");
        assert_eq!(store.clip(id).map(|c| c.duration), Some(4.0));

        store.set_grid(1.0, false);
        store.resize_clip(id, 0.01).expect("resize");
        assert_eq!(store.clip(id).map(|c| c.duration), Some(MIN_GRID_DIVISION));
    }

    #[test]
    fn test_transition_through_store() {
        let (mut store, track) = store_with_track();
        let id = store.add_clip(clip_on(&store, track)).expect("add");
        let now = Utc::now();

        store.transition(id, ClipStatus::Active, now).expect("activate");
        assert!(store.transition(id, ClipStatus::Pending, now).is_err());
        store.fail(id, "agent crashed", now).expect("fail");

        let clip = store.clip(id).expect("clip");
        assert_eq!(clip.status, ClipStatus::Failed);
        assert_eq!(clip.failure_reason.as_deref(), Some("agent crashed"));
    }

    #[test]
    fn test_reset_retires_terminal_clip() {
        let (mut store, track) = store_with_track();
        let id = store.add_clip(clip_on(&store, track)).expect("add");
        let now = Utc::now();

        assert!(store.reset(id, now).is_err());

        store.fail(id, "bad", now).expect("fail");
        let fresh = store.reset(id, now).expect("reset");

        assert_ne!(fresh, id);
        assert!(store.clip(id).is_none());
        assert_eq!(store.clip(fresh).map(|c| c.status), Some(ClipStatus::Pending));
        assert_eq!(store.history().len(), 1);
        assert_eq!(store.history()[0].status, ClipStatus::Failed);
        assert_eq!(store.clips().len(), 1);
    }

    #[test]
    fn test_insert_generated_drops_unstorable_clips() {
        let (mut store, track) = store_with_track();
        let good = clip_on(&store, track);
        let orphan = clip_on(&store, TrackId::now_v7());

        assert_eq!(store.insert_generated(vec![good, orphan]), 1);
        assert_eq!(store.clips().len(), 1);
    }

    #[test]
    fn test_insert_generated_enters_as_pending() {
        let (mut store, track) = store_with_track();
        let mut active = clip_on(&store, track);
        active.status = ClipStatus::Active;
        let mut done = clip_on(&store, track);
        done.status = ClipStatus::Completed;
        done.completed_at = Some(Utc::now());
        let mut failed = clip_on(&store, track);
        failed.status = ClipStatus::Failed;
        failed.failure_reason = Some("boom".to_string());

        assert_eq!(store.insert_generated(vec![active, done, failed]), 3);
        for clip in store.clips() {
            assert_eq!(clip.status, ClipStatus::Pending);
            assert!(clip.completed_at.is_none());
            assert!(clip.failure_reason.is_none());
        }
    }
}
