//! Playhead scheduler
//!
//! Each [`Scheduler::tick`] advances the playhead, snapshots the store, picks
//! the pending clips touched by the range the playhead swept and applies
//! execution-mode policy:
//! `auto` and `assist` clips are dispatched, `manual` clips are surfaced, and
//! invalid instructions fail without ever becoming active.
//!
//! Dispatch is edge-triggered on `pending -> active`. Clips that already
//! reached a terminal state are skipped on every later pass, including loop
//! replays, until the store resets them.

use crate::{AgentExecutor, AgentResult, ClipStore};
use chrono::Utc;
use cuesheet_core::{
    audible_tracks, Advance, Clip, ClipId, ClipStatus, CuesheetResult, EngineConfig, SchedulerConfig,
    SchedulerError, StoreError, TimelineState, TrackId,
};
use cuesheet_interpreter::{ClipInterpreter, InterpretedInstruction};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    /// Playhead position after the advance
    pub position: f64,
    pub looped: bool,
    /// Playback reached the end of the timeline
    pub stopped: bool,
    /// Clips moved to `active` and handed to the executor
    pub dispatched: Vec<ClipId>,
    /// Valid manual clips waiting for an explicit run
    pub surfaced: Vec<InterpretedInstruction>,
    /// Invalid instructions; their clips are now `failed`
    pub invalid: Vec<InterpretedInstruction>,
    /// Clips the executor refused; now `failed`
    pub dispatch_failed: Vec<ClipId>,
    /// Eligible clips left `pending` by the dispatch cap
    pub deferred: Vec<ClipId>,
}

/// What one batch of agent results did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyReport {
    pub completed: Vec<ClipId>,
    pub failed: Vec<ClipId>,
    /// Successful assist results held until approved or rejected
    pub awaiting_approval: Vec<ClipId>,
    /// Results for unknown clips or clips that were not active
    pub ignored: Vec<ClipId>,
    /// Generated clips merged into the store
    pub generated: usize,
}

/// Drives clips through their lifecycle as the playhead moves.
pub struct Scheduler<S: ClipStore, E: AgentExecutor> {
    config: SchedulerConfig,
    interpreter: ClipInterpreter,
    timeline: TimelineState,
    store: S,
    executor: E,
    /// Successful assist results, keyed by clip
    awaiting_approval: HashMap<ClipId, AgentResult>,
    results_tx: mpsc::UnboundedSender<AgentResult>,
    results_rx: mpsc::UnboundedReceiver<AgentResult>,
}

impl<S: ClipStore, E: AgentExecutor> Scheduler<S, E> {
    /// Create a scheduler with a stopped timeline built from `config`.
    pub fn new(config: &EngineConfig, interpreter: ClipInterpreter, store: S, executor: E) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self {
            config: config.scheduler.clone(),
            interpreter,
            timeline: TimelineState::from_defaults(&config.timeline),
            store,
            executor,
            awaiting_approval: HashMap::new(),
            results_tx,
            results_rx,
        }
    }

    pub fn timeline(&self) -> &TimelineState {
        &self.timeline
    }

    /// Direct access for view controls (zoom, grid, tempo).
    pub fn timeline_mut(&mut self) -> &mut TimelineState {
        &mut self.timeline
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Edits made here become visible to the next tick.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn interpreter(&self) -> &ClipInterpreter {
        &self.interpreter
    }

    /// A handle agents use to report results. Results are applied by
    /// [`Scheduler::drain_inbox`].
    pub fn result_sender(&self) -> mpsc::UnboundedSender<AgentResult> {
        self.results_tx.clone()
    }

    // === Playback ===

    pub fn play(&mut self) {
        self.timeline.play();
        tracing::info!(position = self.timeline.position, "Playback started");
    }

    pub fn pause(&mut self) {
        self.timeline.pause();
        tracing::info!(position = self.timeline.position, "Playback paused");
    }

    /// Pause and rewind. Active clips keep running.
    pub fn stop(&mut self) {
        self.timeline.pause();
        self.timeline.seek(0.0);
        tracing::info!("Playback stopped");
    }

    pub fn seek(&mut self, position: f64) {
        self.timeline.seek(position);
    }

    pub fn set_loop(&mut self, start: f64, end: f64) -> CuesheetResult<()> {
        self.timeline.set_loop(start, end)?;
        Ok(())
    }

    pub fn clear_loop(&mut self) {
        self.timeline.clear_loop();
    }

    // === Tick ===

    /// Advance the playhead by `delta` timeline units and act on every clip
    /// the playhead passed over. Does nothing while paused.
    pub fn tick(&mut self, delta: f64) -> TickReport {
        if !self.timeline.playing {
            return TickReport {
                position: self.timeline.position,
                ..TickReport::default()
            };
        }

        let advance = self.timeline.tick(delta);
        let mut report = TickReport {
            position: advance.to,
            looped: advance.looped,
            stopped: advance.stopped,
            ..TickReport::default()
        };
        if advance.looped {
            tracing::info!(from = advance.from, to = advance.to, "Playhead looped");
        }

        let sweep = self.swept_ranges(&advance);
        let candidates = self.candidates(&sweep);
        tracing::debug!(
            from = advance.from,
            position = advance.to,
            candidates = candidates.len(),
            "Scheduler tick"
        );

        for instruction in candidates {
            self.consider(instruction, &mut report);
        }
        report
    }

    /// Closed ranges the playhead covered during one advance. A loop wrap
    /// covers the tail of the loop region and then its start.
    fn swept_ranges(&self, advance: &Advance) -> Vec<(f64, f64)> {
        match self.timeline.loop_region {
            Some(region) if advance.looped => {
                vec![(advance.from, region.end), (region.start, advance.to)]
            }
            _ => vec![(advance.from, advance.to)],
        }
    }

    /// Pending clips touched by the swept ranges, interpreted and in
    /// dispatch order.
    fn candidates(&mut self, sweep: &[(f64, f64)]) -> Vec<InterpretedInstruction> {
        let snapshot = self.store.snapshot();
        self.prune_approvals(&snapshot.clips);

        let audible: Option<HashSet<TrackId>> = self
            .config
            .respect_track_flags
            .then(|| audible_tracks(&snapshot.tracks).into_iter().collect());
        let track_order: HashMap<TrackId, i32> =
            snapshot.tracks.iter().map(|t| (t.id, t.order)).collect();

        let mut due: Vec<_> = snapshot
            .clips
            .into_iter()
            .filter(|c| c.status == ClipStatus::Pending)
            .filter(|c| sweep.iter().any(|&(from, to)| c.overlaps(from, to)))
            .filter(|c| audible.as_ref().map_or(true, |a| a.contains(&c.track_id)))
            .collect();

        due.sort_by(|a, b| {
            let order = |id: &TrackId| track_order.get(id).copied().unwrap_or(i32::MAX);
            a.start_time
                .total_cmp(&b.start_time)
                .then_with(|| order(&a.track_id).cmp(&order(&b.track_id)))
        });

        self.interpreter.interpret_many(&due)
    }

    fn consider(&mut self, instruction: InterpretedInstruction, report: &mut TickReport) {
        let Some(clip_id) = instruction.clip_id() else {
            tracing::warn!(
                errors = ?instruction.error_messages(),
                "Clip without id cannot be scheduled"
            );
            report.invalid.push(instruction);
            return;
        };

        if let Some(reason) = instruction.failure_reason() {
            tracing::warn!(clip_id = %clip_id, reason = %reason, "Invalid instruction");
            if let Err(e) = self.store.fail(clip_id, &reason, Utc::now()) {
                tracing::warn!(clip_id = %clip_id, error = %e, "Failed to mark clip failed");
            }
            report.invalid.push(instruction);
            return;
        }

        if !instruction.execution_mode.dispatches_automatically() {
            report.surfaced.push(instruction);
            return;
        }

        if let Some(cap) = self.config.max_dispatches_per_tick {
            if report.dispatched.len() + report.dispatch_failed.len() >= cap {
                report.deferred.push(clip_id);
                return;
            }
        }

        match self.activate(clip_id, &instruction) {
            Ok(()) => report.dispatched.push(clip_id),
            Err(_) => report.dispatch_failed.push(clip_id),
        }
    }

    /// Move a pending clip to `active` and hand it to the executor. A refused
    /// dispatch fails the clip.
    fn activate(&mut self, clip_id: ClipId, instruction: &InterpretedInstruction) -> CuesheetResult<()> {
        self.store.transition(clip_id, ClipStatus::Active, Utc::now())?;

        if let Err(e) = self.executor.dispatch(instruction) {
            tracing::warn!(clip_id = %clip_id, error = %e, "Dispatch failed");
            self.store.fail(clip_id, &e.to_string(), Utc::now())?;
            return Err(e.into());
        }

        tracing::info!(
            clip_id = %clip_id,
            agent_type = ?instruction.agent_type,
            mode = %instruction.execution_mode,
            "Clip dispatched"
        );
        Ok(())
    }

    // === Manual Run ===

    /// Run a pending clip now, regardless of playhead and execution mode.
    ///
    /// # Errors
    /// - the clip is unknown or not pending
    /// - the instruction is invalid (the clip is failed)
    /// - the executor refuses it (the clip is failed)
    pub fn run_clip(&mut self, clip_id: ClipId) -> CuesheetResult<InterpretedInstruction> {
        let clip = self
            .store
            .clip(clip_id)
            .ok_or(StoreError::ClipNotFound { clip_id })?;
        if clip.status != ClipStatus::Pending {
            return Err(SchedulerError::NotRunnable {
                clip_id,
                status: clip.status,
            }
            .into());
        }

        let instruction = self.interpreter.interpret(&clip);
        if let Some(reason) = instruction.failure_reason() {
            tracing::warn!(clip_id = %clip_id, reason = %reason, "Invalid instruction on manual run");
            self.store.fail(clip_id, &reason, Utc::now())?;
            return Err(SchedulerError::InvalidInstruction {
                clip_id,
                errors: instruction.error_messages(),
            }
            .into());
        }

        self.activate(clip_id, &instruction)?;
        tracing::info!(clip_id = %clip_id, "Clip run manually");
        Ok(instruction)
    }

    // === Results ===

    /// Apply every result waiting in the inbox.
    pub fn drain_inbox(&mut self) -> ApplyReport {
        let mut results = Vec::new();
        while let Ok(result) = self.results_rx.try_recv() {
            results.push(result);
        }
        self.apply_results(results)
    }

    /// Apply agent results. Successful assist results are held for approval;
    /// other successes complete the clip and merge its generated clips.
    pub fn apply_results(&mut self, results: impl IntoIterator<Item = AgentResult>) -> ApplyReport {
        let mut report = ApplyReport::default();
        let clips = self.store.snapshot().clips;
        self.prune_approvals(&clips);

        for result in results {
            let clip_id = result.clip_id;
            let Some(clip) = self.store.clip(clip_id) else {
                tracing::warn!(clip_id = %clip_id, "Result for unknown clip");
                report.ignored.push(clip_id);
                continue;
            };
            if clip.status != ClipStatus::Active || self.awaiting_approval.contains_key(&clip_id) {
                tracing::warn!(clip_id = %clip_id, status = %clip.status, "Result for clip that is not running");
                report.ignored.push(clip_id);
                continue;
            }

            if !result.success {
                let reason = result.failure_reason();
                match self.store.fail(clip_id, &reason, Utc::now()) {
                    Ok(()) => report.failed.push(clip_id),
                    Err(e) => {
                        tracing::warn!(clip_id = %clip_id, error = %e, "Failed to record agent failure");
                        report.ignored.push(clip_id);
                    }
                }
                continue;
            }

            if clip.execution_mode.requires_approval() {
                tracing::info!(clip_id = %clip_id, "Result awaiting approval");
                self.awaiting_approval.insert(clip_id, result);
                report.awaiting_approval.push(clip_id);
                continue;
            }

            match self.complete(result) {
                Ok(generated) => {
                    report.completed.push(clip_id);
                    report.generated += generated;
                }
                Err(e) => {
                    tracing::warn!(clip_id = %clip_id, error = %e, "Failed to complete clip");
                    report.ignored.push(clip_id);
                }
            }
        }
        report
    }

    fn complete(&mut self, result: AgentResult) -> CuesheetResult<usize> {
        self.store
            .transition(result.clip_id, ClipStatus::Completed, Utc::now())?;
        Ok(self.store.insert_generated(result.generated_clips))
    }

    // === Approval ===

    /// Drop held results whose clip left the store.
    fn prune_approvals(&mut self, clips: &[Clip]) {
        if self.awaiting_approval.is_empty() {
            return;
        }
        let live: HashSet<ClipId> = clips.iter().filter_map(|c| c.id).collect();
        self.awaiting_approval.retain(|clip_id, _| {
            let keep = live.contains(clip_id);
            if !keep {
                tracing::info!(clip_id = %clip_id, "Dropping held result for removed clip");
            }
            keep
        });
    }

    /// Results held for approval.
    pub fn awaiting_approval(&self) -> impl Iterator<Item = &AgentResult> {
        self.awaiting_approval.values()
    }

    pub fn is_awaiting_approval(&self, clip_id: ClipId) -> bool {
        self.awaiting_approval.contains_key(&clip_id)
    }

    /// Accept a held assist result: the clip completes and its generated
    /// clips are merged. Returns how many generated clips were kept.
    pub fn approve(&mut self, clip_id: ClipId) -> CuesheetResult<usize> {
        let result = self
            .awaiting_approval
            .remove(&clip_id)
            .ok_or(SchedulerError::NotAwaitingApproval { clip_id })?;
        let generated = self.complete(result)?;
        tracing::info!(clip_id = %clip_id, generated, "Result approved");
        Ok(generated)
    }

    /// Decline a held assist result: the clip is rejected and its output
    /// discarded.
    pub fn reject(&mut self, clip_id: ClipId) -> CuesheetResult<()> {
        if self.awaiting_approval.remove(&clip_id).is_none() {
            return Err(SchedulerError::NotAwaitingApproval { clip_id }.into());
        }
        self.store
            .transition(clip_id, ClipStatus::Rejected, Utc::now())?;
        tracing::info!(clip_id = %clip_id, "Result rejected");
        Ok(())
    }

    /// Make a terminal clip eligible again as a new pending instance.
    pub fn reset_clip(&mut self, clip_id: ClipId) -> CuesheetResult<ClipId> {
        let fresh = self.store.reset(clip_id, Utc::now())?;
        tracing::info!(clip_id = %clip_id, new_clip_id = %fresh, "Clip reset");
        Ok(fresh)
    }
}

// =============================================================================
// TESTS
// =============================================================================
