//! Clip status lifecycle.
//!
//! # State Transition Diagram
//!
//! ```text
//! Pending ──┬── dispatch ──→ Active ──┬── success (approved) ──→ Completed
//!           │                         ├── failure ────────────→ Failed
//!           │                         └── approval declined ──→ Rejected
//!           └── invalid instruction ──→ Failed
//! ```
//!
//! Completed, Failed and Rejected are terminal for a clip instance. Replaying
//! a clip creates a new pending instance via [`Clip::fresh_instance`]; the
//! terminal clip itself is never moved back.

use crate::{Clip, ClipId, ClipStatus, EntityIdType, LifecycleError, Timestamp};

impl ClipStatus {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: ClipStatus) -> bool {
        matches!(
            (self, next),
            (ClipStatus::Pending, ClipStatus::Active)
                | (ClipStatus::Pending, ClipStatus::Failed)
                | (ClipStatus::Active, ClipStatus::Completed)
                | (ClipStatus::Active, ClipStatus::Failed)
                | (ClipStatus::Active, ClipStatus::Rejected)
        )
    }
}

impl Clip {
    /// Move the clip to `next`, stamping `updated_at` (and `completed_at` on
    /// terminal states).
    pub fn transition(&mut self, next: ClipStatus, at: Timestamp) -> Result<(), LifecycleError> {
        if !self.status.can_transition_to(next) {
            return Err(LifecycleError::InvalidTransition {
                clip_id: self.id_or_nil(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = at;
        if next.is_terminal() {
            self.completed_at = Some(at);
        }
        Ok(())
    }

    /// Transition to `Failed`, recording why.
    pub fn fail(&mut self, reason: &str, at: Timestamp) -> Result<(), LifecycleError> {
        self.transition(ClipStatus::Failed, at)?;
        self.failure_reason = Some(reason.to_string());
        Ok(())
    }

    /// A new pending instance of this clip with a fresh id. Timing, payload
    /// and classification are kept; outcome fields are cleared.
    pub fn fresh_instance(&self, at: Timestamp) -> Clip {
        let mut clip = self.clone();
        clip.id = Some(ClipId::now_v7());
        clip.status = ClipStatus::Pending;
        clip.failure_reason = None;
        clip.completed_at = None;
        clip.created_at = at;
        clip.updated_at = at;
        clip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AgentType, BehaviorType, CampaignId, TrackId};
    use chrono::Utc;

    const ALL: [ClipStatus; 5] = [
        ClipStatus::Pending,
        ClipStatus::Active,
        ClipStatus::Completed,
        ClipStatus::Rejected,
        ClipStatus::Failed,
    ];

    fn make_clip() -> Clip {
        Clip::new(
            CampaignId::now_v7(),
            TrackId::now_v7(),
            AgentType::Coach,
            BehaviorType::Planning,
            "Plan release week",
        )
    }

    #[test]
    fn test_happy_path() {
        let mut clip = make_clip();
        let now = Utc::now();

        clip.transition(ClipStatus::Active, now).expect("pending -> active");
        assert!(clip.completed_at.is_none());

        clip.transition(ClipStatus::Completed, now).expect("active -> completed");
        assert_eq!(clip.status, ClipStatus::Completed);
        assert_eq!(clip.completed_at, Some(now));
    }

    #[test]
    fn test_pending_can_fail_directly() {
        let mut clip = make_clip();
        clip.fail("Clip missing agentType", Utc::now()).expect("pending -> failed");
        assert_eq!(clip.status, ClipStatus::Failed);
        assert_eq!(clip.failure_reason.as_deref(), Some("Clip missing agentType"));
    }

    #[test]
    fn test_pending_cannot_complete() {
        let mut clip = make_clip();
        let err = clip.transition(ClipStatus::Completed, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::InvalidTransition {
                from: ClipStatus::Pending,
                to: ClipStatus::Completed,
                ..
            }
        ));
        assert_eq!(clip.status, ClipStatus::Pending);
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be illegal");
            }
        }
    }

    #[test]
    fn test_nothing_moves_back_to_pending() {
        for from in ALL {
            assert!(!from.can_transition_to(ClipStatus::Pending));
        }
    }

    #[test]
    fn test_fresh_instance_is_new_and_pending() {
        let mut clip = make_clip().with_timing(4.0, 2.0);
        let now = Utc::now();
        clip.transition(ClipStatus::Active, now).expect("dispatch");
        clip.fail("agent crashed", now).expect("fail");

        let replay = clip.fresh_instance(Utc::now());
        assert_ne!(replay.id, clip.id);
        assert_eq!(replay.status, ClipStatus::Pending);
        assert!(replay.failure_reason.is_none());
        assert!(replay.completed_at.is_none());
        assert_eq!(replay.start_time, 4.0);
        assert_eq!(clip.status, ClipStatus::Failed);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_status() -> impl Strategy<Value = ClipStatus> {
        prop_oneof![
            Just(ClipStatus::Pending),
            Just(ClipStatus::Active),
            Just(ClipStatus::Completed),
            Just(ClipStatus::Rejected),
            Just(ClipStatus::Failed),
        ]
    }

    fn rank(status: ClipStatus) -> u8 {
        match status {
            ClipStatus::Pending => 0,
            ClipStatus::Active => 1,
            _ => 2,
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Every legal transition moves strictly forward.
        #[test]
        fn prop_transitions_are_monotonic(from in arb_status(), to in arb_status()) {
            if from.can_transition_to(to) {
                prop_assert!(rank(to) > rank(from));
            }
        }
    }
}
