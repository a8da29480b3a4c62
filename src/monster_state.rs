use crate::constants::{FROZEN_DURATION_MS, FURIOUS_DURATION_MS};
use crate::types::MonsterMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Deadline {
    At(u64),
    Never,
}

impl Deadline {
    fn is_active(self, now_ms: u64) -> bool {
        match self {
            Deadline::At(until) => now_ms < until,
            Deadline::Never => true,
        }
    }
}

/// Timed Normal / Frozen / Furious modes of one monster.
///
/// Expiry is polled against the engine clock: a deadline that has passed is
/// simply no longer active, nothing fires in the background. Frozen wins over
/// Furious for the current mode, but the two deadlines run independently.
#[derive(Clone, Debug)]
pub struct MonsterStateMachine {
    reactive: bool,
    frozen_until: Option<Deadline>,
    furious_until: Option<u64>,
}

impl MonsterStateMachine {
    /// `reactive` is false when gold and ice leave monsters alone.
    pub fn new(reactive: bool) -> Self {
        Self {
            reactive,
            frozen_until: None,
            furious_until: None,
        }
    }

    pub fn mode(&self, now_ms: u64) -> MonsterMode {
        if self.is_frozen(now_ms) {
            MonsterMode::Frozen
        } else if self.is_furious(now_ms) {
            MonsterMode::Furious
        } else {
            MonsterMode::Normal
        }
    }

    pub fn is_frozen(&self, now_ms: u64) -> bool {
        self.frozen_until
            .is_some_and(|deadline| deadline.is_active(now_ms))
    }

    /// Furious deadline still pending, whether or not a freeze hides it.
    pub fn is_furious(&self, now_ms: u64) -> bool {
        self.furious_until.is_some_and(|until| now_ms < until)
    }

    pub fn is_paused(&self) -> bool {
        self.frozen_until == Some(Deadline::Never)
    }

    /// Drops deadlines that have passed.
    pub fn expire(&mut self, now_ms: u64) {
        if self
            .frozen_until
            .is_some_and(|deadline| !deadline.is_active(now_ms))
        {
            self.frozen_until = None;
        }
        if self.furious_until.is_some_and(|until| now_ms >= until) {
            self.furious_until = None;
        }
    }

    /// Gold was eaten. Returns whether the monster turned furious.
    pub fn on_gold(&mut self, now_ms: u64) -> bool {
        if !self.reactive || self.is_frozen(now_ms) {
            return false;
        }
        self.furious_until = Some(now_ms + FURIOUS_DURATION_MS);
        true
    }

    /// Ice was eaten. Returns whether the monster got frozen.
    pub fn on_ice(&mut self, now_ms: u64) -> bool {
        if !self.reactive {
            return false;
        }
        self.freeze_for(now_ms, FROZEN_DURATION_MS);
        true
    }

    /// Freezes until `now_ms + duration_ms`; a longer freeze already in
    /// place is kept.
    pub fn freeze_for(&mut self, now_ms: u64, duration_ms: u64) {
        let until = now_ms + duration_ms;
        self.frozen_until = match self.frozen_until {
            Some(Deadline::Never) => Some(Deadline::Never),
            Some(Deadline::At(current)) if current > until => Some(Deadline::At(current)),
            _ => Some(Deadline::At(until)),
        };
    }

    /// Permanent freeze, used when the game ends.
    pub fn pause(&mut self) {
        self.frozen_until = Some(Deadline::Never);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gold_makes_normal_monster_furious_then_reverts() {
        let mut state = MonsterStateMachine::new(true);
        assert_eq!(state.mode(0), MonsterMode::Normal);
        assert!(state.on_gold(1_000));
        assert_eq!(state.mode(1_000), MonsterMode::Furious);
        assert_eq!(state.mode(1_000 + FURIOUS_DURATION_MS - 1), MonsterMode::Furious);
        assert_eq!(state.mode(1_000 + FURIOUS_DURATION_MS), MonsterMode::Normal);
        state.expire(1_000 + FURIOUS_DURATION_MS);
        assert!(!state.is_furious(1_000 + FURIOUS_DURATION_MS));
    }

    #[test]
    fn ice_freezes_a_furious_monster_without_touching_its_fury() {
        let mut state = MonsterStateMachine::new(true);
        state.on_gold(0);
        assert!(state.on_ice(1_000));
        assert_eq!(state.mode(1_000), MonsterMode::Frozen);
        // Fury expires at 3s while still frozen.
        assert!(state.is_furious(2_999));
        assert!(!state.is_furious(FURIOUS_DURATION_MS));
        assert_eq!(state.mode(1_000 + FROZEN_DURATION_MS), MonsterMode::Normal);
    }

    #[test]
    fn fury_outlasting_a_freeze_resumes() {
        let mut state = MonsterStateMachine::new(true);
        state.freeze_for(0, 500);
        assert!(!state.on_gold(100));
        state.expire(500);
        assert!(state.on_gold(600));
        state.on_ice(700);
        assert_eq!(state.mode(2_000), MonsterMode::Frozen);
        assert_eq!(state.mode(700 + FROZEN_DURATION_MS), MonsterMode::Normal);
        let mut longer = MonsterStateMachine::new(true);
        longer.on_gold(1_000);
        longer.freeze_for(1_000, 1_000);
        assert_eq!(longer.mode(2_000), MonsterMode::Furious);
    }

    #[test]
    fn gold_is_ignored_while_frozen() {
        let mut state = MonsterStateMachine::new(true);
        state.on_ice(0);
        assert!(!state.on_gold(100));
        assert!(!state.is_furious(100));
    }

    #[test]
    fn shorter_freeze_does_not_cut_a_longer_one() {
        let mut state = MonsterStateMachine::new(true);
        state.freeze_for(0, 5_000);
        state.on_ice(1_000);
        assert_eq!(state.mode(4_500), MonsterMode::Frozen);
        assert_eq!(state.mode(5_000), MonsterMode::Normal);
    }

    #[test]
    fn pause_is_permanent() {
        let mut state = MonsterStateMachine::new(true);
        state.on_gold(0);
        state.pause();
        state.on_ice(10);
        state.expire(u64::MAX);
        assert!(state.is_paused());
        assert_eq!(state.mode(u64::MAX), MonsterMode::Frozen);
    }

    #[test]
    fn inert_machine_ignores_items() {
        let mut state = MonsterStateMachine::new(false);
        assert!(!state.on_gold(0));
        assert!(!state.on_ice(0));
        assert_eq!(state.mode(0), MonsterMode::Normal);
        state.freeze_for(0, 5_000);
        assert_eq!(state.mode(1_000), MonsterMode::Frozen);
    }
}
