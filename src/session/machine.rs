//! Match/completion state machine with a fixed cooldown window.

use std::time::{Duration, Instant};

use crate::pipeline::Detection;

/// Default cooldown after a successful match.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3);

/// Observable machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    /// Ready to count the next qualifying detection.
    Idle,
    /// A match fired recently; further matches are suppressed until the
    /// window elapses.
    Cooldown,
}

/// Emitted once per cooldown window when a qualifying detection is seen.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Class label of the detection that triggered the match.
    pub class: String,
    /// Its confidence at trigger time.
    pub confidence: f32,
    /// In-session match count after this completion.
    pub match_count: u32,
}

/// Ephemeral view of the session, shared read-only with the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub is_active: bool,
    pub target_lesson: Option<String>,
    pub match_count: u32,
    pub cooldown_active: bool,
}

/// Watches detection batches for a sustained match against the target sign.
///
/// `Idle` → qualifying detection → emit [`Completion`], enter `Cooldown` →
/// window elapses → `Idle`. At most one completion fires per window even
/// under continuously matching detections. Time is injected through `now`
/// so the cooldown is deterministic under test.
#[derive(Debug, Clone)]
pub struct MatchMachine {
    target: String,
    cooldown: Duration,
    cooldown_until: Option<Instant>,
    match_count: u32,
}

impl MatchMachine {
    pub fn new(target: impl Into<String>) -> Self {
        Self::with_cooldown(target, DEFAULT_COOLDOWN)
    }

    pub fn with_cooldown(target: impl Into<String>, cooldown: Duration) -> Self {
        Self {
            target: target.into(),
            cooldown,
            cooldown_until: None,
            match_count: 0,
        }
    }

    /// Feed one detection batch at time `now`.
    ///
    /// Returns a [`Completion`] iff some detection's class case-insensitively
    /// equals the target and no cooldown is pending. Entering `Matched`
    /// increments the match count and immediately starts the cooldown.
    pub fn observe(&mut self, detections: &[Detection], now: Instant) -> Option<Completion> {
        if let Some(until) = self.cooldown_until {
            if now < until {
                return None;
            }
            self.cooldown_until = None;
        }

        let hit = detections.iter().find(|d| d.matches_target(&self.target))?;
        self.match_count += 1;
        self.cooldown_until = Some(now + self.cooldown);
        Some(Completion {
            class: hit.class.clone(),
            confidence: hit.confidence,
            match_count: self.match_count,
        })
    }

    /// Explicit reset: zero the counter and force `Idle` immediately,
    /// overriding any running cooldown.
    pub fn reset(&mut self) {
        self.match_count = 0;
        self.cooldown_until = None;
    }

    /// Switch the target sign.
    ///
    /// A pending cooldown is left running and keeps blocking new
    /// completions until it naturally elapses; use [`reset`](Self::reset)
    /// to clear it eagerly.
    pub fn set_target(&mut self, target: impl Into<String>) {
        self.target = target.into();
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn match_count(&self) -> u32 {
        self.match_count
    }

    pub fn state(&self, now: Instant) -> MatchState {
        match self.cooldown_until {
            Some(until) if now < until => MatchState::Cooldown,
            _ => MatchState::Idle,
        }
    }

    pub fn snapshot(&self, is_active: bool, now: Instant) -> SessionSnapshot {
        SessionSnapshot {
            is_active,
            target_lesson: Some(self.target.clone()),
            match_count: self.match_count,
            cooldown_active: self.state(now) == MatchState::Cooldown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Rect;

    fn hit(class: &str) -> Vec<Detection> {
        vec![Detection::new(class, 0.9, Rect::default())]
    }

    #[test]
    fn test_match_enters_cooldown() {
        let mut machine = MatchMachine::new("a");
        let t0 = Instant::now();

        let completion = machine.observe(&hit("A"), t0).unwrap();
        assert_eq!(completion.match_count, 1);
        assert_eq!(machine.state(t0), MatchState::Cooldown);

        // Still inside the window: suppressed.
        assert!(machine.observe(&hit("a"), t0 + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_non_matching_class_is_ignored() {
        let mut machine = MatchMachine::new("a");
        assert!(machine.observe(&hit("b"), Instant::now()).is_none());
        assert_eq!(machine.match_count(), 0);
    }

    #[test]
    fn test_reset_overrides_cooldown() {
        let mut machine = MatchMachine::new("a");
        let t0 = Instant::now();
        machine.observe(&hit("a"), t0).unwrap();

        machine.reset();
        assert_eq!(machine.match_count(), 0);
        assert_eq!(machine.state(t0), MatchState::Idle);

        // Very next qualifying detection counts again, no waiting.
        let completion = machine.observe(&hit("a"), t0 + Duration::from_millis(1)).unwrap();
        assert_eq!(completion.match_count, 1);
    }

    #[test]
    fn test_target_change_keeps_pending_cooldown() {
        let mut machine = MatchMachine::new("a");
        let t0 = Instant::now();
        machine.observe(&hit("a"), t0).unwrap();

        machine.set_target("b");
        // Cooldown from the old target still blocks.
        assert!(machine.observe(&hit("b"), t0 + Duration::from_secs(1)).is_none());
        // Elapses naturally.
        let completion = machine.observe(&hit("b"), t0 + Duration::from_secs(3)).unwrap();
        assert_eq!(completion.class, "b");
    }
}
