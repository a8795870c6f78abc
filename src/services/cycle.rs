//! Cycle admission: at most one cycle in flight, and a minimum gap
//! between successful cycles for periodic triggers.

use serde::Serialize;
use std::time::{Duration, Instant};

/// What asked for a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Fired by the refresh interval.
    Periodic,
    /// Explicit refresh; ignores the minimum gap.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipReason {
    /// Another cycle is running.
    Busy,
    /// The last successful cycle finished less than the minimum gap ago.
    Throttled,
}

/// Outcome of a trigger that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum CycleStatus {
    Completed,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GatePhase {
    Idle,
    Running,
}

/// Two-state admission gate. Every clock read is passed in by the caller.
#[derive(Debug)]
pub struct CycleGate {
    phase: GatePhase,
    last_success: Option<Instant>,
    min_gap: Duration,
}

impl CycleGate {
    pub fn new(min_gap: Duration) -> Self {
        Self {
            phase: GatePhase::Idle,
            last_success: None,
            min_gap,
        }
    }

    pub fn phase(&self) -> GatePhase {
        self.phase
    }

    pub fn last_success(&self) -> Option<Instant> {
        self.last_success
    }

    /// Move to `Running`, or say why the trigger is dropped.
    ///
    /// A manual trigger clears the last-success timer before the gap check.
    pub fn try_enter(&mut self, now: Instant, trigger: Trigger) -> Result<(), SkipReason> {
        if self.phase == GatePhase::Running {
            return Err(SkipReason::Busy);
        }

        if trigger == Trigger::Manual {
            self.last_success = None;
        }

        if let Some(last) = self.last_success {
            if now.saturating_duration_since(last) < self.min_gap {
                return Err(SkipReason::Throttled);
            }
        }

        self.phase = GatePhase::Running;
        Ok(())
    }

    /// Return to `Idle`; a success restarts the gap timer.
    pub fn finish(&mut self, now: Instant, success: bool) {
        self.phase = GatePhase::Idle;
        if success {
            self.last_success = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> (CycleGate, Instant) {
        (CycleGate::new(Duration::from_secs(5)), Instant::now())
    }

    #[test]
    fn test_busy_gate_drops_triggers() {
        let (mut gate, t0) = gate();
        assert_eq!(gate.try_enter(t0, Trigger::Periodic), Ok(()));
        assert_eq!(gate.phase(), GatePhase::Running);
        assert_eq!(gate.try_enter(t0, Trigger::Periodic), Err(SkipReason::Busy));
        assert_eq!(gate.try_enter(t0, Trigger::Manual), Err(SkipReason::Busy));
    }

    #[test]
    fn test_min_gap_after_success() {
        let (mut gate, t0) = gate();
        gate.try_enter(t0, Trigger::Periodic).unwrap();
        gate.finish(t0, true);

        let soon = t0 + Duration::from_secs(4);
        assert_eq!(gate.try_enter(soon, Trigger::Periodic), Err(SkipReason::Throttled));
        assert_eq!(gate.phase(), GatePhase::Idle);

        let later = t0 + Duration::from_secs(5);
        assert_eq!(gate.try_enter(later, Trigger::Periodic), Ok(()));
    }

    #[test]
    fn test_failure_does_not_start_gap() {
        let (mut gate, t0) = gate();
        gate.try_enter(t0, Trigger::Periodic).unwrap();
        gate.finish(t0, false);
        assert_eq!(gate.last_success(), None);
        assert_eq!(
            gate.try_enter(t0 + Duration::from_secs(1), Trigger::Periodic),
            Ok(())
        );
    }

    #[test]
    fn test_manual_trigger_resets_timer() {
        let (mut gate, t0) = gate();
        gate.try_enter(t0, Trigger::Periodic).unwrap();
        gate.finish(t0, true);

        let soon = t0 + Duration::from_secs(1);
        assert_eq!(gate.try_enter(soon, Trigger::Manual), Ok(()));
        assert_eq!(gate.last_success(), None);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(CycleStatus::Skipped(SkipReason::Busy)).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "busy");
        let json = serde_json::to_value(CycleStatus::Completed).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(serde_json::to_value(GatePhase::Running).unwrap(), "running");
    }
}
