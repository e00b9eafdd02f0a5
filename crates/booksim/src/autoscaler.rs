//! Threshold-based autoscaling of the server pool.

use booksim_core::{EventId, SimError, SimulationContext};

use crate::config::AutoscalePolicy;
use crate::event::BookingEvent;

/// Outcome of an autoscaling check, carries the new admission ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalingDecision {
    ScaleUp(u32),
    ScaleDown(u32),
    Hold,
}

/// State machine over discrete capacity levels, evaluated at fixed sampling instants.
pub struct Autoscaler {
    policy: AutoscalePolicy,
    last_change: Option<f64>,
}

impl Autoscaler {
    pub fn new(policy: AutoscalePolicy) -> Self {
        Self {
            policy,
            last_change: None,
        }
    }

    pub fn policy(&self) -> &AutoscalePolicy {
        &self.policy
    }

    pub fn last_change(&self) -> Option<f64> {
        self.last_change
    }

    pub fn cooldown_elapsed(&self, now: f64) -> bool {
        self.last_change
            .map_or(true, |t| now - t >= self.policy.cooldown)
    }

    /// Evaluates the transition rules for the current pool state.
    ///
    /// Overload (utilization at or above the scale-up threshold, or any waiting request when
    /// `scale_up_on_queue` is set) adds `step` servers up to `max`. Utilization at or below the
    /// scale-down threshold removes `step` servers down to `min`. Nothing changes within the cooldown.
    pub fn check(&mut self, now: f64, busy: u32, target: u32, queue_len: usize) -> ScalingDecision {
        if !self.cooldown_elapsed(now) {
            return ScalingDecision::Hold;
        }
        let utilization = if target == 0 {
            1.
        } else {
            busy as f64 / target as f64
        };
        let overloaded =
            utilization >= self.policy.scale_up_utilization || (self.policy.scale_up_on_queue && queue_len > 0);
        let decision = if overloaded && target < self.policy.max {
            ScalingDecision::ScaleUp(target.saturating_add(self.policy.step).min(self.policy.max))
        } else if utilization <= self.policy.scale_down_utilization && target > self.policy.min {
            ScalingDecision::ScaleDown(target.saturating_sub(self.policy.step).max(self.policy.min))
        } else {
            ScalingDecision::Hold
        };
        if decision != ScalingDecision::Hold {
            self.last_change = Some(now);
        }
        decision
    }

    pub fn schedule_check(&self, ctx: &mut SimulationContext<BookingEvent>) -> Result<EventId, SimError> {
        ctx.emit(BookingEvent::AutoscaleCheck, self.policy.sampling_period)
    }
}
