//! Admission control: serve, queue or drop an arriving request.

use rustc_hash::FxHashMap;

use booksim_core::{EventId, SimError, SimulationContext};

use crate::event::BookingEvent;
use crate::pool::ServerPool;
use crate::request::RequestId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// A server is free, start service right away.
    Start,
    /// All servers are busy, wait in the queue.
    Enqueue,
    /// Queue is full, the request is lost.
    Drop,
}

/// Decides the fate of arriving requests and manages abandonment timeouts of queued ones.
///
/// Every queued request gets a companion timeout event. The event is cancelled when service starts,
/// and a timeout that fires for a request no longer tracked here is ignored.
pub struct AdmissionController {
    abandon_timeout: Option<f64>,
    timeouts: FxHashMap<RequestId, EventId>,
}

impl AdmissionController {
    pub fn new(abandon_timeout: Option<f64>) -> Self {
        Self {
            abandon_timeout,
            timeouts: FxHashMap::default(),
        }
    }

    pub fn abandon_timeout(&self) -> Option<f64> {
        self.abandon_timeout
    }

    pub fn decide(&self, pool: &ServerPool) -> Admission {
        if pool.has_free_server() {
            Admission::Start
        } else if !pool.queue_is_full() {
            Admission::Enqueue
        } else {
            Admission::Drop
        }
    }

    pub fn arm_timeout(
        &mut self,
        request: RequestId,
        ctx: &mut SimulationContext<BookingEvent>,
    ) -> Result<(), SimError> {
        if let Some(timeout) = self.abandon_timeout {
            let event_id = ctx.emit(BookingEvent::AbandonTimeout { request }, timeout)?;
            self.timeouts.insert(request, event_id);
        }
        Ok(())
    }

    pub fn disarm_timeout(&mut self, request: RequestId, ctx: &mut SimulationContext<BookingEvent>) {
        if let Some(event_id) = self.timeouts.remove(&request) {
            ctx.cancel_event(event_id);
        }
    }

    /// Consumes the timeout of the request, returns false for stale timeouts.
    pub fn take_fired_timeout(&mut self, request: RequestId) -> bool {
        self.timeouts.remove(&request).is_some()
    }

    pub fn armed_timeouts(&self) -> usize {
        self.timeouts.len()
    }
}
