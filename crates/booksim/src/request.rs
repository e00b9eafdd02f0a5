//! Requests and their lifecycle.

use rustc_hash::FxHashMap;
use serde::Serialize;

pub type RequestId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RequestStatus {
    Waiting,
    InService,
    Completed,
    Dropped,
    Abandoned,
}

impl RequestStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RequestStatus::Completed | RequestStatus::Dropped | RequestStatus::Abandoned
        )
    }
}

/// A single booking request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Request {
    pub id: RequestId,
    pub arrival: f64,
    pub service_start: Option<f64>,
    pub completion: Option<f64>,
    /// Time when the request was dropped or abandoned.
    pub left: Option<f64>,
    pub status: RequestStatus,
}

impl Request {
    pub fn new(id: RequestId, arrival: f64) -> Self {
        Self {
            id,
            arrival,
            service_start: None,
            completion: None,
            left: None,
            status: RequestStatus::Waiting,
        }
    }

    pub fn start(&mut self, time: f64) {
        self.service_start = Some(time);
        self.status = RequestStatus::InService;
    }

    pub fn complete(&mut self, time: f64) {
        self.completion = Some(time);
        self.status = RequestStatus::Completed;
    }

    pub fn drop_at(&mut self, time: f64) {
        self.left = Some(time);
        self.status = RequestStatus::Dropped;
    }

    pub fn abandon_at(&mut self, time: f64) {
        self.left = Some(time);
        self.status = RequestStatus::Abandoned;
    }

    /// Completion minus arrival, defined only for completed requests.
    pub fn response_time(&self) -> Option<f64> {
        self.completion.map(|t| t - self.arrival)
    }

    pub fn waiting_time(&self) -> Option<f64> {
        self.service_start.map(|t| t - self.arrival)
    }

    pub fn service_time(&self) -> Option<f64> {
        match (self.service_start, self.completion) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}

/// Tracks requests that are waiting or in service.
///
/// Requests leave the registry as soon as they become terminal.
#[derive(Default)]
pub struct RequestRegistry {
    live: FxHashMap<RequestId, Request>,
    next_id: RequestId,
}

impl RequestRegistry {
    pub fn register(&mut self, arrival: f64) -> RequestId {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id, Request::new(id, arrival));
        id
    }

    pub fn get(&self, id: RequestId) -> Option<&Request> {
        self.live.get(&id)
    }

    pub fn get_mut(&mut self, id: RequestId) -> Option<&mut Request> {
        self.live.get_mut(&id)
    }

    pub fn remove(&mut self, id: RequestId) -> Option<Request> {
        self.live.remove(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn registered_count(&self) -> u64 {
        self.next_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_times() {
        let mut request = Request::new(0, 1.);
        assert_eq!(request.service_time(), None);
        request.start(1.5);
        assert_eq!(request.status, RequestStatus::InService);
        assert_eq!(request.waiting_time(), Some(0.5));
        assert_eq!(request.service_time(), None);
        request.complete(3.5);
        assert!(request.status.is_terminal());
        assert_eq!(request.service_time(), Some(2.));
        assert_eq!(request.response_time(), Some(2.5));
    }

    #[test]
    fn test_registry() {
        let mut registry = RequestRegistry::default();
        let a = registry.register(0.);
        let b = registry.register(1.);
        assert_ne!(a, b);
        assert_eq!(registry.registered_count(), 2);
        assert_eq!(registry.live_count(), 2);
        let mut dropped = registry.remove(a).unwrap();
        dropped.drop_at(0.);
        assert_eq!(dropped.response_time(), None);
        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.registered_count(), 2);
        assert!(registry.get(a).is_none());
        assert_eq!(registry.get(b).map(|r| r.arrival), Some(1.));
    }
}
