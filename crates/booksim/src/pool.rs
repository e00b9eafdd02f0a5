//! Server pool with a bounded waiting queue.

use std::collections::VecDeque;

use crate::request::RequestId;

/// A set of homogeneous servers and the FIFO queue of requests waiting for them.
///
/// `target` is the admission ceiling set by the capacity strategy, `capacity` is the number of
/// provisioned servers. They differ only while servers above a lowered target are still busy:
/// such servers are retired when their request completes, so `busy <= capacity` always holds
/// and in-service requests are never evicted.
pub struct ServerPool {
    capacity: u32,
    target: u32,
    busy: u32,
    queue: VecDeque<RequestId>,
    queue_capacity: usize,
}

impl ServerPool {
    pub fn new(servers: u32, queue_capacity: usize) -> Self {
        Self {
            capacity: servers,
            target: servers,
            busy: 0,
            queue: VecDeque::with_capacity(queue_capacity.min(1024)),
            queue_capacity,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn busy(&self) -> u32 {
        self.busy
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub fn waiting(&self) -> impl Iterator<Item = &RequestId> {
        self.queue.iter()
    }

    /// Fraction of provisioned servers that are busy.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.
        } else {
            self.busy as f64 / self.capacity as f64
        }
    }

    pub fn has_free_server(&self) -> bool {
        self.busy < self.target
    }

    pub fn queue_is_full(&self) -> bool {
        self.queue.len() >= self.queue_capacity
    }

    /// Occupies a free server, returns false if there is none.
    pub fn acquire(&mut self) -> bool {
        if !self.has_free_server() {
            return false;
        }
        self.busy += 1;
        true
    }

    /// Frees a server after service completion, retiring it if the pool is above its target.
    pub fn release(&mut self) {
        debug_assert!(self.busy > 0);
        self.busy = self.busy.saturating_sub(1);
        if self.capacity > self.target {
            self.capacity -= 1;
        }
    }

    /// Appends request to the queue, returns false if the queue is full.
    pub fn enqueue(&mut self, id: RequestId) -> bool {
        if self.queue_is_full() {
            return false;
        }
        self.queue.push_back(id);
        true
    }

    pub fn dequeue(&mut self) -> Option<RequestId> {
        self.queue.pop_front()
    }

    /// Removes a waiting request from any position of the queue.
    pub fn remove_waiting(&mut self, id: RequestId) -> bool {
        if let Some(pos) = self.queue.iter().position(|&x| x == id) {
            self.queue.remove(pos);
            true
        } else {
            false
        }
    }

    /// Sets a new admission ceiling.
    ///
    /// Scaling up provisions servers immediately. Scaling down retires idle servers immediately
    /// and busy ones on release.
    pub fn scale_to(&mut self, target: u32) {
        self.target = target;
        self.capacity = if target >= self.capacity {
            target
        } else {
            target.max(self.busy)
        };
    }
}
