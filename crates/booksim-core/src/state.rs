use std::collections::{BinaryHeap, HashSet};

use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::prelude::*;
use rand_pcg::Pcg64;

use crate::error::SimError;
use crate::event::{Event, EventId};
use crate::log::log_invalid_schedule;

/// Epsilon to compare floating point values for equality.
pub const EPSILON: f64 = 1e-12;

#[derive(Clone)]
pub struct SimulationState<T> {
    clock: f64,
    rand: Pcg64,
    events: BinaryHeap<Event<T>>,
    canceled_events: HashSet<EventId>,
    event_count: u64,
}

impl<T> SimulationState<T> {
    pub fn new(seed: u64) -> Self {
        Self {
            clock: 0.0,
            rand: Pcg64::seed_from_u64(seed),
            events: BinaryHeap::new(),
            canceled_events: HashSet::new(),
            event_count: 0,
        }
    }

    pub fn time(&self) -> f64 {
        self.clock
    }

    // Only moves the clock forward.
    pub fn advance_to(&mut self, time: f64) {
        if time > self.clock {
            self.clock = time;
        }
    }

    pub fn rand(&mut self) -> f64 {
        self.rand.gen_range(0.0..1.0)
    }

    pub fn gen_range<R, S>(&mut self, range: S) -> R
    where
        R: SampleUniform,
        S: SampleRange<R>,
    {
        self.rand.gen_range(range)
    }

    pub fn sample_from_distribution<R, Dist: Distribution<R>>(&mut self, dist: &Dist) -> R {
        dist.sample(&mut self.rand)
    }

    pub fn add_event(&mut self, data: T, delay: f64) -> Result<EventId, SimError> {
        self.add_event_at(data, self.clock + delay)
    }

    pub fn add_event_at(&mut self, data: T, time: f64) -> Result<EventId, SimError> {
        if !time.is_finite() || time < self.clock - EPSILON {
            log_invalid_schedule(time, self.clock);
            return Err(SimError::InvalidSchedule { time, now: self.clock });
        }
        let event_id = self.event_count;
        self.events.push(Event {
            id: event_id,
            // max is used to absorb floating-point errors within EPSILON
            time: time.max(self.clock),
            data,
        });
        self.event_count += 1;
        Ok(event_id)
    }

    pub fn next_event(&mut self) -> Option<Event<T>> {
        while let Some(event) = self.events.pop() {
            if !self.canceled_events.remove(&event.id) {
                self.clock = event.time;
                return Some(event);
            }
        }
        None
    }

    pub fn peek_event(&mut self) -> Option<&Event<T>> {
        loop {
            let event_id = self.events.peek()?.id;
            if self.canceled_events.remove(&event_id) {
                self.events.pop();
            } else {
                return self.events.peek();
            }
        }
    }

    pub fn cancel_event(&mut self, id: EventId) {
        if id < self.event_count {
            self.canceled_events.insert(id);
        }
    }

    pub fn cancel_events<F>(&mut self, pred: F)
    where
        F: Fn(&Event<T>) -> bool,
    {
        for event in self.events.iter() {
            if pred(event) {
                self.canceled_events.insert(event.id);
            }
        }
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    pub fn pending_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| !self.canceled_events.contains(&e.id))
            .count()
    }
}

impl<T: Clone> SimulationState<T> {
    pub fn dump_events(&self) -> Vec<Event<T>> {
        let mut output: Vec<Event<T>> = self
            .events
            .iter()
            .filter(|e| !self.canceled_events.contains(&e.id))
            .cloned()
            .collect();
        output.sort();
        // Because the sorting order of events is inverted to be used with BinaryHeap
        output.reverse();
        output
    }
}
