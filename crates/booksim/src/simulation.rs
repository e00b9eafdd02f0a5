//! Booking system model and the simulation facade running it.

use serde::Serialize;

use booksim_core::{log_debug, log_info, log_trace, log_warn};
use booksim_core::{Event, EventHandler, EventId, SimError, Simulation, SimulationContext};

use crate::admission::{Admission, AdmissionController};
use crate::arrival::ArrivalProcess;
use crate::autoscaler::{Autoscaler, ScalingDecision};
use crate::config::{CapacityStrategy, Config};
use crate::error::Error;
use crate::event::BookingEvent;
use crate::metrics::{MetricsCollector, Summary};
use crate::pool::ServerPool;
use crate::request::{RequestId, RequestRegistry};
use crate::service::ServiceSampler;

/// Dispatched event as recorded in the event log.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventRecord {
    pub time: f64,
    pub id: EventId,
    pub event: BookingEvent,
}

/// The request tier of the booking site: arrivals, servers with their queue, admission control,
/// optional autoscaling and metrics.
///
/// All mutable state of a run lives here, so independent runs share nothing.
pub struct BookingSystem {
    arrivals: ArrivalProcess,
    service: ServiceSampler,
    pool: ServerPool,
    admission: AdmissionController,
    autoscaler: Option<Autoscaler>,
    requests: RequestRegistry,
    metrics: MetricsCollector,
    arrivals_open: bool,
    event_log: Option<Vec<EventRecord>>,
}

impl BookingSystem {
    pub fn new(config: &Config) -> Result<Self, Error> {
        config.validate()?;
        let servers = config.capacity.initial_servers();
        let autoscaler = match &config.capacity {
            CapacityStrategy::Fixed { .. } => None,
            CapacityStrategy::Autoscale(policy) => Some(Autoscaler::new(policy.clone())),
        };
        Ok(Self {
            arrivals: ArrivalProcess::new(&config.arrival, config.seed)?,
            service: ServiceSampler::try_from(&config.service)?,
            pool: ServerPool::new(servers, config.queue_capacity),
            admission: AdmissionController::new(config.abandon_timeout),
            autoscaler,
            requests: RequestRegistry::default(),
            metrics: MetricsCollector::new(&config.capacity.label(), 0., servers),
            arrivals_open: true,
            event_log: None,
        })
    }

    /// Schedules the first arrival and, if autoscaling is enabled, the first capacity check.
    pub fn start(&mut self, ctx: &mut SimulationContext<BookingEvent>) -> Result<(), SimError> {
        self.arrivals.schedule_next(ctx)?;
        if let Some(autoscaler) = &self.autoscaler {
            autoscaler.schedule_check(ctx)?;
        }
        log_info!(
            ctx,
            "started with {} servers, queue capacity {}",
            self.pool.capacity(),
            self.pool.queue_capacity()
        );
        Ok(())
    }

    /// Stops generating arrivals and capacity checks, already admitted requests are unaffected.
    pub fn close_arrivals(&mut self, ctx: &mut SimulationContext<BookingEvent>) {
        if !self.arrivals_open {
            return;
        }
        self.arrivals_open = false;
        ctx.cancel_events(|e| matches!(e.data, BookingEvent::Arrival | BookingEvent::AutoscaleCheck));
        log_info!(
            ctx,
            "arrivals closed, {} requests waiting or in service",
            self.requests.live_count()
        );
    }

    pub fn arrivals_open(&self) -> bool {
        self.arrivals_open
    }

    pub fn pool(&self) -> &ServerPool {
        &self.pool
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    pub fn autoscaler(&self) -> Option<&Autoscaler> {
        self.autoscaler.as_ref()
    }

    pub fn requests(&self) -> &RequestRegistry {
        &self.requests
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn enable_event_log(&mut self) {
        if self.event_log.is_none() {
            self.event_log = Some(Vec::new());
        }
    }

    pub fn event_log(&self) -> &[EventRecord] {
        self.event_log.as_deref().unwrap_or(&[])
    }

    fn on_arrival(&mut self, ctx: &mut SimulationContext<BookingEvent>) -> Result<(), SimError> {
        if !self.arrivals_open {
            return Ok(());
        }
        let id = self.requests.register(ctx.time());
        if let Some(request) = self.requests.get(id) {
            self.metrics.on_arrival(request);
        }
        self.admit(id, ctx)?;
        self.arrivals.schedule_next(ctx)?;
        Ok(())
    }

    fn admit(&mut self, id: RequestId, ctx: &mut SimulationContext<BookingEvent>) -> Result<(), SimError> {
        match self.admission.decide(&self.pool) {
            Admission::Start => self.start_service(id, ctx),
            Admission::Enqueue => {
                self.pool.enqueue(id);
                self.admission.arm_timeout(id, ctx)?;
                log_trace!(ctx, "request {} queued at position {}", id, self.pool.queue_len());
                Ok(())
            }
            Admission::Drop => {
                if let Some(mut request) = self.requests.remove(id) {
                    request.drop_at(ctx.time());
                    self.metrics.on_drop(&request);
                }
                log_debug!(ctx, "request {} dropped, queue is full", id);
                Ok(())
            }
        }
    }

    fn start_service(&mut self, id: RequestId, ctx: &mut SimulationContext<BookingEvent>) -> Result<(), SimError> {
        if !self.pool.acquire() {
            return Err(SimError::Handler(format!("no free server for request {}", id)));
        }
        let duration = ctx.sample_from_distribution(&self.service);
        let request = self
            .requests
            .get_mut(id)
            .ok_or_else(|| SimError::Handler(format!("unknown request {}", id)))?;
        request.start(ctx.time());
        self.metrics.on_start(request);
        ctx.emit(BookingEvent::ServiceComplete { request: id }, duration)?;
        log_trace!(ctx, "request {} started, service time {:.3}", id, duration);
        Ok(())
    }

    /// Starts waiting requests while there are free servers.
    fn dispatch_waiting(&mut self, ctx: &mut SimulationContext<BookingEvent>) -> Result<(), SimError> {
        while self.pool.has_free_server() {
            match self.pool.dequeue() {
                Some(id) => {
                    self.admission.disarm_timeout(id, ctx);
                    self.start_service(id, ctx)?;
                }
                None => break,
            }
        }
        Ok(())
    }

    fn on_service_complete(
        &mut self,
        id: RequestId,
        ctx: &mut SimulationContext<BookingEvent>,
    ) -> Result<(), SimError> {
        match self.requests.remove(id) {
            Some(mut request) => {
                request.complete(ctx.time());
                self.metrics.on_complete(&request);
            }
            None => log_warn!(ctx, "completion of unknown request {}", id),
        }
        self.pool.release();
        self.dispatch_waiting(ctx)
    }

    fn on_abandon_timeout(&mut self, id: RequestId, ctx: &mut SimulationContext<BookingEvent>) {
        if !self.admission.take_fired_timeout(id) {
            return;
        }
        if !self.pool.remove_waiting(id) {
            log_warn!(ctx, "timeout of request {} which is not waiting", id);
            return;
        }
        if let Some(mut request) = self.requests.remove(id) {
            request.abandon_at(ctx.time());
            self.metrics.on_abandon(&request);
        }
        log_debug!(ctx, "request {} abandoned the queue", id);
    }

    fn on_autoscale_check(&mut self, ctx: &mut SimulationContext<BookingEvent>) -> Result<(), SimError> {
        let autoscaler = match self.autoscaler.as_mut() {
            Some(autoscaler) => autoscaler,
            None => return Ok(()),
        };
        let decision = autoscaler.check(
            ctx.time(),
            self.pool.busy(),
            self.pool.target(),
            self.pool.queue_len(),
        );
        if self.arrivals_open {
            autoscaler.schedule_check(ctx)?;
        }
        match decision {
            ScalingDecision::ScaleUp(target) => {
                log_info!(ctx, "scaling up from {} to {} servers", self.pool.target(), target);
                self.pool.scale_to(target);
                self.metrics.on_capacity_change();
                self.dispatch_waiting(ctx)?;
            }
            ScalingDecision::ScaleDown(target) => {
                log_info!(ctx, "scaling down from {} to {} servers", self.pool.target(), target);
                self.pool.scale_to(target);
                self.metrics.on_capacity_change();
            }
            ScalingDecision::Hold => {}
        }
        Ok(())
    }
}

impl EventHandler<BookingEvent> for BookingSystem {
    fn on(&mut self, event: Event<BookingEvent>, ctx: &mut SimulationContext<BookingEvent>) -> Result<(), SimError> {
        if let Some(log) = self.event_log.as_mut() {
            log.push(EventRecord {
                time: event.time,
                id: event.id,
                event: event.data.clone(),
            });
        }
        match event.data {
            BookingEvent::Arrival => self.on_arrival(ctx)?,
            BookingEvent::ServiceComplete { request } => self.on_service_complete(request, ctx)?,
            BookingEvent::AbandonTimeout { request } => self.on_abandon_timeout(request, ctx),
            BookingEvent::AutoscaleCheck => self.on_autoscale_check(ctx)?,
        }
        self.metrics.observe_pool(
            ctx.time(),
            self.pool.busy(),
            self.pool.capacity(),
            self.pool.target(),
        );
        Ok(())
    }
}

/// Runs the booking system for a single configuration.
///
/// ```rust
/// use booksim::{BookingSimulation, Config};
///
/// let mut sim = BookingSimulation::new(Config::default()).unwrap();
/// let summary = sim.run().unwrap();
/// assert_eq!(summary.completed + summary.dropped + summary.abandoned, summary.arrived);
/// ```
pub struct BookingSimulation {
    config: Config,
    sim: Simulation<BookingEvent, BookingSystem>,
}

impl BookingSimulation {
    pub fn new(config: Config) -> Result<Self, Error> {
        let system = BookingSystem::new(&config)?;
        let mut sim = Simulation::new(config.seed, "booking", system);
        let (system, ctx) = sim.parts_mut();
        system.start(ctx)?;
        Ok(Self { config, sim })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs until the horizon, then drains or stops depending on the config, and returns the summary.
    pub fn run(&mut self) -> Result<Summary, Error> {
        if self.sim.time() < self.config.horizon {
            self.sim.run_until(self.config.horizon)?;
        }
        let (system, ctx) = self.sim.parts_mut();
        system.close_arrivals(ctx);
        if self.config.drain {
            self.sim.step_until_no_events()?;
        }
        Ok(self.summary())
    }

    /// Processes events up to the given time, returns true if more events are pending.
    pub fn run_until(&mut self, time: f64) -> Result<bool, Error> {
        Ok(self.sim.run_until(time)?)
    }

    /// Processes a single event, returns false if there are no pending events.
    pub fn step(&mut self) -> Result<bool, Error> {
        Ok(self.sim.step()?)
    }

    /// Summary of the run observed so far.
    pub fn summary(&self) -> Summary {
        self.sim.handler().metrics().finalize(self.sim.time())
    }

    pub fn enable_event_log(&mut self) {
        self.sim.handler_mut().enable_event_log();
    }

    pub fn event_log(&self) -> &[EventRecord] {
        self.sim.handler().event_log()
    }

    pub fn system(&self) -> &BookingSystem {
        self.sim.handler()
    }

    pub fn pool(&self) -> &ServerPool {
        self.sim.handler().pool()
    }

    pub fn metrics(&self) -> &MetricsCollector {
        self.sim.handler().metrics()
    }

    pub fn time(&self) -> f64 {
        self.sim.time()
    }

    pub fn pending_events(&self) -> usize {
        self.sim.context().pending_events()
    }
}
