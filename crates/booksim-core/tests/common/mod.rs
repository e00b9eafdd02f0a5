use serde::Serialize;

use booksim_core::{Event, EventHandler, SimError, SimulationContext};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum TestEvent {
    Ping(u32),
    Reschedule { delay: f64 },
    Past,
}

/// Records every delivered event as (time, id, payload).
#[derive(Default)]
pub struct Recorder {
    pub delivered: Vec<(f64, u64, TestEvent)>,
}

impl EventHandler<TestEvent> for Recorder {
    fn on(&mut self, event: Event<TestEvent>, ctx: &mut SimulationContext<TestEvent>) -> Result<(), SimError> {
        self.delivered.push((event.time, event.id, event.data.clone()));
        match event.data {
            TestEvent::Ping(_) => {}
            TestEvent::Reschedule { delay } => {
                let r: f64 = ctx.rand();
                ctx.emit(TestEvent::Reschedule { delay: delay + r }, delay)?;
            }
            TestEvent::Past => {
                ctx.emit_at(TestEvent::Ping(0), ctx.time() - 1.0)?;
            }
        }
        Ok(())
    }
}

#[allow(dead_code)]
pub fn assert_float_eq(x: f64, y: f64, eps: f64) {
    assert!(x > y - eps && x < y + eps, "{} != {} (eps {})", x, y, eps);
}
