//! Logging facilities.
//!
//! Every record is prefixed with the simulation time, a colored level tag and the component name,
//! e.g. `[12.345 DEBUG booking] request 17 queued`.

use atty::Stream;
use colored::{Color, ColoredString, Colorize};
use log::error;

/// Applies the color to the string if stderr (log) goes to console.
pub fn get_colored(s: &str, color: Color) -> ColoredString {
    if atty::is(Stream::Stderr) {
        s.color(color)
    } else {
        s.normal()
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_with_ctx {
    ($level:ident, $tag:expr, $color:ident, $ctx:expr, $msg:expr) => (
        log::$level!(
            target: $ctx.name(),
            "[{:.3} {} {}] {}",
            $ctx.time(), $crate::log::get_colored($tag, $crate::colored::Color::$color), $ctx.name(), $msg
        )
    );
    ($level:ident, $tag:expr, $color:ident, $ctx:expr, $format:expr, $($arg:tt)+) => (
        log::$level!(
            target: $ctx.name(),
            concat!("[{:.3} {} {}] ", $format),
            $ctx.time(), $crate::log::get_colored($tag, $crate::colored::Color::$color), $ctx.name(), $($arg)+
        )
    );
}

/// Logs a message at the info level.
///
/// The first argument is anything with `name()` and `time()` methods,
/// usually a [`SimulationContext`](crate::SimulationContext).
///
/// # Examples
///
/// ```rust
/// use std::io::Write;
/// use env_logger::Builder;
/// use booksim_core::{log_info, Simulation, EventHandler, Event, SimError, SimulationContext};
///
/// struct Idle;
///
/// impl EventHandler<()> for Idle {
///     fn on(&mut self, _: Event<()>, ctx: &mut SimulationContext<()>) -> Result<(), SimError> {
///         log_info!(ctx, "woke up");
///         Ok(())
///     }
/// }
///
/// Builder::from_default_env()
///     .format(|buf, record| writeln!(buf, "{}", record.args()))
///     .init();
///
/// let mut sim = Simulation::new(123, "idle", Idle);
/// sim.context_mut().emit((), 1.0).unwrap();
/// sim.step_until_no_events().unwrap();
/// ```
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $($arg:tt)+) => ($crate::__log_with_ctx!(info, "INFO", Green, $ctx, $($arg)+));
}

/// Logs a message at the debug level.
///
/// See [`log_info!`](crate::log_info!).
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $($arg:tt)+) => ($crate::__log_with_ctx!(debug, "DEBUG", Blue, $ctx, $($arg)+));
}

/// Logs a message at the trace level.
///
/// See [`log_info!`](crate::log_info!).
#[macro_export]
macro_rules! log_trace {
    ($ctx:expr, $($arg:tt)+) => ($crate::__log_with_ctx!(trace, "TRACE", Cyan, $ctx, $($arg)+));
}

/// Logs a message at the warn level.
///
/// See [`log_info!`](crate::log_info!).
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $($arg:tt)+) => ($crate::__log_with_ctx!(warn, "WARN", Yellow, $ctx, $($arg)+));
}

/// Logs a message at the error level.
///
/// See [`log_info!`](crate::log_info!).
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $($arg:tt)+) => ($crate::__log_with_ctx!(error, "ERROR", Red, $ctx, $($arg)+));
}

pub(crate) fn log_invalid_schedule(time: f64, now: f64) {
    error!(
        target: "simulation",
        "[{:.3} {} simulation] Event scheduled in the past: {{\"time\": {}}}",
        now,
        get_colored("ERROR", Color::Red),
        time,
    );
}
