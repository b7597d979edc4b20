//! Synthetic workloads ("tasklets") run at each node of a call tree.
//!
//! A tasklet is cooperative, cancellable background work: it runs until a
//! one-shot cancellation channel fires, then terminates. The executor fires
//! the channel exactly once, `TaskDuration` milliseconds after start; a
//! dropped sender cancels as well.
//!
//! Two of the variants are deliberate fault injections, not bugs:
//! - `fail` asks the server to sever the connection without a response,
//!   modeling a downstream peer that dies mid-reply;
//! - `crash` terminates the whole host process, modeling full host failure.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod load;

use callmesh_core::TaskKind;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

pub use load::{CPU_FRACTION, RAM_BYTES};

/// How a finished tasklet wants the enclosing request to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Respond normally.
    Completed,
    /// Terminate the connection without writing a response.
    SeverConnection,
}

/// Length of one duty cycle for the cpu tasklet.
const CPU_CYCLE: Duration = Duration::from_millis(10);

/// Pause between page sweeps for the ram tasklet.
const RAM_TOUCH_INTERVAL: Duration = Duration::from_millis(1);

/// Run a tasklet until the cancellation channel fires.
///
/// Cancellation is the only way a tasklet ends; the caller owns the timing.
/// `crash` does not return.
pub async fn run(kind: TaskKind, done: oneshot::Receiver<()>) -> TaskOutcome {
    tracing::debug!(task = %kind, "tasklet started");
    let outcome = match kind {
        TaskKind::Sleep => {
            let _ = done.await;
            TaskOutcome::Completed
        }
        TaskKind::Fail => {
            let _ = done.await;
            tracing::warn!("fail tasklet severing connection");
            TaskOutcome::SeverConnection
        }
        TaskKind::Crash => {
            let _ = done.await;
            terminate_process();
        }
        TaskKind::Cpu => cpu(CPU_FRACTION, done).await,
        TaskKind::Ram => ram(RAM_BYTES, done).await,
    };
    tracing::debug!(task = %kind, "tasklet ended");
    outcome
}

/// Consume approximately `fraction` of one core until cancelled.
///
/// Each ~10 ms cycle busy-spins for `fraction` of the cycle on the current
/// worker thread, then yields to the runtime for the complementary fraction.
/// The busy slice is short enough not to starve the runtime.
async fn cpu(fraction: f64, mut done: oneshot::Receiver<()>) -> TaskOutcome {
    let busy_us = (fraction * CPU_CYCLE.as_micros() as f64) as u64;
    let idle = CPU_CYCLE.mul_f64(1.0 - fraction);
    while matches!(done.try_recv(), Err(TryRecvError::Empty)) {
        load::spin_for_us(busy_us);
        tokio::time::sleep(idle).await;
    }
    TaskOutcome::Completed
}

/// Hold `bytes` of memory, re-touching pages until cancelled.
async fn ram(bytes: usize, mut done: oneshot::Receiver<()>) -> TaskOutcome {
    tracing::debug!(bytes, "allocating ram region");
    let mut region = load::TouchedRegion::allocate(bytes);
    while matches!(done.try_recv(), Err(TryRecvError::Empty)) {
        region.touch();
        tokio::time::sleep(RAM_TOUCH_INTERVAL).await;
    }
    // Region dropped here, releasing the memory.
    TaskOutcome::Completed
}

/// Terminate the host process.
///
/// Reachable only from the `crash` tasklet; nothing else in the codebase may
/// end the process.
fn terminate_process() -> ! {
    tracing::error!("crash tasklet terminating process");
    std::process::exit(1)
}
