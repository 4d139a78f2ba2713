//! Host-side stand-ins for the second hardware execution context and the
//! serial transport. None of this exists in the on-target build; it is what
//! lets the demo's observable behavior run under the normal test harness.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::flag::ClobberFlag;
use crate::region::AtomicScratch;
use crate::reporter::SerialSink;
use crate::worker::ClobberWorker;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("clobber worker thread panicked")]
    WorkerPanicked,
}

/// Handle to the thread standing in for the second core.
pub struct WorkerHandle {
    stop: Arc<AtomicBool>,
    iterations: Arc<AtomicU64>,
    thread: thread::JoinHandle<ClobberWorker>,
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerStats {
    pub iterations: u64,
    pub final_offset: u8,
}

/// Launch the corrupting worker on a second OS thread, optionally after a
/// start delay.
///
/// The shutdown probe the worker polls once per iteration doubles as the
/// iteration counter, so the loop body itself stays exactly as it runs on
/// target.
pub fn spawn_worker(
    region: Arc<AtomicScratch>,
    flag: Arc<ClobberFlag>,
    start_delay: Duration,
) -> WorkerHandle {
    let stop = Arc::new(AtomicBool::new(false));
    let iterations = Arc::new(AtomicU64::new(0));

    let thread = thread::Builder::new()
        .name("clobber-core1".into())
        .spawn({
            let stop = stop.clone();
            let iterations = iterations.clone();
            move || {
                if !start_delay.is_zero() {
                    thread::sleep(start_delay);
                }
                tracing::debug!("clobber worker starting");
                let mut worker = ClobberWorker::new();
                worker.run(&*region, &flag, || {
                    iterations.fetch_add(1, Ordering::Relaxed);
                    stop.load(Ordering::Relaxed)
                });
                tracing::debug!("clobber worker stopped");
                worker
            }
        })
        .expect("Failed to spawn clobber worker thread");

    WorkerHandle {
        stop,
        iterations,
        thread,
    }
}

impl WorkerHandle {
    /// Iterations completed so far.
    pub fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::Relaxed)
    }

    /// Trip the injected stop probe and join the thread.
    pub fn stop(self) -> Result<WorkerStats, SimError> {
        self.stop.store(true, Ordering::Relaxed);
        let worker = self.thread.join().map_err(|_| SimError::WorkerPanicked)?;
        Ok(WorkerStats {
            iterations: self.iterations.load(Ordering::Relaxed),
            final_offset: worker.offset(),
        })
    }
}

/// Serial sink over any `io::Write`.
///
/// Transport errors are logged once and then swallowed: the serial path is
/// best-effort, and a disconnected sink must not stop the reporter. An
/// optional pacing delay models the byte time at a given baud rate.
pub struct HostSink<W: Write> {
    out: W,
    byte_time: Option<Duration>,
    failed: bool,
}

impl<W: Write> HostSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            byte_time: None,
            failed: false,
        }
    }

    /// Pace writes at `baud`, assuming 10 bit times per byte (8N1 plus
    /// start and stop bits).
    pub fn throttled(out: W, baud: u32) -> Self {
        let byte_time = (baud > 0).then(|| Duration::from_secs_f64(10.0 / baud as f64));
        Self {
            out,
            byte_time,
            failed: false,
        }
    }
}

impl<W: Write> SerialSink for HostSink<W> {
    fn write_byte(&mut self, byte: u8) {
        if let Some(delay) = self.byte_time {
            thread::sleep(delay);
        }
        let res = self.out.write_all(&[byte]).and_then(|_| self.out.flush());
        if let Err(err) = res {
            if !self.failed {
                tracing::warn!("Serial sink write failed, further output is lost: {err}");
                self.failed = true;
            }
        }
    }
}

/// End-of-run record the CLI serializes for CI consumption.
#[derive(Debug, serde::Serialize)]
pub struct RunSummary {
    pub lines_emitted: u64,
    pub final_counter: u32,
    pub worker_iterations: u64,
    pub clobber_observed: bool,
    pub elapsed_ms: u64,
}
