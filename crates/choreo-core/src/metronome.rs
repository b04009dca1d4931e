// ─────────────────────────────────────────────────────────────────────
// Rotor Choreography — Metronome (Periodic Tick Driver)
// ─────────────────────────────────────────────────────────────────────
//! Background thread that calls `Choreographer::step` at a fixed
//! interval and hands each frame to a [`FrameSink`].
//!
//! The choreographer is shared behind one `parking_lot::Mutex`: control
//! messages and ticks take the same lock, so a reconfiguration can
//! never interleave with an in-flight step.
//!
//! Wall-clock jitter only affects real-time fidelity. Simulation time
//! still advances by exactly `step_size` per tick.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::choreographer::Choreographer;
use crate::sink::FrameSink;

/// Choreographer handle shared between the control path and the driver.
pub type SharedChoreographer = Arc<Mutex<Choreographer>>;

pub fn shared(choreographer: Choreographer) -> SharedChoreographer {
    Arc::new(Mutex::new(choreographer))
}

/// Periodic tick driver. Stops on `stop()` or drop.
pub struct Metronome {
    running: Arc<AtomicBool>,
    interval_ms: Arc<AtomicU64>,
    ticks: Arc<AtomicU64>,
    target: SharedChoreographer,
    handle: Option<JoinHandle<()>>,
}

impl Metronome {
    /// Start ticking at the choreographer's configured interval.
    pub fn start(target: SharedChoreographer, sink: Arc<dyn FrameSink>) -> Self {
        let interval = target.lock().config().tick_interval_ms;
        Self::start_with_interval(target, interval, sink)
    }

    pub fn start_with_interval(
        target: SharedChoreographer,
        interval_ms: u64,
        sink: Arc<dyn FrameSink>,
    ) -> Self {
        let interval_ms = interval_ms.max(1);
        target.lock().set_tick_interval_ms(interval_ms);

        let running = Arc::new(AtomicBool::new(true));
        let interval = Arc::new(AtomicU64::new(interval_ms));
        let ticks = Arc::new(AtomicU64::new(0));

        let handle = {
            let running = Arc::clone(&running);
            let interval = Arc::clone(&interval);
            let ticks = Arc::clone(&ticks);
            let target = Arc::clone(&target);
            thread::Builder::new()
                .name("choreo-metronome".to_string())
                .spawn(move || tick_loop(&target, sink.as_ref(), &running, &interval, &ticks))
        };

        let handle = match handle {
            Ok(h) => {
                log::info!("Auto step started ({interval_ms}ms)");
                Some(h)
            }
            Err(e) => {
                log::error!("failed to spawn metronome thread: {e}");
                running.store(false, Ordering::SeqCst);
                None
            }
        };

        Self {
            running,
            interval_ms: interval,
            ticks,
            target,
            handle,
        }
    }

    /// Retune the interval; takes effect from the next tick.
    pub fn set_interval(&self, ms: u64) {
        let ms = ms.max(1);
        self.interval_ms.store(ms, Ordering::SeqCst);
        self.target.lock().set_tick_interval_ms(ms);
        log::info!("Metro set to {ms}ms");
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ticks attempted since start, refused ones included.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Stop ticking and join the driver thread. Idempotent.
    pub fn stop(&mut self) {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                log::error!("metronome thread panicked");
            }
        }
        if was_running {
            log::info!("Auto step stopped");
        }
    }
}

impl Drop for Metronome {
    fn drop(&mut self) {
        self.stop();
    }
}

fn tick_loop(
    target: &Mutex<Choreographer>,
    sink: &dyn FrameSink,
    running: &AtomicBool,
    interval_ms: &AtomicU64,
    ticks: &AtomicU64,
) {
    while running.load(Ordering::SeqCst) {
        let started = Instant::now();

        let result = target.lock().step();
        ticks.fetch_add(1, Ordering::SeqCst);
        match result {
            Ok(frame) => sink.emit(&frame),
            Err(e) => sink.refused(&e),
        }

        let deadline = started + Duration::from_millis(interval_ms.load(Ordering::SeqCst));
        // park_timeout may wake early; keep waiting until the deadline
        while running.load(Ordering::SeqCst) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::park_timeout(deadline - now);
        }
    }
}
