// ─────────────────────────────────────────────────────────────────────
// Rotor Choreography — Frame Sink Interface
// ─────────────────────────────────────────────────────────────────────
//! Egress seam: whatever consumes tick frames (motor drivers, a
//! display, a network bridge) sits behind [`FrameSink`].
//!
//! The recorder keeps the most recent frames in memory and is what the
//! tests and benches use.

use std::collections::VecDeque;

use parking_lot::Mutex;

use choreo_physics::TickFrame;
use choreo_types::ChoreoError;

/// Consumer of per-tick output.
pub trait FrameSink: Send + Sync {
    fn emit(&self, frame: &TickFrame);

    /// Called when a tick was refused. Default: ignore.
    fn refused(&self, _error: &ChoreoError) {}
}

/// Bounded in-memory sink retaining the last `capacity` frames.
pub struct FrameRecorder {
    capacity: usize,
    frames: Mutex<VecDeque<TickFrame>>,
    refusals: Mutex<Vec<ChoreoError>>,
}

impl FrameRecorder {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
            refusals: Mutex::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    pub fn latest(&self) -> Option<TickFrame> {
        self.frames.lock().back().cloned()
    }

    /// Drain every retained frame, oldest first.
    pub fn take(&self) -> Vec<TickFrame> {
        self.frames.lock().drain(..).collect()
    }

    pub fn refusals(&self) -> Vec<ChoreoError> {
        self.refusals.lock().clone()
    }
}

impl FrameSink for FrameRecorder {
    fn emit(&self, frame: &TickFrame) {
        let mut frames = self.frames.lock();
        if frames.len() == self.capacity {
            frames.pop_front();
        }
        frames.push_back(frame.clone());
    }

    fn refused(&self, error: &ChoreoError) {
        self.refusals.lock().push(error.clone());
    }
}

type EmitFn = Box<dyn Fn(&TickFrame) + Send + Sync>;

/// Sink that forwards every frame to a closure.
pub struct CallbackSink {
    emit_fn: EmitFn,
}

impl CallbackSink {
    pub fn new(emit_fn: impl Fn(&TickFrame) + Send + Sync + 'static) -> Self {
        Self {
            emit_fn: Box::new(emit_fn),
        }
    }
}

impl FrameSink for CallbackSink {
    fn emit(&self, frame: &TickFrame) {
        (self.emit_fn)(frame)
    }
}
