use std::time::Duration;

use arc_telem::{Frame, TimeSpan};

use crate::queue::Spsc;
use crate::time_wheel::TimeWheel;

/// `HighRate` graphs drive their tick off a dedicated base-period timer
/// because at least one interval node needs sub-millisecond latency;
/// `EventDriven` graphs only need to wake when new input data arrives (or,
/// if they do have slower intervals, the wider base period is cheap enough
/// to fold into the same blocking wait).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    HighRate,
    EventDriven,
}

/// How often `Loop::wait` polls for a time trigger when there is no active
/// interval node at all — just often enough that `Runtime::stop` is noticed
/// promptly without the loop spinning.
const IDLE_POLL: Duration = Duration::from_millis(200);

pub struct LoopConfig {
    pub mode: ExecutionMode,
    pub interval: Option<TimeSpan>,
}

/// Drives `Runtime::run`'s wait-for-trigger step. The reference runtime pairs
/// a `TimeWheel` with a condvar-based notifier woken on queue push; here a
/// single blocking `recv_timeout` on the input queue plays both roles at
/// once — a frame arriving satisfies the data trigger, and the timeout
/// elapsing satisfies the time trigger, with no separate wake-up plumbing
/// needed.
pub struct Loop {
    mode: ExecutionMode,
    time_wheel: Option<TimeWheel>,
}

impl Loop {
    pub fn new(cfg: LoopConfig) -> Self {
        let time_wheel = cfg.interval.map(|i| TimeWheel::new(i.nanos().max(1) as u64));
        Self { mode: cfg.mode, time_wheel }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Blocks until either a frame is available or the base period elapses,
    /// returning the frame if one was popped.
    pub fn wait(&self, inputs: &Spsc<Frame>) -> Option<Frame> {
        let timeout = match &self.time_wheel {
            Some(wheel) => Duration::from_nanos(wheel.base_period_ns()),
            None => IDLE_POLL,
        };
        inputs.pop_timeout(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_returns_pushed_frame_immediately() {
        let inputs = Spsc::new(4);
        inputs.push(Frame::new());
        let l = Loop::new(LoopConfig { mode: ExecutionMode::EventDriven, interval: None });
        assert!(l.wait(&inputs).is_some());
    }

    #[test]
    fn wait_times_out_with_no_data() {
        let inputs: Spsc<Frame> = Spsc::new(4);
        let l = Loop::new(LoopConfig { mode: ExecutionMode::HighRate, interval: Some(TimeSpan::milliseconds(5)) });
        assert!(l.wait(&inputs).is_none());
    }
}
