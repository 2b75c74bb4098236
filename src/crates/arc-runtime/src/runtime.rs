use arc_core::Scheduler;
use arc_telem::{Frame, TimeStamp};

use crate::breaker::{Breaker, BreakerConfig};
use crate::error::Result;
use crate::loop_driver::Loop;
use crate::queue::Spsc;

/// A `Send + Sync`, freely cloneable window onto a running [`Runtime`]. A
/// `Runtime` itself cannot cross threads — its `Scheduler` holds
/// `Rc<RefCell<arc_wasm::Module>>` for every WASM node — so the host thread
/// that owns `Runtime::run` hands out `Handle`s to whichever other threads
/// need to feed it input or drain its output.
#[derive(Clone)]
pub struct Handle {
    inputs: Spsc<Frame>,
    outputs: Spsc<Frame>,
    breaker: Breaker,
}

impl Handle {
    /// Enqueues a frame of channel updates for the runtime to ingest on its
    /// next wait cycle. Returns `false` if the input queue is closed or full.
    pub fn write(&self, frame: Frame) -> bool {
        self.inputs.push(frame)
    }

    /// Pops the next frame of channel writes the runtime produced, if any
    /// are buffered yet.
    pub fn read(&self) -> Option<Frame> {
        self.outputs.try_pop()
    }

    /// Closes the output queue, signalling downstream consumers that no
    /// more frames are coming once it drains empty.
    pub fn close_outputs(&self) {
        self.outputs.close();
    }

    /// Requests `run` return after completing its current tick. Returns
    /// `true` if this call is what stopped it.
    pub fn stop(&self) -> bool {
        self.breaker.stop()
    }

    pub fn is_running(&self) -> bool {
        self.breaker.running()
    }
}

/// The single-threaded dataflow driver: owns the scheduler, the wait loop
/// that decides when to tick it, and the input/output queues frames cross
/// the host boundary through. Adapted from the reference runtime's
/// `Runtime` class, which spawns its own worker thread internally — here
/// `run` blocks the calling thread directly, and a [`Handle`] stands in for
/// the reference's thread-safe public methods.
pub struct Runtime {
    breaker: Breaker,
    scheduler: Scheduler,
    loop_: Loop,
    inputs: Spsc<Frame>,
    outputs: Spsc<Frame>,
    start_time: TimeStamp,
    pub read_channels: Vec<u32>,
    pub write_channels: Vec<u32>,
}

impl Runtime {
    pub fn new(
        scheduler: Scheduler,
        loop_: Loop,
        inputs: Spsc<Frame>,
        outputs: Spsc<Frame>,
        read_channels: Vec<u32>,
        write_channels: Vec<u32>,
        breaker_config: BreakerConfig,
    ) -> Self {
        Self {
            breaker: Breaker::new(breaker_config),
            scheduler,
            loop_,
            inputs,
            outputs,
            start_time: TimeStamp::now(),
            read_channels,
            write_channels,
        }
    }

    pub fn handle(&self) -> Handle {
        Handle { inputs: self.inputs.clone(), outputs: self.outputs.clone(), breaker: self.breaker.clone() }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Runs until a [`Handle::stop`] call or the input queue closes with no
    /// frame waiting, draining every channel write the tick produced into
    /// the output queue. Blocks the calling thread; must be driven from
    /// wherever this `Runtime` lives, since it is not `Send`.
    pub fn run(&mut self) -> Result<()> {
        self.breaker.start();
        let mut first = true;
        while self.breaker.running() {
            let frame = self.loop_.wait(&self.inputs);
            if frame.is_none() && self.inputs.is_closed() && !first {
                break;
            }
            first = false;

            if let Some(frame) = frame {
                self.scheduler.state_mut().ingest(&frame, TimeStamp::now());
            }

            let elapsed = TimeStamp::now() - self.start_time;
            self.scheduler.next(elapsed);

            let writes = self.scheduler.state_mut().flush();
            if !writes.is_empty() {
                let mut out = Frame::new();
                for write in writes {
                    let mut series = arc_telem::Series::empty(write.value.data_type());
                    series.push(write.value)?;
                    out.insert(write.channel_key, series);
                }
                if !self.outputs.push(out) {
                    tracing::warn!("output queue full or closed, dropping a tick's writes");
                }
            }
        }
        self.breaker.stop();
        Ok(())
    }

    pub fn stop(&self) {
        self.breaker.stop();
    }

    pub fn close_outputs(&self) {
        self.outputs.close();
    }
}
