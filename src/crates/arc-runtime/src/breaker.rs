use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Retry/backoff policy for transient I/O errors, carried through from
/// runtime configuration. No transport in this crate is transient enough to
/// retry yet (see `DESIGN.md`), so `Breaker` itself does not consult these
/// fields — they exist so the config surface matches the reference
/// runtime's and a future transport can read them.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakerConfig {
    pub name: String,
    pub base_interval: Duration,
    pub max_retries: u32,
    pub scale: f64,
    pub max_interval: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_interval: Duration::from_millis(100),
            max_retries: 5,
            scale: 2.0,
            max_interval: Duration::from_secs(10),
        }
    }
}

/// A cheap, cloneable running flag plus its retry/backoff policy. One
/// `Breaker` is held by the `Runtime` driving its blocking `run` loop;
/// clones handed out through a `Handle` let another thread request a stop
/// without needing `Runtime` itself to be `Send` (it isn't — see
/// `runtime.rs`).
#[derive(Clone, Default)]
pub struct Breaker {
    running: Arc<AtomicBool>,
    config: BreakerConfig,
}

impl Breaker {
    pub fn new(config: BreakerConfig) -> Self {
        Self { running: Arc::new(AtomicBool::new(false)), config }
    }

    pub fn config(&self) -> &BreakerConfig {
        &self.config
    }

    pub fn running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Returns `true` if this call actually transitioned the breaker from
    /// stopped to running.
    pub fn start(&self) -> bool {
        !self.running.swap(true, Ordering::AcqRel)
    }

    /// Returns `true` if this call actually transitioned the breaker from
    /// running to stopped.
    pub fn stop(&self) -> bool {
        self.running.swap(false, Ordering::AcqRel)
    }
}
