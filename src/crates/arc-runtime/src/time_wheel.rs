use arc_telem::TimeStamp;

/// Default floor on the computed base tick period: below this, per-interval
/// software timers stop being worth it relative to just polling the input
/// queue at a fixed rate.
pub const DEFAULT_MIN_PERIOD_NS: u64 = 10_000_000;

/// Determines when a tick is due for time-based (rather than data-driven)
/// execution. `TimeWheel` itself only tracks a single base period and the
/// last time it fired — it does not know about individual interval nodes,
/// which self-check their own period against elapsed runtime once they run.
pub struct TimeWheel {
    base_period_ns: u64,
    last_tick: TimeStamp,
}

impl TimeWheel {
    pub fn new(base_period_ns: u64) -> Self {
        Self { base_period_ns: base_period_ns.max(1), last_tick: TimeStamp::now() }
    }

    /// GCD of every interval period in the graph, clamped to `min_period_ns`.
    /// A graph with periods `[100ms, 250ms, 1s]` ticks its wheel every
    /// `50ms`, letting each interval node self-check a multiple of that base.
    pub fn calculate_base_period(periods: &[u64], min_period_ns: u64) -> u64 {
        let g = periods.iter().copied().filter(|&p| p > 0).fold(0u64, gcd);
        g.max(min_period_ns)
    }

    /// Whether `base_period_ns` has elapsed since the last tick. Side
    /// effecting: advances the internal clock when it returns `true`.
    pub fn should_tick(&mut self) -> bool {
        let now = TimeStamp::now();
        if (now - self.last_tick).nanos() as u64 >= self.base_period_ns {
            self.last_tick = now;
            true
        } else {
            false
        }
    }

    pub fn base_period_ns(&self) -> u64 {
        self.base_period_ns
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_period_is_gcd_of_inputs() {
        let periods = [100_000_000, 250_000_000, 1_000_000_000];
        assert_eq!(TimeWheel::calculate_base_period(&periods, 1), 50_000_000);
    }

    #[test]
    fn base_period_clamps_to_minimum() {
        let periods = [1_000_000, 2_000_000];
        assert_eq!(TimeWheel::calculate_base_period(&periods, DEFAULT_MIN_PERIOD_NS), DEFAULT_MIN_PERIOD_NS);
    }

    #[test]
    fn empty_periods_fall_back_to_minimum() {
        assert_eq!(TimeWheel::calculate_base_period(&[], DEFAULT_MIN_PERIOD_NS), DEFAULT_MIN_PERIOD_NS);
    }

    #[test]
    fn should_tick_is_false_immediately_after_construction() {
        let mut wheel = TimeWheel::new(1_000_000_000);
        assert!(!wheel.should_tick());
    }
}
