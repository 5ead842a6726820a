use std::collections::VecDeque;

use taskgraph::controller::HostSampler;
use taskgraph::Result;

/// A [`HostSampler`] that plays back a fixed script of `(cpu_pct, mem_pct)`
/// readings, one per call to `sample()`. Once exhausted it repeats the last
/// reading, so a test doesn't need to know exactly how many ticks will
/// occur.
pub struct FakeHostSampler {
    readings: VecDeque<(f64, f64)>,
    last: (f64, f64),
}

impl FakeHostSampler {
    pub fn new(script: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let readings: VecDeque<_> = script.into_iter().collect();
        let last = readings.front().copied().unwrap_or((0.0, 0.0));
        FakeHostSampler { readings, last }
    }
}

impl HostSampler for FakeHostSampler {
    fn sample(&mut self) -> Result<(f64, f64)> {
        let reading = self.readings.pop_front().unwrap_or(self.last);
        self.last = reading;
        Ok(reading)
    }
}
