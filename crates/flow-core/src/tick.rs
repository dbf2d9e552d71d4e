/// Per-tick information handed to every node entry point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub tick: u64,
    pub dt_seconds: f32,
}

impl TickContext {
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            dt_seconds: 0.0,
        }
    }

    pub fn next(&self) -> Self {
        Self {
            tick: self.tick.wrapping_add(1),
            dt_seconds: self.dt_seconds,
        }
    }
}
