// ---------------------------------------------------------------------------
// Simulation clock
// ---------------------------------------------------------------------------

/// Fixed-rate simulated Ground Elapsed Time. Tick pacing is entirely
/// simulated — wall-clock throttling belongs to the embedding layer.
///
/// GET is derived as `start + ticks · dt` rather than accumulated, so a
/// run's tick timestamps are exactly reproducible.
#[derive(Debug, Clone)]
pub struct SimClock {
    start_get_s: f64,
    tick_hz: f64,
    ticks: u64,
}

impl SimClock {
    pub fn new(tick_hz: f64) -> Self {
        Self::starting_at(0.0, tick_hz)
    }

    pub fn starting_at(start_get_s: f64, tick_hz: f64) -> Self {
        Self {
            start_get_s,
            tick_hz: tick_hz.max(1e-3),
            ticks: 0,
        }
    }

    /// Seconds of simulated time per tick.
    pub fn dt(&self) -> f64 {
        1.0 / self.tick_hz
    }

    pub fn tick_hz(&self) -> f64 {
        self.tick_hz
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn get_s(&self) -> f64 {
        self.start_get_s + self.ticks as f64 * self.dt()
    }

    /// Advance one tick and return the new GET.
    pub fn advance(&mut self) -> f64 {
        self.ticks += 1;
        self.get_s()
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(20.0)
    }
}

/// Render GET seconds as `HHH:MM:SS`.
pub fn format_get(get_s: f64) -> String {
    let total = get_s.max(0.0).round() as u64;
    let hours = total / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    format!("{:03}:{:02}:{:02}", hours, minutes, seconds)
}
