use std::time::Duration;

/// Deployment limits injected into both engines. Nothing in here is
/// hard-coded inside the engines so the same logic serves different
/// server configurations.
#[derive(Clone, Debug)]
pub struct GameConfig {
    /// Smallest accepted wager, in wallet units.
    pub min_bet: f64,
    /// Total cells on a Mines board.
    pub mines_cells: u32,
    pub mines_count_min: u32,
    pub mines_count_max: u32,
    /// Length of the inter-round betting window.
    pub betting_window_secs: u32,
    /// Multiplier advance per clock tick. The visual clock and the
    /// resolution clock are the same clock, so the rate is a function of
    /// frame cadence rather than wall time.
    pub crash_tick_increment: f64,
    /// How long a resolved round stays on screen before the automatic
    /// reset.
    pub round_reset_delay: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_bet: 1.0,
            mines_cells: 25,
            mines_count_min: 1,
            mines_count_max: 24,
            betting_window_secs: 10,
            crash_tick_increment: 0.01,
            round_reset_delay: Duration::from_secs(2),
        }
    }
}
