use std::fmt;
use std::time::Duration;

/// Preset tick intervals, as offered by the emulation menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speed {
    Slow,
    Normal,
    Fast,
}

impl Speed {
    pub fn interval(self) -> Duration {
        match self {
            Speed::Slow => Duration::from_millis(10),
            Speed::Normal => Duration::from_millis(5),
            Speed::Fast => Duration::from_millis(2),
        }
    }
}

/// How the delay and sound timers are clocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimerMode {
    /// once per tick, so timers speed up and slow down with the CPU
    #[default]
    PerTick,
    /// 60Hz wall-clock, whatever the CPU speed
    Fixed60Hz,
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerMode::PerTick => write!(f, "per-tick"),
            TimerMode::Fixed60Hz => write!(f, "60Hz"),
        }
    }
}

/// 60Hz, as on the COSMAC VIP
pub const TIMER_PERIOD: Duration = Duration::from_micros(16_667);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorConfig {
    /// time between ticks
    pub speed: Duration,
    pub timer_mode: TimerMode,
    /// seed for Cxkk; `None` seeds from entropy
    pub seed: Option<u64>,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        EmulatorConfig {
            speed: Speed::Normal.interval(),
            timer_mode: TimerMode::PerTick,
            seed: None,
        }
    }
}

impl EmulatorConfig {
    pub fn with_speed(mut self, speed: Duration) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_timer_mode(mut self, timer_mode: TimerMode) -> Self {
        self.timer_mode = timer_mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = EmulatorConfig::default();
        assert_eq!(c.speed, Duration::from_millis(5));
        assert_eq!(c.timer_mode, TimerMode::PerTick);
        assert_eq!(c.seed, None);
    }

    #[test]
    fn test_speed_presets() {
        assert!(Speed::Slow.interval() > Speed::Normal.interval());
        assert!(Speed::Normal.interval() > Speed::Fast.interval());
    }

    #[test]
    fn test_builders() {
        let c = EmulatorConfig::default()
            .with_speed(Speed::Fast.interval())
            .with_timer_mode(TimerMode::Fixed60Hz)
            .with_seed(7);
        assert_eq!(c.speed, Duration::from_millis(2));
        assert_eq!(c.timer_mode, TimerMode::Fixed60Hz);
        assert_eq!(c.seed, Some(7));
    }
}
