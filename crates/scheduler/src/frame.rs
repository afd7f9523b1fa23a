use drawconfig::CanvasConfig;

/// Gates expensive recompute+redraw work on a monotonically increasing
/// render tick.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    last_allowed_tick: Option<u64>,
    min_interval_ticks: u64,
}

impl FrameScheduler {
    pub fn new(min_interval_ticks: u64) -> Self {
        Self {
            last_allowed_tick: None,
            min_interval_ticks,
        }
    }

    pub fn from_config(config: &CanvasConfig) -> Self {
        Self::new(config.scheduler.min_interval_ticks)
    }

    /// Returns `true` and records `tick` when at least the minimum interval
    /// has passed since the last allowed tick. The first request always
    /// passes; a tick older than the last allowed one never does.
    pub fn request_frame(&mut self, tick: u64) -> bool {
        let allowed = match self.last_allowed_tick {
            None => true,
            Some(last) => tick
                .checked_sub(last)
                .is_some_and(|elapsed| elapsed >= self.min_interval_ticks),
        };
        if allowed {
            self.last_allowed_tick = Some(tick);
        }
        allowed
    }

    pub fn last_allowed_tick(&self) -> Option<u64> {
        self.last_allowed_tick
    }

    pub fn min_interval_ticks(&self) -> u64 {
        self.min_interval_ticks
    }

    pub fn reset(&mut self) {
        self.last_allowed_tick = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_deny_allow_for_ticks_0_5_40() {
        let mut scheduler = FrameScheduler::new(30);
        let decisions: Vec<bool> = [0, 5, 40]
            .into_iter()
            .map(|tick| scheduler.request_frame(tick))
            .collect();
        assert_eq!(decisions, vec![true, false, true]);
        assert_eq!(scheduler.last_allowed_tick(), Some(40));
    }

    #[test]
    fn cold_start_always_allows() {
        let mut scheduler = FrameScheduler::new(1_000);
        assert!(scheduler.request_frame(12_345));
    }

    #[test]
    fn denial_leaves_state_unchanged() {
        let mut scheduler = FrameScheduler::new(30);
        assert!(scheduler.request_frame(100));
        assert!(!scheduler.request_frame(110));
        assert!(!scheduler.request_frame(129));
        assert_eq!(scheduler.last_allowed_tick(), Some(100));
        assert!(scheduler.request_frame(130), "interval is inclusive");
    }

    #[test]
    fn backwards_tick_is_denied() {
        let mut scheduler = FrameScheduler::new(0);
        assert!(scheduler.request_frame(50));
        assert!(!scheduler.request_frame(49));
        assert!(scheduler.request_frame(50));
    }

    #[test]
    fn reset_returns_to_cold_start() {
        let mut scheduler = FrameScheduler::new(30);
        assert!(scheduler.request_frame(10));
        scheduler.reset();
        assert!(scheduler.request_frame(11));
    }

    #[test]
    fn reads_interval_from_config() {
        let config = CanvasConfig::from_toml_str(
            r#"
version = 1
[scheduler]
min_interval_ticks = 16
"#,
        )
        .unwrap();
        let scheduler = FrameScheduler::from_config(&config);
        assert_eq!(scheduler.min_interval_ticks(), 16);
    }
}
