// Zeitquelle für die Pattern-Engine (embassy-time, Millisekunden seit Boot)

use embassy_time::Instant;
use show_core::Clock;

#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        Instant::now().as_millis()
    }
}
