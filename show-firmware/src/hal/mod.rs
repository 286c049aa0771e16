// Hardware Abstraction Layer (HAL) Module
//
// Dieses Modul kapselt Hardware-Zugriffe hinter den Traits aus show-core,
// damit die Show-Logik auf dem Host testbar bleibt.

pub mod clock;
pub mod espnow;
pub mod led_writer;
pub mod serial;

pub use clock::EmbassyClock;
pub use espnow::{EspNowTransport, RadioLink};
pub use serial::{LineSource, SerialLineSource};

#[cfg(not(test))]
pub use led_writer::{LED_BUFFER_SIZE, RmtLedWriter};
