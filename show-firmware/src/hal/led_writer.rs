// SmartLED Ausgabe für die Show
//
// Bildet den Pegel der Pattern-Engine (0-255) auf eine weiße WS2812 LED ab.
// Der Pegel wird auf LED_BRIGHTNESS begrenzt.

use rgb::RGB8;
use show_core::{OutputError, OutputSink};

/// Skaliert einen Pegel (0-255) auf die maximale Helligkeit
pub fn level_to_color(level: u8, brightness: u8) -> RGB8 {
    let value = (u16::from(level) * u16::from(brightness) / 255) as u8;
    RGB8 {
        r: value,
        g: value,
        b: value,
    }
}

// ============================================================================
// Real Hardware Implementation (nur für ESP32-Target)
// ============================================================================

#[cfg(not(test))]
mod real_impl {
    use super::*;
    use esp_hal::Blocking;
    use esp_hal::rmt::Rmt;
    use esp_hal::time::Rate;
    use esp_hal_smartled::SmartLedsAdapter;
    use smart_leds_trait::SmartLedsWrite;

    use crate::config::LED_BRIGHTNESS;

    // Buffer-Größe für 1 LED (3 Farben * 8 Bits + 1 Reset)
    pub const LED_BUFFER_SIZE: usize = 25;

    /// Real Hardware LED Writer
    ///
    /// Nutzt ESP32 RMT Peripheral um WS2812 LEDs anzusteuern.
    ///
    /// Hinweis: Der Buffer muss 'static sein, daher wird er im Task erstellt
    /// und als Parameter übergeben statt im Constructor allokiert.
    pub struct RmtLedWriter<'a> {
        led: SmartLedsAdapter<'a, LED_BUFFER_SIZE>,
    }

    impl<'a> RmtLedWriter<'a> {
        /// Erstellt einen neuen RmtLedWriter
        ///
        /// # Parameter
        /// - `gpio8`: GPIO8 Peripheral für LED-Datenleitung
        /// - `rmt_peripheral`: RMT Peripheral
        /// - `rmt_clock_mhz`: RMT Clock Frequenz in MHz (z.B. 80)
        /// - `buffer`: Buffer für LED-Daten (erstellt mit smart_led_buffer!(1) Macro)
        ///
        /// # Fehlerbehandlung
        /// Gibt `OutputError::WriteFailed` zurück wenn der RMT-Takt nicht passt
        pub fn new(
            gpio8: esp_hal::peripherals::GPIO8<'a>,
            rmt_peripheral: esp_hal::peripherals::RMT<'a>,
            rmt_clock_mhz: u32,
            buffer: &'a mut [esp_hal::rmt::PulseCode; LED_BUFFER_SIZE],
        ) -> Result<Self, OutputError> {
            let rmt: Rmt<'a, Blocking> = Rmt::new(rmt_peripheral, Rate::from_mhz(rmt_clock_mhz))
                .map_err(|_| OutputError::WriteFailed)?;

            let led = SmartLedsAdapter::new(rmt.channel0, gpio8, buffer);

            Ok(Self { led })
        }
    }

    impl OutputSink for RmtLedWriter<'_> {
        fn set_level(&mut self, level: u8) -> Result<(), OutputError> {
            let color = level_to_color(level, LED_BRIGHTNESS);
            self.led
                .write([color].into_iter())
                .map_err(|_| OutputError::WriteFailed)
        }
    }
}

#[cfg(not(test))]
pub use real_impl::{LED_BUFFER_SIZE, RmtLedWriter};

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_to_color_scales_to_brightness() {
        assert_eq!(level_to_color(0, 10), RGB8 { r: 0, g: 0, b: 0 });
        assert_eq!(level_to_color(255, 10), RGB8 { r: 10, g: 10, b: 10 });
        assert_eq!(level_to_color(128, 10), RGB8 { r: 5, g: 5, b: 5 });
    }

    #[test]
    fn test_level_to_color_full_brightness() {
        assert_eq!(level_to_color(255, 255), RGB8 { r: 255, g: 255, b: 255 });
    }
}
