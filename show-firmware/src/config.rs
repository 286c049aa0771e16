// Projekt-Konfiguration: Konstanten und Hardware-Zuordnungen
#![allow(dead_code)]

use show_core::{LinkProfile, NodeConfig, Pattern, Role};

// ============================================================================
// LED Konfiguration
// ============================================================================

/// GPIO-Pin für die RGB LED (WS2812/Neopixel)
pub const LED_GPIO_PIN: u8 = 8;

/// Maximale Helligkeit der LED (0-255)
/// Pegel 255 aus der Pattern-Engine wird auf diesen Wert skaliert
pub const LED_BRIGHTNESS: u8 = 10;

/// RMT Taktfrequenz in MHz
/// 80 MHz ist optimal für WS2812 LED-Timing
pub const RMT_CLOCK_MHZ: u32 = 80;

/// Anzahl der LEDs im Strip
pub const LED_COUNT: usize = 1;

/// Boot-Anzeige: Anzahl und Dauer der Blitze
pub const BOOT_FLASH_COUNT: u8 = 3;
pub const BOOT_FLASH_MS: u64 = 200;

// ============================================================================
// Show-Loop Konfiguration
// ============================================================================

/// Pause zwischen zwei Schleifen-Iterationen in Millisekunden
/// Muss deutlich kleiner als das kürzeste Pattern-Intervall sein (Strobe: 50 ms)
pub const LOOP_TICK_MS: u64 = 10;

/// Maximale Länge einer Serial-Zeile in Bytes
pub const SERIAL_LINE_CAPACITY: usize = 64;

/// Puffer für den Status als JSON
pub const STATUS_JSON_CAPACITY: usize = 256;

/// Rolle des Knotens
/// Wird zur Build-Zeit aus der Environment Variable SHOW_ROLE geladen
/// (transmitter | receiver | standalone), Default: receiver
pub const NODE_ROLE: &str = match option_env!("SHOW_ROLE") {
    Some(role) => role,
    None => "receiver",
};

/// Knoten-Konfiguration aus den Build-Zeit-Werten
///
/// Unbekannte Rollennamen fallen auf `Receiver` zurück.
pub fn node_config() -> NodeConfig {
    let role = Role::from_name(NODE_ROLE).unwrap_or(Role::Receiver);
    NodeConfig {
        initial_pattern: Pattern::Off,
        ..NodeConfig::new(role, LinkProfile::ESPNOW)
    }
}

// ============================================================================
// Funk Konfiguration
// ============================================================================

/// WiFi-Kanal für ESP-NOW (alle Knoten müssen denselben nutzen)
pub const ESPNOW_CHANNEL: u8 = 1;

/// Heap-Größe für den WiFi-Treiber (Bytes)
/// ESP-NOW läuft über den WiFi-Stack und braucht dynamischen Speicher
pub const WIFI_HEAP_SIZE: usize = 65536; // 64 KB

/// Zusätzliche Heap-Größe (Bytes)
pub const EXTRA_HEAP_SIZE: usize = 16384; // 16 KB
