//! Knoten-Konfiguration
//!
//! Protokoll-Konstanten liegen bei ihrem Modul, hier wird nur pro Knoten
//! entschieden was davon gilt.

use crate::codec::WireFormat;
use crate::dispatch::{PING_REPLY_DELAY_MS, Role};
use crate::pattern::Pattern;

/// Bedeutung des `counter`-Felds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CounterMode {
    /// Millisekunden seit Boot des Senders (Empfänger zeigt die Latenz)
    Timestamp,
    /// Fortlaufende Nachrichten-Nummer
    Sequence,
}

/// Wire-Format + Zähler-Modus eines Funk-Links
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkProfile {
    pub name: &'static str,
    pub wire: WireFormat,
    pub counter_mode: CounterMode,
}

impl LinkProfile {
    pub const ESPNOW: Self = Self {
        name: "ESP-NOW",
        wire: WireFormat::ESPNOW,
        counter_mode: CounterMode::Timestamp,
    };

    pub const LORA: Self = Self {
        name: "LoRa",
        wire: WireFormat::LORA,
        counter_mode: CounterMode::Sequence,
    };
}

/// Konfiguration eines Knotens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeConfig {
    pub role: Role,
    pub link: LinkProfile,
    /// Pattern nach dem Boot
    pub initial_pattern: Pattern,
    /// Gleicher Zähler zweimal hintereinander → ignorieren
    pub suppress_duplicates: bool,
    pub ping_reply_delay_ms: u32,
}

impl NodeConfig {
    pub fn new(role: Role, link: LinkProfile) -> Self {
        Self {
            role,
            link,
            ..Self::default()
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            role: Role::Receiver,
            link: LinkProfile::ESPNOW,
            initial_pattern: Pattern::Off,
            suppress_duplicates: true,
            ping_reply_delay_ms: PING_REPLY_DELAY_MS,
        }
    }
}
