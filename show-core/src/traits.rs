//! Hardware Abstraction Traits
//!
//! Diese Traits definieren Schnittstellen für Funk, Ausgabe und Zeit
//! ohne konkrete Implementierung.

use core::fmt;

use crate::codec::Frame;

/// Fehler-Typ für die Ausgabe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    WriteFailed,
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputError::WriteFailed => f.write_str("output write failed"),
        }
    }
}

impl core::error::Error for OutputError {}

/// Trait für die Show-Ausgabe (LED, Relais, ...)
///
/// # Implementierungen
/// - **Production:** RmtLedWriter (ESP32 RMT Peripheral, WS2812)
/// - **Testing:** MockOutput (in-memory Mock)
pub trait OutputSink: Send {
    /// Setzt den Ausgabe-Pegel (0 = aus, 255 = voll)
    ///
    /// # Fehlerbehandlung
    /// Gibt `OutputError::WriteFailed` zurück wenn Hardware-Zugriff fehlschlägt
    fn set_level(&mut self, level: u8) -> Result<(), OutputError>;
}

/// Fehler beim Senden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SendError {
    /// Funk ist belegt, nächster Versuch später
    TransportBusy,
    /// Kein Peer / Funk nicht initialisiert
    NoPeer,
    /// Datensatz plus Trailer passt nicht in einen Frame
    FrameTooLarge,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::TransportBusy => f.write_str("transport busy"),
            SendError::NoPeer => f.write_str("no peer"),
            SendError::FrameTooLarge => f.write_str("frame too large"),
        }
    }
}

impl core::error::Error for SendError {}

/// Hardware-Adresse eines Senders (ESP-NOW: MAC)
pub type PeerAddress = [u8; 6];

/// Empfangs-Metadaten
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceiveMeta {
    pub received_at_ms: u64,
    /// Absender, falls der Link ihn kennt (LoRa-Rohdaten: `None`)
    pub sender: Option<PeerAddress>,
    pub rssi_dbm: Option<i16>,
    /// Nur LoRa
    pub snr_db: Option<f32>,
}

/// Empfangenes Datagramm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Received {
    pub frame: Frame,
    pub meta: ReceiveMeta,
}

/// Trait für den Broadcast-Transport
///
/// Ein Aufruf von [`Transport::send`] überträgt genau einen Datensatz an alle
/// Empfänger. Zustellung und Reihenfolge sind nicht garantiert.
///
/// # Implementierungen
/// - **Production:** EspNowTransport (esp-radio ESP-NOW, Broadcast-Adresse)
/// - **Testing:** MockTransport (Inbox-Queue + gesendete Frames)
pub trait Transport {
    fn send(&mut self, frame: &[u8]) -> Result<(), SendError>;

    /// Nicht-blockierend: höchstens ein wartendes Datagramm
    fn poll_receive(&mut self) -> Option<Received>;
}

/// Monotone Millisekunden seit Boot
pub trait Clock {
    fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
