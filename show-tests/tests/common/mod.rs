//! Gemeinsame Mocks für die Host-Tests
//!
//! Ersetzen Funk, LED und Uhr, damit `Node` ohne Hardware läuft.
#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;

use show_core::{
    Clock, CommandMessage, Frame, OutputError, OutputSink, PeerAddress, ReceiveMeta, Received,
    SendError, Transport, WireFormat,
};

// ============================================================================
// Mock Transport
// ============================================================================

#[derive(Default)]
pub struct MockTransport {
    /// Wartende Pakete, `poll_receive` liefert eins pro Aufruf
    pub inbox: VecDeque<Received>,
    /// Alle erfolgreich gesendeten Frames
    pub sent: Vec<Frame>,
    /// Simuliere belegten Funk beim nächsten send()
    pub fail_next_send: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_raw(&mut self, bytes: &[u8]) {
        self.push_raw_with_rssi(bytes, None);
    }

    pub fn push_raw_with_rssi(&mut self, bytes: &[u8], rssi_dbm: Option<i16>) {
        self.push_raw_with_meta(
            bytes,
            ReceiveMeta {
                rssi_dbm,
                ..ReceiveMeta::default()
            },
        );
    }

    pub fn push_raw_with_meta(&mut self, bytes: &[u8], meta: ReceiveMeta) {
        let frame = Frame::from_slice(bytes).expect("test frame fits");
        self.inbox.push_back(Received { frame, meta });
    }

    pub fn push_command(&mut self, wire: WireFormat, name: &str, value1: i32, counter: u32) {
        let frame = wire.encode(name, value1, 0, counter);
        self.push_raw(&frame);
    }

    /// Wie `push_command`, aber mit bekanntem Absender (ESP-NOW)
    pub fn push_command_from(
        &mut self,
        sender: PeerAddress,
        wire: WireFormat,
        name: &str,
        value1: i32,
        counter: u32,
    ) {
        let frame = wire.encode(name, value1, 0, counter);
        self.push_raw_with_meta(
            &frame,
            ReceiveMeta {
                sender: Some(sender),
                ..ReceiveMeta::default()
            },
        );
    }

    /// Gesendete Frames dekodiert
    pub fn sent_messages(&self, wire: WireFormat) -> Vec<CommandMessage> {
        self.sent
            .iter()
            .map(|frame| wire.decode(frame).expect("sent frame decodes"))
            .collect()
    }
}

impl Transport for MockTransport {
    fn send(&mut self, frame: &[u8]) -> Result<(), SendError> {
        if self.fail_next_send {
            self.fail_next_send = false;
            return Err(SendError::TransportBusy);
        }
        self.sent.push(Frame::from_slice(frame).ok_or(SendError::FrameTooLarge)?);
        Ok(())
    }

    fn poll_receive(&mut self) -> Option<Received> {
        self.inbox.pop_front()
    }
}

// ============================================================================
// Mock Output
// ============================================================================

#[derive(Default)]
pub struct MockOutput {
    /// Zuletzt geschriebener Pegel (für Assertions in Tests)
    pub last_level: Option<u8>,
    /// Anzahl der set_level() Aufrufe
    pub write_count: usize,
    /// Simuliere Fehler beim nächsten set_level()
    pub fail_next_write: bool,
}

impl MockOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputSink for MockOutput {
    fn set_level(&mut self, level: u8) -> Result<(), OutputError> {
        if self.fail_next_write {
            self.fail_next_write = false;
            return Err(OutputError::WriteFailed);
        }

        self.last_level = Some(level);
        self.write_count += 1;
        Ok(())
    }
}

// ============================================================================
// Manual Clock
// ============================================================================

#[derive(Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn at(now: u64) -> Self {
        Self {
            now: Cell::new(now),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.set(now);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}
