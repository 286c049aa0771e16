//! Transport-Adapter
//!
//! - [`NullTransport`]: für Standalone-Knoten ohne Funk
//! - [`CrcFramed`]: hängt eine CRC-16 an jeden Datensatz (LoRa-Link)

use crate::codec::Frame;
use crate::traits::{Received, SendError, Transport};

/// Länge des CRC-Trailers
pub const CRC_SIZE: usize = 2;

/// Transport ohne Funk: Senden schlägt fehl, Empfang ist immer leer
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport;

impl Transport for NullTransport {
    fn send(&mut self, _frame: &[u8]) -> Result<(), SendError> {
        Err(SendError::NoPeer)
    }

    fn poll_receive(&mut self) -> Option<Received> {
        None
    }
}

/// CRC-16/CCITT-FALSE (Poly 0x1021, Init 0xFFFF, ohne Reflektion)
pub fn crc16(bytes: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in bytes {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// CRC-gesicherter Transport
///
/// Beim Senden wird die CRC little-endian angehängt, beim Empfang geprüft und
/// abgeschnitten. Frames mit falscher CRC werden gezählt und verworfen.
#[derive(Debug)]
pub struct CrcFramed<T> {
    inner: T,
    dropped_frames: u32,
}

impl<T: Transport> CrcFramed<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            dropped_frames: 0,
        }
    }

    /// Anzahl verworfener Frames (CRC falsch oder zu kurz)
    pub fn dropped_frames(&self) -> u32 {
        self.dropped_frames
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    fn check(frame: &mut Frame) -> bool {
        let Some(payload_len) = frame.len().checked_sub(CRC_SIZE) else {
            return false;
        };
        let (payload, trailer) = frame.split_at(payload_len);
        let expected = u16::from_le_bytes([trailer[0], trailer[1]]);
        if crc16(payload) != expected {
            return false;
        }
        frame.truncate(payload_len);
        true
    }
}

impl<T: Transport> Transport for CrcFramed<T> {
    fn send(&mut self, frame: &[u8]) -> Result<(), SendError> {
        let mut out = Frame::from_slice(frame).ok_or(SendError::FrameTooLarge)?;
        out.extend_from_slice(&crc16(frame).to_le_bytes())
            .map_err(|_| SendError::FrameTooLarge)?;
        self.inner.send(&out)
    }

    fn poll_receive(&mut self) -> Option<Received> {
        // Kaputte Frames überspringen, aber nur was gerade wartet
        while let Some(mut received) = self.inner.poll_receive() {
            if Self::check(&mut received.frame) {
                return Some(received);
            }
            self.dropped_frames = self.dropped_frames.wrapping_add(1);
        }
        None
    }
}
