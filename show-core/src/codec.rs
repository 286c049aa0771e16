//! Message Codec - festes Wire-Format für Show-Kommandos
//!
//! Jeder Datensatz hat eine feste Größe und wird ohne Längen-Präfix übertragen:
//!
//! ```text
//! offset 0   : command  (NUL-gepaddeter ASCII-Text, 32 Bytes ESP-NOW / 16 Bytes LoRa)
//! offset N   : value1   (i32, little-endian)
//! offset N+4 : value2   (i32, little-endian)
//! offset N+8 : counter  (u32, Timestamp oder Sequenznummer)
//! ```
//!
//! Alle ESP32-Sender sind little-endian, daher ist das Format byte-kompatibel
//! mit den bestehenden Geräten.

use core::fmt;
use core::ops::Deref;

use heapless::String;

/// Größte Kommando-Kapazität aller Wire-Formate (ESP-NOW)
pub const MAX_COMMAND_CAPACITY: usize = 32;

/// value1 + value2 + counter
const TRAILER_SIZE: usize = 12;

/// Puffergröße für rohe Datagramme (Datensatz + Transport-Trailer wie CRC)
pub const FRAME_CAPACITY: usize = 64;

/// Kommando-Name eines dekodierten Datensatzes (kein Heap)
pub type CommandName = String<MAX_COMMAND_CAPACITY>;

/// Fehler beim Dekodieren eines Datensatzes
///
/// Der Empfänger verwirft das Paket und läuft weiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Puffer hat nicht exakt die Datensatz-Größe (fremdes oder kaputtes Paket)
    SizeMismatch { expected: usize, actual: usize },
    /// Kommando-Feld ist kein gültiges UTF-8
    InvalidText,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected} bytes, got {actual}")
            }
            CodecError::InvalidText => f.write_str("command field is not valid text"),
        }
    }
}

impl core::error::Error for CodecError {}

/// Fehler wenn ein Frame nicht in den festen Puffer passt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFull;

/// Rohes Datagramm mit fester Kapazität
///
/// Wird von Transport-Adaptern und vom Codec genutzt.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    buf: [u8; FRAME_CAPACITY],
    len: usize,
}

impl Frame {
    pub const fn new() -> Self {
        Self {
            buf: [0; FRAME_CAPACITY],
            len: 0,
        }
    }

    /// Kopiert ein empfangenes Datagramm, `None` wenn es zu groß ist
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let mut frame = Self::new();
        frame.extend_from_slice(bytes).ok()?;
        Some(frame)
    }

    /// Hängt Bytes an; bei Überlauf bleibt der Frame unverändert
    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), FrameFull> {
        let end = self.len + bytes.len();
        if end > FRAME_CAPACITY {
            return Err(FrameFull);
        }
        self.buf[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    /// Kürzt den Frame (z.B. um einen geprüften CRC-Trailer)
    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Frame {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Frame").field(&self.as_bytes()).finish()
    }
}

/// Dekodierter Datensatz
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMessage {
    pub command: CommandName,
    pub value1: i32,
    pub value2: i32,
    pub counter: u32,
}

impl CommandMessage {
    /// Erstellt einen Datensatz; zu lange Namen werden auf [`MAX_COMMAND_CAPACITY`] gekürzt
    pub fn new(name: &str, value1: i32, value2: i32, counter: u32) -> Self {
        let mut command = CommandName::new();
        // passt immer, truncate_utf8 begrenzt auf die Kapazität
        let _ = command.push_str(truncate_utf8(name, MAX_COMMAND_CAPACITY));
        Self {
            command,
            value1,
            value2,
            counter,
        }
    }

    pub fn name(&self) -> &str {
        self.command.as_str()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CommandMessage {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "{} [{},{}] #{}",
            self.command.as_str(),
            self.value1,
            self.value2,
            self.counter
        )
    }
}

/// Layout eines Datensatzes für einen Transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WireFormat {
    command_capacity: usize,
}

impl WireFormat {
    /// ESP-NOW: 32 Bytes Kommando, 44 Bytes Datensatz
    pub const ESPNOW: Self = Self {
        command_capacity: 32,
    };

    /// LoRa: 16 Bytes Kommando, 28 Bytes Datensatz
    pub const LORA: Self = Self {
        command_capacity: 16,
    };

    pub const fn command_capacity(self) -> usize {
        self.command_capacity
    }

    pub const fn record_size(self) -> usize {
        self.command_capacity + TRAILER_SIZE
    }

    /// Längster Name der unverändert übertragen wird (ein Byte bleibt für NUL)
    pub const fn max_name_len(self) -> usize {
        self.command_capacity - 1
    }

    /// Kodiert einen Datensatz
    ///
    /// Namen länger als [`WireFormat::max_name_len`] werden still auf eine
    /// Zeichengrenze gekürzt, danach folgt immer mindestens ein NUL.
    pub fn encode(self, name: &str, value1: i32, value2: i32, counter: u32) -> Frame {
        let mut record = [0u8; FRAME_CAPACITY];
        let text = truncate_utf8(name, self.max_name_len());
        record[..text.len()].copy_from_slice(text.as_bytes());

        let n = self.command_capacity;
        record[n..n + 4].copy_from_slice(&value1.to_le_bytes());
        record[n + 4..n + 8].copy_from_slice(&value2.to_le_bytes());
        record[n + 8..n + 12].copy_from_slice(&counter.to_le_bytes());

        Frame {
            buf: record,
            len: self.record_size(),
        }
    }

    pub fn encode_message(self, message: &CommandMessage) -> Frame {
        self.encode(
            message.name(),
            message.value1,
            message.value2,
            message.counter,
        )
    }

    /// Dekodiert einen Datensatz
    ///
    /// # Fehlerbehandlung
    /// - `SizeMismatch` wenn der Puffer nicht exakt [`WireFormat::record_size`] lang ist
    /// - `InvalidText` wenn das Kommando-Feld kein UTF-8 ist
    pub fn decode(self, bytes: &[u8]) -> Result<CommandMessage, CodecError> {
        let expected = self.record_size();
        if bytes.len() != expected {
            return Err(CodecError::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        let (text, values) = bytes.split_at(self.command_capacity);
        // Fremde Sender füllen das Feld evtl. komplett ohne NUL
        let end = text.iter().position(|&b| b == 0).unwrap_or(text.len());
        let name = core::str::from_utf8(&text[..end]).map_err(|_| CodecError::InvalidText)?;

        Ok(CommandMessage::new(
            name,
            i32::from_le_bytes(word(values, 0)),
            i32::from_le_bytes(word(values, 4)),
            u32::from_le_bytes(word(values, 8)),
        ))
    }
}

fn word(bytes: &[u8], offset: usize) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&bytes[offset..offset + 4]);
    out
}

/// Kürzt auf höchstens `max` Bytes, ohne ein UTF-8 Zeichen zu zerschneiden
fn truncate_utf8(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(WireFormat::ESPNOW.record_size(), 44);
        assert_eq!(WireFormat::LORA.record_size(), 28);
    }

    #[test]
    fn test_roundtrip_espnow() {
        let frame = WireFormat::ESPNOW.encode("PATTERN", 3, -7, 123_456);
        let msg = WireFormat::ESPNOW.decode(&frame).unwrap();
        assert_eq!(msg, CommandMessage::new("PATTERN", 3, -7, 123_456));
    }

    #[test]
    fn test_roundtrip_longest_name() {
        let name = "ABCDEFGHIJKLMNO"; // 15 Bytes = LoRa max_name_len
        let frame = WireFormat::LORA.encode(name, i32::MIN, i32::MAX, u32::MAX);
        let msg = WireFormat::LORA.decode(&frame).unwrap();
        assert_eq!(msg.name(), name);
        assert_eq!(msg.value1, i32::MIN);
        assert_eq!(msg.value2, i32::MAX);
        assert_eq!(msg.counter, u32::MAX);
    }

    #[test]
    fn test_byte_layout() {
        let frame = WireFormat::LORA.encode("SCENE", 2, 0, 7);
        assert_eq!(frame.len(), 28);
        assert_eq!(&frame[..5], b"SCENE");
        assert!(frame[5..16].iter().all(|&b| b == 0));
        assert_eq!(&frame[16..20], &[2, 0, 0, 0]);
        assert_eq!(&frame[20..24], &[0, 0, 0, 0]);
        assert_eq!(&frame[24..28], &[7, 0, 0, 0]);
    }

    #[test]
    fn test_truncates_long_name() {
        let frame = WireFormat::LORA.encode("SHOW_START_EXTENDED", 0, 0, 1);
        assert_eq!(frame[15], 0);
        let msg = WireFormat::LORA.decode(&frame).unwrap();
        assert_eq!(msg.name(), "SHOW_START_EXTE");
    }

    #[test]
    fn test_truncates_on_char_boundary() {
        // 8 × 'Ä' = 16 Bytes, passt nicht in 15 Bytes
        let frame = WireFormat::LORA.encode("ÄÄÄÄÄÄÄÄ", 0, 0, 0);
        let msg = WireFormat::LORA.decode(&frame).unwrap();
        assert_eq!(msg.name(), "ÄÄÄÄÄÄÄ");
    }

    #[test]
    fn test_decode_size_mismatch() {
        for len in [0usize, 1, 27, 29, 44] {
            let buf = [0u8; 64];
            assert_eq!(
                WireFormat::LORA.decode(&buf[..len]),
                Err(CodecError::SizeMismatch {
                    expected: 28,
                    actual: len
                })
            );
        }
    }

    #[test]
    fn test_decode_full_field_without_nul() {
        let mut buf = [0u8; 28];
        buf[..16].copy_from_slice(b"ABCDEFGHIJKLMNOP");
        let msg = WireFormat::LORA.decode(&buf).unwrap();
        assert_eq!(msg.name(), "ABCDEFGHIJKLMNOP");
    }

    #[test]
    fn test_decode_invalid_text() {
        let mut buf = [0u8; 28];
        buf[0] = 0xFF;
        buf[1] = 0xFE;
        assert_eq!(WireFormat::LORA.decode(&buf), Err(CodecError::InvalidText));
    }

    #[test]
    fn test_frame_capacity() {
        assert!(Frame::from_slice(&[0u8; FRAME_CAPACITY]).is_some());
        assert!(Frame::from_slice(&[0u8; FRAME_CAPACITY + 1]).is_none());

        let mut frame = Frame::from_slice(&[1, 2, 3]).unwrap();
        assert_eq!(frame.extend_from_slice(&[0u8; FRAME_CAPACITY]), Err(FrameFull));
        assert_eq!(frame.as_bytes(), &[1, 2, 3]);
        frame.truncate(1);
        assert_eq!(frame.as_bytes(), &[1]);
    }
}
