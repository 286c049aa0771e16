// Serial-Eingabe über USB-Serial-JTAG
//
// Liest nur die Bytes, die schon im RX-FIFO liegen, und setzt daraus
// Zeilen zusammen. Ausgabe läuft weiter über esp-println/defmt.

use esp_hal::Blocking;
use esp_hal::usb_serial_jtag::UsbSerialJtagRx;
use heapless::String;
use show_core::LineBuffer;

use crate::config::SERIAL_LINE_CAPACITY;

/// Eine fertige Eingabezeile
pub type Line = String<SERIAL_LINE_CAPACITY>;

/// Quelle für Bedien-Zeilen (nicht-blockierend)
pub trait LineSource {
    /// Höchstens eine fertige Zeile, `None` wenn noch keine vollständig ist
    fn poll_line(&mut self) -> Option<Line>;
}

/// USB-Serial-JTAG Zeilenleser
pub struct SerialLineSource<'a> {
    rx: UsbSerialJtagRx<'a, Blocking>,
    lines: LineBuffer<SERIAL_LINE_CAPACITY>,
    pending: [u8; 16],
    pending_len: usize,
    pending_pos: usize,
}

impl<'a> SerialLineSource<'a> {
    pub fn new(rx: UsbSerialJtagRx<'a, Blocking>) -> Self {
        Self {
            rx,
            lines: LineBuffer::new(),
            pending: [0; 16],
            pending_len: 0,
            pending_pos: 0,
        }
    }
}

impl LineSource for SerialLineSource<'_> {
    fn poll_line(&mut self) -> Option<Line> {
        loop {
            if self.pending_pos == self.pending_len {
                self.pending_len = self.rx.drain_rx_fifo(&mut self.pending);
                self.pending_pos = 0;
                if self.pending_len == 0 {
                    return None;
                }
            }

            // Bytes nach dem Zeilenende bleiben für den nächsten Aufruf liegen
            while self.pending_pos < self.pending_len {
                let byte = self.pending[self.pending_pos];
                self.pending_pos += 1;
                if let Some(line) = self.lines.feed(byte) {
                    return Some(line);
                }
            }
        }
    }
}
