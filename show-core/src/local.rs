//! Lokale Steuerung (Serial-Zeilen und HTTP-Routen)
//!
//! Übersetzt Bedien-Eingaben in dasselbe [`Command`]-Vokabular wie der Funk,
//! damit lokale und entfernte Kommandos hinter dem Parser nicht mehr
//! unterscheidbar sind.

use core::fmt;

use heapless::{String, Vec};

use crate::command::Command;
use crate::dispatch::Role;
use crate::pattern::Pattern;
use crate::state::Counters;

/// Ausgabe für `help`
pub const HELP_TEXT: &str = "\
Available commands:
  start       - start show
  stop        - stop show
  on          - LED on
  off         - LED off
  toggle      - toggle LED
  scene<N>    - change scene (e.g. scene2)
  pattern<N>  - 0 off, 1 slow, 2 fast, 3 strobe, 4 pulse
  ping        - test connection
  status      - show system status
  help        - show this help";

/// Ergebnis des Parsers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LocalInput {
    Command(Command),
    Help,
    Status,
    /// Nicht verstanden, ändert nichts
    Unknown,
}

/// Parst eine Serial-Zeile
///
/// Case-insensitive, Whitespace am Rand wird ignoriert. `scene` und `pattern`
/// brauchen eine Dezimalzahl, optional mit Leerzeichen (`scene 2`).
pub fn parse_line(line: &str) -> LocalInput {
    let input = line.trim();

    let Some(word) = lowercase(input) else {
        return LocalInput::Unknown;
    };

    match word.as_str() {
        "start" => LocalInput::Command(Command::ShowStart),
        "stop" => LocalInput::Command(Command::ShowStop),
        "on" => LocalInput::Command(Command::LedOn),
        "off" => LocalInput::Command(Command::LedOff),
        "toggle" => LocalInput::Command(Command::LedToggle),
        "ping" => LocalInput::Command(Command::Ping),
        "help" => LocalInput::Help,
        "status" => LocalInput::Status,
        other => parse_numbered(other),
    }
}

/// Parst eine HTTP-Route (`/start`, `/scene2`, ...)
///
/// Query-String wird ignoriert, `/` liefert den Status.
pub fn parse_route(path: &str) -> LocalInput {
    let path = path.split('?').next().unwrap_or("");
    let route = path.trim().trim_start_matches('/').trim_end_matches('/');
    if route.is_empty() {
        return LocalInput::Status;
    }
    // Routen haben keine Leerzeichen
    if route.contains(char::is_whitespace) {
        return LocalInput::Unknown;
    }
    parse_line(route)
}

fn parse_numbered(word: &str) -> LocalInput {
    if let Some(rest) = word.strip_prefix("scene") {
        return parse_number(rest).map_or(LocalInput::Unknown, |n| {
            LocalInput::Command(Command::Scene(n))
        });
    }
    if let Some(rest) = word.strip_prefix("pattern") {
        return parse_number(rest).map_or(LocalInput::Unknown, |n| {
            LocalInput::Command(Command::Pattern(n))
        });
    }
    LocalInput::Unknown
}

fn parse_number(text: &str) -> Option<i32> {
    let text = text.trim_start();
    // `str::parse` akzeptiert ein führendes '+', das wollen wir nicht
    if text.starts_with('+') {
        return None;
    }
    text.parse().ok()
}

/// Längste Eingabe die der Parser betrachtet
const MAX_WORD_LEN: usize = 32;

fn lowercase(input: &str) -> Option<String<MAX_WORD_LEN>> {
    let mut out = String::new();
    for c in input.chars() {
        out.push(c.to_ascii_lowercase()).ok()?;
    }
    Some(out)
}

/// Sammelt Bytes bis zum Zeilenende
///
/// Nicht-blockierend: jedes Byte wird einzeln eingespeist. Zu lange oder
/// ungültige Zeilen werden komplett verworfen.
#[derive(Debug, Default)]
pub struct LineBuffer<const N: usize> {
    buf: Vec<u8, N>,
    overflow: bool,
}

impl<const N: usize> LineBuffer<N> {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            overflow: false,
        }
    }

    /// Speist ein Byte ein und liefert die Zeile bei `\n`
    pub fn feed(&mut self, byte: u8) -> Option<String<N>> {
        match byte {
            b'\r' => None,
            b'\n' => {
                let overflow = core::mem::replace(&mut self.overflow, false);
                let line = self.take_line();
                if overflow { None } else { line }
            }
            _ => {
                if self.buf.push(byte).is_err() {
                    self.overflow = true;
                }
                None
            }
        }
    }

    fn take_line(&mut self) -> Option<String<N>> {
        let line = core::str::from_utf8(&self.buf).ok().and_then(|text| {
            let mut out = String::new();
            out.push_str(text).ok()?;
            Some(out)
        });
        self.buf.clear();
        line
    }
}

/// Antwort auf `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    pub role: Role,
    pub link: &'static str,
    pub counters: Counters,
    pub output_level: u8,
    pub show_running: bool,
    pub scene_id: i32,
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_pattern_name"))]
    pub pattern: Pattern,
}

#[cfg(feature = "serde")]
impl StatusReport {
    /// Schreibt den Status als JSON in `buf` und liefert die Länge
    ///
    /// # Fehlerbehandlung
    /// `BufferFull` wenn `buf` zu klein ist
    pub fn write_json(&self, buf: &mut [u8]) -> Result<usize, serde_json_core::ser::Error> {
        serde_json_core::to_slice(self, buf)
    }
}

#[cfg(feature = "serde")]
fn serialize_pattern_name<S: serde::Serializer>(
    pattern: &Pattern,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(pattern.name())
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "System status:")?;
        writeln!(f, "  Role: {}", self.role)?;
        writeln!(f, "  Link: {}", self.link)?;
        writeln!(f, "  Messages sent: {}", self.counters.messages_sent)?;
        writeln!(f, "  Messages received: {}", self.counters.messages_received)?;
        writeln!(
            f,
            "  LED state: {} ({})",
            if self.output_level > 0 { "ON" } else { "OFF" },
            self.output_level
        )?;
        writeln!(
            f,
            "  Show running: {}",
            if self.show_running { "YES" } else { "NO" }
        )?;
        writeln!(f, "  Current scene: {}", self.scene_id)?;
        write!(f, "  Pattern: {}", self.pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_words() {
        assert_eq!(parse_line("start"), LocalInput::Command(Command::ShowStart));
        assert_eq!(parse_line("  STOP \r"), LocalInput::Command(Command::ShowStop));
        assert_eq!(parse_line("Toggle"), LocalInput::Command(Command::LedToggle));
        assert_eq!(parse_line("help"), LocalInput::Help);
        assert_eq!(parse_line("status"), LocalInput::Status);
    }

    #[test]
    fn test_parse_numbered() {
        assert_eq!(parse_line("scene2"), LocalInput::Command(Command::Scene(2)));
        assert_eq!(parse_line("scene 12"), LocalInput::Command(Command::Scene(12)));
        assert_eq!(parse_line("PATTERN3"), LocalInput::Command(Command::Pattern(3)));
        assert_eq!(parse_line("scene-1"), LocalInput::Command(Command::Scene(-1)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "scene", "scenex", "scene 2x", "scene+2", "blackout", "pattern 1 2"] {
            assert_eq!(parse_line(input), LocalInput::Unknown, "input {input:?}");
        }
        // länger als jedes bekannte Wort
        assert_eq!(
            parse_line("scene000000000000000000000000000000001"),
            LocalInput::Unknown
        );
    }

    #[test]
    fn test_parse_routes() {
        assert_eq!(parse_route("/start"), LocalInput::Command(Command::ShowStart));
        assert_eq!(parse_route("/scene3"), LocalInput::Command(Command::Scene(3)));
        assert_eq!(parse_route("/stop?from=ui"), LocalInput::Command(Command::ShowStop));
        assert_eq!(parse_route("/"), LocalInput::Status);
        assert_eq!(parse_route("/scene 3"), LocalInput::Unknown);
        assert_eq!(parse_route("/favicon.ico"), LocalInput::Unknown);
    }

    #[test]
    fn test_line_buffer_yields_lines() {
        let mut lines = LineBuffer::<16>::new();
        let mut out = None;
        for &b in b"scene2\r\n" {
            if let Some(line) = lines.feed(b) {
                out = Some(line);
            }
        }
        assert_eq!(out.as_deref(), Some("scene2"));
        assert_eq!(lines.feed(b'\n').as_deref(), Some(""));
    }

    #[test]
    fn test_line_buffer_discards_overlong_line() {
        let mut lines = LineBuffer::<4>::new();
        for &b in b"toolong" {
            assert!(lines.feed(b).is_none());
        }
        assert!(lines.feed(b'\n').is_none());

        for &b in b"on" {
            lines.feed(b);
        }
        assert_eq!(lines.feed(b'\n').as_deref(), Some("on"));
    }

    #[test]
    fn test_line_buffer_discards_invalid_utf8() {
        let mut lines = LineBuffer::<8>::new();
        lines.feed(0xFF);
        assert!(lines.feed(b'\n').is_none());
    }
}
