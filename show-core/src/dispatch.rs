//! Command Dispatcher
//!
//! Einzige Stelle, an der ein dekodierter Datensatz zu einer Zustandsänderung
//! wird. Unbekannte Kommandos sind kein Fehler sondern ein normales
//! [`DispatchOutcome::Ignored`], denn Gegenstellen können eine andere
//! Firmware-Version haben.

use core::fmt;

use heapless::Vec;

use crate::codec::CommandMessage;
use crate::command::Command;
use crate::pattern::{FULL_LEVEL, Pattern};
use crate::state::NodeState;
use crate::traits::PeerAddress;

/// Verzögerung zwischen empfangenem PING und gesendetem PONG
pub const PING_REPLY_DELAY_MS: u32 = 100;

/// Anzahl Sender, deren letzter Zähler gemerkt wird
pub const TRACKED_SENDERS: usize = 8;

/// Rolle des Knotens (zur Laufzeit gewählt)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Sendet lokale Kommandos per Funk
    Transmitter,
    /// Führt Funk-Kommandos aus und beantwortet PING
    Receiver,
    /// Ohne Funk, führt lokale Kommandos direkt aus
    Standalone,
}

impl Role {
    /// Nur Empfänger antworten auf PING mit PONG
    pub const fn can_reply(self) -> bool {
        matches!(self, Role::Receiver)
    }

    /// Lokale Kommandos werden gesendet statt lokal ausgeführt
    pub const fn broadcasts_local(self) -> bool {
        matches!(self, Role::Transmitter)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Role::Transmitter => "TRANSMITTER",
            Role::Receiver => "RECEIVER",
            Role::Standalone => "STANDALONE",
        }
    }

    /// Parst den Rollennamen (case-insensitive), z.B. aus der Build-Konfiguration
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        [Role::Transmitter, Role::Receiver, Role::Standalone]
            .into_iter()
            .find(|role| role.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Herkunft eines Datensatzes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Origin {
    /// Serial / HTTP am selben Gerät
    Local,
    /// Über den Transport empfangen, mit Absender falls bekannt
    Remote(Option<PeerAddress>),
}

/// Angewendete Wirkung eines Kommandos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Effect {
    /// Direkter Ausgabe-Pegel, am Pattern vorbei
    Output { level: u8, toggled: bool },
    PatternChanged(Pattern),
    ShowStarted,
    ShowStopped,
    SceneChanged { scene_id: i32, pattern: Pattern },
    /// `reply_due_ms` ist gesetzt wenn ein PONG geplant wurde
    PingReceived { reply_due_ms: Option<u64> },
    PongReceived,
}

/// Grund für ein ignoriertes Kommando
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IgnoreReason {
    UnknownCommand,
    UnknownPattern(i32),
    /// Wiederholung der vorigen Funk-Nachricht desselben Senders
    Duplicate(u32),
}

/// Ergebnis von [`Dispatcher::dispatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchOutcome {
    Applied(Effect),
    Ignored(IgnoreReason),
}

impl DispatchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, DispatchOutcome::Applied(_))
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Output {
                level,
                toggled: true,
            } => write!(f, "LED toggled (level {level})"),
            Effect::Output { level: 0, .. } => f.write_str("LED OFF"),
            Effect::Output { .. } => f.write_str("LED ON"),
            Effect::PatternChanged(pattern) => write!(f, "pattern changed to {pattern}"),
            Effect::ShowStarted => f.write_str("show started"),
            Effect::ShowStopped => f.write_str("show stopped"),
            Effect::SceneChanged { scene_id, pattern } => {
                write!(f, "scene changed to {scene_id} ({pattern})")
            }
            Effect::PingReceived {
                reply_due_ms: Some(_),
            } => f.write_str("PING received, PONG scheduled"),
            Effect::PingReceived { reply_due_ms: None } => f.write_str("PING received"),
            Effect::PongReceived => f.write_str("PONG received"),
        }
    }
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoreReason::UnknownCommand => f.write_str("unknown command"),
            IgnoreReason::UnknownPattern(id) => write!(f, "unknown pattern {id}"),
            IgnoreReason::Duplicate(counter) => write!(f, "duplicate message #{counter}"),
        }
    }
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchOutcome::Applied(effect) => write!(f, "applied: {effect}"),
            DispatchOutcome::Ignored(reason) => write!(f, "ignored: {reason}"),
        }
    }
}

/// Command Dispatcher
///
/// Hält nur die Rolle und den Duplikat-Filter; Pattern- und Show-State
/// werden bei jedem Aufruf übergeben.
///
/// # Duplikat-Filter
/// - Sender mit Adresse (ESP-NOW): letzter Zähler pro Sender
/// - Ohne Adresse (LoRa-Rohdaten): nur exakt gleiche Datensätze hintereinander
/// - PONG wird nie gefiltert, mehrere Empfänger antworten mit gleichem Zähler
#[derive(Debug, Clone)]
pub struct Dispatcher {
    role: Role,
    reply_delay_ms: u32,
    suppress_duplicates: bool,
    last_by_sender: Vec<(PeerAddress, u32), TRACKED_SENDERS>,
    last_anonymous: Option<CommandMessage>,
}

impl Dispatcher {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            reply_delay_ms: PING_REPLY_DELAY_MS,
            suppress_duplicates: true,
            last_by_sender: Vec::new(),
            last_anonymous: None,
        }
    }

    pub fn with_reply_delay(mut self, delay_ms: u32) -> Self {
        self.reply_delay_ms = delay_ms;
        self
    }

    pub fn with_duplicate_suppression(mut self, enabled: bool) -> Self {
        self.suppress_duplicates = enabled;
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Wendet einen dekodierten Datensatz auf den Zustand an
    ///
    /// Jedes Kommando ändert höchstens eine Pattern-Transition plus eine
    /// Show-State-Änderung. Ignorierte Kommandos ändern nichts.
    pub fn dispatch(
        &mut self,
        message: &CommandMessage,
        origin: Origin,
        now: u64,
        state: &mut NodeState,
    ) -> DispatchOutcome {
        let command = Command::try_from(message);

        if let Origin::Remote(sender) = origin {
            if !matches!(command, Ok(Command::Pong)) && self.is_duplicate(message, sender) {
                return DispatchOutcome::Ignored(IgnoreReason::Duplicate(message.counter));
            }
        }

        match command {
            Ok(command) => self.apply(command, origin, now, state),
            Err(_) => DispatchOutcome::Ignored(IgnoreReason::UnknownCommand),
        }
    }

    fn is_duplicate(&mut self, message: &CommandMessage, sender: Option<PeerAddress>) -> bool {
        if !self.suppress_duplicates {
            return false;
        }

        let Some(address) = sender else {
            let duplicate = self.last_anonymous.as_ref() == Some(message);
            self.last_anonymous = Some(message.clone());
            return duplicate;
        };

        if let Some(last) = self
            .last_by_sender
            .iter_mut()
            .find(|(known, _)| *known == address)
        {
            let duplicate = last.1 == message.counter;
            last.1 = message.counter;
            return duplicate;
        }

        // Ältesten Sender verdrängen
        if self.last_by_sender.is_full() {
            self.last_by_sender.remove(0);
        }
        let _ = self.last_by_sender.push((address, message.counter));
        false
    }

    fn apply(
        &self,
        command: Command,
        origin: Origin,
        now: u64,
        state: &mut NodeState,
    ) -> DispatchOutcome {
        let effect = match command {
            Command::LedOn => Self::set_output(state, FULL_LEVEL, false, now),
            Command::LedOff => Self::set_output(state, 0, false, now),
            Command::LedToggle => {
                let level = if state.pattern.output_level() == 0 {
                    FULL_LEVEL
                } else {
                    0
                };
                Self::set_output(state, level, true, now)
            }
            Command::Pattern(id) => {
                let Some(pattern) = Pattern::from_id(id) else {
                    return DispatchOutcome::Ignored(IgnoreReason::UnknownPattern(id));
                };
                state.pattern.set_pattern(pattern, now);
                Effect::PatternChanged(pattern)
            }
            Command::ShowStart => {
                state.show.running = true;
                // Heartbeat während die Show läuft
                state.pattern.set_pattern(Pattern::SlowBlink, now);
                Effect::ShowStarted
            }
            Command::ShowStop => {
                state.show.running = false;
                state.pattern.set_pattern(Pattern::Off, now);
                Effect::ShowStopped
            }
            Command::Scene(scene_id) => {
                state.show.scene_id = scene_id;
                let pattern = Pattern::for_scene(scene_id);
                state.pattern.set_pattern(pattern, now);
                Effect::SceneChanged { scene_id, pattern }
            }
            Command::Ping => {
                let reply = matches!(origin, Origin::Remote(_)) && self.role.can_reply();
                Effect::PingReceived {
                    reply_due_ms: reply.then(|| now + u64::from(self.reply_delay_ms)),
                }
            }
            Command::Pong => Effect::PongReceived,
        };
        DispatchOutcome::Applied(effect)
    }

    fn set_output(state: &mut NodeState, level: u8, toggled: bool, now: u64) -> Effect {
        state.pattern.force_level(level, now);
        Effect::Output { level, toggled }
    }
}
