//! Kommando-Vokabular
//!
//! Der Name aus dem Datensatz wird genau einmal an der Grenze in ein
//! geschlossenes Enum übersetzt. Danach arbeitet der Dispatcher nur noch
//! mit [`Command`].

use core::fmt;

use crate::codec::CommandMessage;

/// Alle bekannten Show-Kommandos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    LedOn,
    LedOff,
    LedToggle,
    /// Pattern-Wechsel (value1 = Pattern-ID)
    Pattern(i32),
    ShowStart,
    ShowStop,
    /// Szenen-Wechsel (value1 = Szenen-ID)
    Scene(i32),
    Ping,
    Pong,
}

/// Name ist nicht im Vokabular (andere Firmware-Version o.ä.)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownCommand;

impl Command {
    /// Wire-Name des Kommandos
    pub const fn name(self) -> &'static str {
        match self {
            Command::LedOn => "LED_ON",
            Command::LedOff => "LED_OFF",
            Command::LedToggle => "LED_TOGGLE",
            Command::Pattern(_) => "PATTERN",
            Command::ShowStart => "SHOW_START",
            Command::ShowStop => "SHOW_STOP",
            Command::Scene(_) => "SCENE",
            Command::Ping => "PING",
            Command::Pong => "PONG",
        }
    }

    /// value1 / value2 für das Wire-Format
    pub const fn values(self) -> (i32, i32) {
        match self {
            Command::Pattern(id) | Command::Scene(id) => (id, 0),
            _ => (0, 0),
        }
    }

    pub fn to_message(self, counter: u32) -> CommandMessage {
        let (value1, value2) = self.values();
        CommandMessage::new(self.name(), value1, value2, counter)
    }
}

impl TryFrom<&CommandMessage> for Command {
    type Error = UnknownCommand;

    fn try_from(message: &CommandMessage) -> Result<Self, Self::Error> {
        // Case-sensitive, wie auf dem Draht
        match message.name() {
            "LED_ON" => Ok(Self::LedOn),
            "LED_OFF" => Ok(Self::LedOff),
            "LED_TOGGLE" => Ok(Self::LedToggle),
            "PATTERN" => Ok(Self::Pattern(message.value1)),
            "SHOW_START" => Ok(Self::ShowStart),
            "SHOW_STOP" => Ok(Self::ShowStop),
            "SCENE" => Ok(Self::Scene(message.value1)),
            "PING" => Ok(Self::Ping),
            "PONG" => Ok(Self::Pong),
            _ => Err(UnknownCommand),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Pattern(value) | Command::Scene(value) => {
                write!(f, "{} {}", self.name(), value)
            }
            _ => f.write_str(self.name()),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Command {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Command::Pattern(value) | Command::Scene(value) => {
                defmt::write!(fmt, "{} {}", self.name(), value)
            }
            _ => defmt::write!(fmt, "{}", self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from_known_names() {
        let scene = CommandMessage::new("SCENE", 3, 9, 0);
        assert_eq!(Command::try_from(&scene), Ok(Command::Scene(3)));

        let toggle = CommandMessage::new("LED_TOGGLE", 0, 0, 0);
        assert_eq!(Command::try_from(&toggle), Ok(Command::LedToggle));
    }

    #[test]
    fn test_try_from_is_case_sensitive() {
        let msg = CommandMessage::new("led_on", 0, 0, 0);
        assert_eq!(Command::try_from(&msg), Err(UnknownCommand));
    }

    #[test]
    fn test_to_message_uses_wire_name() {
        let msg = Command::Pattern(2).to_message(41);
        assert_eq!(msg.name(), "PATTERN");
        assert_eq!(msg.value1, 2);
        assert_eq!(msg.value2, 0);
        assert_eq!(msg.counter, 41);
        assert_eq!(Command::try_from(&msg), Ok(Command::Pattern(2)));
    }
}
