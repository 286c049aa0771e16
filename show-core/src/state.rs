//! Prozessweiter Zustand eines Knotens
//!
//! Ersetzt globale Variablen: der Zustand gehört dem [`crate::node::Node`]
//! und wird nur aus der Hauptschleife geändert.

use crate::pattern::{Pattern, PatternEngine};

/// Nachrichten-Zähler für Diagnose
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Counters {
    pub messages_sent: u32,
    pub messages_received: u32,
}

/// Show-State
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShowState {
    pub running: bool,
    pub scene_id: i32,
    pub counters: Counters,
}

/// Pattern- und Show-State zusammen
///
/// Beide sind unabhängig; nur das Kommando-Vokabular verknüpft sie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeState {
    pub pattern: PatternEngine,
    pub show: ShowState,
}

impl NodeState {
    pub fn new(initial: Pattern, now: u64) -> Self {
        Self {
            pattern: PatternEngine::new(initial, now),
            show: ShowState::default(),
        }
    }
}
