//! Pattern-Engine - Zustandsmaschine für LED-Effekte
//!
//! Die Engine entscheidet bei jedem Tick anhand der Wanduhr, ob sich die
//! Ausgabe ändert. Sie zählt keine Ticks: ein Flankenwechsel passiert sobald
//! `now - last_transition >= interval` gilt. Damit ist sie unabhängig davon,
//! wie unregelmäßig die Hauptschleife läuft.

use core::fmt;

/// Volle Helligkeit
pub const FULL_LEVEL: u8 = 255;

pub const SLOW_BLINK_INTERVAL_MS: u32 = 1000;
pub const FAST_BLINK_INTERVAL_MS: u32 = 200;
pub const STROBE_INTERVAL_MS: u32 = 50;

/// Pulse: alle 30 ms ein Schritt um 5 (Dreieck-Welle)
pub const PULSE_STEP_INTERVAL_MS: u32 = 30;
pub const PULSE_STEP: u8 = 5;

/// ScenePulse: Intervall = 1000 / Szene
pub const SCENE_PULSE_BASE_MS: u32 = 1000;
const MAX_SCENE_INDEX: i32 = SCENE_PULSE_BASE_MS as i32;

/// Verfügbare Effekte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pattern {
    Off,
    SlowBlink,
    FastBlink,
    Strobe,
    Pulse,
    /// Blinken mit szenenabhängigem Tempo (Szene 1..=1000)
    ScenePulse { scene: u16 },
}

impl Pattern {
    /// Pattern-ID aus dem `PATTERN`-Kommando
    ///
    /// 0 Off, 1 SlowBlink, 2 FastBlink, 3 Strobe, 4 Pulse
    pub const fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(Self::Off),
            1 => Some(Self::SlowBlink),
            2 => Some(Self::FastBlink),
            3 => Some(Self::Strobe),
            4 => Some(Self::Pulse),
            _ => None,
        }
    }

    /// Pattern für eine Szene; Szene 0 und negative Werte laufen wie Szene 1
    pub const fn for_scene(scene_id: i32) -> Self {
        let scene = if scene_id < 1 {
            1
        } else if scene_id > MAX_SCENE_INDEX {
            MAX_SCENE_INDEX
        } else {
            scene_id
        };
        Self::ScenePulse {
            scene: scene as u16,
        }
    }

    /// Flanken-Intervall, `None` für Off (kein Fortschritt)
    pub const fn interval_ms(self) -> Option<u32> {
        match self {
            Self::Off => None,
            Self::SlowBlink => Some(SLOW_BLINK_INTERVAL_MS),
            Self::FastBlink => Some(FAST_BLINK_INTERVAL_MS),
            Self::Strobe => Some(STROBE_INTERVAL_MS),
            Self::Pulse => Some(PULSE_STEP_INTERVAL_MS),
            Self::ScenePulse { scene } => Some(SCENE_PULSE_BASE_MS / scene as u32),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::SlowBlink => "SlowBlink",
            Self::FastBlink => "FastBlink",
            Self::Strobe => "Strobe",
            Self::Pulse => "Pulse",
            Self::ScenePulse { .. } => "ScenePulse",
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.interval_ms() {
            Some(interval) => write!(f, "{} ({} ms)", self.name(), interval),
            None => f.write_str(self.name()),
        }
    }
}

/// Richtung der Pulse-Rampe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Rising,
    Falling,
}

/// Pattern-State + Tick-Logik
///
/// Einzige Instanz pro Knoten, gehört dem [`crate::state::NodeState`].
/// Geändert wird nur über [`PatternEngine::set_pattern`],
/// [`PatternEngine::force_level`] und [`PatternEngine::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternEngine {
    pattern: Pattern,
    interval_ms: u32,
    last_transition: u64,
    output_level: u8,
    direction: Direction,
}

impl PatternEngine {
    pub fn new(initial: Pattern, now: u64) -> Self {
        let mut engine = Self {
            pattern: Pattern::Off,
            interval_ms: 0,
            last_transition: now,
            output_level: 0,
            direction: Direction::Rising,
        };
        engine.set_pattern(initial, now);
        engine
    }

    pub fn pattern(&self) -> Pattern {
        self.pattern
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn last_transition(&self) -> u64 {
        self.last_transition
    }

    pub fn output_level(&self) -> u8 {
        self.output_level
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Ersetzt das aktive Pattern, die neue Phase beginnt bei `now`
    ///
    /// Blink-Patterns starten eingeschaltet, Pulse bei 0 steigend, Off bei 0.
    /// Gibt den neuen Ausgabe-Pegel zurück.
    pub fn set_pattern(&mut self, pattern: Pattern, now: u64) -> u8 {
        self.pattern = pattern;
        self.interval_ms = pattern.interval_ms().unwrap_or(0);
        self.last_transition = now;
        self.direction = Direction::Rising;
        self.output_level = match pattern {
            Pattern::Off | Pattern::Pulse => 0,
            _ => FULL_LEVEL,
        };
        self.output_level
    }

    /// Direkter Pegel (LED_ON / LED_OFF / LED_TOGGLE)
    ///
    /// Das Pattern bleibt aktiv; es übernimmt erst an seiner nächsten Flanke
    /// wieder, gemessen ab `now`.
    pub fn force_level(&mut self, level: u8, now: u64) {
        self.output_level = level;
        self.last_transition = now;
    }

    /// Prüft die Flanke und gibt den neuen Pegel zurück wenn er sich ändert
    pub fn tick(&mut self, now: u64) -> Option<u8> {
        if self.pattern == Pattern::Off {
            return None;
        }

        let elapsed = now.saturating_sub(self.last_transition);
        if elapsed < u64::from(self.interval_ms) {
            return None;
        }
        self.last_transition = now;

        let previous = self.output_level;
        self.output_level = match self.pattern {
            Pattern::Pulse => self.next_pulse_level(),
            _ if previous == 0 => FULL_LEVEL,
            _ => 0,
        };

        (self.output_level != previous).then_some(self.output_level)
    }

    fn next_pulse_level(&mut self) -> u8 {
        let level = match self.direction {
            Direction::Rising => self.output_level.saturating_add(PULSE_STEP),
            Direction::Falling => self.output_level.saturating_sub(PULSE_STEP),
        };
        if level == FULL_LEVEL {
            self.direction = Direction::Falling;
        } else if level == 0 {
            self.direction = Direction::Rising;
        }
        level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slow_blink_closed_interval_edges() {
        let mut engine = PatternEngine::new(Pattern::SlowBlink, 0);
        assert_eq!(engine.output_level(), FULL_LEVEL);

        assert_eq!(engine.tick(0), None);
        assert_eq!(engine.tick(999), None);
        assert_eq!(engine.tick(1000), Some(0));
        assert_eq!(engine.tick(1999), None);
        assert_eq!(engine.tick(2000), Some(FULL_LEVEL));
    }

    #[test]
    fn test_irregular_ticks_restart_from_late_edge() {
        let mut engine = PatternEngine::new(Pattern::FastBlink, 0);
        // Schleife hing 350 ms: eine Flanke, nicht zwei
        assert_eq!(engine.tick(350), Some(0));
        assert_eq!(engine.last_transition(), 350);
        assert_eq!(engine.tick(549), None);
        assert_eq!(engine.tick(550), Some(FULL_LEVEL));
    }

    #[test]
    fn test_strobe_interval() {
        let mut engine = PatternEngine::new(Pattern::Strobe, 100);
        assert_eq!(engine.interval_ms(), 50);
        assert_eq!(engine.tick(149), None);
        assert_eq!(engine.tick(150), Some(0));
    }

    #[test]
    fn test_scene_pulse_interval() {
        assert_eq!(Pattern::for_scene(2).interval_ms(), Some(500));
        assert_eq!(Pattern::for_scene(3).interval_ms(), Some(333));
        assert_eq!(Pattern::for_scene(0), Pattern::ScenePulse { scene: 1 });
        assert_eq!(Pattern::for_scene(-4), Pattern::ScenePulse { scene: 1 });
        assert_eq!(Pattern::for_scene(50_000).interval_ms(), Some(1));
    }

    #[test]
    fn test_off_never_progresses() {
        let mut engine = PatternEngine::new(Pattern::Off, 0);
        assert_eq!(engine.output_level(), 0);
        for now in [0, 50, 1_000, 100_000] {
            assert_eq!(engine.tick(now), None);
        }
        assert_eq!(engine.output_level(), 0);
    }

    #[test]
    fn test_pulse_triangle_wave() {
        let mut engine = PatternEngine::new(Pattern::Pulse, 0);
        assert_eq!(engine.output_level(), 0);
        assert_eq!(engine.tick(29), None);
        assert_eq!(engine.tick(30), Some(5));

        // 0 → 255 in 51 Schritten
        let mut now = 30;
        while engine.output_level() < FULL_LEVEL {
            now += 30;
            engine.tick(now);
        }
        assert_eq!(now, 51 * 30);
        assert_eq!(engine.direction(), Direction::Falling);

        now += 30;
        assert_eq!(engine.tick(now), Some(250));
    }

    #[test]
    fn test_pulse_turns_at_zero() {
        let mut engine = PatternEngine::new(Pattern::Pulse, 0);
        engine.force_level(5, 0);
        engine.direction = Direction::Falling;
        assert_eq!(engine.tick(30), Some(0));
        assert_eq!(engine.direction(), Direction::Rising);
        assert_eq!(engine.tick(60), Some(5));
    }

    #[test]
    fn test_set_pattern_restarts_phase() {
        let mut engine = PatternEngine::new(Pattern::SlowBlink, 0);
        engine.tick(1000);
        assert_eq!(engine.set_pattern(Pattern::FastBlink, 1100), FULL_LEVEL);
        assert_eq!(engine.pattern(), Pattern::FastBlink);
        assert_eq!(engine.tick(1299), None);
        assert_eq!(engine.tick(1300), Some(0));
    }

    #[test]
    fn test_force_level_masks_until_next_edge() {
        let mut engine = PatternEngine::new(Pattern::FastBlink, 0);
        engine.force_level(0, 120);
        assert_eq!(engine.pattern(), Pattern::FastBlink);
        assert_eq!(engine.tick(319), None);
        assert_eq!(engine.tick(320), Some(FULL_LEVEL));
    }

    #[test]
    fn test_pattern_ids() {
        assert_eq!(Pattern::from_id(0), Some(Pattern::Off));
        assert_eq!(Pattern::from_id(4), Some(Pattern::Pulse));
        assert_eq!(Pattern::from_id(5), None);
        assert_eq!(Pattern::from_id(-1), None);
    }
}
