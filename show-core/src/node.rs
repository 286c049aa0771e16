//! Node - kooperative Hauptschleife eines Show-Knotens
//!
//! Besitzt den gesamten Zustand (Pattern + Show), den Dispatcher, den
//! Transport und die Ausgabe. Es gibt genau einen Schreiber: wer `&mut Node`
//! hat. Jede Methode kehrt sofort zurück; warten (Timer, Yield) ist Sache des
//! Aufrufers.

use core::fmt;

use crate::codec::{CodecError, CommandMessage};
use crate::command::Command;
use crate::config::{CounterMode, NodeConfig};
use crate::dispatch::{DispatchOutcome, Dispatcher, Effect, Origin};
use crate::local::{HELP_TEXT, LocalInput, StatusReport, parse_line, parse_route};
use crate::state::NodeState;
use crate::traits::{
    Clock, OutputError, OutputSink, ReceiveMeta, Received, SendError, Transport,
};

/// Antwort auf eine lokale Eingabe
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LocalResponse {
    Help,
    Status(StatusReport),
    Unknown,
    /// Transmitter: Kommando gesendet
    Sent { command: Command, counter: u32 },
    SendFailed { command: Command, error: SendError },
    /// Receiver / Standalone: lokal ausgeführt
    Dispatched(DispatchOutcome),
}

impl fmt::Display for LocalResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalResponse::Help => f.write_str(HELP_TEXT),
            LocalResponse::Status(report) => write!(f, "{report}"),
            LocalResponse::Unknown => f.write_str("Unknown command. Type 'help' for commands."),
            LocalResponse::Sent { command, counter } => write!(f, "sent {command} #{counter}"),
            LocalResponse::SendFailed { command, error } => {
                write!(f, "sending {command} failed: {error}")
            }
            LocalResponse::Dispatched(outcome) => write!(f, "{outcome}"),
        }
    }
}

/// Was mit einem empfangenen Frame passiert ist
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Dispatched {
        message: CommandMessage,
        meta: ReceiveMeta,
        /// Nur bei Timestamp-Zählern; Uhren der Knoten sind nicht synchron
        latency_ms: Option<u32>,
        outcome: DispatchOutcome,
    },
    /// Frame verworfen, Schleife läuft weiter
    Rejected { error: CodecError, meta: ReceiveMeta },
}

/// Ergebnis einer Schleifen-Iteration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub inbound: Option<Inbound>,
    /// Fälliges PONG wurde gesendet (Zähler) oder ist fehlgeschlagen
    pub reply: Option<Result<u32, SendError>>,
    /// Neuer Pegel an die Ausgabe geschrieben
    pub level: Option<u8>,
    pub output_error: Option<OutputError>,
}

impl StepReport {
    /// Nichts passiert, nichts zu loggen
    pub fn is_idle(&self) -> bool {
        self.inbound.is_none()
            && self.reply.is_none()
            && self.level.is_none()
            && self.output_error.is_none()
    }
}

/// Ein Show-Knoten
pub struct Node<T, O, C> {
    config: NodeConfig,
    transport: T,
    output: O,
    clock: C,
    dispatcher: Dispatcher,
    state: NodeState,
    next_sequence: u32,
    pending_reply: Option<u64>,
    /// Zuletzt erfolgreich geschriebener Pegel, `None` vor dem ersten Render
    rendered_level: Option<u8>,
}

impl<T, O, C> Node<T, O, C>
where
    T: Transport,
    O: OutputSink,
    C: Clock,
{
    pub fn new(config: NodeConfig, transport: T, output: O, clock: C) -> Self {
        let dispatcher = Dispatcher::new(config.role)
            .with_reply_delay(config.ping_reply_delay_ms)
            .with_duplicate_suppression(config.suppress_duplicates);
        let state = NodeState::new(config.initial_pattern, clock.now_ms());

        Self {
            config,
            transport,
            output,
            clock,
            dispatcher,
            state,
            next_sequence: 0,
            pending_reply: None,
            rendered_level: None,
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Zeitpunkt des geplanten PONG
    pub fn pending_reply(&self) -> Option<u64> {
        self.pending_reply
    }

    pub fn status(&self) -> StatusReport {
        StatusReport {
            role: self.config.role,
            link: self.config.link.name,
            counters: self.state.show.counters,
            output_level: self.state.pattern.output_level(),
            show_running: self.state.show.running,
            scene_id: self.state.show.scene_id,
            pattern: self.state.pattern.pattern(),
        }
    }

    /// Serial-Zeile verarbeiten
    pub fn handle_line(&mut self, line: &str) -> LocalResponse {
        self.handle_input(parse_line(line))
    }

    /// HTTP-Route verarbeiten
    pub fn handle_route(&mut self, path: &str) -> LocalResponse {
        self.handle_input(parse_route(path))
    }

    pub fn handle_input(&mut self, input: LocalInput) -> LocalResponse {
        match input {
            LocalInput::Help => LocalResponse::Help,
            LocalInput::Status => LocalResponse::Status(self.status()),
            LocalInput::Unknown => LocalResponse::Unknown,
            LocalInput::Command(command) => self.submit(command),
        }
    }

    /// Lokales Kommando: Transmitter sendet, alle anderen führen selbst aus
    pub fn submit(&mut self, command: Command) -> LocalResponse {
        if self.config.role.broadcasts_local() {
            return match self.broadcast(command) {
                Ok(counter) => LocalResponse::Sent { command, counter },
                Err(error) => LocalResponse::SendFailed { command, error },
            };
        }

        let now = self.clock.now_ms();
        // Lokale Kommandos laufen nicht durch den Duplikat-Filter, der Zähler ist egal
        let message = command.to_message(0);
        let outcome = self
            .dispatcher
            .dispatch(&message, Origin::Local, now, &mut self.state);
        LocalResponse::Dispatched(outcome)
    }

    /// Kodiert und sendet ein Kommando, gibt den verwendeten Zähler zurück
    pub fn broadcast(&mut self, command: Command) -> Result<u32, SendError> {
        let counter = self.next_counter();
        let frame = self
            .config
            .link
            .wire
            .encode_message(&command.to_message(counter));
        self.transport.send(&frame)?;

        let counters = &mut self.state.show.counters;
        counters.messages_sent = counters.messages_sent.wrapping_add(1);
        Ok(counter)
    }

    /// Eine Iteration der Hauptschleife
    ///
    /// Reihenfolge: höchstens ein Frame empfangen, fälliges PONG senden,
    /// Pattern ticken, geänderten Pegel ausgeben.
    pub fn step(&mut self) -> StepReport {
        let now = self.clock.now_ms();
        let mut report = StepReport::default();

        if let Some(received) = self.transport.poll_receive() {
            report.inbound = Some(self.receive(received, now));
        }

        report.reply = self.send_due_reply(now);

        self.state.pattern.tick(now);
        match self.render() {
            Ok(level) => report.level = level,
            Err(error) => report.output_error = Some(error),
        }

        report
    }

    fn receive(&mut self, received: Received, now: u64) -> Inbound {
        let Received { frame, meta } = received;
        let message = match self.config.link.wire.decode(&frame) {
            Ok(message) => message,
            Err(error) => return Inbound::Rejected { error, meta },
        };

        let counters = &mut self.state.show.counters;
        counters.messages_received = counters.messages_received.wrapping_add(1);

        let latency_ms = match self.config.link.counter_mode {
            CounterMode::Timestamp => Some((now as u32).wrapping_sub(message.counter)),
            CounterMode::Sequence => None,
        };

        let outcome = self
            .dispatcher
            .dispatch(&message, Origin::Remote(meta.sender), now, &mut self.state);
        if let DispatchOutcome::Applied(Effect::PingReceived {
            reply_due_ms: Some(due),
        }) = outcome
        {
            self.pending_reply = Some(due);
        }

        Inbound::Dispatched {
            message,
            meta,
            latency_ms,
            outcome,
        }
    }

    fn send_due_reply(&mut self, now: u64) -> Option<Result<u32, SendError>> {
        let due = self.pending_reply?;
        if now < due {
            return None;
        }
        // Kein zweiter Versuch; der Sender pingt bei Bedarf erneut
        self.pending_reply = None;
        Some(self.broadcast(Command::Pong))
    }

    /// Schreibt den Pegel nur wenn er sich seit dem letzten Schreiben geändert hat
    fn render(&mut self) -> Result<Option<u8>, OutputError> {
        let level = self.state.pattern.output_level();
        if self.rendered_level == Some(level) {
            return Ok(None);
        }
        self.output.set_level(level)?;
        self.rendered_level = Some(level);
        Ok(Some(level))
    }

    fn next_counter(&mut self) -> u32 {
        match self.config.link.counter_mode {
            CounterMode::Timestamp => self.clock.now_ms() as u32,
            CounterMode::Sequence => {
                let counter = self.next_sequence;
                self.next_sequence = self.next_sequence.wrapping_add(1);
                counter
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use core::cell::Cell;

    use super::*;
    use crate::codec::{Frame, WireFormat};
    use crate::config::LinkProfile;
    use crate::dispatch::Role;
    use crate::pattern::{FULL_LEVEL, Pattern};
    use crate::transport::NullTransport;

    struct ManualClock(Cell<u64>);

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.0.get()
        }
    }

    #[derive(Default)]
    struct LevelLog {
        last: Option<u8>,
        writes: usize,
        fail_next: bool,
    }

    impl OutputSink for LevelLog {
        fn set_level(&mut self, level: u8) -> Result<(), OutputError> {
            if self.fail_next {
                self.fail_next = false;
                return Err(OutputError::WriteFailed);
            }
            self.last = Some(level);
            self.writes += 1;
            Ok(())
        }
    }

    /// Ein wartender Frame, merkt sich den zuletzt gesendeten
    #[derive(Default)]
    struct OneShot {
        inbox: Option<Frame>,
        sent: Option<Frame>,
    }

    impl Transport for OneShot {
        fn send(&mut self, frame: &[u8]) -> Result<(), SendError> {
            self.sent = Frame::from_slice(frame);
            Ok(())
        }

        fn poll_receive(&mut self) -> Option<Received> {
            self.inbox.take().map(|frame| Received {
                frame,
                meta: ReceiveMeta::default(),
            })
        }
    }

    fn standalone(clock: &ManualClock) -> Node<NullTransport, LevelLog, &ManualClock> {
        let config = NodeConfig::new(Role::Standalone, LinkProfile::ESPNOW);
        Node::new(config, NullTransport, LevelLog::default(), clock)
    }

    #[test]
    fn test_first_step_renders_initial_level() {
        let clock = ManualClock(Cell::new(0));
        let mut node = standalone(&clock);

        assert_eq!(node.step().level, Some(0));
        assert!(node.step().is_idle());
        assert_eq!(node.output().writes, 1);
    }

    #[test]
    fn test_output_error_is_retried() {
        let clock = ManualClock(Cell::new(0));
        let mut node = standalone(&clock);
        node.output_mut().fail_next = true;

        let report = node.step();
        assert_eq!(report.output_error, Some(OutputError::WriteFailed));
        assert_eq!(node.step().level, Some(0));
    }

    #[test]
    fn test_standalone_dispatches_locally() {
        let clock = ManualClock(Cell::new(0));
        let mut node = standalone(&clock);
        node.step();

        let response = node.handle_line("pattern 2");
        assert!(matches!(response, LocalResponse::Dispatched(outcome) if outcome.is_applied()));
        assert_eq!(node.state().pattern.pattern(), Pattern::FastBlink);
        assert_eq!(node.step().level, Some(FULL_LEVEL));

        clock.0.set(200);
        assert_eq!(node.step().level, Some(0));
    }

    #[test]
    fn test_help_and_unknown_do_not_touch_state() {
        let clock = ManualClock(Cell::new(0));
        let mut node = standalone(&clock);
        let before = *node.state();

        assert_eq!(node.handle_line("help"), LocalResponse::Help);
        assert_eq!(node.handle_line("dance"), LocalResponse::Unknown);
        assert!(matches!(node.handle_line("status"), LocalResponse::Status(_)));
        assert_eq!(*node.state(), before);
    }

    #[test]
    fn test_sequence_counter_starts_at_zero() {
        let clock = ManualClock(Cell::new(5_000));
        let config = NodeConfig::new(Role::Transmitter, LinkProfile::LORA);
        let mut node = Node::new(config, OneShot::default(), LevelLog::default(), &clock);

        assert_eq!(node.broadcast(Command::Ping), Ok(0));
        assert_eq!(node.broadcast(Command::Ping), Ok(1));
        assert_eq!(node.state().show.counters.messages_sent, 2);
        assert_eq!(node.transport().sent.map(|f| f.len()), Some(28));
    }

    #[test]
    fn test_timestamp_latency() {
        let clock = ManualClock(Cell::new(1_250));
        let config = NodeConfig::new(Role::Receiver, LinkProfile::ESPNOW);
        let mut node = Node::new(config, OneShot::default(), LevelLog::default(), &clock);
        node.transport_mut().inbox = Some(WireFormat::ESPNOW.encode("LED_ON", 0, 0, 1_200));

        let report = node.step();
        match report.inbound {
            Some(Inbound::Dispatched { latency_ms, .. }) => assert_eq!(latency_ms, Some(50)),
            other => panic!("unexpected inbound {other:?}"),
        }
        assert_eq!(report.level, Some(FULL_LEVEL));
    }
}
