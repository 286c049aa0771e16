//! Show Core - Plattformunabhängiges Show-Protokoll
//!
//! Diese Crate enthält KEINE Hardware-Dependencies.
//! Sie definiert Wire-Format, Kommandos, Pattern-Engine und die Traits,
//! über die die Firmware Funk, Ausgabe und Zeit anbindet.

#![no_std]

pub mod codec;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod local;
pub mod node;
pub mod pattern;
pub mod state;
pub mod traits;
pub mod transport;

// Re-exports für einfachen Zugriff
pub use codec::{CodecError, CommandMessage, FRAME_CAPACITY, Frame, WireFormat};
pub use command::{Command, UnknownCommand};
pub use config::{CounterMode, LinkProfile, NodeConfig};
pub use dispatch::{DispatchOutcome, Dispatcher, Effect, IgnoreReason, Origin, Role};
pub use local::{LineBuffer, LocalInput, StatusReport, parse_line, parse_route};
pub use node::{Inbound, LocalResponse, Node, StepReport};
pub use pattern::{Pattern, PatternEngine};
pub use state::{Counters, NodeState, ShowState};
pub use traits::{
    Clock, OutputError, OutputSink, PeerAddress, ReceiveMeta, Received, SendError, Transport,
};
pub use transport::{CrcFramed, NullTransport, crc16};
