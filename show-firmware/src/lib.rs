// Library-Root: Hardware-Anbindung des Show-Knotens
// Keine Standard-Bibliothek (Embedded System)
#![no_std]

// Module
pub mod config;
pub mod hal;
pub mod tasks;

// Re-exports von show-core
pub use show_core::{Command, Node, NodeConfig, Pattern, Role};
