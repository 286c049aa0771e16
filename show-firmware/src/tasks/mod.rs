// Task-Modul: Enthält alle Embassy Tasks
//
// Ein einziger Task besitzt den gesamten Show-Zustand (Single Writer).
// Der Funk-Interrupt übergibt Pakete über die Queue des esp-radio Treibers.

pub mod show_loop;

// Re-export Tasks für einfachen Import
pub use show_loop::show_loop_task;
