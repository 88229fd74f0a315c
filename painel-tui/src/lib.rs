// painel-tui/src/lib.rs

pub mod commands;
pub mod help;
pub mod render;
pub mod tui_module;

pub use tui_module::TuiModule;
