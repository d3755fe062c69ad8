//! UI module for r128view
//!
//! Provides the meter renderer, its drawing surfaces and the terminal
//! user interface using ratatui.

mod app;
mod controller;
mod export;
mod render;
mod surface;
mod terminal;
mod widgets;

pub use app::App;
pub use surface::Argb;
