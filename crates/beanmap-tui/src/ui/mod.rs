//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, status bar and overlays
//! - `input`: keyboard event handling
//! - `styles`: color palette and text styling
//! - `screens`: landing and map screen content

pub mod input;
pub mod render;
pub mod screens;
pub mod styles;
