//! Frame buffer and layout primitives for the terminal front-end.
//!
//! A [`Canvas`] holds two planes of identical shape: the glyph plane with one
//! `char` per cell, and the color plane with one [`Color`] tag per cell. Panels
//! render into [`Block`]s of styled [`Line`]s which [`compose`] merges side by
//! side into a canvas. [`Canvas::print_colored`] then turns the whole frame
//! into a single byte stream with one escape sequence per run of same-colored
//! cells.
mod canvas;
mod color;
mod layout;

pub use canvas::Canvas;
pub use color::Color;
pub use layout::{Block, Line, Span, compose, pane_widths};
