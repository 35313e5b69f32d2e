//! # codonfinder - Terminal Codon Finder
//!
//! A terminal client for codon finder services using ratatui.
//!
//! ## Architecture
//!
//! The application follows an event-driven architecture with clear separation:
//! - `model`: Query form, request parameters, result sets and application state
//! - `patterns`: Input validation patterns and edit-list parsing
//! - `backend`: The codon service seam and its HTTP implementation
//! - `query`: Query controller (debounced submits, request sequencing, results)
//! - `event`: Keyboard event handling
//! - `ui`: TUI rendering with ratatui, including result formatting
//! - `controller`: Terminal setup and the main loop
//! - `logging`: tracing subscriber setup

pub mod backend;
pub mod controller;
pub mod event;
pub mod logging;
pub mod model;
pub mod patterns;
pub mod query;
pub mod ui;
