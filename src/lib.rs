//! Core library for the stock-watch inventory monitor.
//!
//! A pass reads one snapshot of an inventory sheet, applies a threshold rule
//! to every data row and emails a table of the flagged items. Table sources
//! and delivery live under [`io`], column lookup in [`resolve`], the rules in
//! [`evaluate`], report building and markup in [`report`], and the pass
//! orchestration in [`pass`]. The [`schedule`] module decides when passes run.

pub mod config;
pub mod error;
pub mod evaluate;
pub mod io;
pub mod model;
pub mod pass;
pub mod report;
pub mod resolve;
pub mod schedule;

pub use error::{Result, StockError};
