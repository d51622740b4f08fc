// src/lib.rs

//! Polite Crawler Library
//!
//! A priority-aware crawl frontier that never contacts the same host twice
//! in quick succession, plus the worker coordination to drive it.

pub mod error;
pub mod frontier;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
