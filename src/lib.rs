// src/lib.rs

pub mod config;
pub mod core;
pub mod error;
pub mod mission;
pub mod persistence;
pub mod progress;
pub use crate::core::engine::StarEngine;
