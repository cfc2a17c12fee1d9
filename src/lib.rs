//! Deterministic planning and assembly of claim-driven vertical videos.

pub mod assembly;
pub mod captions;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod gate;
pub mod jobs;
pub mod kit;
pub mod media;
pub mod model;
pub mod planner;
pub mod provenance;
pub mod report;
pub mod ui;

pub use error::{ReelError, Result};
