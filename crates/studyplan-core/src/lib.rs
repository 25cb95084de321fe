//! studyplan-core — Allocation engine, collaborator traits, and re-planning.
//!
//! This crate turns a backlog of study items into a day-by-day plan that
//! respects a daily time budget, and keeps stored plans current as learners
//! make progress.

pub mod allocator;
pub mod engine;
pub mod error;
pub mod filter;
pub mod locks;
pub mod model;
pub mod parser;
pub mod partition;
pub mod ranker;
pub mod replan;
pub mod report;
pub mod traits;
