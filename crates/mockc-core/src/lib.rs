//! Core engine for mockc.
//!
//! This crate provides the language-agnostic mock generation pipeline:
//! - Type signature data model and canonical type text
//! - Per-unit import alias allocation
//! - Interface merging with embedding, conflict, and accessibility checks
//! - Mock layout synthesis
//! - Source index and configuration directive parsing
//! - Output unit planning
//! - Error types and error codes
//! - JSON output types for CLI responses
//! - An executable model of generated mock call semantics

pub mod alias;
pub mod canonical;
pub mod directive;
pub mod error;
pub mod index;
pub mod merge;
pub mod output;
pub mod runtime;
pub mod synth;
pub mod types;
pub mod unit;
