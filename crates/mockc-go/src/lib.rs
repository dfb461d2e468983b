//! Go source emission for mockc.
//!
//! Turns a [`mockc_core::unit::SynthesizedUnit`] into the text of one
//! generated `.go` file. All naming and type decisions were made during
//! synthesis; this crate only lays them out.

pub mod render;

pub use render::{render_unit, BUILD_CONSTRAINT, GENERATED_HEADER};
