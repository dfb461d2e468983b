//! mockc: generate record-and-stub mocks for Go interfaces.
//!
//! The engine lives in [`mockc_core`] and Go emission in [`mockc_go`]. This
//! crate adds the parts that touch the file system and the command line:
//!
//! - [`driver`]: index discovery, per-unit generation, atomic writes, `--check`
//! - [`cli`]: flag-mode configuration

pub mod cli;
pub mod driver;

pub use mockc_core::error::{MockcError, MockcResult, OutputErrorCode};
