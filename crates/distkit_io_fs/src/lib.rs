//! `distkit_io_fs`:
//! Rust-side directory mirror engine used by the distribution steps.
//!
//! Modules:
//! - `mirror` : traversal and copy orchestration
//! - `spec`   : enums/options/errors
//! - `report` : run-time report model
//! - `util`   : shared helper functions

pub mod mirror;
pub mod report;
pub mod spec;
mod util;

pub use mirror::mirror_tree;
pub use report::{ReportMirror, ReportMirrorBuilder};
pub use spec::{
    EnumMirrorPatternMode, EnumMirrorSymlinkStrategy, MirrorTreeError, SpecMirrorOptions,
};
