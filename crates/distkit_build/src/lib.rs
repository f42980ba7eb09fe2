//! distkit - packaging and staging of the tracker distribution
//!
//! Steps:
//! - `package`: freeze `tracker.py` with PyInstaller and collect the executable
//! - `stage`: copy the script and mirror its virtual environment
//! - `pipeline`: run the steps in order, stopping at the first failure

pub mod config;
pub mod error;
pub mod package;
pub mod pipeline;
pub mod stage;

pub use config::{BuildConfig, SpecPackagerCommand};
pub use error::{BuildError, Result};
pub use pipeline::{EnumBuildStep, SpecRunOptions, run};
