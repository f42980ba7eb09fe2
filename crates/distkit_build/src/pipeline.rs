//! Ordered execution of the build steps.

use crate::config::BuildConfig;
use crate::error::Result;
use crate::package::freeze;
use crate::stage::stage;

/// Which steps a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumBuildStep {
    /// Package the executable only.
    Freeze,
    /// Copy script and venv only.
    Stage,
    /// Freeze, then stage.
    All,
}

/// Run-wide switches that are not part of the path layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecRunOptions {
    /// Stage step reports what it would copy without writing.
    pub if_dry_run: bool,
}

/// Execute `step` against `cfg`, stopping at the first failure.
pub fn run(cfg: &BuildConfig, step: EnumBuildStep, spec_run_options: SpecRunOptions) -> Result<()> {
    tracing::info!("Starting build process...");

    if matches!(step, EnumBuildStep::Freeze | EnumBuildStep::All) {
        freeze(cfg)?;
    }
    if matches!(step, EnumBuildStep::Stage | EnumBuildStep::All) {
        stage(cfg, spec_run_options.if_dry_run)?;
    }

    tracing::info!("Build process completed successfully!");
    if step != EnumBuildStep::Stage {
        tracing::info!(
            "Python executable is available at: {}",
            cfg.path_artifact_dest.display()
        );
    }
    Ok(())
}
