//! `cv deps`: dependency-manifest analysis has no grounded counterpart in
//! any core module (P/I/G/V/S/H/C/PA) and is not part of the ambient
//! stack. Accepted for argument-parsing completeness, implemented as a
//! stub so `cv doctor` can report it accurately.

use anyhow::Result;
use clap::Subcommand;
use cv_core::CvError;

#[derive(Subcommand)]
pub enum DepsAction {
    Analyze,
    Check,
    Install,
    Diagnose,
    Issues,
}

pub fn run(_action: DepsAction) -> Result<()> {
    Err(CvError::Internal("not implemented in this build".into()).into())
}
