//! External process launching.

use anyhow::{Context, Result};
use log::debug;
use std::ffi::OsString;
use std::process::Command;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn run_command_impl(
        &self,
        program: &str,
        args: &[OsString],
    ) -> Result<Option<i32>> {
        debug!("Running {} {:?}", program, args);
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("Failed to launch {}", program))?;
        debug!("{} exited with {}", program, status);
        Ok(status.code())
    }
}
