//! Editor selection and launching.
//!
//! The editor setting may carry its own arguments (`mate -w`, `code --wait`).
//! It is split with shell-word rules and the path to open is appended as a
//! separate argument, so paths with spaces or quotes are passed through intact.

use anyhow::{Context, Result, bail};
use log::{debug, info};
use std::ffi::OsString;
use std::path::Path;

use crate::runtime::Runtime;

/// Environment variables consulted for the editor, highest priority first.
pub const EDITOR_ENV_VARS: [&str; 2] = ["VIEWGEM_EDITOR", "EDITOR"];

/// Editor used when nothing is configured.
#[cfg(target_os = "macos")]
pub const DEFAULT_EDITOR: &str = "mate";

#[cfg(target_os = "windows")]
pub const DEFAULT_EDITOR: &str = "notepad";

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
pub const DEFAULT_EDITOR: &str = "vi";

/// A resolved editor invocation: the program and its leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl EditorCommand {
    /// Split an editor setting such as `code --wait` into program and arguments.
    pub fn parse(value: &str) -> Result<Self> {
        let words = shlex::split(value)
            .with_context(|| format!("Invalid editor command (unbalanced quotes): {}", value))?;
        let mut words = words.into_iter();
        let Some(program) = words.next() else {
            bail!("Editor command is empty");
        };
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    /// Pick the editor: explicit override, then `VIEWGEM_EDITOR`, then `EDITOR`,
    /// then the platform default. Blank values are skipped.
    pub fn resolve<R: Runtime>(runtime: &R, explicit: Option<&str>) -> Result<Self> {
        if let Some(value) = explicit.filter(|v| !v.trim().is_empty()) {
            debug!("Using editor from command line: {}", value);
            return Self::parse(value);
        }

        for key in EDITOR_ENV_VARS {
            if let Ok(value) = runtime.env_var(key)
                && !value.trim().is_empty()
            {
                debug!("Using editor from {}: {}", key, value);
                return Self::parse(&value);
            }
        }

        debug!("No editor configured, falling back to {}", DEFAULT_EDITOR);
        Self::parse(DEFAULT_EDITOR)
    }

    /// Arguments for opening `path`: the configured arguments followed by the
    /// path, passed through without any lossy conversion.
    pub fn args_for(&self, path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        args.push(path.as_os_str().to_os_string());
        args
    }

    /// Open `path` and wait for the editor to exit.
    #[tracing::instrument(skip(self, runtime))]
    pub fn open<R: Runtime>(&self, runtime: &R, path: &Path) -> Result<()> {
        let args = self.args_for(path);
        info!("Opening {} with {}", path.display(), self.program);

        let code = runtime
            .run_command(&self.program, &args)
            .with_context(|| format!("Could not run editor '{}'", self.program))?;

        match code {
            Some(0) => Ok(()),
            Some(code) => bail!("Editor '{}' exited with status {}", self.program, code),
            None => bail!("Editor '{}' was terminated by a signal", self.program),
        }
    }
}
