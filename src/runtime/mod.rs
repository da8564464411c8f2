//! Runtime abstraction for system operations.
//!
//! This module provides a trait-based abstraction over system operations,
//! enabling dependency injection and testability.
//!
//! # Structure
//!
//! - `env` - Environment variables and home directory
//! - `fs` - Directory listing and glob expansion
//! - `process` - Launching external commands

mod env;
mod fs;
mod process;

use anyhow::Result;
use std::env as std_env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError>;

    // File System
    fn is_dir(&self, path: &Path) -> bool;
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Expand a glob pattern into the matching paths, sorted.
    /// Entries that cannot be read are skipped.
    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>>;

    // Directories
    fn home_dir(&self) -> Option<PathBuf>;

    // Processes
    /// Run `program` with `args` in the foreground, inheriting stdio, and wait for it.
    /// Returns the exit code, or `None` if the process was terminated by a signal.
    fn run_command(&self, program: &str, args: &[OsString]) -> Result<Option<i32>>;
}

pub struct RealRuntime;

impl Runtime for RealRuntime {
    fn env_var(&self, key: &str) -> Result<String, std_env::VarError> {
        self.env_var_impl(key)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.read_dir_impl(path)
    }

    fn glob(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        self.glob_impl(pattern)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir_impl()
    }

    fn run_command(&self, program: &str, args: &[OsString]) -> Result<Option<i32>> {
        self.run_command_impl(program, args)
    }
}
