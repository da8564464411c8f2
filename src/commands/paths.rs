use anyhow::{Result, bail};
use log::{debug, info};
use std::path::PathBuf;

use crate::runtime::Runtime;

/// Resolve the gem directories to search, in priority order.
///
/// 1. Directories given on the command line
/// 2. `VIEWGEM_GEM_DIRS` (path-list)
/// 3. `GEM_HOME` followed by `GEM_PATH` (path-list)
/// 4. Well-known per-user and system locations
#[tracing::instrument(skip(runtime))]
pub fn gem_dirs<R: Runtime>(runtime: &R, explicit: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if !explicit.is_empty() {
        debug!("Using gem dirs from command line: {:?}", explicit);
        return Ok(dedup(explicit.to_vec()));
    }

    let from_env = path_list(runtime, "VIEWGEM_GEM_DIRS");
    if !from_env.is_empty() {
        debug!("Using gem dirs from VIEWGEM_GEM_DIRS: {:?}", from_env);
        return Ok(dedup(from_env));
    }

    let mut dirs = Vec::new();
    if let Ok(home) = runtime.env_var("GEM_HOME")
        && !home.is_empty()
    {
        dirs.push(PathBuf::from(home));
    }
    dirs.extend(path_list(runtime, "GEM_PATH"));
    if !dirs.is_empty() {
        debug!("Using gem dirs from GEM_HOME/GEM_PATH: {:?}", dirs);
        return Ok(dedup(dirs));
    }

    let dirs = default_gem_dirs(runtime)?;
    if dirs.is_empty() {
        bail!("No gem directories found. Set GEM_HOME or GEM_PATH, or pass --gem-dir.");
    }
    info!("Using default gem dirs: {:?}", dirs);
    Ok(dirs)
}

/// Expand the well-known gem installation roots that exist on this machine.
#[tracing::instrument(skip(runtime))]
pub fn default_gem_dirs<R: Runtime>(runtime: &R) -> Result<Vec<PathBuf>> {
    let mut patterns: Vec<PathBuf> = Vec::new();

    if let Some(home) = runtime.home_dir() {
        patterns.push(home.join(".gem/ruby/*"));
        patterns.push(home.join(".local/share/gem/ruby/*"));
    }
    patterns.extend(system_gem_patterns());

    let mut dirs = Vec::new();
    for pattern in patterns {
        let Some(pattern) = pattern.to_str() else {
            debug!("Skipping non UTF-8 pattern {:?}", pattern);
            continue;
        };
        for dir in runtime.glob(pattern)? {
            if runtime.is_dir(&dir) {
                dirs.push(dir);
            }
        }
    }
    Ok(dedup(dirs))
}

#[cfg(target_os = "macos")]
fn system_gem_patterns() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/Library/Ruby/Gems/*"),
        PathBuf::from("/usr/local/lib/ruby/gems/*"),
        PathBuf::from("/opt/homebrew/lib/ruby/gems/*"),
    ]
}

#[cfg(target_os = "windows")]
fn system_gem_patterns() -> Vec<PathBuf> {
    vec![PathBuf::from(r"C:\Ruby*\lib\ruby\gems\*")]
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn system_gem_patterns() -> Vec<PathBuf> {
    vec![
        PathBuf::from("/usr/lib/ruby/gems/*"),
        PathBuf::from("/usr/local/lib/ruby/gems/*"),
        PathBuf::from("/var/lib/gems/*"),
    ]
}

/// Read a path-list environment variable, dropping empty entries.
fn path_list<R: Runtime>(runtime: &R, key: &str) -> Vec<PathBuf> {
    match runtime.env_var(key) {
        Ok(value) => std::env::split_paths(&value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn dedup(dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen: Vec<PathBuf> = Vec::new();
    for dir in dirs {
        if !seen.contains(&dir) {
            seen.push(dir);
        }
    }
    seen
}
