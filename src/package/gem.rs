use std::fmt;
use std::path::{Path, PathBuf};

use super::version::{GemVersion, parse_version};

/// A single installed gem version: one `gems/<name>-<version>[-<platform>]` directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledGem {
    pub name: String,
    pub version: GemVersion,
    /// Version text as it appears in the directory name.
    pub version_str: String,
    pub platform: Option<String>,
    pub path: PathBuf,
}

impl InstalledGem {
    /// Split an installation directory name into name, version and platform.
    ///
    /// Gem names may contain `-`, so the version is located as the first
    /// dash-separated segment that looks like a dotted version (`1.2`, `0.9.rc1`).
    /// Undotted numeric segments (`rack-2`) are only accepted when no dotted
    /// one exists.
    pub fn from_dir_name(dir_name: &str, path: &Path) -> Option<Self> {
        let parts: Vec<&str> = dir_name.split('-').collect();
        let is_version_like = |part: &str| {
            part.starts_with(|c: char| c.is_ascii_digit()) && parse_version(part).is_ok()
        };

        let index = (1..parts.len())
            .find(|&i| parts[i].contains('.') && is_version_like(parts[i]))
            .or_else(|| {
                (1..parts.len()).find(|&i| {
                    parts[i].chars().all(|c| c.is_ascii_digit()) && is_version_like(parts[i])
                })
            })?;

        let name = parts[..index].join("-");
        if name.is_empty() {
            return None;
        }

        let version_str = parts[index].to_string();
        let version = parse_version(&version_str).ok()?;
        let platform = (index + 1 < parts.len()).then(|| parts[index + 1..].join("-"));

        Some(Self {
            name,
            version,
            version_str,
            platform,
            path: path.to_path_buf(),
        })
    }
}

impl fmt::Display for InstalledGem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version_str)?;
        if let Some(ref platform) = self.platform {
            write!(f, " ({})", platform)?;
        }
        Ok(())
    }
}
