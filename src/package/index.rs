use anyhow::Result;
use log::debug;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::runtime::Runtime;

use super::gem::InstalledGem;
use super::version::Requirement;

/// In-memory view of every gem installed across a list of gem directories.
///
/// Directory structure: `<gem_dir>/gems/<name>-<version>[-<platform>]/`
#[derive(Debug, Default)]
pub struct PackageIndex {
    gems: Vec<InstalledGem>,
}

impl PackageIndex {
    /// Scan the `gems/` subdirectory of every gem directory.
    ///
    /// Gem directories listed first take precedence when the same version is
    /// installed more than once. Missing gem directories are skipped.
    #[tracing::instrument(skip(runtime, gem_dirs))]
    pub fn load<R: Runtime>(runtime: &R, gem_dirs: &[PathBuf]) -> Result<Self> {
        let mut gems = Vec::new();

        // Scan in reverse so that, after a stable sort by version, entries
        // from earlier gem directories end up last (i.e. preferred).
        for gem_dir in gem_dirs.iter().rev() {
            let gems_dir = gem_dir.join("gems");
            if !runtime.is_dir(&gems_dir) {
                debug!("Skipping {:?}: no gems directory", gem_dir);
                continue;
            }

            let mut found = Vec::new();
            for entry in runtime.read_dir(&gems_dir)? {
                if !runtime.is_dir(&entry) {
                    continue;
                }
                let Some(dir_name) = entry.file_name().and_then(|s| s.to_str()) else {
                    continue;
                };
                match InstalledGem::from_dir_name(dir_name, &entry) {
                    Some(gem) => found.push(gem),
                    None => debug!("Ignoring unrecognized entry {:?}", entry),
                }
            }
            debug!("Found {} gem(s) in {:?}", found.len(), gems_dir);

            // Directory listing order is unspecified. Within one gem dir a
            // platform-less build sorts after platform builds of the same
            // version, then by path.
            found.sort_by(|a, b| {
                (a.platform.is_none(), &a.path).cmp(&(b.platform.is_none(), &b.path))
            });
            gems.extend(found);
        }

        gems.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(Self { gems })
    }

    pub fn from_gems(mut gems: Vec<InstalledGem>) -> Self {
        gems.sort_by(|a, b| a.version.cmp(&b.version));
        Self { gems }
    }

    pub fn is_empty(&self) -> bool {
        self.gems.is_empty()
    }

    pub fn len(&self) -> usize {
        self.gems.len()
    }

    /// All installed versions of `name` satisfying `requirement`, lowest version first.
    pub fn search(
        &self,
        name: &str,
        requirement: &Requirement,
        allow_prerelease: bool,
    ) -> Vec<&InstalledGem> {
        self.gems
            .iter()
            .filter(|gem| gem.name == name)
            .filter(|gem| requirement.matches(&gem.version, allow_prerelease))
            .collect()
    }

    /// The highest installed version of `name` satisfying `requirement`.
    pub fn best_match(
        &self,
        name: &str,
        requirement: &Requirement,
        allow_prerelease: bool,
    ) -> Option<&InstalledGem> {
        self.search(name, requirement, allow_prerelease).pop()
    }

    /// Sorted, de-duplicated names of all installed gems.
    pub fn names(&self) -> Vec<&str> {
        self.gems
            .iter()
            .map(|gem| gem.name.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
