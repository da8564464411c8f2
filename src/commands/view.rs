use anyhow::{Result, bail};
use log::debug;
use std::path::PathBuf;

use crate::{
    editor::EditorCommand,
    package::{InstalledGem, PackageIndex, Requirement},
    runtime::Runtime,
};

use super::paths::gem_dirs;

/// What to do with the gem once it is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// Open the gem directory in the editor.
    #[default]
    Open,
    /// Print the gem directory.
    Print,
    /// Print every matching installed version.
    List,
}

#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    pub name: String,
    /// Raw requirement strings; all must hold. Empty means any version.
    pub requirements: Vec<String>,
    pub allow_prerelease: bool,
    pub editor: Option<String>,
    pub gem_dirs: Vec<PathBuf>,
    pub action: Action,
}

/// Find the installed gem and open, print or list it.
#[tracing::instrument(skip(runtime))]
pub fn view<R: Runtime>(runtime: R, options: ViewOptions) -> Result<()> {
    // Fail on a bad requirement or editor before touching the filesystem
    let requirement = Requirement::parse_all(&options.requirements)?;
    let editor = match options.action {
        Action::Open => Some(EditorCommand::resolve(&runtime, options.editor.as_deref())?),
        Action::Print | Action::List => None,
    };

    let dirs = gem_dirs(&runtime, &options.gem_dirs)?;
    let index = PackageIndex::load(&runtime, &dirs)?;
    debug!("Loaded {} installed gem(s) from {} dir(s)", index.len(), dirs.len());

    let matches = index.search(&options.name, &requirement, options.allow_prerelease);
    let Some(best) = matches.last() else {
        bail!(not_found_message(&index, &options.name, &requirement));
    };
    debug!("Best match for {} ({}): {}", options.name, requirement, best);

    match editor {
        Some(editor) => editor.open(&runtime, &best.path)?,
        None if options.action == Action::List => {
            for gem in &matches {
                println!("{}", list_line(gem));
            }
        }
        None => println!("{}", best.path.display()),
    }

    Ok(())
}

fn list_line(gem: &InstalledGem) -> String {
    match gem.platform {
        Some(ref platform) => format!(
            "{} {} {} {}",
            gem.name,
            gem.version_str,
            platform,
            gem.path.display()
        ),
        None => format!("{} {} {}", gem.name, gem.version_str, gem.path.display()),
    }
}

fn not_found_message(index: &PackageIndex, name: &str, requirement: &Requirement) -> String {
    let mut message = format!("Could not find {} ({})", name, requirement);

    let suggestions = suggestions(index, name);
    if !suggestions.is_empty() {
        message.push_str(&format!("\nDid you mean: {}?", suggestions.join(", ")));
    }
    message
}

/// Up to three installed names containing `name`, case-insensitively.
fn suggestions<'a>(index: &'a PackageIndex, name: &str) -> Vec<&'a str> {
    let needle = name.to_lowercase();
    index
        .names()
        .into_iter()
        .filter(|candidate| *candidate != name && candidate.to_lowercase().contains(&needle))
        .take(3)
        .collect()
}
