use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use viewgem::commands::{Action, ViewOptions, view};

/// viewgem - open an installed gem in your editor
///
/// Finds the newest installed version of NAME that satisfies the version
/// requirement and opens its directory in $VIEWGEM_EDITOR or $EDITOR.
///
/// Examples:
///   viewgem rake                  # Open the latest installed rake
///   viewgem rails -v '~> 7.0'     # Open the newest installed rails 7.x
///   viewgem rack -v '>= 2, < 3' -p  # Print the path instead of opening it
#[derive(Parser, Debug)]
#[command(
    author,
    about,
    disable_version_flag = true,
    after_long_help = concat!("viewgem ", env!("VIEWGEM_VERSION"))
)]
struct Cli {
    /// Name of the installed gem
    #[arg(value_name = "NAME")]
    name: String,

    /// Version requirement, e.g. ">= 1.2.0" or "~> 2.1" (repeatable)
    #[arg(short = 'v', long = "version", value_name = "REQUIREMENT")]
    requirements: Vec<String>,

    /// Include prerelease versions
    #[arg(long)]
    pre: bool,

    /// Editor command (overrides VIEWGEM_EDITOR and EDITOR)
    #[arg(short, long, value_name = "COMMAND")]
    editor: Option<String>,

    /// Gem directory to search (repeatable; replaces GEM_HOME/GEM_PATH)
    #[arg(short = 'd', long = "gem-dir", value_name = "PATH")]
    gem_dirs: Vec<PathBuf>,

    /// Print the gem's path instead of opening it
    #[arg(short, long, conflicts_with = "list")]
    print: bool,

    /// List every installed version matching the requirement
    #[arg(short, long)]
    list: bool,
}

impl Cli {
    fn action(&self) -> Action {
        if self.list {
            Action::List
        } else if self.print {
            Action::Print
        } else {
            Action::Open
        }
    }

    fn into_options(self) -> ViewOptions {
        ViewOptions {
            action: self.action(),
            name: self.name,
            requirements: self.requirements,
            allow_prerelease: self.pre,
            editor: self.editor,
            gem_dirs: self.gem_dirs,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = viewgem::runtime::RealRuntime;

    view(runtime, cli.into_options())
}
