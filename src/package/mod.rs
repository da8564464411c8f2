//! Installed package lookup.
//!
//! This module reads the local gem installation directories and answers
//! "which installed version of X best satisfies requirement R".

mod gem;
mod index;
mod version;

pub use gem::InstalledGem;
pub use index::PackageIndex;
pub use version::{Comparator, GemVersion, Op, Requirement, parse_version};
