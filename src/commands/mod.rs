mod paths;
mod view;

pub use paths::{default_gem_dirs, gem_dirs};
pub use view::{Action, ViewOptions, view};
