pub mod commands;
pub mod editor;
pub mod package;
pub mod runtime;
