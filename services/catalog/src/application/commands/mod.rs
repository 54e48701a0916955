//! Commands module

pub mod image_commands;

pub use image_commands::*;
