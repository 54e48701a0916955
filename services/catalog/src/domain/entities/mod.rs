//! 实体

mod catalog_item;
mod image;
mod owner;

pub use catalog_item::*;
pub use image::*;
pub use owner::*;
