//! 值对象

mod ids;
mod owner_kind;

pub use ids::*;
pub use owner_kind::*;
