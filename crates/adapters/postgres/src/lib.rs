//! catalog-adapter-postgres - PostgreSQL 适配器

mod connection;
mod transaction;

pub use connection::*;
pub use transaction::*;
