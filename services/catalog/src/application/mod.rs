//! 应用层

pub mod commands;
pub mod handler;
pub mod image_service;
pub mod owner_adapter;

pub use handler::ServiceHandler;
pub use image_service::{ImageService, ImageServiceConfig};
pub use owner_adapter::OwnerAdapter;
