//! 领域层
//!
//! 目录实体、图片、多态 owner、值对象和仓储接口

pub mod entities;
pub mod repositories;
pub mod value_objects;
