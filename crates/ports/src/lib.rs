//! ports - 抽象 trait 层
//!
//! 定义基础设施的抽象接口

mod unit_of_work;

pub use unit_of_work::*;
