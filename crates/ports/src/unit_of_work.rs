//! 事务作用域 trait 定义

use async_trait::async_trait;
use catalog_errors::AppResult;

/// 事务作用域
///
/// 由仓储的 `begin` 创建，绑定到该作用域的仓储共享同一个事务。
/// 作用域在未提交的情况下被丢弃时，事务必须回滚。
#[async_trait]
pub trait TransactionScope: Send + Sync {
    /// 提交事务
    async fn commit(self) -> AppResult<()>;

    /// 回滚事务
    async fn rollback(self) -> AppResult<()>;
}
