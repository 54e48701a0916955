//! PostgreSQL 事务管理模块
//!
//! 提供可在多个仓储之间共享的事务作用域，以及统一的执行器入口：
//! 仓储既可以直接走连接池，也可以绑定到某个事务作用域。

use std::sync::Arc;

use async_trait::async_trait;
use catalog_errors::{AppError, AppResult};
use catalog_ports::TransactionScope;
use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// 共享事务类型
pub type SharedTx = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// PostgreSQL 事务作用域
///
/// 持有共享事务；通过 [`PgTransactionScope::executor`] 得到的执行器
/// 都在同一个事务中执行。作用域被丢弃且事务未提交时，sqlx 会自动回滚。
pub struct PgTransactionScope {
    tx: SharedTx,
}

impl PgTransactionScope {
    /// 开始事务
    pub async fn begin(pool: &PgPool) -> AppResult<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {}", e)))?;

        debug!("Transaction started");
        Ok(Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        })
    }

    /// 获取绑定到本事务的执行器
    pub fn executor(&self) -> PgExecutor {
        PgExecutor::Transaction(self.tx.clone())
    }

    async fn take(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.tx
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))
    }
}

#[async_trait]
impl TransactionScope for PgTransactionScope {
    async fn commit(self) -> AppResult<()> {
        let tx = self.take().await?;
        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit transaction: {}", e)))?;

        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(self) -> AppResult<()> {
        let tx = self.take().await?;
        tx.rollback()
            .await
            .map_err(|e| AppError::database(format!("Failed to rollback transaction: {}", e)))?;

        debug!("Transaction rolled back");
        Ok(())
    }
}

/// 仓储使用的执行器：连接池或共享事务
#[derive(Clone)]
pub enum PgExecutor {
    Pool(PgPool),
    Transaction(SharedTx),
}

impl PgExecutor {
    /// 是否绑定在事务上
    pub fn in_transaction(&self) -> bool {
        matches!(self, Self::Transaction(_))
    }

    /// 获取一个可执行查询的连接
    ///
    /// 事务模式下返回的是事务锁的守卫，持有期间同一事务的其他调用会等待。
    pub async fn acquire(&self) -> AppResult<PgConn<'_>> {
        match self {
            Self::Pool(pool) => pool
                .acquire()
                .await
                .map(PgConn::Pooled)
                .map_err(|e| AppError::database(format!("Failed to acquire connection: {}", e))),
            Self::Transaction(tx) => Ok(PgConn::Transaction(tx.lock().await)),
        }
    }
}

/// 已获取的连接
pub enum PgConn<'a> {
    Pooled(PoolConnection<Postgres>),
    Transaction(MutexGuard<'a, Option<Transaction<'static, Postgres>>>),
}

impl PgConn<'_> {
    /// 作为 sqlx 执行器使用
    pub fn executor(&mut self) -> AppResult<&mut PgConnection> {
        match self {
            Self::Pooled(conn) => Ok(&mut **conn),
            Self::Transaction(guard) => guard
                .as_mut()
                .map(|tx| &mut **tx)
                .ok_or_else(|| AppError::internal("Transaction consumed")),
        }
    }
}
