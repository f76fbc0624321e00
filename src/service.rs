//! # 账本服务模块
//!
//! 单写者actor：一个tokio任务独占 [`UhsLedger`]，其他任务通过通道提交请求。
//! 请求逐个处理完毕后才处理下一个，任何读者都看不到只应用了一半的提交。

use log::{debug, info};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::LedgerError;
use crate::keys::SignatureVerifier;
use crate::transaction::{Transaction, TxIn};
use crate::uhs::UhsLedger;

/// 服务错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("ledger service is closed")]
    Closed,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// 发给账本任务的请求
#[derive(Debug)]
enum LedgerRequest {
    /// 验证并执行交易
    Execute(Transaction, oneshot::Sender<Result<Transaction, LedgerError>>),
    /// 铸币
    Mint(Transaction, oneshot::Sender<Result<Transaction, LedgerError>>),
    /// 查询输入是否可花费
    IsSpendable(TxIn, oneshot::Sender<bool>),
    /// 查询集合大小
    Len(oneshot::Sender<usize>),
    /// 停止服务，任务交回账本
    Shutdown(oneshot::Sender<()>),
}

/// 账本服务句柄，可克隆并在任务间共享
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerRequest>,
}

/// 启动账本任务
///
/// # 参数
///
/// * `ledger` - 由任务独占的账本
/// * `capacity` - 请求通道容量
///
/// # 返回值
///
/// 返回 (句柄, 任务句柄)。调用 [`LedgerHandle::shutdown`] 或丢弃所有句柄后
/// 任务结束，并交回账本。
pub fn spawn<V>(ledger: UhsLedger<V>, capacity: usize) -> (LedgerHandle, JoinHandle<UhsLedger<V>>)
where
    V: SignatureVerifier + Send + 'static,
{
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    let task = tokio::spawn(run(ledger, receiver));
    (LedgerHandle { sender }, task)
}

async fn run<V: SignatureVerifier>(
    mut ledger: UhsLedger<V>,
    mut receiver: mpsc::Receiver<LedgerRequest>,
) -> UhsLedger<V> {
    info!("ledger service started");
    while let Some(request) = receiver.recv().await {
        match request {
            LedgerRequest::Execute(tx, reply) => {
                let _ = reply.send(ledger.execute(tx));
            }
            LedgerRequest::Mint(tx, reply) => {
                let _ = reply.send(ledger.mint(tx));
            }
            LedgerRequest::IsSpendable(txin, reply) => {
                let _ = reply.send(ledger.is_spendable(&txin));
            }
            LedgerRequest::Len(reply) => {
                let _ = reply.send(ledger.len());
            }
            LedgerRequest::Shutdown(reply) => {
                debug!("shutdown requested");
                let _ = reply.send(());
                break;
            }
        }
    }
    info!("ledger service stopped with {} spendable hashes", ledger.len());
    ledger
}

impl LedgerHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> LedgerRequest,
    ) -> Result<T, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(make(reply))
            .await
            .map_err(|_| ServiceError::Closed)?;
        response.await.map_err(|_| ServiceError::Closed)
    }

    /// 验证并执行交易
    pub async fn execute(&self, tx: Transaction) -> Result<Transaction, ServiceError> {
        Ok(self
            .request(|reply| LedgerRequest::Execute(tx, reply))
            .await??)
    }

    /// 跳过验证直接提交
    pub async fn mint(&self, tx: Transaction) -> Result<Transaction, ServiceError> {
        Ok(self.request(|reply| LedgerRequest::Mint(tx, reply)).await??)
    }

    pub async fn is_spendable(&self, txin: TxIn) -> Result<bool, ServiceError> {
        self.request(|reply| LedgerRequest::IsSpendable(txin, reply))
            .await
    }

    pub async fn len(&self) -> Result<usize, ServiceError> {
        self.request(LedgerRequest::Len).await
    }

    /// 停止账本任务
    ///
    /// 之前已排队的请求先处理完；之后通过任何句柄发出的请求都返回
    /// `ServiceError::Closed`。
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.request(LedgerRequest::Shutdown).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash256;
    use crate::keys::generate_keypair;
    use crate::transaction::{Outpoint, TxOut};

    #[tokio::test]
    async fn test_service_mint_and_query() {
        let (handle, task) = spawn(UhsLedger::new(), 8);
        let (public_key, _) = generate_keypair();
        let tx = Transaction::new(vec![], vec![TxOut::new(3, hash256(&[&public_key]))]);

        let minted = handle.mint(tx).await.unwrap();
        let txin = TxIn::new(Outpoint::new(minted.tx_id(), 0), minted.outputs[0].clone());
        assert!(handle.is_spendable(txin).await.unwrap());
        assert_eq!(handle.len().await.unwrap(), 1);

        drop(handle);
        let ledger = task.await.unwrap();
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_service_shutdown_returns_ledger() {
        let (handle, task) = spawn(UhsLedger::new(), 8);
        let other = handle.clone();
        let (public_key, _) = generate_keypair();
        let tx = Transaction::new(vec![], vec![TxOut::new(3, hash256(&[&public_key]))]);
        handle.mint(tx).await.unwrap();

        handle.shutdown().await.unwrap();
        let ledger = task.await.unwrap();
        assert_eq!(ledger.len(), 1);

        // 其他句柄仍然存在，但服务已经停止
        assert_eq!(other.len().await, Err(ServiceError::Closed));
        assert_eq!(handle.shutdown().await, Err(ServiceError::Closed));
    }

    #[tokio::test]
    async fn test_service_propagates_ledger_errors() {
        let (handle, _task) = spawn(UhsLedger::new(), 8);
        let tx = Transaction::new(vec![], vec![TxOut::new(1, [0u8; 32])]);
        let err = handle.execute(tx).await.unwrap_err();
        assert!(matches!(err, ServiceError::Ledger(LedgerError::Structure(_))));
    }
}
