//! # UHS账本模块
//!
//! 保存当前所有可花费输出的哈希（Unspent Hash Set），提供先验证后提交、
//! 直接铸币和成员查询。
//!
//! 账本是显式的状态对象，没有全局状态。所有修改都经过 `&mut self`，
//! 单个进程内一次只会有一笔提交在进行；需要跨任务共享时使用
//! [`crate::service::LedgerHandle`]。

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::compact::CompactTx;
use crate::config::{LedgerConfig, SpendPolicy};
use crate::error::{LedgerError, LedgerResult, SnapshotError};
use crate::hash::{Hash256, HASH_SIZE};
use crate::keys::{SchnorrVerifier, SignatureVerifier};
use crate::transaction::{hash_tx_input, Transaction, TxIn};
use crate::validation;

/// 快照文件格式
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    hashes: Vec<String>,
}

/// UHS账本
pub struct UhsLedger<V = SchnorrVerifier> {
    uhs: HashSet<Hash256>,
    verifier: V,
    policy: SpendPolicy,
    display_commits: bool,
}

impl UhsLedger<SchnorrVerifier> {
    /// 创建空账本，使用默认配置和Schnorr验签
    pub fn new() -> Self {
        Self::with_config(&LedgerConfig::default())
    }

    pub fn with_config(config: &LedgerConfig) -> Self {
        Self::with_verifier(SchnorrVerifier, config)
    }
}

impl Default for UhsLedger<SchnorrVerifier> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: SignatureVerifier> UhsLedger<V> {
    /// 使用自定义验签器创建空账本
    pub fn with_verifier(verifier: V, config: &LedgerConfig) -> Self {
        UhsLedger {
            uhs: HashSet::new(),
            verifier,
            policy: config.spend_policy,
            display_commits: config.display_commits,
        }
    }

    pub fn policy(&self) -> SpendPolicy {
        self.policy
    }

    /// 验证并执行交易
    ///
    /// 依次运行结构、金额、签名检查，任一失败立即返回对应错误且不修改集合；
    /// 全部通过后派生紧凑交易并提交。
    ///
    /// # 返回值
    ///
    /// 成功时原样返回交易
    pub fn execute(&mut self, tx: Transaction) -> LedgerResult<Transaction> {
        if let Err(err) = self.validate(&tx) {
            warn!("rejected tx {}: {}", hex::encode(tx.tx_id()), err);
            return Err(err);
        }
        self.commit(&CompactTx::create(&tx))?;
        Ok(tx)
    }

    /// 纯验证，不读取也不修改集合
    pub fn validate(&self, tx: &Transaction) -> LedgerResult<()> {
        validation::validate(tx, &self.verifier)
    }

    /// 跳过验证直接提交
    ///
    /// 仅用于引入新货币的受信任引导路径，调用者的授权由外部机制保证。
    /// 严格策略下，铸币交易若带输入，这些输入同样必须在集合中。
    pub fn mint(&mut self, tx: Transaction) -> LedgerResult<Transaction> {
        info!(
            "mint tx {}: {} outputs, value {}",
            hex::encode(tx.tx_id()),
            tx.outputs.len(),
            tx.outputs.iter().map(|o| u128::from(o.value)).sum::<u128>()
        );
        self.commit(&CompactTx::create(&tx))?;
        Ok(tx)
    }

    /// 将紧凑交易应用到集合
    ///
    /// 先移除全部花费，再加入全部新建，所以一笔交易不能花费自己刚创建的输出。
    /// 重复加入是幂等的。严格策略下会在修改前检查所有花费哈希都存在且互不相同，
    /// 否则返回 `DoubleSpendOrUnknownInput` 并保持集合不变；
    /// 宽松策略下缺失的花费被忽略。
    pub fn commit(&mut self, compact: &CompactTx) -> LedgerResult<()> {
        if self.policy == SpendPolicy::Strict {
            let mut seen = HashSet::with_capacity(compact.spends.len());
            for spend in &compact.spends {
                if !self.uhs.contains(spend) || !seen.insert(spend) {
                    warn!(
                        "commit of tx {} refused: {} is not spendable",
                        hex::encode(compact.tx_id),
                        hex::encode(spend)
                    );
                    return Err(LedgerError::DoubleSpendOrUnknownInput { hash: *spend });
                }
            }
        }

        for spend in &compact.spends {
            if !self.uhs.remove(spend) {
                warn!(
                    "tx {} spends unknown hash {}, ignored",
                    hex::encode(compact.tx_id),
                    hex::encode(spend)
                );
            }
        }
        self.uhs.extend(compact.creates.iter().copied());

        if self.display_commits {
            info!("commit\n{}", compact);
        } else {
            info!(
                "committed tx {}: -{} +{} (uhs size {})",
                hex::encode(compact.tx_id),
                compact.spends.len(),
                compact.creates.len(),
                self.uhs.len()
            );
        }
        Ok(())
    }

    /// 给定输入是否可花费（其哈希在集合中）
    pub fn is_spendable(&self, txin: &TxIn) -> bool {
        self.uhs.contains(&hash_tx_input(txin))
    }

    pub fn contains(&self, hash: &Hash256) -> bool {
        self.uhs.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.uhs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uhs.is_empty()
    }

    pub fn hashes(&self) -> impl Iterator<Item = &Hash256> {
        self.uhs.iter()
    }

    /// 把当前集合写入JSON快照（十六进制，已排序）
    pub fn save_snapshot(&self, path: &Path) -> Result<(), SnapshotError> {
        let mut hashes: Vec<String> = self.uhs.iter().map(hex::encode).collect();
        hashes.sort();
        let serialized = serde_json::to_string_pretty(&Snapshot { hashes })?;
        fs::write(path, serialized)?;
        info!("wrote {} hashes to {}", self.uhs.len(), path.display());
        Ok(())
    }

    /// 从JSON快照恢复账本
    pub fn load_snapshot(path: &Path, verifier: V, config: &LedgerConfig) -> Result<Self, SnapshotError> {
        let contents = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&contents)?;

        let mut ledger = Self::with_verifier(verifier, config);
        for encoded in &snapshot.hashes {
            let bytes = hex::decode(encoded)?;
            if bytes.len() != HASH_SIZE {
                return Err(SnapshotError::HashLength { actual: bytes.len() });
            }
            let mut hash = [0u8; HASH_SIZE];
            hash.copy_from_slice(&bytes);
            ledger.uhs.insert(hash);
        }
        info!("loaded {} hashes from {}", ledger.uhs.len(), path.display());
        Ok(ledger)
    }
}
