//! # 钱包模块
//!
//! 内存钱包：管理密钥和见证承诺，记录可花费输入，构造并签名转账交易。

use std::collections::HashMap;

use log::debug;
use secp256k1::KeyPair;
use thiserror::Error;

use crate::address::{decode_address, encode_address, AddressError};
use crate::hash::{hash256, Hash256};
use crate::keys::{generate_keypair, make_witness, sign_message, PublicKey};
use crate::transaction::{Outpoint, Transaction, TxIn, TxOut};

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("wallet has nothing to spend")]
    NoFunds,

    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },

    #[error("no key for the commitment of input {index}")]
    UnknownCommitment { index: usize },

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("signing failed: {0}")]
    Signing(#[from] secp256k1::Error),
}

/// 选币策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoinSelection {
    /// 按顺序累加输入，直到覆盖转账金额
    #[default]
    FirstFit,
    /// 花掉所有输入，余额全部找零
    SweepAll,
}

/// 见证承诺：公钥的hash256
pub fn witness_commitment(public_key: &PublicKey) -> Hash256 {
    hash256(&[public_key])
}

pub struct Wallet {
    /// 钱包余额（原子单位）
    pub balance: u64,
    /// 可花费的输入
    pub spendable_inputs: Vec<TxIn>,
    /// 选币策略
    pub selection: CoinSelection,
    keys: HashMap<PublicKey, KeyPair>,
    commitments: HashMap<Hash256, PublicKey>,
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

impl Wallet {
    pub fn new() -> Self {
        Wallet {
            balance: 0,
            spendable_inputs: Vec::new(),
            selection: CoinSelection::FirstFit,
            keys: HashMap::new(),
            commitments: HashMap::new(),
        }
    }

    pub fn with_selection(selection: CoinSelection) -> Self {
        Wallet {
            selection,
            ..Self::new()
        }
    }

    /// 铸造 `num_outputs` 个面值为 `value` 的输出，每个输出使用新密钥
    ///
    /// 返回的交易没有输入和见证，需要经账本的铸币路径提交，
    /// 再调用 [`Wallet::receive_transfer`] 计入余额。
    pub fn mint_new_coins(&mut self, num_outputs: usize, value: u64) -> Transaction {
        let outputs = (0..num_outputs)
            .map(|_| {
                let payee = self.generate_key();
                TxOut::new(value, witness_commitment(&payee))
            })
            .collect();
        Transaction::new(Vec::new(), outputs)
    }

    /// 生成一个新地址。一个钱包可以有很多地址。
    pub fn address(&mut self) -> Result<String, WalletError> {
        let public_key = self.generate_key();
        Ok(encode_address(&public_key)?)
    }

    pub fn is_my_address(&self, address: &str) -> bool {
        decode_address(address)
            .map(|public_key| self.keys.contains_key(&public_key))
            .unwrap_or(false)
    }

    /// 从交易中收取属于本钱包的输出，更新余额和可花费输入
    pub fn receive_transfer(&mut self, tx: &Transaction) {
        let txid = tx.tx_id();
        for (index, output) in tx.outputs.iter().enumerate() {
            if self.commitments.contains_key(&output.witness) {
                self.balance = self.balance.saturating_add(output.value);
                self.spendable_inputs
                    .push(TxIn::new(Outpoint::new(txid, index as u64), output.clone()));
            }
        }
    }

    /// 可花费输入的总额
    pub fn spendable_total(&self) -> u64 {
        self.spendable_inputs
            .iter()
            .map(|input| input.prev_output.value)
            .fold(0u64, u64::saturating_add)
    }

    /// 构造向 `receiver` 转账 `amount` 的已签名交易
    ///
    /// 输入总额超过 `amount` 时，差额找零到本钱包的新密钥。
    /// 成功后被花费的输入从钱包移除，找零计入余额。
    ///
    /// 钱包在账本接受交易之前就更新了自己的状态。账本拒绝这笔交易时
    /// （例如提交时的 `DoubleSpendOrUnknownInput`），调用
    /// [`Wallet::abort_transfer`] 恢复被花费的输入并撤销找零。
    ///
    /// # 参数
    ///
    /// * `amount` - 转账金额
    /// * `receiver` - 接收方地址
    pub fn transfer(&mut self, amount: u64, receiver: &str) -> Result<Transaction, WalletError> {
        let payee = decode_address(receiver)?;
        if self.spendable_inputs.is_empty() {
            return Err(WalletError::NoFunds);
        }

        let (count, total) = self.select_inputs(amount);
        if total < amount {
            return Err(WalletError::InsufficientFunds {
                have: total,
                need: amount,
            });
        }

        let mut tx = Transaction::new(
            self.spendable_inputs[..count].to_vec(),
            vec![TxOut::new(amount, witness_commitment(&payee))],
        );
        if total > amount {
            let change_key = self.generate_key();
            tx.outputs
                .push(TxOut::new(total - amount, witness_commitment(&change_key)));
        }

        let txid = tx.tx_id();
        let mut witnesses = Vec::with_capacity(count);
        for (index, input) in tx.inputs.iter().enumerate() {
            let (public_key, keypair) = self
                .commitments
                .get(&input.prev_output.witness)
                .and_then(|public_key| self.keys.get(public_key).map(|kp| (public_key, kp)))
                .ok_or(WalletError::UnknownCommitment { index })?;
            let signature = sign_message(&txid, keypair)?;
            witnesses.push(make_witness(public_key, &signature));
        }
        tx.witnesses = witnesses;

        self.spendable_inputs.drain(..count);
        self.balance = self.balance.saturating_sub(total);
        self.receive_transfer(&tx);
        debug!(
            "built transfer {}: {} inputs, amount {}, change {}",
            hex::encode(txid),
            count,
            amount,
            total - amount
        );
        Ok(tx)
    }

    /// 撤销 [`Wallet::transfer`] 对钱包的修改
    ///
    /// 交易花费的输入放回可花费列表的开头，交易中属于本钱包的输出（找零）
    /// 被移除，余额相应恢复。
    pub fn abort_transfer(&mut self, tx: &Transaction) {
        let txid = tx.tx_id();
        let mut received = 0u64;
        self.spendable_inputs.retain(|input| {
            if input.prev_outpoint.txid == txid {
                received = received.saturating_add(input.prev_output.value);
                false
            } else {
                true
            }
        });

        let restored: Vec<TxIn> = tx
            .inputs
            .iter()
            .filter(|input| self.commitments.contains_key(&input.prev_output.witness))
            .cloned()
            .collect();
        let spent = restored
            .iter()
            .map(|input| input.prev_output.value)
            .fold(0u64, u64::saturating_add);
        self.spendable_inputs.splice(0..0, restored);

        self.balance = self.balance.saturating_sub(received).saturating_add(spent);
        debug!(
            "aborted transfer {}: restored {}, dropped {}",
            hex::encode(txid),
            spent,
            received
        );
    }

    /// 按选币策略挑选输入
    ///
    /// # 返回值
    ///
    /// 返回 (选中的前缀长度, 选中输入的总额)
    fn select_inputs(&self, amount: u64) -> (usize, u64) {
        let mut total = 0u64;
        let mut count = 0;
        for input in &self.spendable_inputs {
            if self.selection == CoinSelection::FirstFit && count > 0 && total >= amount {
                break;
            }
            total = total.saturating_add(input.prev_output.value);
            count += 1;
        }
        (count, total)
    }

    fn generate_key(&mut self) -> PublicKey {
        let (public_key, keypair) = generate_keypair();
        self.keys.insert(public_key, keypair);
        self.commitments
            .insert(witness_commitment(&public_key), public_key);
        public_key
    }
}
