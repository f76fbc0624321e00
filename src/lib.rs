//! # UHS结算核心
//!
//! 基于未花费哈希集合（Unspent Hash Set）的数字货币结算核心。账本不保存完整的
//! 未花费输出，只保存每个可花费输出的哈希。交易合法的条件是：输入哈希在集合中、
//! 金额守恒、每个输入都有与承诺公钥哈希匹配的签名。执行合法交易时原子地移除
//! 被花费输出的哈希并加入新输出的哈希。
//!
//! ## 主要模块
//!
//! * `hash` - SHA-256摘要
//! * `transaction` - 交易数据结构和规范二进制编码
//! * `compact` - 由交易派生紧凑交易
//! * `validation` - 结构、金额、签名检查
//! * `uhs` - UHS账本（提交引擎）
//! * `service` - 单写者账本服务
//! * `keys` / `address` / `wallet` - 密钥、地址和内存钱包
//! * `config` - 账本配置

pub mod address;
pub mod compact;
pub mod config;
pub mod error;
pub mod hash;
pub mod keys;
pub mod service;
pub mod transaction;
pub mod uhs;
pub mod validation;
pub mod wallet;

pub use compact::CompactTx;
pub use config::{LedgerConfig, SpendPolicy};
pub use error::{LedgerError, LedgerResult, StructureViolation};
pub use hash::{hash256, Hash256};
pub use transaction::{hash_tx_input, uhs_id_from_output, Outpoint, Transaction, TxIn, TxOut};
pub use uhs::UhsLedger;
