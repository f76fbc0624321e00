//! # 错误模块
//!
//! 交易解码、验证和提交过程中可能出现的错误。

use std::fmt;

use thiserror::Error;

use crate::hash::Hash256;

/// 交易结构检查失败的具体原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureViolation {
    /// 交易没有输入
    MissingInputs,
    /// 交易没有输出
    MissingOutputs,
    /// 见证数量与输入数量不一致
    WitnessCountMismatch { inputs: usize, witnesses: usize },
}

impl fmt::Display for StructureViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureViolation::MissingInputs => write!(f, "missing inputs"),
            StructureViolation::MissingOutputs => write!(f, "missing outputs"),
            StructureViolation::WitnessCountMismatch { inputs, witnesses } => write!(
                f,
                "number of witnesses ({}) doesn't match the number of inputs ({})",
                witnesses, inputs
            ),
        }
    }
}

/// 账本错误
///
/// 所有验证错误对提交的交易都是终结性的：不会部分应用，也不会自动重试。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("malformed {what} encoding: expected {expected} bytes, got {actual}")]
    MalformedEncoding {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("validation: {0}")]
    Structure(StructureViolation),

    #[error("validation: input value {inputs} doesn't match output value {outputs}")]
    BalanceMismatch { inputs: u128, outputs: u128 },

    #[error("validation: witness commitment mismatch for input {index}")]
    WitnessCommitmentMismatch { index: usize },

    #[error("validation: bad signature for input {index}")]
    InvalidSignature { index: usize },

    #[error("commit: {} is already spent or was never created", hex::encode(.hash))]
    DoubleSpendOrUnknownInput { hash: Hash256 },
}

/// 账本操作结果类型
pub type LedgerResult<T> = Result<T, LedgerError>;

/// UHS快照读写错误
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("snapshot hash is not hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("snapshot hash has {actual} bytes, expected 32")]
    HashLength { actual: usize },
}
