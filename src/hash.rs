//! # 哈希模块
//!
//! 交易ID、输入哈希和见证承诺共用的SHA-256摘要。

use sha2::{Digest, Sha256};

/// 哈希长度（字节）
pub const HASH_SIZE: usize = 32;

/// 32字节哈希值
pub type Hash256 = [u8; HASH_SIZE];

/// 全零哈希
pub const ZERO_HASH: Hash256 = [0u8; HASH_SIZE];

/// 按给定顺序对多个字节串计算SHA-256
///
/// 顺序敏感：`hash256(&[a, b])` 与 `hash256(&[b, a])` 不同，
/// 但与 `hash256(&[&[a, b].concat()])` 相同。
///
/// # 参数
///
/// * `parts` - 依次写入哈希器的字节串
///
/// # 返回值
///
/// 返回32字节摘要
pub fn hash256(parts: &[&[u8]]) -> Hash256 {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut digest = ZERO_HASH;
    digest.copy_from_slice(&hasher.finalize());
    digest
}
