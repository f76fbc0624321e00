//! # 地址模块
//!
//! 钱包地址使用bech32编码：人类可读部分为 `usd`，数据部分为版本号1
//! 加上32字节公钥，形如 `usd1p...`。

use bech32::{u5, FromBase32, ToBase32, Variant};
use thiserror::Error;

use crate::keys::{PublicKey, PUBLIC_KEY_SIZE};

/// bech32人类可读部分
pub const ADDRESS_HRP: &str = "usd";
/// 地址版本号
pub const ADDRESS_VERSION: u8 = 1;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AddressError {
    #[error("invalid bech32 address: {0}")]
    Bech32(#[from] bech32::Error),

    #[error("address belongs to {found:?}, expected \"usd\"")]
    WrongHrp { found: String },

    #[error("unsupported address version {version:?}")]
    Version { version: Option<u8> },

    #[error("address holds {actual} bytes, expected a 32-byte public key")]
    Length { actual: usize },
}

/// 由公钥生成地址
pub fn encode_address(public_key: &PublicKey) -> Result<String, AddressError> {
    let mut data = vec![u5::try_from_u8(ADDRESS_VERSION)?];
    data.extend(public_key.to_base32());
    Ok(bech32::encode(ADDRESS_HRP, data, Variant::Bech32)?)
}

/// 解析地址，返回其中的公钥
pub fn decode_address(address: &str) -> Result<PublicKey, AddressError> {
    let (hrp, data, _variant) = bech32::decode(address)?;
    if hrp != ADDRESS_HRP {
        return Err(AddressError::WrongHrp { found: hrp });
    }
    let program = match data.split_first() {
        Some((version, program)) if version.to_u8() == ADDRESS_VERSION => program,
        other => {
            return Err(AddressError::Version {
                version: other.map(|(version, _)| version.to_u8()),
            })
        }
    };

    let bytes = Vec::<u8>::from_base32(program)?;
    if bytes.len() != PUBLIC_KEY_SIZE {
        return Err(AddressError::Length { actual: bytes.len() });
    }
    let mut public_key = [0u8; PUBLIC_KEY_SIZE];
    public_key.copy_from_slice(&bytes);
    Ok(public_key)
}
