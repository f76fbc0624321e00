//! # 密钥模块
//!
//! 生成密钥、签名和验签。使用secp256k1上的Schnorr签名（BIP-340）：
//! 公钥为32字节x-only公钥，签名为64字节，见证为 `公钥 || 签名` 共96字节。

use secp256k1::{schnorr, KeyPair, Message, Secp256k1, XOnlyPublicKey};

/// 公钥长度
pub const PUBLIC_KEY_SIZE: usize = 32;
/// 签名长度
pub const SIGNATURE_SIZE: usize = 64;
/// 参考方案下的见证长度
pub const WITNESS_SIZE: usize = PUBLIC_KEY_SIZE + SIGNATURE_SIZE;

/// 32字节公钥
pub type PublicKey = [u8; PUBLIC_KEY_SIZE];

/// 签名验证能力
///
/// 验证流水线只依赖这个trait，签名方案可以替换。
pub trait SignatureVerifier {
    /// 验证 `signature` 是否是 `public_key` 对 `message` 的有效签名
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool;
}

/// 默认的Schnorr验签器
#[derive(Debug, Clone, Copy, Default)]
pub struct SchnorrVerifier;

impl SignatureVerifier for SchnorrVerifier {
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        verify_signature(message, signature, public_key)
    }
}

/// 生成新的密钥对
///
/// # 返回值
///
/// 返回 (公钥, 密钥对)
pub fn generate_keypair() -> (PublicKey, KeyPair) {
    let secp = Secp256k1::new();
    let mut rng = rand::thread_rng();
    let keypair = KeyPair::new(&secp, &mut rng);
    (public_key_of(&keypair), keypair)
}

/// 取密钥对的x-only公钥
pub fn public_key_of(keypair: &KeyPair) -> PublicKey {
    let (xonly, _parity) = keypair.x_only_public_key();
    xonly.serialize()
}

/// 对32字节消息签名
///
/// 消息通常是交易ID。
pub fn sign_message(
    message: &[u8; 32],
    keypair: &KeyPair,
) -> Result<[u8; SIGNATURE_SIZE], secp256k1::Error> {
    let secp = Secp256k1::signing_only();
    let msg = Message::from_slice(message)?;
    let signature = secp.sign_schnorr_no_aux_rand(&msg, keypair);
    let mut out = [0u8; SIGNATURE_SIZE];
    out.copy_from_slice(&signature[..]);
    Ok(out)
}

/// 验证签名
///
/// 消息、签名或公钥无法解析时同样返回 `false`。
pub fn verify_signature(message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
    let (msg, sig, key) = match (
        Message::from_slice(message),
        schnorr::Signature::from_slice(signature),
        XOnlyPublicKey::from_slice(public_key),
    ) {
        (Ok(msg), Ok(sig), Ok(key)) => (msg, sig, key),
        _ => return false,
    };
    Secp256k1::verification_only()
        .verify_schnorr(&sig, &msg, &key)
        .is_ok()
}

/// 拼接见证：公钥 || 签名
pub fn make_witness(public_key: &PublicKey, signature: &[u8]) -> Vec<u8> {
    let mut witness = Vec::with_capacity(PUBLIC_KEY_SIZE + signature.len());
    witness.extend_from_slice(public_key);
    witness.extend_from_slice(signature);
    witness
}

/// 拆分见证为 (候选公钥, 签名)
///
/// 不足32字节的见证整体视为公钥，签名为空。
pub fn split_witness(witness: &[u8]) -> (&[u8], &[u8]) {
    witness.split_at(witness.len().min(PUBLIC_KEY_SIZE))
}
