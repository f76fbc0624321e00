//! # 交易模块
//!
//! 定义UHS账本的交易数据结构：输出引用（Outpoint）、交易输出（TxOut）、
//! 交易输入（TxIn）和完整交易（Transaction），以及它们的规范二进制编码。
//!
//! 所有整数均为小端序64位。编码逐字节确定，哈希因此可以跨实现复用：
//!
//! * Outpoint: `[32字节txid][8字节index]` = 40字节
//! * TxOut: `[32字节witness][8字节value]` = 40字节
//! * TxIn: `Outpoint || TxOut` = 80字节
//! * Transaction: `[输入数][输入...][输出数][输出...][见证数][见证...]`，
//!   每个见证为 `[8字节长度][字节...]`，见证格式因此可以替换

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::hash::{hash256, Hash256, HASH_SIZE};

/// 长度前缀的字节数
const COUNT_SIZE: usize = 8;

/// 计算交易输入的哈希，即写入或移出UHS的值
pub fn hash_tx_input(txin: &TxIn) -> Hash256 {
    hash256(&[&txin.serialize()])
}

/// 由交易ID、输出索引和输出内容生成UHS ID
///
/// UHS ID是一个合成TxIn的哈希。创建者（提交时）和花费者（构造新输入时）
/// 都只凭公开信息就能算出同一个值。
///
/// # 参数
///
/// * `txid` - 创建该输出的交易ID
/// * `index` - 输出在 `tx.outputs` 中的位置
/// * `output` - 输出本身
pub fn uhs_id_from_output(txid: Hash256, index: u64, output: &TxOut) -> Hash256 {
    let txin = TxIn::new(Outpoint::new(txid, index), output.clone());
    hash_tx_input(&txin)
}

fn read_u64(raw: &[u8]) -> u64 {
    let mut buf = [0u8; COUNT_SIZE];
    buf.copy_from_slice(&raw[..COUNT_SIZE]);
    u64::from_le_bytes(buf)
}

fn read_hash(raw: &[u8]) -> Hash256 {
    let mut hash = [0u8; HASH_SIZE];
    hash.copy_from_slice(&raw[..HASH_SIZE]);
    hash
}

fn expect_len(what: &'static str, raw: &[u8], expected: usize) -> LedgerResult<()> {
    if raw.len() != expected {
        return Err(LedgerError::MalformedEncoding {
            what,
            expected,
            actual: raw.len(),
        });
    }
    Ok(())
}

/// 引用某笔交易的第 `index` 个输出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outpoint {
    /// 创建该输出的交易ID
    pub txid: Hash256,
    /// 输出索引
    pub index: u64,
}

impl Outpoint {
    /// 编码长度
    pub const SIZE: usize = HASH_SIZE + 8;

    pub fn new(txid: Hash256, index: u64) -> Self {
        Outpoint { txid, index }
    }

    pub fn serialize(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..HASH_SIZE].copy_from_slice(&self.txid);
        out[HASH_SIZE..].copy_from_slice(&self.index.to_le_bytes());
        out
    }

    pub fn deserialize(raw: &[u8]) -> LedgerResult<Self> {
        expect_len("outpoint", raw, Self::SIZE)?;
        Ok(Outpoint {
            txid: read_hash(raw),
            index: read_u64(&raw[HASH_SIZE..]),
        })
    }
}

/// 交易输出：可被花费的金额
///
/// `value` 以原子单位（分）计。`witness` 是授权花费者公钥的哈希，
/// 而不是公钥本身。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxOut {
    /// 金额（原子单位）
    pub value: u64,
    /// 见证承诺：hash256(公钥)
    pub witness: Hash256,
}

impl TxOut {
    /// 编码长度
    pub const SIZE: usize = HASH_SIZE + 8;

    pub fn new(value: u64, witness: Hash256) -> Self {
        TxOut { value, witness }
    }

    pub fn serialize(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..HASH_SIZE].copy_from_slice(&self.witness);
        out[HASH_SIZE..].copy_from_slice(&self.value.to_le_bytes());
        out
    }

    pub fn deserialize(raw: &[u8]) -> LedgerResult<Self> {
        expect_len("txout", raw, Self::SIZE)?;
        Ok(TxOut {
            witness: read_hash(raw),
            value: read_u64(&raw[HASH_SIZE..]),
        })
    }
}

/// 交易输入：花费之前的某个输出
///
/// 携带被花费输出的完整副本，验证时无需查询历史交易。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxIn {
    /// 被花费输出的位置
    pub prev_outpoint: Outpoint,
    /// 被花费输出的内容
    pub prev_output: TxOut,
}

impl TxIn {
    /// 编码长度
    pub const SIZE: usize = Outpoint::SIZE + TxOut::SIZE;

    pub fn new(prev_outpoint: Outpoint, prev_output: TxOut) -> Self {
        TxIn {
            prev_outpoint,
            prev_output,
        }
    }

    pub fn serialize(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[..Outpoint::SIZE].copy_from_slice(&self.prev_outpoint.serialize());
        out[Outpoint::SIZE..].copy_from_slice(&self.prev_output.serialize());
        out
    }

    pub fn deserialize(raw: &[u8]) -> LedgerResult<Self> {
        expect_len("txin", raw, Self::SIZE)?;
        Ok(TxIn {
            prev_outpoint: Outpoint::deserialize(&raw[..Outpoint::SIZE])?,
            prev_output: TxOut::deserialize(&raw[Outpoint::SIZE..])?,
        })
    }
}

/// 完整交易，包含有序的输入、输出和见证列表
///
/// 第 `i` 个见证授权第 `i` 个输入。交易ID只覆盖输入和输出，
/// 仅见证不同的两笔交易拥有相同的ID。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// 交易输入列表
    pub inputs: Vec<TxIn>,
    /// 交易输出列表
    pub outputs: Vec<TxOut>,
    /// 见证列表
    pub witnesses: Vec<Vec<u8>>,
}

impl Transaction {
    /// 创建新的交易（不含见证）
    ///
    /// # 参数
    ///
    /// * `inputs` - 交易输入列表
    /// * `outputs` - 交易输出列表
    pub fn new(inputs: Vec<TxIn>, outputs: Vec<TxOut>) -> Self {
        Transaction {
            inputs,
            outputs,
            witnesses: Vec::new(),
        }
    }

    fn write_body(&self, data: &mut Vec<u8>) {
        data.extend_from_slice(&(self.inputs.len() as u64).to_le_bytes());
        for input in &self.inputs {
            data.extend_from_slice(&input.serialize());
        }
        data.extend_from_slice(&(self.outputs.len() as u64).to_le_bytes());
        for output in &self.outputs {
            data.extend_from_slice(&output.serialize());
        }
    }

    fn body_len(&self) -> usize {
        2 * COUNT_SIZE + self.inputs.len() * TxIn::SIZE + self.outputs.len() * TxOut::SIZE
    }

    /// 计算交易ID
    ///
    /// 对带长度前缀的输入和输出编码做hash256，见证不参与。
    pub fn tx_id(&self) -> Hash256 {
        let mut data = Vec::with_capacity(self.body_len());
        self.write_body(&mut data);
        hash256(&[&data])
    }

    /// 序列化完整交易（包括见证）
    pub fn serialize(&self) -> Vec<u8> {
        let witness_bytes: usize = self
            .witnesses
            .iter()
            .map(|witness| COUNT_SIZE + witness.len())
            .sum();
        let mut data = Vec::with_capacity(self.body_len() + COUNT_SIZE + witness_bytes);
        self.write_body(&mut data);
        data.extend_from_slice(&(self.witnesses.len() as u64).to_le_bytes());
        for witness in &self.witnesses {
            data.extend_from_slice(&(witness.len() as u64).to_le_bytes());
            data.extend_from_slice(witness);
        }
        data
    }

    /// 反序列化完整交易
    ///
    /// 每个见证自带长度前缀，长度不同或为空的见证都能原样还原。
    /// 任何长度前缀超出剩余字节，或见证之后还有多余字节时返回
    /// `MalformedEncoding`。
    pub fn deserialize(raw: &[u8]) -> LedgerResult<Self> {
        let mut reader = Reader::new(raw);

        let input_count = reader.count("transaction inputs", TxIn::SIZE)?;
        let mut inputs = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            inputs.push(TxIn::deserialize(reader.take(TxIn::SIZE))?);
        }

        let output_count = reader.count("transaction outputs", TxOut::SIZE)?;
        let mut outputs = Vec::with_capacity(output_count);
        for _ in 0..output_count {
            outputs.push(TxOut::deserialize(reader.take(TxOut::SIZE))?);
        }

        // 每个见证至少占一个长度前缀
        let witness_count = reader.count("transaction witnesses", COUNT_SIZE)?;
        let mut witnesses = Vec::with_capacity(witness_count);
        for _ in 0..witness_count {
            let len = reader.count("transaction witness", 1)?;
            witnesses.push(reader.take(len).to_vec());
        }

        let rest = reader.remaining();
        if !rest.is_empty() {
            return Err(LedgerError::MalformedEncoding {
                what: "transaction",
                expected: 0,
                actual: rest.len(),
            });
        }

        Ok(Transaction {
            inputs,
            outputs,
            witnesses,
        })
    }
}

/// 交易解码游标
struct Reader<'a> {
    raw: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(raw: &'a [u8]) -> Self {
        Reader { raw, pos: 0 }
    }

    fn remaining(&self) -> &'a [u8] {
        &self.raw[self.pos..]
    }

    /// 读取长度前缀，并确认后续字节足够容纳 `count * item_size`
    fn count(&mut self, what: &'static str, item_size: usize) -> LedgerResult<usize> {
        let rest = self.remaining();
        if rest.len() < COUNT_SIZE {
            return Err(LedgerError::MalformedEncoding {
                what,
                expected: COUNT_SIZE,
                actual: rest.len(),
            });
        }
        let count = read_u64(rest);
        self.pos += COUNT_SIZE;

        let available = rest.len() - COUNT_SIZE;
        let needed = usize::try_from(count)
            .ok()
            .and_then(|n| n.checked_mul(item_size));
        match needed {
            Some(bytes) if bytes <= available => Ok(count as usize),
            _ => Err(LedgerError::MalformedEncoding {
                what,
                expected: needed.unwrap_or(usize::MAX),
                actual: available,
            }),
        }
    }

    fn take(&mut self, len: usize) -> &'a [u8] {
        let slice = &self.raw[self.pos..self.pos + len];
        self.pos += len;
        slice
    }
}
