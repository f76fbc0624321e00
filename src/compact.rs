//! # 紧凑交易模块
//!
//! 把完整交易归约为修改UHS所需的最少哈希：要移除的输入哈希和要加入的输出哈希。

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::hash::Hash256;
use crate::transaction::{hash_tx_input, uhs_id_from_output, Transaction};

/// 紧凑交易，账本修改逻辑唯一接受的形式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactTx {
    /// 原交易ID
    pub tx_id: Hash256,
    /// 被花费输入的哈希，顺序与输入一致
    pub spends: Vec<Hash256>,
    /// 新建输出的UHS ID，顺序与输出一致
    pub creates: Vec<Hash256>,
}

impl CompactTx {
    /// 从完整交易派生紧凑交易
    ///
    /// 纯计算，不查询UHS。
    pub fn create(tx: &Transaction) -> Self {
        let tx_id = tx.tx_id();
        let spends = tx.inputs.iter().map(hash_tx_input).collect();
        let creates = tx
            .outputs
            .iter()
            .enumerate()
            .map(|(index, output)| uhs_id_from_output(tx_id, index as u64, output))
            .collect();

        let compact = CompactTx {
            tx_id,
            spends,
            creates,
        };
        debug!(
            "derived compact tx {}: {} spends, {} creates",
            hex::encode(compact.tx_id),
            compact.spends.len(),
            compact.creates.len()
        );
        compact
    }
}

impl From<&Transaction> for CompactTx {
    fn from(tx: &Transaction) -> Self {
        CompactTx::create(tx)
    }
}

impl fmt::Display for CompactTx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[ txid: {} ]", hex::encode(self.tx_id))?;
        writeln!(f, " spending:")?;
        for spend in &self.spends {
            writeln!(f, "  \u{2191} {}", hex::encode(spend))?;
        }
        write!(f, " creating:")?;
        for create in &self.creates {
            write!(f, "\n  -> {}", hex::encode(create))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Outpoint, TxIn, TxOut};

    fn two_in_two_out() -> Transaction {
        let prev = TxOut::new(5, [7u8; 32]);
        Transaction::new(
            vec![
                TxIn::new(Outpoint::new([1u8; 32], 0), prev.clone()),
                TxIn::new(Outpoint::new([1u8; 32], 1), prev),
            ],
            vec![TxOut::new(6, [8u8; 32]), TxOut::new(4, [9u8; 32])],
        )
    }

    #[test]
    fn test_create_mirrors_inputs_and_outputs() {
        let tx = two_in_two_out();
        let compact = CompactTx::create(&tx);

        assert_eq!(compact.tx_id, tx.tx_id());
        assert_eq!(compact.spends, vec![hash_tx_input(&tx.inputs[0]), hash_tx_input(&tx.inputs[1])]);
        assert_eq!(compact.creates.len(), 2);
        for (index, output) in tx.outputs.iter().enumerate() {
            let spender = TxIn::new(Outpoint::new(tx.tx_id(), index as u64), output.clone());
            assert_eq!(compact.creates[index], hash_tx_input(&spender));
        }
    }

    #[test]
    fn test_create_is_deterministic() {
        let tx = two_in_two_out();
        assert_eq!(CompactTx::create(&tx), CompactTx::from(&tx));
    }

    #[test]
    fn test_display_lists_every_hash() {
        let compact = CompactTx::create(&two_in_two_out());
        let shown = compact.to_string();
        assert!(shown.starts_with(&format!("[ txid: {} ]", hex::encode(compact.tx_id))));
        assert_eq!(shown.matches('\u{2191}').count(), 2);
        assert_eq!(shown.matches("->").count(), 2);
    }
}
