//! # 验证模块
//!
//! 提交前的纯检查：结构、金额守恒、见证与签名。
//!
//! 这些检查都不查询UHS。输入哈希是否仍在集合中由账本在提交时负责，
//! 所以一笔结构、金额和签名都合法的交易仍可能因为双花在提交阶段被拒绝。

use crate::error::{LedgerError, LedgerResult, StructureViolation};
use crate::hash::hash256;
use crate::keys::{split_witness, SignatureVerifier};
use crate::transaction::Transaction;

/// 依次执行三项检查，遇到第一个失败立即返回
pub fn validate<V: SignatureVerifier + ?Sized>(tx: &Transaction, verifier: &V) -> LedgerResult<()> {
    check_structure(tx)?;
    check_inputs_outputs(tx)?;
    check_witness_and_signature(tx, verifier)
}

/// 结构检查：至少一个输入和一个输出，见证数等于输入数
pub fn check_structure(tx: &Transaction) -> LedgerResult<()> {
    if tx.inputs.is_empty() {
        return Err(LedgerError::Structure(StructureViolation::MissingInputs));
    }
    if tx.outputs.is_empty() {
        return Err(LedgerError::Structure(StructureViolation::MissingOutputs));
    }
    if tx.inputs.len() != tx.witnesses.len() {
        return Err(LedgerError::Structure(StructureViolation::WitnessCountMismatch {
            inputs: tx.inputs.len(),
            witnesses: tx.witnesses.len(),
        }));
    }
    Ok(())
}

/// 金额守恒检查：输入总额必须严格等于输出总额，没有隐含手续费
///
/// 以128位累加，任何现实的输入数量都不会溢出。
pub fn check_inputs_outputs(tx: &Transaction) -> LedgerResult<()> {
    let inputs: u128 = tx
        .inputs
        .iter()
        .map(|input| u128::from(input.prev_output.value))
        .sum();
    let outputs: u128 = tx
        .outputs
        .iter()
        .map(|output| u128::from(output.value))
        .sum();

    if inputs != outputs {
        return Err(LedgerError::BalanceMismatch { inputs, outputs });
    }
    Ok(())
}

/// 见证与签名检查
///
/// 对每个输入：取见证前32字节作为候选公钥，其hash256必须等于
/// 被花费输出中的承诺；剩余部分必须是该公钥对交易ID的有效签名。
pub fn check_witness_and_signature<V: SignatureVerifier + ?Sized>(
    tx: &Transaction,
    verifier: &V,
) -> LedgerResult<()> {
    let txid = tx.tx_id();
    for (index, (input, witness)) in tx.inputs.iter().zip(&tx.witnesses).enumerate() {
        let (public_key, signature) = split_witness(witness);

        if hash256(&[public_key]) != input.prev_output.witness {
            return Err(LedgerError::WitnessCommitmentMismatch { index });
        }
        if !verifier.verify(&txid, signature, public_key) {
            return Err(LedgerError::InvalidSignature { index });
        }
    }
    Ok(())
}
