use cbdc_uhs::compact::CompactTx;
use cbdc_uhs::keys::{PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
use cbdc_uhs::{hash_tx_input, uhs_id_from_output, LedgerError, Outpoint, Transaction, TxIn, TxOut};

// 辅助函数：构造一个多输入多输出的交易
fn multi_tx() -> Transaction {
    let inputs = (0..3u64)
        .map(|i| TxIn::new(Outpoint::new([i as u8; 32], i), TxOut::new(10 * (i + 1), [0xaa; 32])))
        .collect();
    let outputs = vec![TxOut::new(35, [0xbb; 32]), TxOut::new(25, [0xcc; 32])];
    let mut tx = Transaction::new(inputs, outputs);
    tx.witnesses = (0..3u8)
        .map(|i| vec![i; PUBLIC_KEY_SIZE + SIGNATURE_SIZE])
        .collect();
    tx
}

#[test]
fn test_structure() {
    let fake_txid = [1u8; 32];
    let fake_witness = [3u8; 32];
    // 公钥(32) + 签名(64) = 96
    let fake_tx_witness = vec![4u8; PUBLIC_KEY_SIZE + SIGNATURE_SIZE];

    let op = Outpoint::new(fake_txid, 1);
    assert_eq!(Outpoint::deserialize(&op.serialize()).unwrap(), op);

    let txo = TxOut::new(24, fake_witness);
    assert_eq!(TxOut::deserialize(&txo.serialize()).unwrap(), txo);

    let txi = TxIn::new(op, txo.clone());
    assert_eq!(TxIn::deserialize(&txi.serialize()).unwrap(), txi);
    assert_eq!(txi.prev_outpoint.index, 1);
    assert_eq!(txi.prev_outpoint.txid, fake_txid);
    assert_eq!(txi.prev_output.value, 24);
    assert_eq!(txi.prev_output.witness, fake_witness);

    let mut ftx = Transaction::new(vec![txi.clone()], vec![txo.clone()]);
    ftx.witnesses.push(fake_tx_witness);
    assert_eq!(ftx.tx_id().len(), 32);
    // 24 = 长度前缀, 40 = 一个TxOut, 80 = 一个TxIn, 8 + 96 = 一个带长度的见证
    assert_eq!(ftx.serialize().len(), 24 + 40 + 80 + 8 + 96);

    // 注意上面outpoint使用的索引是1
    assert_eq!(hash_tx_input(&txi), uhs_id_from_output(fake_txid, 1, &txo));
}

#[test]
fn test_transaction_roundtrip_preserves_order() {
    let tx = multi_tx();
    let raw = tx.serialize();
    assert_eq!(raw.len(), 24 + 3 * 80 + 2 * 40 + 3 * (8 + 96));

    let back = Transaction::deserialize(&raw).unwrap();
    assert_eq!(back, tx);
    assert_eq!(back.tx_id(), tx.tx_id());
    assert_eq!(back.witnesses[2], vec![2u8; 96]);
}

#[test]
fn test_deserialize_rejects_trailing_garbage_without_witnesses() {
    let mut tx = multi_tx();
    tx.witnesses.clear();
    let mut raw = tx.serialize();
    raw.push(0);
    assert!(matches!(
        Transaction::deserialize(&raw),
        Err(LedgerError::MalformedEncoding { expected: 0, actual: 1, .. })
    ));
}

#[test]
fn test_hash_linkage_for_every_output() {
    let tx = multi_tx();
    let txid = tx.tx_id();
    let compact = CompactTx::create(&tx);
    for (index, output) in tx.outputs.iter().enumerate() {
        let spender = TxIn::new(Outpoint::new(txid, index as u64), output.clone());
        assert_eq!(uhs_id_from_output(txid, index as u64, output), hash_tx_input(&spender));
        assert_eq!(compact.creates[index], hash_tx_input(&spender));
    }
    for (index, input) in tx.inputs.iter().enumerate() {
        assert_eq!(compact.spends[index], hash_tx_input(input));
    }
}

#[test]
fn test_tx_id_is_content_addressed() {
    let tx = multi_tx();
    let mut reordered = tx.clone();
    reordered.outputs.swap(0, 1);
    assert_ne!(tx.tx_id(), reordered.tx_id());

    let mut stripped = tx.clone();
    stripped.witnesses.clear();
    assert_eq!(tx.tx_id(), stripped.tx_id());
}

#[test]
fn test_witnesses_of_any_length_roundtrip() {
    let mut tx = multi_tx();
    tx.inputs.truncate(2);
    tx.witnesses = vec![vec![1u8; 96], vec![2u8; 48]];
    assert_eq!(Transaction::deserialize(&tx.serialize()).unwrap(), tx);

    tx.inputs.truncate(1);
    tx.witnesses = vec![vec![]];
    assert_eq!(Transaction::deserialize(&tx.serialize()).unwrap(), tx);
}
