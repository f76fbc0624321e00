//! # 铸币演示程序
//!
//! 给钱包铸造5个面值为2的币，确认它们都可花费，再转账4给另一个钱包。
//!
//! 用法：`mintmoney [config.json]`，日志级别由 `RUST_LOG` 控制。

use std::env;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use cbdc_uhs::config::LedgerConfig;
use cbdc_uhs::service;
use cbdc_uhs::uhs::UhsLedger;
use cbdc_uhs::wallet::{CoinSelection, Wallet};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match env::args().nth(1) {
        Some(path) => LedgerConfig::from_file(Path::new(&path))?,
        None => LedgerConfig::default(),
    }
    .apply_env()?;
    info!("config: {:?}", config);

    let (ledger, task) = service::spawn(UhsLedger::with_config(&config), config.channel_capacity);

    let mut dave = Wallet::with_selection(CoinSelection::SweepAll);
    let mut bob = Wallet::new();

    // 铸造5个面值为2的币
    let mint_tx = ledger.mint(dave.mint_new_coins(5, 2)).await?;
    dave.receive_transfer(&mint_tx);
    println!("   dave balance: {}", dave.balance);

    for input in &dave.spendable_inputs {
        let spendable = ledger.is_spendable(input.clone()).await?;
        println!("   is spendable?: {}", spendable);
    }

    let transfer = dave
        .transfer(4, &bob.address()?)
        .context("dave could not build the transfer")?;
    let transfer = ledger.execute(transfer).await?;
    bob.receive_transfer(&transfer);

    println!("   dave balance: {}", dave.balance);
    println!("   bob balance: {}", bob.balance);
    println!("   uhs size: {}", ledger.len().await?);

    ledger.shutdown().await?;
    let ledger = task.await.context("ledger task failed")?;
    if let Some(path) = &config.snapshot_path {
        ledger.save_snapshot(path)?;
        println!("   snapshot written to {}", path.display());
    }
    Ok(())
}
