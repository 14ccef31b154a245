//! Export verifying keys for on-chain deployment.
//!
//! Loads keys from `ZENIGMA_KEYS_DIR` (default `keys`) or runs setup and
//! saves them there, then prints each verifying key as hex and writes
//! `verifying_keys.json` next to the keys.

use std::error::Error;
use std::path::PathBuf;

use zenigma_circuits::{PoseidonHasher, WalletParams};
use zenigma_prover::setup::{setup_all_circuits, CircuitKeys};

fn main() -> Result<(), Box<dyn Error>> {
    let keys_dir = PathBuf::from(std::env::var("ZENIGMA_KEYS_DIR").unwrap_or_else(|_| "keys".to_string()));

    let keys = if keys_dir.exists() {
        println!("Loading existing keys from {:?}", keys_dir);
        CircuitKeys::load_from_directory(&keys_dir)?
    } else {
        println!("Running trusted setup (this may take a while)...");
        let keys = setup_all_circuits(&PoseidonHasher::new(), WalletParams::default())?;
        keys.save_to_directory(&keys_dir)?;
        println!("Keys saved to {:?}", keys_dir);
        keys
    };

    let wallet_init_vk = keys.wallet_init.serialize_vk()?;

    println!("\n=== Verifying Keys ===\n");
    println!("WalletInit VK ({} bytes):", wallet_init_vk.len());
    println!("0x{}\n", hex::encode(&wallet_init_vk));

    let json = serde_json::json!({
        "wallet_init_vk": format!("0x{}", hex::encode(&wallet_init_vk)),
    });
    let json_path = keys_dir.join("verifying_keys.json");
    std::fs::write(&json_path, serde_json::to_string_pretty(&json)?)?;
    println!("JSON exported to {:?}", json_path);

    Ok(())
}
