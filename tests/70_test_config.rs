/*
MIT License

Copyright (c) 2024 Davinci

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! # Environment Configuration Tests
//!
//! `Config::load` reads the process environment, so these tests run serially.

use launchpad_mint_pool::{
    config::{Config, ConfigError},
    utils::RateLimit,
};
use serial_test::serial;
use solana_sdk::signature::write_keypair_file;
use std::env;

mod common;
use common::*;

const KEYS: &[&str] = &[
    "LAUNCHPAD_PORT",
    "LAUNCHPAD_PROGRAM_ID",
    "PLATFORM_CONFIG_ACCOUNT",
    "PLATFORM_NAME",
    "PLATFORM_KEYPAIR_PATH",
    "RESERVATION_TTL_SECS",
    "RATE_LIMIT_WINDOW_SECS",
    "PREPARE_RATE_LIMIT",
    "SUBMIT_RATE_LIMIT",
    "COMPUTE_UNIT_PRICE",
    "ADMIN_WALLETS",
];

fn clear_env() {
    for key in KEYS {
        env::remove_var(key);
    }
}

/// CFG-001: full environment
#[test]
#[serial]
fn test_load_from_environment() {
    println!("🧪 CFG-001: Config::load");
    clear_env();
    let program = Pubkey::new_unique();
    let platform_config = Pubkey::new_unique();
    let admin_a = Pubkey::new_unique();
    let admin_b = Pubkey::new_unique();

    env::set_var("LAUNCHPAD_PORT", "9090");
    env::set_var("LAUNCHPAD_PROGRAM_ID", program.to_string());
    env::set_var("PLATFORM_CONFIG_ACCOUNT", platform_config.to_string());
    env::set_var("PLATFORM_NAME", "Curated");
    env::set_var("RESERVATION_TTL_SECS", "600");
    env::set_var("RATE_LIMIT_WINDOW_SECS", "30");
    env::set_var("PREPARE_RATE_LIMIT", "3");
    env::set_var("SUBMIT_RATE_LIMIT", "0");
    env::set_var("COMPUTE_UNIT_PRICE", "2500");
    env::set_var("ADMIN_WALLETS", format!("{},{}", admin_a, admin_b));

    let config = Config::load().expect("config loads");
    clear_env();

    assert_eq!(config.port, 9090);
    assert_eq!(config.reservation_ttl_secs, 600);
    assert_eq!(config.prepare_limit, RateLimit { max_requests: 3, window_secs: 30 });
    assert_eq!(config.submit_limit.max_requests, 0);
    assert_eq!(config.admin_wallets.len(), 2);

    let settings = config.service_settings();
    assert_eq!(settings.platform.launchpad_program_id, program);
    assert_eq!(settings.platform.platform_config, platform_config);
    assert_eq!(settings.platform.memo_text("ABC"), "Curated | ABC");
    assert_eq!(settings.platform.compute_unit_price_micro_lamports, 2500);
    assert_eq!(settings.reservation_ttl_secs, 600);
    println!("✅ CFG-001: environment mapped onto service settings");
}

/// CFG-002: missing and malformed values
#[test]
#[serial]
fn test_missing_and_invalid_values() {
    println!("🧪 CFG-002: config errors");
    clear_env();
    assert_eq!(
        Config::load(),
        Err(ConfigError::Missing("LAUNCHPAD_PROGRAM_ID".into()))
    );

    env::set_var("LAUNCHPAD_PROGRAM_ID", "definitely-not-base58!");
    env::set_var("PLATFORM_CONFIG_ACCOUNT", Pubkey::new_unique().to_string());
    let result = Config::load();
    clear_env();
    assert!(matches!(result, Err(ConfigError::Invalid { ref key, .. }) if key == "LAUNCHPAD_PROGRAM_ID"));
    println!("✅ CFG-002: Missing and Invalid reported by key");
}

/// CFG-003: platform keypair secret file
#[test]
#[serial]
fn test_platform_signer_file() {
    println!("🧪 CFG-003: platform keypair file");
    clear_env();
    let platform = Keypair::new();
    let path = env::temp_dir().join(format!("platform-{}.json", platform.pubkey()));
    write_keypair_file(&platform, &path).expect("write keypair");

    env::set_var("LAUNCHPAD_PROGRAM_ID", Pubkey::new_unique().to_string());
    env::set_var("PLATFORM_CONFIG_ACCOUNT", Pubkey::new_unique().to_string());
    env::set_var("PLATFORM_KEYPAIR_PATH", path.to_string_lossy().to_string());
    let config = Config::load().expect("config loads");
    clear_env();

    let loaded = config.load_platform_signer().expect("signer loads");
    assert_eq!(loaded.pubkey(), platform.pubkey());
    let _ = std::fs::remove_file(&path);

    let missing = Config {
        platform_keypair_path: "/nonexistent/platform.json".into(),
        ..config
    };
    assert!(matches!(missing.load_platform_signer(), Err(ConfigError::Secret { .. })));
    println!("✅ CFG-003: signer read from file, missing file reported");
}
