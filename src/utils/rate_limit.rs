//! Per-identity request throttle
//!
//! Fixed-window counters held in process memory. The counters reset on
//! restart and are not shared between instances, so this is a best-effort
//! brake on abusive clients only. Keypair allocation correctness never depends
//! on it.

use log::{debug, warn};
use parking_lot::Mutex;
use solana_program::pubkey::Pubkey;
use std::collections::HashMap;

use crate::error::LaunchError;

/// Windows are pruned once the table grows past this many identities
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateAction {
    Prepare,
    Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window_secs: i64,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: i64,
    count: u32,
}

pub struct RateLimiter {
    prepare: RateLimit,
    submit: RateLimit,
    windows: Mutex<HashMap<(Pubkey, RateAction), Window>>,
}

impl RateLimiter {
    pub fn new(prepare: RateLimit, submit: RateLimit) -> Self {
        Self {
            prepare,
            submit,
            windows: Mutex::new(HashMap::new()),
        }
    }

    fn limit_for(&self, action: RateAction) -> RateLimit {
        match action {
            RateAction::Prepare => self.prepare,
            RateAction::Submit => self.submit,
        }
    }

    /// Counts one request, failing with `RateLimited` once the window is full.
    pub fn check(&self, identity: &Pubkey, action: RateAction, now: i64) -> Result<(), LaunchError> {
        let limit = self.limit_for(action);
        if limit.max_requests == 0 {
            return Ok(());
        }

        let mut windows = self.windows.lock();
        if windows.len() > PRUNE_THRESHOLD {
            let before = windows.len();
            windows.retain(|(_, a), w| now < w.started_at + self.limit_for(*a).window_secs);
            debug!("Pruned {} idle rate-limit windows", before - windows.len());
        }

        let window = windows
            .entry((*identity, action))
            .or_insert(Window { started_at: now, count: 0 });
        if now >= window.started_at + limit.window_secs {
            *window = Window { started_at: now, count: 0 };
        }
        if window.count >= limit.max_requests {
            let retry_after = (window.started_at + limit.window_secs - now).max(1) as u64;
            warn!("Rate limit hit: {} {:?}, retry in {}s", identity, action, retry_after);
            return Err(LaunchError::RateLimited { retry_after_secs: retry_after });
        }
        window.count += 1;
        Ok(())
    }
}
