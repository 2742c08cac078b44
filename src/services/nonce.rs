//! Action-scoped anti-forgery tokens
//!
//! A nonce is a truncated HMAC-SHA256 over the current time tick and the
//! action name. Ticks last half the configured lifetime and a nonce is
//! accepted during the tick it was issued in and the one after, so every
//! nonce stays valid for between half and the full lifetime.

use data_encoding::HEXLOWER;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex characters kept from the MAC
const NONCE_LEN: usize = 20;

/// Action used by the HTML import form
pub const IMPORT_ACTION: &str = "import-html";

pub struct NonceService {
    keyed: HmacSha256,
    tick_secs: u64,
}

impl NonceService {
    pub fn new(secret: &[u8], lifetime_secs: u64) -> anyhow::Result<Self> {
        let keyed = HmacSha256::new_from_slice(secret)
            .map_err(|e| anyhow::anyhow!("Invalid nonce secret: {}", e))?;
        Ok(Self {
            keyed,
            tick_secs: (lifetime_secs / 2).max(1),
        })
    }

    /// Issue a nonce for `action` valid from now
    pub fn create(&self, action: &str) -> String {
        self.create_at(action, now_secs())
    }

    /// Check a submitted nonce for `action`
    pub fn verify(&self, action: &str, token: &str) -> bool {
        self.verify_at(action, token, now_secs())
    }

    pub fn create_at(&self, action: &str, now: u64) -> String {
        let tag = self.mac(action, self.tick(now)).finalize().into_bytes();
        let mut hex = HEXLOWER.encode(&tag);
        hex.truncate(NONCE_LEN);
        hex
    }

    pub fn verify_at(&self, action: &str, token: &str, now: u64) -> bool {
        if token.len() != NONCE_LEN {
            return false;
        }
        let Ok(submitted) = HEXLOWER.decode(token.as_bytes()) else {
            return false;
        };

        let tick = self.tick(now);
        [Some(tick), tick.checked_sub(1)]
            .into_iter()
            .flatten()
            .any(|t| self.mac(action, t).verify_truncated_left(&submitted).is_ok())
    }

    fn tick(&self, now: u64) -> u64 {
        now / self.tick_secs
    }

    fn mac(&self, action: &str, tick: u64) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(tick.to_string().as_bytes());
        mac.update(b"|");
        mac.update(action.as_bytes());
        mac
    }
}

fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
