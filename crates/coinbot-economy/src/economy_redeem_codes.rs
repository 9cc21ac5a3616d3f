//! Single-use redeem codes generated once at startup.
//!
//! Codes look like `RDM-<index>-<8 uppercase hex>` with a 1-based index. The
//! set of valid codes never changes after generation and each code flips from
//! unredeemed to redeemed exactly once.

use std::collections::HashMap;

use rand::RngCore;
use thiserror::Error;

pub const REDEEM_CODE_COUNT: usize = 50;
pub const REDEEM_CODE_PREFIX: &str = "RDM";
const REDEEM_CODE_RANDOM_BYTES: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One generated code and whether it has been consumed.
pub struct RedeemCode {
    pub code: String,
    pub redeemed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
/// Reasons a redeem attempt is refused.
pub enum RedeemCodeError {
    #[error("no redeem code supplied")]
    MissingCode,
    #[error("redeem code is not recognised")]
    UnknownCode,
    #[error("redeem code has already been used")]
    AlreadyRedeemed,
}

#[derive(Debug, Clone, Default)]
pub struct RedeemCodeRegistry {
    codes: Vec<RedeemCode>,
    positions: HashMap<String, usize>,
}

impl RedeemCodeRegistry {
    /// Generates `count` fresh codes from `rng`.
    pub fn generate<R: RngCore + ?Sized>(count: usize, rng: &mut R) -> Self {
        let codes = (1..=count).map(|index| {
            let mut bytes = [0u8; REDEEM_CODE_RANDOM_BYTES];
            rng.fill_bytes(&mut bytes);
            format_redeem_code(index, &bytes)
        });
        Self::from_codes(codes)
    }

    /// Builds a registry from known code strings. Duplicates after
    /// canonicalisation are dropped.
    pub fn from_codes<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::default();
        for raw in codes {
            let code = canonical_redeem_code(raw.as_ref());
            if code.is_empty() || registry.positions.contains_key(&code) {
                continue;
            }
            registry
                .positions
                .insert(code.clone(), registry.codes.len());
            registry.codes.push(RedeemCode {
                code,
                redeemed: false,
            });
        }
        registry
    }

    /// Codes in generation order.
    pub fn codes(&self) -> &[RedeemCode] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn is_valid(&self, code: &str) -> bool {
        self.positions.contains_key(&canonical_redeem_code(code))
    }

    pub fn is_redeemed(&self, code: &str) -> bool {
        self.lookup(code)
            .map(|position| self.codes[position].redeemed)
            .unwrap_or(false)
    }

    /// Marks `code` as consumed.
    pub fn redeem(&mut self, code: &str) -> Result<(), RedeemCodeError> {
        if code.trim().is_empty() {
            return Err(RedeemCodeError::MissingCode);
        }
        let position = self.lookup(code).ok_or(RedeemCodeError::UnknownCode)?;
        let entry = &mut self.codes[position];
        if entry.redeemed {
            return Err(RedeemCodeError::AlreadyRedeemed);
        }
        entry.redeemed = true;
        Ok(())
    }

    fn lookup(&self, code: &str) -> Option<usize> {
        self.positions.get(&canonical_redeem_code(code)).copied()
    }
}

/// Command input is lowercased before it reaches the registry while codes are
/// issued uppercase, so lookups compare in uppercase.
pub fn canonical_redeem_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

fn format_redeem_code(index: usize, bytes: &[u8]) -> String {
    let suffix = bytes
        .iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<String>();
    format!("{REDEEM_CODE_PREFIX}-{index}-{suffix}")
}
