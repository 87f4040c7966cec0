use std::{collections::HashSet, sync::OnceLock};

use regex::Regex;

fn evm_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").unwrap())
}

fn solana_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$").unwrap())
}

fn cosmos_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?i)[a-z]{2,20}1[0-9a-z]{38,74}$").unwrap())
}

/// A wallet belongs to exactly one of the three supported address grammars.
pub fn is_supported_wallet(value: &str) -> bool {
    evm_regex().is_match(value)
        || solana_regex().is_match(value)
        || cosmos_regex().is_match(value)
}

/// Filters a raw wallet list down to supported addresses, collapsing
/// case-insensitive duplicates to the first occurrence. The surviving
/// entries keep their original spelling: explorers accept either case, and
/// some grammars (base58) are case-significant for display.
pub fn normalize_wallets<I, S>(wallets: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for wallet in wallets {
        let trimmed = wallet.as_ref().trim();
        if !is_supported_wallet(trimmed) {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
        }
    }
    out
}
