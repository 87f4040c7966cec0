use serde::Serialize;

/// One entry of the static airdrop catalog. Loaded once at process start and
/// immutable afterwards; `token_address` is `None` for tokens that have not
/// launched yet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AirdropDefinition {
    pub key: String,
    pub name: String,
    pub chain: String,
    pub chain_id: String,
    pub token_address: Option<String>,
    pub decimals: u32,
    pub price_usd: f64,
    pub avg_airdrop_usd: f64,
}

#[allow(clippy::too_many_arguments)]
fn entry(
    key: &str,
    name: &str,
    chain: &str,
    chain_id: &str,
    token_address: Option<&str>,
    decimals: u32,
    price_usd: f64,
    avg_airdrop_usd: f64,
) -> AirdropDefinition {
    AirdropDefinition {
        key: key.to_string(),
        name: name.to_string(),
        chain: chain.to_string(),
        chain_id: chain_id.to_string(),
        token_address: token_address.map(str::to_string),
        decimals,
        price_usd,
        avg_airdrop_usd,
    }
}

/// The built-in ordered catalog of known airdrops. Order is part of the
/// contract: scan output lines up with it index by index.
pub fn default_catalog() -> Vec<AirdropDefinition> {
    vec![
        // Ethereum
        entry("UNI", "Uniswap", "ethereum", "1", Some("0x1f9840a85d5af5bf1d1762f925bdaddc4201f984"), 18, 10.0, 1200.0),
        entry("ENS", "ENS", "ethereum", "1", Some("0xc18360217d8f7ab5e7c516566761ea12ce7f9d72"), 18, 30.0, 500.0),
        entry("DYDX", "dYdX", "ethereum", "1", Some("0x92d6c1e31e14520e676a687f0a93788b716beff5"), 18, 2.0, 700.0),
        entry("1INCH", "1inch", "ethereum", "1", Some("0x111111111117dc0aa78b770fa6a738034120c302"), 18, 0.5, 300.0),
        entry("AAVE", "Aave", "ethereum", "1", Some("0x7fc66500c84a76ad7e9c93437bfc5ac33e2ddae9"), 18, 90.0, 1000.0),
        entry("COMP", "Compound", "ethereum", "1", Some("0xc00e94cb662c3520282e6f5717214004a7f26888"), 18, 55.0, 600.0),
        entry("SUSHI", "SushiSwap", "ethereum", "1", Some("0x6b3595068778dd592e39a122f4f5a5cf09c90fe2"), 18, 1.2, 400.0),
        entry("CRV", "Curve", "ethereum", "1", Some("0xd533a949740bb3306d119cc777fa900ba034cd52"), 18, 0.6, 800.0),
        entry("CVX", "Convex", "ethereum", "1", Some("0x4e3fbd56cd56c3e6dffa66b113c6185b4426bf8c"), 18, 3.5, 500.0),
        entry("LOOKS", "LooksRare", "ethereum", "1", Some("0xf4d2888d29d722226fafa5d9b24f9164c092421e"), 18, 0.1, 300.0),
        entry("BLUR", "Blur", "ethereum", "1", Some("0x5283d291dbcf85356a21ba090e6db59121208b44"), 18, 0.3, 600.0),
        entry("ZRO", "LayerZero", "ethereum", "1", Some("0x6985884c4392d348587b19cb9eaaf157f13271cd"), 18, 3.0, 2000.0),
        // Pre-launch entries: no token contract yet, always unsupported
        entry("ETHFI", "EtherFi", "ethereum", "1", None, 18, 0.0, 700.0),
        entry("REZ", "Renzo", "ethereum", "1", None, 18, 0.0, 300.0),
        entry("SWELL", "Swell", "ethereum", "1", None, 18, 0.0, 300.0),
        entry("ENA", "Ethena", "ethereum", "1", None, 18, 0.0, 800.0),
        entry("EIGEN", "EigenLayer", "ethereum", "1", None, 18, 0.0, 1800.0),
        entry("STRK", "StarkNet", "ethereum", "1", None, 18, 0.0, 1500.0),
        entry("ZK", "zkSync", "ethereum", "1", None, 18, 0.0, 1200.0),
        // Arbitrum
        entry("ARB", "Arbitrum", "arbitrum", "42161", Some("0x912ce59144191c1204e64559fe8253a0e49e6548"), 18, 2.0, 1500.0),
        entry("GMX", "GMX", "arbitrum", "42161", Some("0xfc5a1a6eb076a6ca4a8574adfdf3f5f2c0f8b5f0"), 18, 35.0, 900.0),
        entry("RDNT", "Radiant", "arbitrum", "42161", Some("0x3082cc23568ea640225c2467653db90e9250aaa0"), 18, 0.2, 600.0),
        entry("MAGIC", "Treasure", "arbitrum", "42161", Some("0x539bde0d7dbd336b79148aa742883198bbf60342"), 18, 0.8, 400.0),
        // Optimism
        entry("OP", "Optimism", "optimism", "10", Some("0x4200000000000000000000000000000000000042"), 18, 4.0, 800.0),
        entry("VELO", "Velodrome", "optimism", "10", Some("0x9560e827af36c94d2ac33a39bce1fe78631088db"), 18, 0.08, 300.0),
        // Base
        entry("AERO", "Aerodrome", "base", "8453", Some("0x940181a94a35a4569e4529a3cdfb74e38fd98631"), 18, 1.3, 450.0),
        entry("FRIEND", "Friend.tech", "base", "8453", None, 18, 0.0, 300.0),
        // Polygon
        entry("QUICK", "QuickSwap", "polygon", "137", Some("0x831753dd7087cac61ab5644b308642cc1c33dc13"), 18, 0.04, 200.0),
        // BNB Chain
        entry("CAKE", "PancakeSwap", "bsc", "56", Some("0x0e09fabb73bd3ade0a17ecc321fd13a19e81ce82"), 18, 2.7, 400.0),
        // Solana
        entry("JTO", "Jito", "solana", "0", Some("jtojtomepa8beP8AuQc6eXt5FriJwfFMwA9v2f9mCL"), 9, 2.8, 400.0),
        entry("PYTH", "Pyth", "solana", "0", Some("HZ1JovNiVvGrGNiiYv5f3B8wLxbuKQ4u6r4s4s6Yv8o"), 6, 0.7, 300.0),
        entry("JUP", "Jupiter", "solana", "0", Some("JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN"), 6, 0.9, 500.0),
        entry("TNSR", "Tensor", "solana", "0", None, 6, 0.35, 400.0),
        entry("W", "Wormhole", "solana", "0", None, 6, 0.9, 600.0),
        // Cosmos: placeholder adapter, reported as not yet configured
        entry("ATOM", "Cosmos Hub", "cosmos", "0", Some("uatom"), 6, 8.0, 400.0),
        entry("OSMO", "Osmosis", "cosmos", "0", Some("uosmo"), 6, 0.9, 350.0),
        entry("TIA", "Celestia", "cosmos", "0", Some("utia"), 6, 10.0, 1000.0),
        entry("SAGA", "Saga", "cosmos", "0", None, 6, 0.0, 500.0),
    ]
}
