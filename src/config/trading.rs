use std::path::PathBuf;

use super::Config;

// ==================================================
// ENVIRONMENT OVERRIDES
// ==================================================

impl Config {
    /// `READ_ONLY` from the environment wins over the file setting.
    pub fn is_read_only(&self) -> bool {
        std::env::var("READ_ONLY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(self.trading.read_only)
    }

    /// `KEYPAIR_PATH` from the environment wins over the file setting.
    pub fn keypair_path(&self) -> Option<PathBuf> {
        std::env::var("KEYPAIR_PATH")
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.wallet.keypair_path.clone())
    }

    /// `RPC_URL` from the environment wins over the file setting.
    pub fn rpc_url(&self) -> String {
        std::env::var("RPC_URL").unwrap_or_else(|_| self.network.rpc_url.clone())
    }
}
