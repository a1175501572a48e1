pub const DEFAULT_RPC_URL: &str = "localhost";
pub const DEFAULT_SOLANA_BIN: &str = "solana";
pub const DEFAULT_KEYGEN_BIN: &str = "solana-keygen";
pub const DEFAULT_SPL_TOKEN_BIN: &str = "spl-token";

#[derive(Clone, Debug)]
pub struct OracleConfig {
    /// Cluster endpoint handed to balance, transfer and mint commands (`--url`)
    pub rpc_url: String,
    pub solana_bin: String,
    pub keygen_bin: String,
    pub spl_token_bin: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            solana_bin: DEFAULT_SOLANA_BIN.to_string(),
            keygen_bin: DEFAULT_KEYGEN_BIN.to_string(),
            spl_token_bin: DEFAULT_SPL_TOKEN_BIN.to_string(),
        }
    }
}

impl OracleConfig {
    pub fn with_rpc_url(mut self, url: &str) -> Self {
        self.rpc_url = url.to_string();
        self
    }

    pub fn with_solana_bin(mut self, bin: &str) -> Self {
        self.solana_bin = bin.to_string();
        self
    }

    pub fn with_keygen_bin(mut self, bin: &str) -> Self {
        self.keygen_bin = bin.to_string();
        self
    }

    pub fn with_spl_token_bin(mut self, bin: &str) -> Self {
        self.spl_token_bin = bin.to_string();
        self
    }
}
