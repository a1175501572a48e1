use rewards_oracle::{OracleClient, SecretFile};
use serde::Deserialize;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// A recovery phrase held only for the duration of one request. Wiped on drop
/// and never printed.
#[derive(Clone)]
pub struct RecoveryPhrase(Zeroizing<String>);

impl RecoveryPhrase {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self(Zeroizing::new(phrase.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn words(&self) -> Vec<&str> {
        self.0.split_whitespace().collect()
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for RecoveryPhrase {
    fn from(phrase: String) -> Self {
        Self::new(phrase)
    }
}

impl<'de> Deserialize<'de> for RecoveryPhrase {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

impl std::fmt::Debug for RecoveryPhrase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RecoveryPhrase(<redacted>)")
    }
}

/// A claimed identity: public key plus the phrase that should derive it.
#[derive(Clone, Debug)]
pub struct Identity {
    pub public_key: String,
    pub phrase: RecoveryPhrase,
}

impl Identity {
    pub fn new(public_key: impl Into<String>, phrase: impl Into<RecoveryPhrase>) -> Self {
        Self {
            public_key: public_key.into(),
            phrase: phrase.into(),
        }
    }
}

/// Whether `phrase` derives `public_key` according to the oracle.
///
/// Fails closed: a blank input, a phrase file that cannot be written, an
/// oracle error and a mismatch all yield `false`. The phrase file exists only
/// for the duration of the oracle call.
pub fn verify_identity(oracle: &dyn OracleClient, phrase: &RecoveryPhrase, public_key: &str) -> bool {
    if phrase.is_blank() || public_key.trim().is_empty() {
        return false;
    }

    let secret = match SecretFile::create(phrase.expose()) {
        Ok(secret) => secret,
        Err(e) => {
            warn!("Could not stage recovery phrase: {}", e);
            return false;
        }
    };

    match oracle.recover_public_key(&secret) {
        Ok(recovered) => {
            let matches = recovered == public_key;
            if !matches {
                debug!("Recovered key {} does not match claim {}", recovered, public_key);
            }
            matches
        }
        Err(e) => {
            debug!("Key recovery failed: {}", e);
            false
        }
    }
}
