//! Wallet interface and selection.
//!
//! A wallet owns a signing key and submits signed transactions to a
//! [`Runtime`]. Front ends do not probe for concrete wallet kinds; they ask
//! [`select_wallet`] for the first one available.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use story_crypto::{Keypair, Signature};
use story_program::{Instruction, Runtime};
use story_types::Address;
use tracing::{debug, info};

use crate::error::{SdkError, SdkResult};

/// Environment variable holding a hex-encoded 32-byte secret key.
pub const SECRET_KEY_VAR: &str = "STORY_SECRET_KEY";

#[async_trait]
pub trait Wallet: Send + Sync {
    /// Human-readable wallet kind.
    fn name(&self) -> &str;

    /// Connect and return the wallet's public identity.
    async fn connect(&self) -> SdkResult<Address>;

    /// The public identity, once connected.
    fn public_identity(&self) -> Option<Address>;

    /// Sign `instructions` as one transaction and submit it.
    async fn sign_and_send(&self, instructions: Vec<Instruction>) -> SdkResult<Signature>;
}

/// Keypair-backed signing shared by the concrete wallets.
struct KeypairSigner {
    keypair: Arc<Keypair>,
    runtime: Arc<Runtime>,
    connected: AtomicBool,
}

impl KeypairSigner {
    fn new(keypair: Keypair, runtime: Arc<Runtime>) -> Self {
        Self {
            keypair: Arc::new(keypair),
            runtime,
            connected: AtomicBool::new(false),
        }
    }

    fn connect(&self, wallet: &str) -> Address {
        self.connected.store(true, Ordering::SeqCst);
        let address = self.keypair.address();
        info!(wallet, identity = %address, "wallet connected");
        address
    }

    fn public_identity(&self) -> Option<Address> {
        self.connected
            .load(Ordering::SeqCst)
            .then(|| self.keypair.address())
    }

    /// Submission may wait on account locks, so it runs on the blocking
    /// pool rather than an executor thread.
    async fn sign_and_send(
        &self,
        wallet: &str,
        instructions: Vec<Instruction>,
    ) -> SdkResult<Signature> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SdkError::NotConnected(wallet.to_string()));
        }
        let keypair = Arc::clone(&self.keypair);
        let runtime = Arc::clone(&self.runtime);
        let signature =
            tokio::task::spawn_blocking(move || runtime.submit(&keypair, instructions))
                .await
                .map_err(|e| SdkError::Internal(format!("submit task failed: {e}")))??;
        debug!(wallet, tx = %signature, "transaction sent");
        Ok(signature)
    }
}

/// Wallet whose key comes from [`SECRET_KEY_VAR`].
pub struct EnvWallet(KeypairSigner);

impl EnvWallet {
    pub const NAME: &'static str = "env";

    pub fn from_secret_hex(secret: &str, runtime: Arc<Runtime>) -> SdkResult<Self> {
        let keypair = Keypair::from_secret_hex(secret)?;
        Ok(Self(KeypairSigner::new(keypair, runtime)))
    }
}

#[async_trait]
impl Wallet for EnvWallet {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn connect(&self) -> SdkResult<Address> {
        Ok(self.0.connect(Self::NAME))
    }

    fn public_identity(&self) -> Option<Address> {
        self.0.public_identity()
    }

    async fn sign_and_send(&self, instructions: Vec<Instruction>) -> SdkResult<Signature> {
        self.0.sign_and_send(Self::NAME, instructions).await
    }
}

/// Wallet backed by a JSON keypair file.
pub struct KeypairFileWallet {
    path: PathBuf,
    signer: KeypairSigner,
}

impl KeypairFileWallet {
    pub const NAME: &'static str = "keypair-file";

    pub fn load(path: &Path, runtime: Arc<Runtime>) -> SdkResult<Self> {
        let keypair = Keypair::read_file(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            signer: KeypairSigner::new(keypair, runtime),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Wallet for KeypairFileWallet {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn connect(&self) -> SdkResult<Address> {
        Ok(self.signer.connect(Self::NAME))
    }

    fn public_identity(&self) -> Option<Address> {
        self.signer.public_identity()
    }

    async fn sign_and_send(&self, instructions: Vec<Instruction>) -> SdkResult<Signature> {
        self.signer.sign_and_send(Self::NAME, instructions).await
    }
}

/// The inputs wallet selection looks at, captured once.
#[derive(Clone, Debug, Default)]
pub struct WalletEnvironment {
    pub secret_key: Option<String>,
    pub keypair_path: Option<PathBuf>,
}

impl WalletEnvironment {
    /// Read [`SECRET_KEY_VAR`] from the process environment.
    pub fn from_process(keypair_path: Option<PathBuf>) -> Self {
        Self {
            secret_key: std::env::var(SECRET_KEY_VAR)
                .ok()
                .filter(|s| !s.trim().is_empty()),
            keypair_path,
        }
    }
}

/// Pick the first available wallet: an environment secret, then a keypair
/// file that exists on disk.
pub fn select_wallet(env: &WalletEnvironment, runtime: Arc<Runtime>) -> SdkResult<Box<dyn Wallet>> {
    if let Some(secret) = &env.secret_key {
        return Ok(Box::new(EnvWallet::from_secret_hex(secret, runtime)?));
    }
    if let Some(path) = env.keypair_path.as_deref().filter(|p| p.exists()) {
        return Ok(Box::new(KeypairFileWallet::load(path, runtime)?));
    }
    Err(SdkError::NoWallet)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_available_is_no_wallet() {
        let env = WalletEnvironment {
            secret_key: None,
            keypair_path: Some(PathBuf::from("/nonexistent/id.json")),
        };
        assert!(matches!(
            select_wallet(&env, Arc::new(Runtime::in_memory())),
            Err(SdkError::NoWallet)
        ));
    }

    #[test]
    fn env_secret_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id.json");
        Keypair::generate().write_file(&path).unwrap();

        let env = WalletEnvironment {
            secret_key: Some(hex::encode([3u8; 32])),
            keypair_path: Some(path.clone()),
        };
        let wallet = select_wallet(&env, Arc::new(Runtime::in_memory())).unwrap();
        assert_eq!(wallet.name(), EnvWallet::NAME);

        let env = WalletEnvironment {
            secret_key: None,
            keypair_path: Some(path),
        };
        let wallet = select_wallet(&env, Arc::new(Runtime::in_memory())).unwrap();
        assert_eq!(wallet.name(), KeypairFileWallet::NAME);
    }

    #[test]
    fn malformed_secret_is_an_error() {
        let env = WalletEnvironment {
            secret_key: Some("not-hex".into()),
            keypair_path: None,
        };
        assert!(matches!(
            select_wallet(&env, Arc::new(Runtime::in_memory())),
            Err(SdkError::Keypair(_))
        ));
    }
}
