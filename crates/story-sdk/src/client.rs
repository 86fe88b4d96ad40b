use std::sync::Arc;

use serde::{Deserialize, Serialize};
use story_crypto::Signature;
use story_program::{create_branch, create_root, Instruction, NodeArgs, Runtime, StoryNode};
use story_types::Address;
use tracing::info;

use crate::error::{SdkError, SdkResult};
use crate::repository::StoryTree;
use crate::wallet::Wallet;

/// Outcome of a successful mint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    /// Address of the new node.
    pub address: Address,
    /// Transaction id.
    pub signature: Signature,
}

/// Embed plain text directly as a content URI, for content that has not
/// been uploaded anywhere.
pub fn inline_content_uri(text: &str) -> String {
    format!("data:text/plain;{text}")
}

/// Mints and reads story nodes on behalf of one wallet.
pub struct StoryClient {
    runtime: Arc<Runtime>,
    wallet: Box<dyn Wallet>,
}

impl StoryClient {
    pub fn new(runtime: Arc<Runtime>, wallet: Box<dyn Wallet>) -> Self {
        Self { runtime, wallet }
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    pub fn wallet(&self) -> &dyn Wallet {
        self.wallet.as_ref()
    }

    /// The wallet's identity, connecting first if needed.
    pub async fn author(&self) -> SdkResult<Address> {
        match self.wallet.public_identity() {
            Some(address) => Ok(address),
            None => self.wallet.connect().await,
        }
    }

    /// Mint a new root story.
    ///
    /// Title and content are trimmed; either being blank is rejected here,
    /// before anything is signed.
    pub async fn mint_root(
        &self,
        title: &str,
        content_uri: &str,
        image_uri: &str,
    ) -> SdkResult<MintReceipt> {
        let args = node_args(title, content_uri, image_uri)?;
        let author = self.author().await?;
        let (ix, address) = create_root(self.runtime.deriver(), author, args)?;
        let receipt = self.send(ix, address).await?;
        info!(node = %receipt.address, tx = %receipt.signature, "root minted");
        Ok(receipt)
    }

    /// Mint a branch continuing `parent`.
    pub async fn mint_branch(
        &self,
        parent: Address,
        title: &str,
        content_uri: &str,
        image_uri: &str,
    ) -> SdkResult<MintReceipt> {
        let args = node_args(title, content_uri, image_uri)?;
        let author = self.author().await?;
        let (ix, address) = create_branch(self.runtime.deriver(), author, parent, args)?;
        let receipt = self.send(ix, address).await?;
        info!(
            node = %receipt.address,
            parent = %parent,
            tx = %receipt.signature,
            "branch minted"
        );
        Ok(receipt)
    }

    async fn send(&self, ix: Instruction, address: Address) -> SdkResult<MintReceipt> {
        let signature = self.wallet.sign_and_send(vec![ix]).await?;
        Ok(MintReceipt { address, signature })
    }

    pub fn fetch(&self, address: &Address) -> SdkResult<Option<StoryNode>> {
        Ok(self.runtime.fetch_node(address)?)
    }

    /// Like [`Self::fetch`], but a missing node is an error.
    pub fn require(&self, address: &Address) -> SdkResult<StoryNode> {
        self.fetch(address)?
            .ok_or(SdkError::NodeNotFound(*address))
    }

    /// Load the whole story tree.
    pub fn tree(&self) -> SdkResult<StoryTree> {
        StoryTree::load(self.runtime.store().as_ref(), &self.runtime.program_id())
    }
}

fn node_args(title: &str, content_uri: &str, image_uri: &str) -> SdkResult<NodeArgs> {
    let title = title.trim();
    let content_uri = content_uri.trim();
    if title.is_empty() {
        return Err(SdkError::MissingField("title"));
    }
    if content_uri.is_empty() {
        return Err(SdkError::MissingField("content"));
    }
    Ok(NodeArgs::new(title, content_uri, image_uri.trim()))
}
