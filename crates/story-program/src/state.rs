use serde::{Deserialize, Serialize};
use story_crypto::{account_discriminator, AddressDeriver, Discriminator, NodeSeeds};
use story_types::{Address, TitleSeed, UnixTimestamp};

use crate::codec::{put_string, DecodeError, Reader};

/// One minted story node.
///
/// Every field is fixed at creation except `children_count`, which is
/// bumped by one each time a branch names this node as its parent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryNode {
    /// Author who signed the creation.
    pub author: Address,
    /// Parent node address, or [`Address::SENTINEL`] for roots.
    pub parent: Address,
    /// Short title for navigation and display.
    pub title: String,
    /// URI of the node's content (`arweave://`, `ipfs://`, `data:`).
    pub content_uri: String,
    /// URI of a cover image; empty when there is none.
    pub image_uri: String,
    /// Number of direct children branching from this node.
    pub children_count: u64,
    /// Unix timestamp of creation.
    pub created_at: UnixTimestamp,
    /// Bump used to derive this node's address.
    pub bump: u8,
}

impl StoryNode {
    /// Name hashed into the account discriminator.
    pub const TYPE_NAME: &'static str = "StoryNode";

    pub fn discriminator() -> Discriminator {
        account_discriminator(Self::TYPE_NAME)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_sentinel()
    }

    /// Account size in bytes for the given field values:
    /// 8 (discriminator) + 32 (author) + 32 (parent) + 4+title + 4+content_uri
    /// + 4+image_uri + 8 (children) + 8 (timestamp) + 1 (bump).
    pub fn space(title: &str, content_uri: &str, image_uri: &str) -> usize {
        8 + 32 + 32 + (4 + title.len()) + (4 + content_uri.len()) + (4 + image_uri.len()) + 8 + 8 + 1
    }

    /// Seeds this node's address was derived from.
    pub fn seeds(&self) -> NodeSeeds {
        let title_seed: TitleSeed = story_crypto::title_seed(&self.title);
        if self.is_root() {
            NodeSeeds::root(self.author, title_seed)
        } else {
            NodeSeeds::branch(self.author, self.parent, title_seed)
        }
    }

    /// Check that `address` is where this node belongs, using the stored
    /// bump instead of searching.
    pub fn verify_address(&self, deriver: &AddressDeriver, address: &Address) -> bool {
        deriver
            .create_address(&self.seeds().as_slices(), self.bump)
            .map(|derived| derived == *address)
            .unwrap_or(false)
    }

    /// Serialize to the on-ledger account layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::space(&self.title, &self.content_uri, &self.image_uri));
        buf.extend_from_slice(&Self::discriminator());
        buf.extend_from_slice(self.author.as_bytes());
        buf.extend_from_slice(self.parent.as_bytes());
        put_string(&mut buf, &self.title);
        put_string(&mut buf, &self.content_uri);
        put_string(&mut buf, &self.image_uri);
        buf.extend_from_slice(&self.children_count.to_le_bytes());
        buf.extend_from_slice(&self.created_at.to_le_bytes());
        buf.push(self.bump);
        buf
    }

    /// Parse the on-ledger account layout.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(data);
        let disc: Discriminator = r.array()?;
        if disc != Self::discriminator() {
            return Err(DecodeError::UnknownDiscriminator(disc));
        }
        let node = Self {
            author: Address::new(r.array()?),
            parent: Address::new(r.array()?),
            title: r.string()?,
            content_uri: r.string()?,
            image_uri: r.string()?,
            children_count: r.u64()?,
            created_at: r.i64()?,
            bump: r.u8()?,
        };
        r.finish()?;
        Ok(node)
    }
}
