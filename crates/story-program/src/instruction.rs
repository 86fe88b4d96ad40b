//! Instruction data and account lists for the two story operations.

use serde::{Deserialize, Serialize};
use story_crypto::{instruction_discriminator, title_seed, AddressDeriver, Discriminator, NodeSeeds};
use story_types::{Address, TitleSeed};

use crate::codec::{put_string, DecodeError, Reader};
use crate::error::ProgramError;

/// Arguments shared by root and branch creation, in wire order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeArgs {
    pub title: String,
    pub content_uri: String,
    pub image_uri: String,
    pub title_seed: TitleSeed,
}

impl NodeArgs {
    /// Build arguments with the seed computed from `title`.
    pub fn new(
        title: impl Into<String>,
        content_uri: impl Into<String>,
        image_uri: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let title_seed = title_seed(&title);
        Self {
            title,
            content_uri: content_uri.into(),
            image_uri: image_uri.into(),
            title_seed,
        }
    }

    fn encode_into(&self, buf: &mut Vec<u8>) {
        put_string(buf, &self.title);
        put_string(buf, &self.content_uri);
        put_string(buf, &self.image_uri);
        buf.extend_from_slice(self.title_seed.as_bytes());
    }

    fn decode_from(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            title: r.string()?,
            content_uri: r.string()?,
            image_uri: r.string()?,
            title_seed: TitleSeed::new(r.array()?),
        })
    }
}

/// A decoded story program instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoryInstruction {
    CreateRoot(NodeArgs),
    CreateBranch(NodeArgs),
}

impl StoryInstruction {
    pub const CREATE_ROOT: &'static str = "create_root";
    pub const CREATE_BRANCH: &'static str = "create_branch";

    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoot(_) => Self::CREATE_ROOT,
            Self::CreateBranch(_) => Self::CREATE_BRANCH,
        }
    }

    pub fn args(&self) -> &NodeArgs {
        match self {
            Self::CreateRoot(args) | Self::CreateBranch(args) => args,
        }
    }

    /// Number of accounts the instruction must declare.
    pub fn account_count(&self) -> usize {
        match self {
            Self::CreateRoot(_) => 2,
            Self::CreateBranch(_) => 3,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&instruction_discriminator(self.name()));
        self.args().encode_into(&mut buf);
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut r = Reader::new(data);
        let disc: Discriminator = r.array()?;
        let ix = if disc == instruction_discriminator(Self::CREATE_ROOT) {
            Self::CreateRoot(NodeArgs::decode_from(&mut r)?)
        } else if disc == instruction_discriminator(Self::CREATE_BRANCH) {
            Self::CreateBranch(NodeArgs::decode_from(&mut r)?)
        } else {
            return Err(DecodeError::UnknownDiscriminator(disc));
        };
        r.finish()?;
        Ok(ix)
    }
}

/// One account an instruction touches, with its access rights.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMeta {
    pub address: Address,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn writable(address: Address) -> Self {
        Self {
            address,
            is_signer: false,
            is_writable: true,
        }
    }

    pub fn signer(address: Address) -> Self {
        Self {
            address,
            is_signer: true,
            is_writable: false,
        }
    }
}

/// An instruction addressed to a program.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub program_id: Address,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// Build a root-creation instruction. Returns the instruction and the
/// address the new node will occupy.
///
/// Accounts: `[story_node (writable), author (signer)]`.
pub fn create_root(
    deriver: &AddressDeriver,
    author: Address,
    args: NodeArgs,
) -> Result<(Instruction, Address), ProgramError> {
    let (node, _) = NodeSeeds::root(author, args.title_seed).derive(deriver)?;
    let ix = Instruction {
        program_id: deriver.program_id(),
        accounts: vec![AccountMeta::writable(node), AccountMeta::signer(author)],
        data: StoryInstruction::CreateRoot(args).encode(),
    };
    Ok((ix, node))
}

/// Build a branch-creation instruction under `parent`.
///
/// Accounts: `[story_node (writable), parent_node (writable), author (signer)]`.
pub fn create_branch(
    deriver: &AddressDeriver,
    author: Address,
    parent: Address,
    args: NodeArgs,
) -> Result<(Instruction, Address), ProgramError> {
    let (node, _) = NodeSeeds::branch(author, parent, args.title_seed).derive(deriver)?;
    let ix = Instruction {
        program_id: deriver.program_id(),
        accounts: vec![
            AccountMeta::writable(node),
            AccountMeta::writable(parent),
            AccountMeta::signer(author),
        ],
        data: StoryInstruction::CreateBranch(args).encode(),
    };
    Ok((ix, node))
}
