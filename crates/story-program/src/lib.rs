//! The story node program.
//!
//! Story nodes are accounts at addresses derived from their content. A
//! root is keyed by `(author, title)`; a branch by `(author, parent,
//! title)`. The program validates creation requests, refuses to overwrite
//! an existing node, and keeps each node's `children_count` in step with
//! the branches created under it.
//!
//! [`Runtime`] executes signed transactions against an
//! [`AccountStore`](story_store::AccountStore) and commits each one
//! atomically.

mod codec;
pub mod context;
pub mod error;
pub mod instruction;
pub mod processor;
pub mod runtime;
pub mod state;
pub mod validation;

use story_types::Address;

pub use codec::DecodeError;
pub use context::InstructionContext;
pub use error::{ProgramError, StoryError, ERROR_CODE_OFFSET};
pub use instruction::{
    create_branch, create_root, AccountMeta, Instruction, NodeArgs, StoryInstruction,
};
pub use processor::process_instruction;
pub use runtime::{
    AccountLocks, Clock, FixedClock, Message, Runtime, RuntimeConfig, SystemClock, Transaction,
};
pub use state::StoryNode;
pub use validation::{validate_node_args, MAX_TITLE_LEN, MAX_URI_LEN};

/// Program id of the canonical story chain deployment.
pub const ID: Address = Address::new([
    206, 173, 44, 114, 173, 180, 26, 70, 125, 252, 226, 57, 178, 117, 23, 229, 123, 8, 242, 19,
    60, 194, 120, 27, 53, 255, 221, 48, 165, 240, 198, 232,
]);
