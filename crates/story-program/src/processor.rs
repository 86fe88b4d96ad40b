//! Instruction processing for root and branch creation.
//!
//! Rejections leave no trace: every check runs before the first staged
//! write, and a branch stages its child and its parent's new counter
//! together, so the runtime commits both or neither.

use story_crypto::NodeSeeds;
use story_store::Account;
use story_types::Address;
use tracing::info;

use crate::context::InstructionContext;
use crate::error::{ProgramError, StoryError};
use crate::instruction::{Instruction, NodeArgs, StoryInstruction};
use crate::state::StoryNode;
use crate::validation::validate_node_args;

/// Decode and run one instruction against `ctx`.
pub fn process_instruction(
    ctx: &mut InstructionContext<'_>,
    instruction: &Instruction,
) -> Result<(), ProgramError> {
    if instruction.program_id != ctx.program_id() {
        return Err(ProgramError::UnknownProgram(instruction.program_id));
    }
    let decoded = StoryInstruction::decode(&instruction.data)?;
    let expected = decoded.account_count();
    if instruction.accounts.len() < expected {
        return Err(ProgramError::NotEnoughAccounts {
            expected,
            actual: instruction.accounts.len(),
        });
    }
    match decoded {
        StoryInstruction::CreateRoot(args) => create_root(ctx, args),
        StoryInstruction::CreateBranch(args) => create_branch(ctx, args),
    }
}

fn create_root(ctx: &mut InstructionContext<'_>, args: NodeArgs) -> Result<(), ProgramError> {
    let node_address = ctx.account(0)?.address;
    let author = ctx.signer(1)?;
    validate_node_args(&args)?;

    let seeds = NodeSeeds::root(author, args.title_seed);
    let bump = claim_address(ctx, &seeds, node_address)?;

    let node = new_node(ctx, author, Address::SENTINEL, args, bump);
    info!(
        node = %node_address,
        author = %author,
        title = %node.title,
        bump,
        "root story node created"
    );
    let program_id = ctx.program_id();
    ctx.stage(node_address, Account::new(program_id, node.encode()))
}

fn create_branch(ctx: &mut InstructionContext<'_>, args: NodeArgs) -> Result<(), ProgramError> {
    let node_address = ctx.account(0)?.address;
    let parent_address = ctx.account(1)?.address;
    let author = ctx.signer(2)?;
    validate_node_args(&args)?;

    let mut parent = load_node(ctx, &parent_address)?;

    let seeds = NodeSeeds::branch(author, parent_address, args.title_seed);
    let bump = claim_address(ctx, &seeds, node_address)?;

    parent.children_count = parent
        .children_count
        .checked_add(1)
        .ok_or(StoryError::Overflow)?;

    let node = new_node(ctx, author, parent_address, args, bump);
    info!(
        node = %node_address,
        parent = %parent_address,
        author = %author,
        title = %node.title,
        parent_children = parent.children_count,
        "branch created"
    );
    let program_id = ctx.program_id();
    ctx.stage(node_address, Account::new(program_id, node.encode()))?;
    ctx.stage(parent_address, Account::new(program_id, parent.encode()))
}

/// Resolve `address` to an existing story node owned by this program.
fn load_node(
    ctx: &InstructionContext<'_>,
    address: &Address,
) -> Result<StoryNode, ProgramError> {
    let account = ctx
        .load(address)?
        .ok_or(ProgramError::ParentNotFound(*address))?;
    if !account.is_owned_by(&ctx.program_id()) {
        return Err(ProgramError::AccountNotStoryNode(*address));
    }
    StoryNode::decode(&account.data).map_err(|_| ProgramError::AccountNotStoryNode(*address))
}

/// Derive the node address from `seeds`, require it to be the declared
/// target, and require the slot to be empty. Returns the bump.
fn claim_address(
    ctx: &InstructionContext<'_>,
    seeds: &NodeSeeds,
    declared: Address,
) -> Result<u8, ProgramError> {
    let (derived, bump) = seeds.derive(ctx.deriver())?;
    if derived != declared {
        return Err(ProgramError::SeedsConstraint {
            derived,
            supplied: declared,
        });
    }
    if ctx.load(&declared)?.is_some() {
        return Err(ProgramError::AccountAlreadyInUse(declared));
    }
    Ok(bump)
}

fn new_node(
    ctx: &InstructionContext<'_>,
    author: Address,
    parent: Address,
    args: NodeArgs,
    bump: u8,
) -> StoryNode {
    StoryNode {
        author,
        parent,
        title: args.title,
        content_uri: args.content_uri,
        image_uri: args.image_uri,
        children_count: 0,
        created_at: ctx.now(),
        bump,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use story_crypto::AddressDeriver;
    use story_store::{AccountStore, InMemoryAccountStore};
    use story_types::TitleSeed;

    use super::*;
    use crate::instruction::{create_branch as branch_ix, create_root as root_ix};

    const AUTHOR: Address = Address::new([7; 32]);

    fn run(
        store: &InMemoryAccountStore,
        ix: &Instruction,
    ) -> Result<BTreeMap<Address, Account>, ProgramError> {
        let deriver = AddressDeriver::new(crate::ID);
        let signers = [AUTHOR];
        let mut staged = BTreeMap::new();
        let mut ctx =
            InstructionContext::new(&deriver, store, &ix.accounts, &signers, &mut staged, 1_000);
        process_instruction(&mut ctx, ix)?;
        Ok(staged)
    }

    fn commit(store: &InMemoryAccountStore, staged: BTreeMap<Address, Account>) {
        let writes: Vec<_> = staged.into_iter().collect();
        store.commit(&writes).unwrap();
    }

    fn mint_root(store: &InMemoryAccountStore, title: &str) -> Address {
        let deriver = AddressDeriver::new(crate::ID);
        let (ix, address) = root_ix(&deriver, AUTHOR, NodeArgs::new(title, "ar://c", "")).unwrap();
        commit(store, run(store, &ix).unwrap());
        address
    }

    fn node(store: &InMemoryAccountStore, address: &Address) -> StoryNode {
        StoryNode::decode(&store.get(address).unwrap().unwrap().data).unwrap()
    }

    #[test]
    fn root_is_created_with_known_address() {
        let store = InMemoryAccountStore::new();
        let address = mint_root(&store, "The Dark Forest");
        assert_eq!(
            address.to_hex(),
            "fdcaea02679e7ce3e93190eb5fea4a315b0b9aca5a4c645eb2bcaa2023ff8457"
        );
        let root = node(&store, &address);
        assert!(root.is_root());
        assert_eq!(root.author, AUTHOR);
        assert_eq!(root.children_count, 0);
        assert_eq!(root.created_at, 1_000);
        assert_eq!(root.bump, 255);
        assert!(root.verify_address(&AddressDeriver::new(crate::ID), &address));
    }

    #[test]
    fn branch_stages_child_and_parent_together() {
        let store = InMemoryAccountStore::new();
        let root = mint_root(&store, "Root");
        let deriver = AddressDeriver::new(crate::ID);
        let (ix, child) =
            branch_ix(&deriver, AUTHOR, root, NodeArgs::new("Left", "ar://l", "")).unwrap();

        let staged = run(&store, &ix).unwrap();
        assert_eq!(staged.len(), 2);
        assert_eq!(node(&store, &root).children_count, 0);

        commit(&store, staged);
        assert_eq!(node(&store, &root).children_count, 1);
        assert_eq!(node(&store, &child).parent, root);
    }

    #[test]
    fn remint_is_rejected() {
        let store = InMemoryAccountStore::new();
        let address = mint_root(&store, "Once");
        let deriver = AddressDeriver::new(crate::ID);
        let (ix, _) = root_ix(&deriver, AUTHOR, NodeArgs::new("Once", "ar://other", "")).unwrap();
        assert!(matches!(
            run(&store, &ix),
            Err(ProgramError::AccountAlreadyInUse(a)) if a == address
        ));
        assert_eq!(node(&store, &address).content_uri, "ar://c");
    }

    #[test]
    fn missing_parent_is_rejected() {
        let store = InMemoryAccountStore::new();
        let deriver = AddressDeriver::new(crate::ID);
        let ghost = Address::new([42; 32]);
        let (ix, _) = branch_ix(&deriver, AUTHOR, ghost, NodeArgs::new("B", "c", "")).unwrap();
        assert!(matches!(
            run(&store, &ix),
            Err(ProgramError::ParentNotFound(a)) if a == ghost
        ));
    }

    #[test]
    fn foreign_parent_is_rejected() {
        let store = InMemoryAccountStore::new();
        let foreign = Address::new([43; 32]);
        store
            .commit(&[(foreign, Account::new(Address::new([1; 32]), vec![0; 8]))])
            .unwrap();
        let deriver = AddressDeriver::new(crate::ID);
        let (ix, _) = branch_ix(&deriver, AUTHOR, foreign, NodeArgs::new("B", "c", "")).unwrap();
        assert!(matches!(
            run(&store, &ix),
            Err(ProgramError::AccountNotStoryNode(_))
        ));
    }

    #[test]
    fn saturated_counter_overflows_without_writes() {
        let store = InMemoryAccountStore::new();
        let root = mint_root(&store, "Full");
        let mut full = node(&store, &root);
        full.children_count = u64::MAX;
        store
            .commit(&[(root, Account::new(crate::ID, full.encode()))])
            .unwrap();

        let deriver = AddressDeriver::new(crate::ID);
        let (ix, child) =
            branch_ix(&deriver, AUTHOR, root, NodeArgs::new("One more", "c", "")).unwrap();
        assert!(matches!(
            run(&store, &ix),
            Err(ProgramError::Story(StoryError::Overflow))
        ));
        assert!(!store.exists(&child).unwrap());
        assert_eq!(node(&store, &root).children_count, u64::MAX);
    }

    #[test]
    fn redirected_target_violates_seeds() {
        let store = InMemoryAccountStore::new();
        let deriver = AddressDeriver::new(crate::ID);
        let (mut ix, derived) = root_ix(&deriver, AUTHOR, NodeArgs::new("R", "c", "")).unwrap();
        let elsewhere = Address::new([9; 32]);
        ix.accounts[0].address = elsewhere;
        assert!(matches!(
            run(&store, &ix),
            Err(ProgramError::SeedsConstraint { derived: d, supplied: s })
                if d == derived && s == elsewhere
        ));
    }

    #[test]
    fn validation_precedes_parent_lookup() {
        let store = InMemoryAccountStore::new();
        let deriver = AddressDeriver::new(crate::ID);
        let mut args = NodeArgs::new("B", "c", "");
        args.title_seed = TitleSeed::new([0; 32]);
        let (ix, _) = branch_ix(&deriver, AUTHOR, Address::new([44; 32]), args).unwrap();
        assert!(matches!(
            run(&store, &ix),
            Err(ProgramError::Story(StoryError::InvalidTitleSeed))
        ));
    }

    #[test]
    fn unsigned_author_is_rejected() {
        let store = InMemoryAccountStore::new();
        let deriver = AddressDeriver::new(crate::ID);
        let (mut ix, _) = root_ix(&deriver, AUTHOR, NodeArgs::new("R", "c", "")).unwrap();
        ix.accounts[1].is_signer = false;
        assert!(matches!(run(&store, &ix), Err(ProgramError::MissingSigner(_))));
    }

    #[test]
    fn short_account_list_is_rejected() {
        let store = InMemoryAccountStore::new();
        let deriver = AddressDeriver::new(crate::ID);
        let (mut ix, _) =
            branch_ix(&deriver, AUTHOR, Address::new([1; 32]), NodeArgs::new("B", "c", "")).unwrap();
        ix.accounts.truncate(2);
        assert!(matches!(
            run(&store, &ix),
            Err(ProgramError::NotEnoughAccounts { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn wrong_program_is_rejected() {
        let store = InMemoryAccountStore::new();
        let deriver = AddressDeriver::new(crate::ID);
        let (mut ix, _) = root_ix(&deriver, AUTHOR, NodeArgs::new("R", "c", "")).unwrap();
        ix.program_id = Address::new([5; 32]);
        assert!(matches!(run(&store, &ix), Err(ProgramError::UnknownProgram(_))));
    }
}
