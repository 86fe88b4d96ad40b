use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use story_program::StoryNode;
use story_store::{Account, AccountStore};
use story_types::Address;
use tracing::{debug, warn};

use crate::error::SdkResult;

/// A read-only index over every story node in a store.
///
/// Built from a full scan, so two trees loaded from the same accounts are
/// identical. Children and roots are ordered by `(created_at, address)`.
#[derive(Clone, Debug, Default)]
pub struct StoryTree {
    nodes: BTreeMap<Address, StoryNode>,
    children: BTreeMap<Address, Vec<Address>>,
    roots: Vec<Address>,
}

impl StoryTree {
    /// Index the story nodes among `accounts`. Accounts not owned by
    /// `program_id`, or whose data is not a story node, are skipped.
    pub fn from_accounts(
        program_id: &Address,
        accounts: impl IntoIterator<Item = (Address, Account)>,
    ) -> Self {
        let mut nodes = BTreeMap::new();
        for (address, account) in accounts {
            if !account.is_owned_by(program_id) {
                continue;
            }
            match StoryNode::decode(&account.data) {
                Ok(node) => {
                    nodes.insert(address, node);
                }
                Err(e) => warn!(account = %address, error = %e, "skipping undecodable account"),
            }
        }

        let by_age = |a: &Address, b: &Address| {
            let key = |x: &Address| (nodes[x].created_at, *x);
            key(a).cmp(&key(b))
        };

        let mut children: BTreeMap<Address, Vec<Address>> = BTreeMap::new();
        let mut roots = Vec::new();
        for (address, node) in &nodes {
            if node.is_root() {
                roots.push(*address);
            } else {
                children.entry(node.parent).or_default().push(*address);
            }
        }
        roots.sort_by(by_age);
        for list in children.values_mut() {
            list.sort_by(by_age);
        }

        debug!(nodes = nodes.len(), roots = roots.len(), "story tree indexed");
        Self {
            nodes,
            children,
            roots,
        }
    }

    /// Scan `store` and index it.
    pub fn load(store: &dyn AccountStore, program_id: &Address) -> SdkResult<Self> {
        Ok(Self::from_accounts(program_id, store.scan_owned(program_id)?))
    }

    pub fn get(&self, address: &Address) -> Option<&StoryNode> {
        self.nodes.get(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.nodes.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in address order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &StoryNode)> {
        self.nodes.iter()
    }

    pub fn roots(&self) -> &[Address] {
        &self.roots
    }

    /// Direct children of `address`, oldest first.
    pub fn children(&self, address: &Address) -> &[Address] {
        self.children.get(address).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Branches whose parent is not in the index.
    pub fn orphans(&self) -> Vec<Address> {
        let mut orphans: Vec<Address> = self
            .children
            .iter()
            .filter(|(parent, _)| !self.nodes.contains_key(parent))
            .flat_map(|(_, kids)| kids.iter().copied())
            .collect();
        orphans.sort_by_key(|a| (self.nodes[a].created_at, *a));
        orphans
    }

    /// Path from `address` up to its root, starting with `address`.
    ///
    /// Stops early at a parent missing from the index. Empty if `address`
    /// itself is unknown.
    pub fn ancestry(&self, address: &Address) -> Vec<Address> {
        let mut path = Vec::new();
        let mut seen = BTreeSet::new();
        let mut cursor = *address;
        while let Some(node) = self.nodes.get(&cursor) {
            if !seen.insert(cursor) {
                break;
            }
            path.push(cursor);
            if node.is_root() {
                break;
            }
            cursor = node.parent;
        }
        path
    }

    /// Depth-first `(depth, address)` listing: each root followed by its
    /// subtree, then each orphan subtree.
    pub fn walk(&self) -> Vec<(usize, Address)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let starts = self.roots.iter().copied().chain(self.orphans());
        for start in starts {
            let mut stack = vec![(0usize, start)];
            while let Some((depth, address)) = stack.pop() {
                out.push((depth, address));
                for child in self.children(&address).iter().rev() {
                    stack.push((depth + 1, *child));
                }
            }
        }
        out
    }

    /// Compare every node's recorded `children_count` with the number of
    /// children actually indexed under it.
    pub fn check_counters(&self) -> CounterReport {
        let mismatches = self
            .nodes
            .iter()
            .filter_map(|(address, node)| {
                let observed = self.children(address).len() as u64;
                (observed != node.children_count).then_some(CounterMismatch {
                    address: *address,
                    recorded: node.children_count,
                    observed,
                })
            })
            .collect();
        CounterReport {
            nodes_checked: self.nodes.len(),
            orphans: self.orphans().len(),
            mismatches,
        }
    }
}

/// Result of [`StoryTree::check_counters`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterReport {
    pub nodes_checked: usize,
    pub orphans: usize,
    pub mismatches: Vec<CounterMismatch>,
}

impl CounterReport {
    /// Returns `true` if every counter matches.
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterMismatch {
    pub address: Address,
    pub recorded: u64,
    pub observed: u64,
}
