//! Round topology.
//!
//! Nodes are laid out breadth-first over the rotated roster: position 0 is
//! the root, and the children of position `p` are `p*b + 1 ..= p*b + b` for
//! branching factor `b`. With `b = n - 1` every trustee is a child of the
//! root.

use crate::error::RoundError;
use crate::roster::{Roster, ServerIdentity};
use crate::slot::{slot_to_tree_position, tree_position_to_slot};

#[derive(Debug, Clone)]
pub struct TreeNode {
    pub position: usize,
    pub slot: usize,
    pub identity: ServerIdentity,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

impl TreeNode {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Immutable for the lifetime of a round
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    root_index: usize,
}

impl Tree {
    /// Star topology rooted at slot `root_index`
    pub fn star(roster: &Roster, root_index: usize) -> Result<Self, RoundError> {
        let branching = roster.len().saturating_sub(1).max(1);
        Self::with_root(roster, root_index, branching)
    }

    pub fn with_root(roster: &Roster, root_index: usize, branching: usize) -> Result<Self, RoundError> {
        let n = roster.len();
        if n == 0 {
            return Err(RoundError::EmptyRoster);
        }
        if root_index >= n {
            return Err(RoundError::RootOutOfRange { root: root_index, n });
        }
        if branching == 0 {
            return Err(RoundError::InvalidBranching);
        }

        let nodes = (0..n)
            .map(|position| {
                let slot = tree_position_to_slot(position, root_index);
                let first_child = position.saturating_mul(branching).saturating_add(1);
                let children = (first_child..first_child.saturating_add(branching))
                    .take_while(|&c| c < n)
                    .collect();
                TreeNode {
                    position,
                    slot,
                    identity: roster.list[slot].clone(),
                    parent: (position > 0).then(|| (position - 1) / branching),
                    children,
                }
            })
            .collect();

        Ok(Self { nodes, root_index })
    }

    pub fn root_index(&self) -> usize {
        self.root_index
    }

    pub fn root(&self) -> &TreeNode {
        &self.nodes[0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn node(&self, position: usize) -> Option<&TreeNode> {
        self.nodes.get(position)
    }

    /// The node holding share `slot`
    pub fn node_for_slot(&self, slot: usize) -> Option<&TreeNode> {
        self.nodes.get(slot_to_tree_position(slot, self.root_index))
    }

    pub fn depth(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| {
                let mut depth = 0;
                let mut cursor = node.parent;
                while let Some(p) = cursor {
                    depth += 1;
                    cursor = self.nodes[p].parent;
                }
                depth
            })
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ots_threshold::KeyPair;

    fn roster(n: usize) -> Roster {
        Roster::new(
            (0..n)
                .map(|i| ServerIdentity::new(format!("t{i}"), KeyPair::random().public()))
                .collect(),
        )
    }

    #[test]
    fn test_star_puts_everyone_under_root() {
        let r = roster(7);
        let tree = Tree::star(&r, 3).unwrap();
        assert_eq!(tree.root().slot, 3);
        assert_eq!(tree.root().identity, r.list[3]);
        assert_eq!(tree.root().children, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(tree.depth(), 1);
        for node in &tree.nodes()[1..] {
            assert!(node.is_leaf());
            assert_eq!(node.parent, Some(0));
        }
    }

    #[test]
    fn test_every_slot_appears_once() {
        let r = roster(9);
        for root in 0..9 {
            let tree = Tree::with_root(&r, root, 2).unwrap();
            let mut slots: Vec<usize> = tree.nodes().iter().map(|n| n.slot).collect();
            slots.sort_unstable();
            assert_eq!(slots, (0..9).collect::<Vec<_>>());
            for slot in 0..9 {
                let node = tree.node_for_slot(slot).unwrap();
                assert_eq!(node.slot, slot);
                assert_eq!(node.identity, r.list[slot]);
            }
        }
    }

    #[test]
    fn test_binary_tree_shape() {
        let tree = Tree::with_root(&roster(7), 0, 2).unwrap();
        assert_eq!(tree.node(0).unwrap().children, vec![1, 2]);
        assert_eq!(tree.node(1).unwrap().children, vec![3, 4]);
        assert_eq!(tree.node(2).unwrap().children, vec![5, 6]);
        assert_eq!(tree.node(6).unwrap().parent, Some(2));
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn test_single_node_tree() {
        let tree = Tree::star(&roster(1), 0).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.root().is_root());
        assert!(tree.root().is_leaf());
    }

    #[test]
    fn test_invalid_arguments() {
        assert_eq!(
            Tree::star(&Roster::default(), 0).err(),
            Some(RoundError::EmptyRoster)
        );
        assert_eq!(
            Tree::star(&roster(3), 3).err(),
            Some(RoundError::RootOutOfRange { root: 3, n: 3 })
        );
        assert_eq!(
            Tree::with_root(&roster(3), 0, 0).err(),
            Some(RoundError::InvalidBranching)
        );
    }
}
