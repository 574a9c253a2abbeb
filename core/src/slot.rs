//! Mapping between tree positions and trustee share slots.
//!
//! A round rooted at slot `r` lays the roster out as
//! `[r, 0, 1, .., r-1, r+1, .., n-1]`: the root takes position 0, slots
//! before it shift up by one, slots after it keep their number.

/// Share slot of the node at tree `position` for a round rooted at `root`
pub fn tree_position_to_slot(position: usize, root: usize) -> usize {
    if position == 0 {
        root
    } else if position <= root {
        position - 1
    } else {
        position
    }
}

/// Inverse of [`tree_position_to_slot`]
pub fn slot_to_tree_position(slot: usize, root: usize) -> usize {
    if slot == root {
        0
    } else if slot < root {
        slot + 1
    } else {
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rotation_round_trips_for_every_root() {
        for n in 1..=12 {
            for root in 0..n {
                let slots: Vec<usize> = (0..n).map(|p| tree_position_to_slot(p, root)).collect();
                // bijection onto 0..n
                assert_eq!(slots.iter().copied().collect::<HashSet<_>>().len(), n);
                assert!(slots.iter().all(|&s| s < n));

                for p in 0..n {
                    assert_eq!(slot_to_tree_position(tree_position_to_slot(p, root), root), p);
                }
                for s in 0..n {
                    assert_eq!(tree_position_to_slot(slot_to_tree_position(s, root), root), s);
                }
            }
        }
    }

    #[test]
    fn test_layout_example() {
        // n = 5 rooted at slot 2: positions hold slots [2, 0, 1, 3, 4]
        let slots: Vec<usize> = (0..5).map(|p| tree_position_to_slot(p, 2)).collect();
        assert_eq!(slots, vec![2, 0, 1, 3, 4]);
    }

    #[test]
    fn test_root_zero_is_identity() {
        for p in 0..8 {
            assert_eq!(tree_position_to_slot(p, 0), p);
        }
    }
}
