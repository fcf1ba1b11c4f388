//! The hash ring: a sorted list of virtual node positions.

use crate::routing::RingPosition;

/// A hash ring is a continuous ring of 32-bit positions. Keys are associated
/// by hashing them onto the ring and walking it in the direction of
/// increasing positions; the first virtual node encountered owns the key.
/// Each ring member is a `(position, element)` pair, and the ring is kept
/// sorted ascending by position, so that walk starts with a binary search.
/// The ring is circular: past the highest position it wraps around and
/// continues from the lowest one.
#[derive(Debug, Clone)]
pub struct HashRing<ElemT> {
    ring: Vec<(RingPosition, ElemT)>,
}

impl<ElemT> HashRing<ElemT> {
    pub(crate) fn new(ring_iter: impl Iterator<Item = (RingPosition, ElemT)>) -> HashRing<ElemT> {
        let mut ring: Vec<(RingPosition, ElemT)> = ring_iter.collect();
        // Stable sort: members with equal positions stay in insertion order.
        ring.sort_by(|a, b| a.0.cmp(&b.0));
        HashRing { ring }
    }

    /// Iterates over all members of the ring starting at the lowest position.
    pub fn iter(&self) -> impl Iterator<Item = &(RingPosition, ElemT)> {
        self.ring.iter()
    }

    /// Provides an iterator over the ring members starting at the given
    /// position. The iterator traverses the whole ring in the direction of
    /// increasing positions, starting at the first member with a position
    /// greater than or equal to the given one. After reaching the maximum
    /// position it wraps around and continues from the lowest one. The
    /// iterator visits each member once, it doesn't have an infinite length.
    pub fn ring_range_full(
        &self,
        position: RingPosition,
    ) -> impl Iterator<Item = &(RingPosition, ElemT)> {
        let start_index: usize = self.ring.partition_point(|member| member.0 < position);

        self.ring[start_index..]
            .iter()
            .chain(self.ring.iter())
            .take(self.ring.len())
    }

    /// Provides an iterator over the ring's elements starting at the given
    /// position, in the same order as [`HashRing::ring_range_full`]. To
    /// access the position along with the element use `ring_range_full`.
    pub fn ring_range(&self, position: RingPosition) -> impl Iterator<Item = &ElemT> {
        self.ring_range_full(position).map(|(_position, elem)| elem)
    }

    /// Traverses the ring starting at the given position and returns the
    /// first element encountered, i.e. the element owning that position.
    /// Returns `None` on an empty ring.
    pub fn get_elem_for_position(&self, position: RingPosition) -> Option<&ElemT> {
        self.ring_range(position).next()
    }

    /// Get the total number of members in the ring.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Returns `true` if the ring contains no members.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::HashRing;
    use crate::routing::RingPosition;
    use crate::test_utils::setup_tracing;

    fn example_ring() -> HashRing<i32> {
        let ring_data = [
            (RingPosition { value: 50 }, 5),
            (RingPosition { value: 20 }, 2),
            (RingPosition { value: 70 }, 7),
            (RingPosition { value: 10 }, 1),
            (RingPosition { value: 40 }, 4),
            (RingPosition { value: 60 }, 6),
            (RingPosition { value: 30 }, 3),
        ];
        HashRing::new(ring_data.into_iter())
    }

    fn collect_range(ring: &HashRing<i32>, position: u32) -> Vec<i32> {
        ring.ring_range(RingPosition { value: position })
            .cloned()
            .collect()
    }

    #[test]
    fn test_ring_is_sorted_after_construction() {
        setup_tracing();
        let ring = example_ring();
        let positions: Vec<u32> = ring.iter().map(|(position, _elem)| position.value()).collect();
        assert_eq!(positions, vec![10, 20, 30, 40, 50, 60, 70]);
        assert_eq!(ring.len(), 7);
        assert!(!ring.is_empty());
    }

    #[test]
    fn test_ring_range() {
        setup_tracing();
        let ring = example_ring();

        // Below the lowest position.
        assert_eq!(collect_range(&ring, 0), vec![1, 2, 3, 4, 5, 6, 7]);
        // Exactly on a member.
        assert_eq!(collect_range(&ring, 10), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(collect_range(&ring, 40), vec![4, 5, 6, 7, 1, 2, 3]);
        // Between members.
        assert_eq!(collect_range(&ring, 15), vec![2, 3, 4, 5, 6, 7, 1]);
        assert_eq!(collect_range(&ring, 65), vec![7, 1, 2, 3, 4, 5, 6]);
        // On the highest member.
        assert_eq!(collect_range(&ring, 70), vec![7, 1, 2, 3, 4, 5, 6]);
        // Past the highest member the range wraps around.
        assert_eq!(collect_range(&ring, 75), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(collect_range(&ring, u32::MAX), vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_get_elem_for_position() {
        setup_tracing();
        let ring = example_ring();

        assert_eq!(ring.get_elem_for_position(RingPosition { value: 0 }), Some(&1));
        assert_eq!(ring.get_elem_for_position(RingPosition { value: 30 }), Some(&3));
        assert_eq!(ring.get_elem_for_position(RingPosition { value: 31 }), Some(&4));
        assert_eq!(ring.get_elem_for_position(RingPosition { value: 70 }), Some(&7));
        // Wrap-around: positions past the last member map to the first one.
        assert_eq!(ring.get_elem_for_position(RingPosition { value: 71 }), Some(&1));
        assert_eq!(
            ring.get_elem_for_position(RingPosition { value: u32::MAX }),
            Some(&1)
        );
    }

    #[test]
    fn test_empty_ring() {
        setup_tracing();
        let ring: HashRing<i32> = HashRing::new(std::iter::empty());
        assert_eq!(ring.len(), 0);
        assert!(ring.is_empty());
        assert_eq!(ring.get_elem_for_position(RingPosition { value: 42 }), None);
        assert_eq!(ring.ring_range(RingPosition { value: 42 }).next(), None);
    }

    #[test]
    fn test_equal_positions_keep_insertion_order() {
        setup_tracing();
        let ring_data = [
            (RingPosition { value: 20 }, 1),
            (RingPosition { value: 10 }, 2),
            (RingPosition { value: 20 }, 3),
            (RingPosition { value: 20 }, 4),
        ];
        let ring: HashRing<i32> = HashRing::new(ring_data.into_iter());

        let elems: Vec<i32> = ring.iter().map(|(_position, elem)| *elem).collect();
        assert_eq!(elems, vec![2, 1, 3, 4]);

        // The walk starts at the first member of the equal run, so the
        // earliest inserted element wins the position.
        assert_eq!(ring.get_elem_for_position(RingPosition { value: 20 }), Some(&1));
        assert_eq!(ring.get_elem_for_position(RingPosition { value: 15 }), Some(&1));
    }
}
