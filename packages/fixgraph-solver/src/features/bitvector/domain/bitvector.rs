//! Sparse bit-vector sets
//!
//! Set of small ordinal indices stored as a sorted, deduplicated `Vec<u32>`:
//! - Membership: O(log n) binary search
//! - Union / intersection / difference: O(n + m) two-pointer merge
//! - Memory: O(n), cache-friendly sequential layout
//!
//! The lattice value for bit-vector dataflow problems. Never shared between
//! variables: assignment copies (`Clone`), and equality is by value.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BitVector {
    /// Sorted, deduplicated member bits
    bits: Vec<u32>,
}

impl BitVector {
    /// Create an empty set
    #[inline]
    pub fn new() -> Self {
        BitVector { bits: Vec::new() }
    }

    /// Create with pre-allocated capacity
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        BitVector {
            bits: Vec::with_capacity(capacity),
        }
    }

    /// Create from a single bit
    #[inline]
    pub fn singleton(bit: u32) -> Self {
        BitVector { bits: vec![bit] }
    }

    /// Create from any iterator of bits (sorted and deduplicated on entry)
    pub fn from_bits(bits: impl IntoIterator<Item = u32>) -> Self {
        let mut v: Vec<u32> = bits.into_iter().collect();
        v.sort_unstable();
        v.dedup();
        BitVector { bits: v }
    }

    /// Number of set bits
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[inline]
    pub fn contains(&self, bit: u32) -> bool {
        self.bits.binary_search(&bit).is_ok()
    }

    /// Set one bit; returns true when it was not already set
    pub fn set(&mut self, bit: u32) -> bool {
        match self.bits.binary_search(&bit) {
            Ok(_) => false,
            Err(pos) => {
                self.bits.insert(pos, bit);
                true
            }
        }
    }

    /// Clear one bit; returns true when it was set
    pub fn clear(&mut self, bit: u32) -> bool {
        match self.bits.binary_search(&bit) {
            Ok(pos) => {
                self.bits.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// `self ∪ other`
    pub fn union(&self, other: &BitVector) -> BitVector {
        let mut out = Vec::with_capacity(self.bits.len() + other.bits.len());
        let (mut i, mut j) = (0, 0);
        while i < self.bits.len() && j < other.bits.len() {
            match self.bits[i].cmp(&other.bits[j]) {
                Ordering::Less => {
                    out.push(self.bits[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    out.push(other.bits[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    out.push(self.bits[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&self.bits[i..]);
        out.extend_from_slice(&other.bits[j..]);
        BitVector { bits: out }
    }

    /// `self ∩ other`
    pub fn intersection(&self, other: &BitVector) -> BitVector {
        let mut out = Vec::with_capacity(self.bits.len().min(other.bits.len()));
        let (mut i, mut j) = (0, 0);
        while i < self.bits.len() && j < other.bits.len() {
            match self.bits[i].cmp(&other.bits[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    out.push(self.bits[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        BitVector { bits: out }
    }

    /// `self − other`
    pub fn difference(&self, other: &BitVector) -> BitVector {
        let mut out = Vec::with_capacity(self.bits.len());
        let (mut i, mut j) = (0, 0);
        while i < self.bits.len() && j < other.bits.len() {
            match self.bits[i].cmp(&other.bits[j]) {
                Ordering::Less => {
                    out.push(self.bits[i]);
                    i += 1;
                }
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&self.bits[i..]);
        BitVector { bits: out }
    }

    /// Merge `other` into `self`; returns true when `self` grew
    pub fn union_with(&mut self, other: &BitVector) -> bool {
        if other.is_subset_of(self) {
            return false;
        }
        *self = self.union(other);
        true
    }

    pub fn is_subset_of(&self, other: &BitVector) -> bool {
        if self.bits.len() > other.bits.len() {
            return false;
        }
        let mut j = 0;
        for &bit in &self.bits {
            loop {
                if j >= other.bits.len() {
                    return false;
                }
                match other.bits[j].cmp(&bit) {
                    Ordering::Less => j += 1,
                    Ordering::Equal => {
                        j += 1;
                        break;
                    }
                    Ordering::Greater => return false,
                }
            }
        }
        true
    }

    pub fn is_disjoint(&self, other: &BitVector) -> bool {
        self.intersection(other).is_empty()
    }

    /// Iterate set bits in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.bits.iter().copied()
    }
}

impl FromIterator<u32> for BitVector {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        BitVector::from_bits(iter)
    }
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, bit) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", bit)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bits_sorts_and_dedups() {
        let v = BitVector::from_bits([5, 1, 3, 1, 5]);
        assert_eq!(v.iter().collect::<Vec<_>>(), vec![1, 3, 5]);
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn set_and_clear() {
        let mut v = BitVector::new();
        assert!(v.set(4));
        assert!(!v.set(4));
        assert!(v.contains(4));
        assert!(v.clear(4));
        assert!(!v.clear(4));
        assert!(v.is_empty());
    }

    #[test]
    fn union_merges_sorted() {
        let a = BitVector::from_bits([1, 3, 5]);
        let b = BitVector::from_bits([2, 3, 8]);
        assert_eq!(a.union(&b), BitVector::from_bits([1, 2, 3, 5, 8]));
        assert_eq!(a.union(&BitVector::new()), a);
    }

    #[test]
    fn intersection_keeps_common_bits() {
        let a = BitVector::from_bits([1, 3, 5, 7]);
        let b = BitVector::from_bits([3, 4, 7]);
        assert_eq!(a.intersection(&b), BitVector::from_bits([3, 7]));
        assert!(a.intersection(&BitVector::new()).is_empty());
    }

    #[test]
    fn difference_removes_bits() {
        let a = BitVector::from_bits([1, 2, 3]);
        let b = BitVector::from_bits([2]);
        assert_eq!(a.difference(&b), BitVector::from_bits([1, 3]));
        assert_eq!(b.difference(&a), BitVector::new());
    }

    #[test]
    fn union_with_reports_growth() {
        let mut a = BitVector::from_bits([1, 2]);
        assert!(!a.union_with(&BitVector::from_bits([1])));
        assert!(a.union_with(&BitVector::from_bits([9])));
        assert_eq!(a, BitVector::from_bits([1, 2, 9]));
    }

    #[test]
    fn subset_checks() {
        let a = BitVector::from_bits([2, 4]);
        let b = BitVector::from_bits([1, 2, 3, 4]);
        assert!(a.is_subset_of(&b));
        assert!(!b.is_subset_of(&a));
        assert!(BitVector::new().is_subset_of(&a));
        assert!(a.is_subset_of(&a));
    }

    #[test]
    fn display_lists_bits() {
        assert_eq!(format!("{}", BitVector::from_bits([3, 1])), "{1, 3}");
        assert_eq!(format!("{}", BitVector::new()), "{}");
    }
}
