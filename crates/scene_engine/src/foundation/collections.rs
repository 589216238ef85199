//! Specialized collection types

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub use slotmap::{DefaultKey, SlotMap};

/// Handle-based map using slot map for stable references
pub type HandleMap<T> = SlotMap<DefaultKey, T>;

/// Typed handle for type-safe references into a [`HandleMap`]
pub struct TypedHandle<T> {
    key: DefaultKey,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> TypedHandle<T> {
    /// Create a new typed handle from a key
    pub fn new(key: DefaultKey) -> Self {
        Self {
            key,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying key
    pub fn key(&self) -> DefaultKey {
        self.key
    }
}

// Manual impls: deriving would put the same bounds on `T`.
impl<T> Clone for TypedHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedHandle<T> {}

impl<T> PartialEq for TypedHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for TypedHandle<T> {}

impl<T> Hash for TypedHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for TypedHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedHandle").field(&self.key).finish()
    }
}

/// Fixed-size triangular bit matrix for unordered pairs `(i, j)`, `i != j`.
///
/// Stores `n * (n - 1) / 2` bits, one per unordered pair, packed into `u64`
/// words. Pair indices are symmetric: `(i, j)` and `(j, i)` share a bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriangularBitset {
    n: usize,
    words: Vec<u64>,
}

impl TriangularBitset {
    /// Create an all-false matrix for `n` items
    pub fn new(n: usize) -> Self {
        let bits = Self::pair_count(n);
        Self {
            n,
            words: vec![0; bits.div_ceil(64)],
        }
    }

    /// Number of unordered pairs for `n` items
    pub const fn pair_count(n: usize) -> usize {
        if n < 2 {
            0
        } else {
            n * (n - 1) / 2
        }
    }

    /// Number of items the matrix was built for
    pub fn len(&self) -> usize {
        self.n
    }

    /// Whether the matrix tracks no pairs
    pub fn is_empty(&self) -> bool {
        self.n < 2
    }

    fn bit_index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i != j && i < self.n && j < self.n, "invalid pair ({i}, {j})");
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        hi * (hi - 1) / 2 + lo
    }

    /// Read the bit for pair `(i, j)`
    pub fn get(&self, i: usize, j: usize) -> bool {
        let bit = self.bit_index(i, j);
        self.words[bit / 64] & (1 << (bit % 64)) != 0
    }

    /// Write the bit for pair `(i, j)`
    pub fn set(&mut self, i: usize, j: usize, value: bool) {
        let bit = self.bit_index(i, j);
        if value {
            self.words[bit / 64] |= 1 << (bit % 64);
        } else {
            self.words[bit / 64] &= !(1 << (bit % 64));
        }
    }

    /// Flip the bit for pair `(i, j)` and return its new value
    pub fn toggle(&mut self, i: usize, j: usize) -> bool {
        let bit = self.bit_index(i, j);
        self.words[bit / 64] ^= 1 << (bit % 64);
        self.words[bit / 64] & (1 << (bit % 64)) != 0
    }

    /// Reset every bit to false
    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|word| *word = 0);
    }

    /// Number of pairs currently set
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Number of pairs whose bit differs between `self` and `other`
    pub fn count_differences(&self, other: &Self) -> usize {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a ^ b).count_ones() as usize)
            .sum()
    }

    /// Pairs `(i, j)` with `i < j` set in all three matrices, in ascending order
    pub fn intersect3(a: &Self, b: &Self, c: &Self) -> Vec<(usize, usize)> {
        debug_assert!(a.n == b.n && b.n == c.n);
        let mut pairs = Vec::new();
        for (word_index, ((wa, wb), wc)) in a.words.iter().zip(&b.words).zip(&c.words).enumerate() {
            let mut word = wa & wb & wc;
            while word != 0 {
                let bit = word_index * 64 + word.trailing_zeros() as usize;
                pairs.push(Self::pair_of(bit));
                word &= word - 1;
            }
        }
        pairs.sort_unstable();
        pairs
    }

    /// Inverse of the packed bit index
    fn pair_of(bit: usize) -> (usize, usize) {
        // Largest hi with hi * (hi - 1) / 2 <= bit
        let mut hi = (((8 * bit + 1) as f64).sqrt() as usize + 1) / 2;
        while hi * (hi - 1) / 2 > bit {
            hi -= 1;
        }
        while (hi + 1) * hi / 2 <= bit {
            hi += 1;
        }
        (bit - hi * (hi - 1) / 2, hi)
    }
}
