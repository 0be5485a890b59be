use serde::{Deserialize, Serialize};
use static_assertions::const_assert;
use std::fmt;

const BITS_PER_WORD: usize = u64::BITS as usize;
const_assert!(BITS_PER_WORD.is_power_of_two());

/// A growable row of bits, stored in 64-bit words.
///
/// Bits beyond the stored words read as zero; setting a bit grows the word
/// vector on demand, so a row never needs an up-front width.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct BitRow {
    words: Vec<u64>,
}

impl BitRow {
    /// An all-zero row.
    pub fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// Whether bit `i` is set.
    pub fn get(&self, i: usize) -> bool {
        match self.words.get(i / BITS_PER_WORD) {
            Some(w) => w & (1u64 << (i % BITS_PER_WORD)) != 0,
            None => false,
        }
    }

    /// Sets bit `i`.
    pub fn set(&mut self, i: usize) {
        let w = i / BITS_PER_WORD;
        if self.words.len() <= w {
            self.words.resize(w + 1, 0);
        }
        self.words[w] |= 1u64 << (i % BITS_PER_WORD);
    }

    /// Clears bit `i`.
    pub fn clear(&mut self, i: usize) {
        if let Some(w) = self.words.get_mut(i / BITS_PER_WORD) {
            *w &= !(1u64 << (i % BITS_PER_WORD));
        }
    }

    /// Clears every bit.
    pub fn clear_all(&mut self) {
        self.words.clear();
    }

    /// Clears all bits at positions `>= from`.
    pub fn clear_from(&mut self, from: usize) {
        let w = from / BITS_PER_WORD;
        if w < self.words.len() {
            self.words[w] &= (1u64 << (from % BITS_PER_WORD)) - 1;
            self.words.truncate(w + 1);
        }
    }

    /// The number of set bits.
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// The number of set bits among the first `n`.
    pub fn count_ones_before(&self, n: usize) -> usize {
        let full = n / BITS_PER_WORD;
        let mut count: usize = self
            .words
            .iter()
            .take(full)
            .map(|w| w.count_ones() as usize)
            .sum();
        if n % BITS_PER_WORD != 0 {
            if let Some(w) = self.words.get(full) {
                count += (w & ((1u64 << (n % BITS_PER_WORD)) - 1)).count_ones() as usize;
            }
        }
        count
    }

    /// The position of the first set bit, if any.
    pub fn first_one(&self) -> Option<usize> {
        for (i, w) in self.words.iter().enumerate() {
            if *w != 0 {
                return Some(i * BITS_PER_WORD + w.trailing_zeros() as usize);
            }
        }
        None
    }

    /// The position of the last set bit, if any.
    pub fn last_one(&self) -> Option<usize> {
        for (i, w) in self.words.iter().enumerate().rev() {
            if *w != 0 {
                return Some(i * BITS_PER_WORD + (BITS_PER_WORD - 1) - w.leading_zeros() as usize);
            }
        }
        None
    }

    /// `self := x | y`.
    pub fn union_assign(&mut self, x: &BitRow, y: &BitRow) {
        let words = x.words.len().max(y.words.len());
        self.words.clear();
        self.words.reserve(words);
        for i in 0..words {
            self.words
                .push(x.words.get(i).unwrap_or(&0) | y.words.get(i).unwrap_or(&0));
        }
    }

    /// Whether every set bit of `self` is also set in `other`.
    pub fn is_subset_of(&self, other: &BitRow) -> bool {
        self.words
            .iter()
            .enumerate()
            .all(|(i, w)| w & !other.words.get(i).unwrap_or(&0) == 0)
    }

    /// Whether `self` is a subset of `other` and at least one bit differs.
    pub fn is_strict_subset_of(&self, other: &BitRow) -> bool {
        self.is_subset_of(other) && !other.is_subset_of(self)
    }
}

impl fmt::Display for BitRow {
    /// Prints the bits up to and including the last set one, as `0`/`1`
    /// characters.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.last_one() {
            None => Ok(()),
            Some(last) => {
                for i in 0..=last {
                    write!(f, "{}", u8::from(self.get(i)))?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_clear() {
        let mut r = BitRow::new();
        assert!(!r.get(100));
        r.set(3);
        r.set(100);
        assert!(r.get(3) && r.get(100));
        assert_eq!(r.count_ones(), 2);
        r.clear(3);
        assert!(!r.get(3));
        assert_eq!(r.first_one(), Some(100));
        assert_eq!(r.last_one(), Some(100));
    }

    #[test]
    fn prefix_counts() {
        let mut r = BitRow::new();
        for i in [0, 5, 63, 64, 130] {
            r.set(i);
        }
        assert_eq!(r.count_ones_before(64), 3);
        assert_eq!(r.count_ones_before(65), 4);
        assert_eq!(r.count_ones_before(131), 5);
        assert_eq!(r.count_ones_before(0), 0);
    }

    #[test]
    fn subset_tests() {
        let mut a = BitRow::new();
        let mut b = BitRow::new();
        a.set(2);
        b.set(2);
        b.set(70);
        assert!(a.is_subset_of(&b));
        assert!(a.is_strict_subset_of(&b));
        assert!(!b.is_subset_of(&a));
        assert!(a.is_subset_of(&a));
        assert!(!a.is_strict_subset_of(&a));
    }

    #[test]
    fn union_and_truncation() {
        let mut a = BitRow::new();
        let mut b = BitRow::new();
        a.set(1);
        b.set(65);
        let mut u = BitRow::new();
        u.union_assign(&a, &b);
        assert!(u.get(1) && u.get(65));
        u.clear_from(64);
        assert!(u.get(1) && !u.get(65));
    }
}
