//! Fixed-radix enumeration of corrective mutations

use crate::candidate::Nucleotide;

/// Alphabet the repair search draws from, in enumeration order
pub const REPAIR_ALPHABET: [Nucleotide; 4] =
    [Nucleotide::A, Nucleotide::G, Nucleotide::C, Nucleotide::U];

/// Every tuple of `width` symbols over [`REPAIR_ALPHABET`], lexicographically
///
/// The last position varies fastest. Width zero yields a single empty tuple.
#[derive(Debug, Clone)]
pub struct MutationTuples {
    digits: Vec<usize>,
    exhausted: bool,
    remaining: u128,
}

impl MutationTuples {
    /// Enumerate all `4^width` tuples
    #[must_use]
    pub fn new(width: usize) -> Self {
        let remaining = Self::count_for(width).unwrap_or(u128::MAX);
        Self {
            digits: vec![0; width],
            exhausted: false,
            remaining,
        }
    }

    /// Total number of tuples for `width` positions, `None` on overflow
    #[must_use]
    pub fn count_for(width: usize) -> Option<u128> {
        u32::try_from(width)
            .ok()
            .and_then(|w| (REPAIR_ALPHABET.len() as u128).checked_pow(w))
    }

    /// Advance the odometer; returns false once it wraps around
    fn increment(&mut self) -> bool {
        for digit in self.digits.iter_mut().rev() {
            *digit += 1;
            if *digit < REPAIR_ALPHABET.len() {
                return true;
            }
            *digit = 0;
        }
        false
    }
}

impl Iterator for MutationTuples {
    type Item = Vec<Nucleotide>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let tuple = self.digits.iter().map(|&d| REPAIR_ALPHABET[d]).collect();
        self.exhausted = !self.increment();
        self.remaining = self.remaining.saturating_sub(1);
        Some(tuple)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.exhausted {
            return (0, Some(0));
        }
        match usize::try_from(self.remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}
