//! Candidate sequences assembled one site at a time

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use rna_design_core::{DesignError, DiscreteAction, Result};

/// One symbol of the designed sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Nucleotide {
    /// Guanine
    G,
    /// Adenine
    A,
    /// Uracil
    U,
    /// Cytosine
    C,
}

impl Nucleotide {
    /// Letter used in materialized sequences
    #[must_use]
    pub fn as_char(self) -> char {
        match self {
            Self::G => 'G',
            Self::A => 'A',
            Self::U => 'U',
            Self::C => 'C',
        }
    }

    /// Parse a single letter, accepting `T` as `U`
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'G' => Some(Self::G),
            'A' => Some(Self::A),
            'U' | 'T' => Some(Self::U),
            'C' => Some(Self::C),
            _ => None,
        }
    }
}

impl fmt::Display for Nucleotide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Symbol written at an unpaired site, indexed by action
pub const ACTION_TO_BASE: [Nucleotide; 4] =
    [Nucleotide::G, Nucleotide::A, Nucleotide::U, Nucleotide::C];

/// Complementary pair written at a paired site and its partner, indexed by action
pub const ACTION_TO_PAIR: [(Nucleotide, Nucleotide); 4] = [
    (Nucleotide::G, Nucleotide::C),
    (Nucleotide::C, Nucleotide::G),
    (Nucleotide::A, Nucleotide::U),
    (Nucleotide::U, Nucleotide::A),
];

/// Number of actions accepted by the assignment tables
pub const NUM_ACTIONS: usize = ACTION_TO_BASE.len();

/// Resolve an action to a table index
///
/// # Errors
/// `InvalidAction` outside `[0, NUM_ACTIONS)`.
pub fn check_action(action: DiscreteAction) -> Result<usize> {
    if action.0 < NUM_ACTIONS {
        Ok(action.0)
    } else {
        Err(DesignError::InvalidAction(action.0))
    }
}

/// A partially assigned sequence of fixed length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSequence {
    slots: Vec<Option<Nucleotide>>,
}

impl CandidateSequence {
    /// Fully unassigned candidate of `len` sites
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    /// Fully assigned candidate
    #[must_use]
    pub fn from_nucleotides(nucleotides: &[Nucleotide]) -> Self {
        Self {
            slots: nucleotides.iter().copied().map(Some).collect(),
        }
    }

    /// Number of sites
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the candidate has no sites
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Symbol at `site`, `None` if unassigned or out of range
    #[must_use]
    pub fn get(&self, site: usize) -> Option<Nucleotide> {
        self.slots.get(site).copied().flatten()
    }

    /// Whether `site` has been written
    #[must_use]
    pub fn is_assigned(&self, site: usize) -> bool {
        self.get(site).is_some()
    }

    /// Smallest unassigned site, `None` once complete
    #[must_use]
    pub fn first_unassigned_site(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Whether every site has been written
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.first_unassigned_site().is_none()
    }

    fn check_writable(&self, site: usize) -> Result<()> {
        match self.slots.get(site) {
            None => Err(DesignError::SiteOutOfRange {
                site,
                len: self.slots.len(),
            }),
            Some(Some(_)) => Err(DesignError::SiteAlreadyAssigned(site)),
            Some(None) => Ok(()),
        }
    }

    /// Write the symbol(s) selected by `action`
    ///
    /// With a `paired_site`, `site` receives the first symbol of the pair and
    /// the partner the second; otherwise `site` receives a single symbol.
    ///
    /// # Errors
    /// `InvalidAction`, `SiteOutOfRange` or `SiteAlreadyAssigned`. Nothing is
    /// written when an error is returned.
    pub fn assign(
        &mut self,
        action: DiscreteAction,
        site: usize,
        paired_site: Option<usize>,
    ) -> Result<()> {
        let index = check_action(action)?;
        self.check_writable(site)?;

        match paired_site {
            Some(partner) => {
                if partner == site {
                    return Err(DesignError::SiteAlreadyAssigned(partner));
                }
                self.check_writable(partner)?;
                let (current, paired) = ACTION_TO_PAIR[index];
                self.slots[site] = Some(current);
                self.slots[partner] = Some(paired);
            }
            None => {
                self.slots[site] = Some(ACTION_TO_BASE[index]);
            }
        }

        Ok(())
    }

    /// Independent copy with each of `sites` overwritten by the matching value
    ///
    /// # Errors
    /// `LengthMismatch` if the slices differ in length, `SiteOutOfRange` for
    /// any site outside the sequence.
    pub fn get_mutated(&self, values: &[Nucleotide], sites: &[usize]) -> Result<Self> {
        if values.len() != sites.len() {
            return Err(DesignError::LengthMismatch {
                expected: sites.len(),
                actual: values.len(),
            });
        }

        let mut slots = self.slots.clone();
        for (&site, &value) in sites.iter().zip(values) {
            let slot = slots.get_mut(site).ok_or(DesignError::SiteOutOfRange {
                site,
                len: self.slots.len(),
            })?;
            *slot = Some(value);
        }

        Ok(Self { slots })
    }

    /// The finished sequence as a string
    ///
    /// # Errors
    /// `IncompleteSequence` if any site is unassigned.
    pub fn materialize(&self) -> Result<String> {
        self.slots
            .iter()
            .map(|slot| slot.map(Nucleotide::as_char))
            .collect::<Option<String>>()
            .ok_or_else(|| DesignError::IncompleteSequence {
                unassigned: self.slots.iter().filter(|s| s.is_none()).count(),
            })
    }
}

impl FromStr for CandidateSequence {
    type Err = DesignError;

    fn from_str(s: &str) -> Result<Self> {
        let nucleotides = s
            .chars()
            .enumerate()
            .map(|(i, c)| {
                Nucleotide::from_char(c).ok_or(DesignError::InvalidSequence {
                    position: i,
                    symbol: c,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_nucleotides(&nucleotides))
    }
}

impl fmt::Display for CandidateSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for slot in &self.slots {
            match slot {
                Some(n) => write!(f, "{n}")?,
                None => write!(f, "-")?,
            }
        }
        Ok(())
    }
}
