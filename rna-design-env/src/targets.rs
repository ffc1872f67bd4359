//! Target sets and the order-randomized cycle episodes draw from

use std::path::Path;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use rna_design_core::{DesignError, Result};

use crate::structure::{EncodingSpec, TargetId, TargetStructure};

/// File extension of structure files in a dataset directory
pub const STRUCTURE_EXTENSION: &str = "rna";

/// Ordered, immutable collection of target structures
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    targets: Vec<Arc<TargetStructure>>,
}

impl TargetSet {
    /// Encode plain dot-brackets, numbering them from 1 in input order
    ///
    /// # Errors
    /// `MalformedStructure` for the first structure that fails to parse.
    pub fn from_dot_brackets<I, S>(dot_brackets: I, spec: EncodingSpec) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut next_id: TargetId = 0;
        Self::from_entries(
            dot_brackets.into_iter().map(|s| {
                next_id += 1;
                (next_id, s)
            }),
            spec,
        )
    }

    /// Encode structures carrying explicit ids
    ///
    /// # Errors
    /// `MalformedStructure` for the first structure that fails to parse.
    pub fn from_entries<I, S>(entries: I, spec: EncodingSpec) -> Result<Self>
    where
        I: IntoIterator<Item = (TargetId, S)>,
        S: AsRef<str>,
    {
        let targets = entries
            .into_iter()
            .map(|(id, s)| TargetStructure::new(id, s.as_ref(), spec).map(Arc::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { targets })
    }

    /// Load `<id>.rna` files from a dataset directory
    ///
    /// With `ids`, exactly those files are read in the given order; otherwise
    /// every file whose stem is an integer id, in ascending id order.
    ///
    /// # Errors
    /// `Io` for unreadable files or a missing id, `MalformedStructure` for
    /// bad contents.
    pub fn load_dir(dir: impl AsRef<Path>, ids: Option<&[TargetId]>, spec: EncodingSpec) -> Result<Self> {
        let dir = dir.as_ref();
        let ids = match ids {
            Some(ids) => ids.to_vec(),
            None => {
                let mut found = Vec::new();
                for entry in std::fs::read_dir(dir)? {
                    let path = entry?.path();
                    if path.extension().and_then(|e| e.to_str()) != Some(STRUCTURE_EXTENSION) {
                        continue;
                    }
                    if let Some(id) = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .and_then(|s| s.parse::<TargetId>().ok())
                    {
                        found.push(id);
                    }
                }
                found.sort_unstable();
                found
            }
        };

        let mut entries = Vec::with_capacity(ids.len());
        for id in ids {
            let path = dir.join(format!("{id}.{STRUCTURE_EXTENSION}"));
            entries.push((id, read_structure_file(&path)?));
        }
        tracing::debug!(dir = %dir.display(), targets = entries.len(), "loaded target structures");

        Self::from_entries(entries, spec)
    }

    /// Targets in load order
    #[must_use]
    pub fn targets(&self) -> &[Arc<TargetStructure>] {
        &self.targets
    }

    /// Number of targets
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the set holds no targets
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Target with the given id
    #[must_use]
    pub fn get(&self, id: TargetId) -> Option<&Arc<TargetStructure>> {
        self.targets.iter().find(|t| t.id() == id)
    }
}

/// First non-empty line of a structure file
///
/// # Errors
/// `Io` if the file is unreadable, `MalformedStructure` if it has no content.
pub fn read_structure_file(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)?;
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_else(|| DesignError::MalformedStructure {
            position: 0,
            reason: format!("{} contains no structure", path.display()),
        })
}

/// Endless stream of targets, reshuffled on every pass through the set
#[derive(Debug, Clone)]
pub struct TargetCycle<R = ChaCha8Rng> {
    targets: Vec<Arc<TargetStructure>>,
    order: Vec<usize>,
    position: usize,
    passes: u64,
    rng: R,
}

impl TargetCycle<ChaCha8Rng> {
    /// Cycle with a reproducible draw order
    ///
    /// # Errors
    /// `EmptyTargetSet` if the set has no targets.
    pub fn seeded(set: &TargetSet, seed: u64) -> Result<Self> {
        Self::new(set, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Cycle seeded from operating-system entropy
    ///
    /// # Errors
    /// `EmptyTargetSet` if the set has no targets.
    pub fn from_entropy(set: &TargetSet) -> Result<Self> {
        Self::new(set, ChaCha8Rng::from_entropy())
    }
}

impl<R: Rng> TargetCycle<R> {
    /// Cycle drawing its permutations from `rng`
    ///
    /// # Errors
    /// `EmptyTargetSet` if the set has no targets.
    pub fn new(set: &TargetSet, rng: R) -> Result<Self> {
        if set.is_empty() {
            return Err(DesignError::EmptyTargetSet);
        }
        let targets = set.targets().to_vec();
        let order = (0..targets.len()).collect();
        Ok(Self {
            targets,
            order,
            // forces a shuffle on the first draw
            position: usize::MAX,
            passes: 0,
            rng,
        })
    }

    /// Next target; starts a freshly shuffled pass when the current one is spent
    pub fn next_target(&mut self) -> Arc<TargetStructure> {
        if self.position >= self.order.len() {
            self.order.shuffle(&mut self.rng);
            self.position = 0;
            self.passes += 1;
            tracing::debug!(pass = self.passes, targets = self.order.len(), "reshuffled targets");
        }
        let target = Arc::clone(&self.targets[self.order[self.position]]);
        self.position += 1;
        target
    }

    /// Number of passes started so far
    #[must_use]
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Number of targets per pass
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Targets in load order
    #[must_use]
    pub fn targets(&self) -> &[Arc<TargetStructure>] {
        &self.targets
    }

    /// Always false, empty sets are rejected at construction
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl<R: Rng> Iterator for TargetCycle<R> {
    type Item = Arc<TargetStructure>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_target())
    }
}
