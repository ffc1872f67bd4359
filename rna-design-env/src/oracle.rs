//! Folding oracles: sequence in, predicted dot-bracket structure out

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use rna_design_core::{DesignError, Result};

use crate::candidate::Nucleotide;

/// Predicted structure of one sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fold {
    /// Predicted structure in dot-bracket notation
    pub dot_bracket: String,
    /// Auxiliary free energy, not used for scoring
    pub energy: Option<f64>,
}

impl Fold {
    /// Fold result without an energy
    pub fn new(dot_bracket: impl Into<String>) -> Self {
        Self {
            dot_bracket: dot_bracket.into(),
            energy: None,
        }
    }
}

/// Structure predictor consumed by the reward engine
///
/// Implementations must be deterministic for a fixed input. They are only
/// called with fully materialized sequences.
pub trait FoldingOracle: Send + Sync {
    /// Predict the secondary structure of `sequence`
    ///
    /// # Errors
    /// Any failure of the predictor, reported as `Oracle`.
    fn fold(&self, sequence: &str) -> Result<Fold>;
}

impl<O: FoldingOracle + ?Sized> FoldingOracle for Arc<O> {
    fn fold(&self, sequence: &str) -> Result<Fold> {
        (**self).fold(sequence)
    }
}

impl<O: FoldingOracle + ?Sized> FoldingOracle for Box<O> {
    fn fold(&self, sequence: &str) -> Result<Fold> {
        (**self).fold(sequence)
    }
}

impl<O: FoldingOracle + ?Sized> FoldingOracle for &O {
    fn fold(&self, sequence: &str) -> Result<Fold> {
        (**self).fold(sequence)
    }
}

/// Oracle backed by a closure
pub struct FnOracle<F>(pub F);

impl<F> FoldingOracle for FnOracle<F>
where
    F: Fn(&str) -> Result<Fold> + Send + Sync,
{
    fn fold(&self, sequence: &str) -> Result<Fold> {
        (self.0)(sequence)
    }
}

/// Wrap a closure as an oracle
pub fn from_fn<F>(f: F) -> FnOracle<F>
where
    F: Fn(&str) -> Result<Fold> + Send + Sync,
{
    FnOracle(f)
}

/// Check that an oracle answer is a dot-bracket string of the expected length
///
/// # Errors
/// `LengthMismatch` for a wrong length, `Oracle` for foreign symbols.
pub fn validate_fold(expected_len: usize, fold: &Fold) -> Result<()> {
    let actual = fold.dot_bracket.chars().count();
    if actual != expected_len {
        return Err(DesignError::LengthMismatch {
            expected: expected_len,
            actual,
        });
    }
    if let Some((i, c)) = fold
        .dot_bracket
        .chars()
        .enumerate()
        .find(|(_, c)| !matches!(c, '.' | '(' | ')'))
    {
        return Err(DesignError::Oracle(format!(
            "predicted structure has symbol {c:?} at position {i}"
        )));
    }
    Ok(())
}

fn parse_sequence(sequence: &str) -> Result<Vec<Nucleotide>> {
    sequence
        .chars()
        .enumerate()
        .map(|(position, symbol)| {
            Nucleotide::from_char(symbol).ok_or(DesignError::InvalidSequence { position, symbol })
        })
        .collect()
}

/// Base-pair maximisation folder
///
/// Predicts the structure with the most canonical (Watson-Crick and GU
/// wobble) nested pairs, every hairpin enclosing at least `min_loop`
/// unpaired sites. Reported energy is the negated pair count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NussinovOracle {
    /// Minimum number of unpaired sites enclosed by a hairpin
    pub min_loop: usize,
}

impl Default for NussinovOracle {
    fn default() -> Self {
        Self { min_loop: 3 }
    }
}

impl NussinovOracle {
    /// Folder with a custom minimum hairpin size
    #[must_use]
    pub fn new(min_loop: usize) -> Self {
        Self { min_loop }
    }

    fn can_pair(a: Nucleotide, b: Nucleotide) -> bool {
        use Nucleotide::{A, C, G, U};
        matches!(
            (a, b),
            (G, C) | (C, G) | (A, U) | (U, A) | (G, U) | (U, G)
        )
    }

    /// Pairs of the maximal structure, as `(i, j)` with `i < j`
    fn pairs(&self, seq: &[Nucleotide]) -> Vec<(usize, usize)> {
        let n = seq.len();
        let mut table = Array2::<u32>::zeros((n, n));
        // Empty intervals (i >= j) score zero
        let at = |table: &Array2<u32>, i: usize, j: usize| if i < j { table[[i, j]] } else { 0 };
        let pairable = |i: usize, j: usize| j - i > self.min_loop && Self::can_pair(seq[i], seq[j]);

        for span in (self.min_loop + 1)..n {
            for i in 0..(n - span) {
                let j = i + span;
                let mut best = at(&table, i + 1, j).max(at(&table, i, j - 1));
                if pairable(i, j) {
                    best = best.max(at(&table, i + 1, j - 1) + 1);
                }
                for k in (i + 1)..j {
                    best = best.max(at(&table, i, k) + at(&table, k + 1, j));
                }
                table[[i, j]] = best;
            }
        }

        let mut pairs = Vec::new();
        let mut stack = if n > 1 { vec![(0, n - 1)] } else { Vec::new() };
        while let Some((i, j)) = stack.pop() {
            if i >= j || j - i <= self.min_loop {
                continue;
            }
            let score = at(&table, i, j);
            if score == 0 {
                continue;
            }
            if score == at(&table, i + 1, j) {
                stack.push((i + 1, j));
            } else if score == at(&table, i, j - 1) {
                stack.push((i, j - 1));
            } else if pairable(i, j) && score == at(&table, i + 1, j - 1) + 1 {
                pairs.push((i, j));
                stack.push((i + 1, j - 1));
            } else if let Some(k) =
                ((i + 1)..j).find(|&k| score == at(&table, i, k) + at(&table, k + 1, j))
            {
                stack.push((k + 1, j));
                stack.push((i, k));
            }
        }

        pairs
    }
}

impl FoldingOracle for NussinovOracle {
    fn fold(&self, sequence: &str) -> Result<Fold> {
        let seq = parse_sequence(sequence)?;
        let pairs = self.pairs(&seq);

        let mut structure = vec!['.'; seq.len()];
        for &(i, j) in &pairs {
            structure[i] = '(';
            structure[j] = ')';
        }
        tracing::trace!(sequence, pairs = pairs.len(), "nussinov fold");

        #[allow(clippy::cast_precision_loss)]
        let energy = -(pairs.len() as f64);
        Ok(Fold {
            dot_bracket: structure.into_iter().collect(),
            energy: Some(energy),
        })
    }
}

/// Oracle that runs ViennaRNA's `RNAfold` as a child process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RnaFoldOracle {
    /// Path or name of the executable
    pub binary: PathBuf,
    /// Extra command-line arguments
    pub args: Vec<String>,
}

impl Default for RnaFoldOracle {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("RNAfold"),
            args: vec!["--noPS".to_string()],
        }
    }
}

impl RnaFoldOracle {
    /// Oracle using a specific `RNAfold` executable
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ..Self::default()
        }
    }
}

/// Extract structure and energy from `RNAfold` standard output
///
/// # Errors
/// `Oracle` if no structure line is present or the energy is unreadable.
pub fn parse_rnafold_output(output: &str) -> Result<Fold> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with(&['.', '(', ')'][..]))
        .ok_or_else(|| DesignError::Oracle("RNAfold produced no structure line".to_string()))?;

    let (structure, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let energy = if rest.is_empty() {
        None
    } else {
        let value = rest.trim_start_matches('(').trim_end_matches(')').trim();
        Some(value.parse::<f64>().map_err(|e| {
            DesignError::Oracle(format!("unreadable RNAfold energy {rest:?}: {e}"))
        })?)
    };

    Ok(Fold {
        dot_bracket: structure.to_string(),
        energy,
    })
}

impl FoldingOracle for RnaFoldOracle {
    fn fold(&self, sequence: &str) -> Result<Fold> {
        let mut child = Command::new(&self.binary)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                DesignError::Oracle(format!("failed to start {}: {e}", self.binary.display()))
            })?;

        {
            let stdin = child
                .stdin
                .as_mut()
                .ok_or_else(|| DesignError::Oracle("RNAfold stdin unavailable".to_string()))?;
            writeln!(stdin, "{sequence}")?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(status = %output.status, %stderr, "RNAfold failed");
            return Err(DesignError::Oracle(format!(
                "RNAfold exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let fold = parse_rnafold_output(&String::from_utf8_lossy(&output.stdout))?;
        validate_fold(sequence.chars().count(), &fold)?;
        Ok(fold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nussinov_hairpin() {
        let oracle = NussinovOracle::default();
        let fold = oracle.fold("GGGAAAACCC").unwrap();
        assert_eq!(fold.dot_bracket, "(((....)))");
        assert_eq!(fold.energy, Some(-3.0));
    }

    #[test]
    fn test_nussinov_respects_min_loop() {
        let oracle = NussinovOracle::default();
        assert_eq!(oracle.fold("GAAC").unwrap().dot_bracket, "....");
        assert_eq!(oracle.fold("GAAAC").unwrap().dot_bracket, "(...)");
        assert_eq!(oracle.fold("").unwrap().dot_bracket, "");
        assert_eq!(oracle.fold("G").unwrap().dot_bracket, ".");
    }

    #[test]
    fn test_nussinov_no_pairs() {
        let fold = NussinovOracle::default().fold("AAAAAAAAAA").unwrap();
        assert_eq!(fold.dot_bracket, "..........");
        assert_eq!(fold.energy, Some(-0.0));
    }

    #[test]
    fn test_nussinov_output_is_well_nested() {
        let oracle = NussinovOracle::default();
        for seq in ["GGGAAACCCAGGGAAACCC", "GCAUGCAUGCAUGCAUGCAU", "AUGGCUACGUAGCCAUU"] {
            let fold = oracle.fold(seq).unwrap();
            validate_fold(seq.len(), &fold).unwrap();
            crate::structure::compute_pairing(&fold.dot_bracket).unwrap();
        }
    }

    #[test]
    fn test_nussinov_rejects_foreign_symbols() {
        assert!(matches!(
            NussinovOracle::default().fold("GGNCC"),
            Err(DesignError::InvalidSequence { position: 2, symbol: 'N' })
        ));
    }

    #[test]
    fn test_parse_rnafold_output() {
        let out = "GGGAAAACCC\n(((....))) ( -1.20)\n";
        let fold = parse_rnafold_output(out).unwrap();
        assert_eq!(fold.dot_bracket, "(((....)))");
        assert_eq!(fold.energy, Some(-1.2));

        let out = "AAAA\n....   (  0.00)\n";
        let fold = parse_rnafold_output(out).unwrap();
        assert_eq!(fold.dot_bracket, "....");
        assert_eq!(fold.energy, Some(0.0));

        assert!(matches!(
            parse_rnafold_output("GGGG\n"),
            Err(DesignError::Oracle(_))
        ));
    }

    #[test]
    fn test_validate_fold() {
        assert!(validate_fold(3, &Fold::new("(.)")).is_ok());
        assert!(matches!(
            validate_fold(4, &Fold::new("(.)")),
            Err(DesignError::LengthMismatch { expected: 4, actual: 3 })
        ));
        assert!(matches!(
            validate_fold(3, &Fold::new("(x)")),
            Err(DesignError::Oracle(_))
        ));
    }

    #[test]
    fn test_missing_binary_is_an_oracle_error() {
        let oracle = RnaFoldOracle::new("/nonexistent/RNAfold-binary");
        assert!(matches!(oracle.fold("GGGAAACCC"), Err(DesignError::Oracle(_))));
    }

    #[test]
    fn test_closure_and_shared_oracles() {
        let oracle = Arc::new(from_fn(|seq: &str| Ok(Fold::new(".".repeat(seq.len())))));
        let shared = Arc::clone(&oracle);
        assert_eq!(shared.fold("ACGU").unwrap().dot_bracket, "....");
        assert_eq!((&*oracle).fold("AC").unwrap().dot_bracket, "..");
    }
}
