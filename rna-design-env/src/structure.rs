//! Target structures: pairing computation and padded encodings

use serde::{Deserialize, Serialize};

use rna_design_core::{DesignError, Observation, ObservationSpace, Result};

/// Identity of a target structure, assigned by whoever loads the target set
pub type TargetId = u64;

/// How dot-bracket symbols are mapped to numeric codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingMode {
    /// Paired vs unpaired: `.`→0, `(`→1, `)`→1, boundary→0
    Structural,
    /// One code per symbol: `.`→0, `(`→1, `)`→2, boundary→3
    Categorical,
}

impl EncodingMode {
    /// Numeric code of a structure symbol
    fn code(self, symbol: Symbol) -> u8 {
        match (self, symbol) {
            (_, Symbol::Unpaired) => 0,
            (_, Symbol::Open) => 1,
            (Self::Structural, Symbol::Close) => 1,
            (Self::Categorical, Symbol::Close) => 2,
            (Self::Structural, Symbol::Boundary) => 0,
            (Self::Categorical, Symbol::Boundary) => 3,
        }
    }

    /// Number of distinct codes this mode emits
    #[must_use]
    pub fn cardinality(self) -> u8 {
        match self {
            Self::Structural => 2,
            Self::Categorical => 4,
        }
    }
}

/// Arrangement of observation elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Plain sequence of codes, shape `[n]`
    Flat,
    /// Every code wrapped as a single-element group, shape `[n, 1]`
    Grouped,
}

/// Encoding parameters derived from the environment configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingSpec {
    /// Number of boundary symbols on each side
    pub radius: usize,
    /// Symbol to code mapping
    pub mode: EncodingMode,
    /// Element arrangement
    pub layout: Layout,
}

impl EncodingSpec {
    /// Build a spec from the raw flags; categorical encodings are always flat
    #[must_use]
    pub fn new(radius: usize, windowed: bool, categorical: bool) -> Self {
        let mode = if categorical {
            EncodingMode::Categorical
        } else {
            EncodingMode::Structural
        };
        let layout = if windowed && !categorical {
            Layout::Grouped
        } else {
            Layout::Flat
        };
        Self {
            radius,
            mode,
            layout,
        }
    }

    /// Width of one observation window
    #[must_use]
    pub fn window_width(&self) -> usize {
        2 * self.radius + 1
    }

    /// Space of the windows this encoding produces
    #[must_use]
    pub fn observation_space(&self) -> WindowSpace {
        WindowSpace {
            width: self.window_width(),
            mode: self.mode,
            layout: self.layout,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Symbol {
    Unpaired,
    Open,
    Close,
    Boundary,
}

impl Symbol {
    fn parse(position: usize, c: char) -> Result<Self> {
        match c {
            '.' => Ok(Self::Unpaired),
            '(' => Ok(Self::Open),
            ')' => Ok(Self::Close),
            other => Err(DesignError::MalformedStructure {
                position,
                reason: format!("unexpected symbol {other:?}"),
            }),
        }
    }
}

/// Compute the partner of every site in a single left-to-right pass
///
/// # Errors
/// `MalformedStructure` for a `)` without a pending `(`, an unmatched `(`
/// or a symbol outside `.()`.
pub fn compute_pairing(dot_bracket: &str) -> Result<Vec<Option<usize>>> {
    let mut pairing = vec![None; dot_bracket.chars().count()];
    let mut pending = Vec::new();

    for (i, c) in dot_bracket.chars().enumerate() {
        match Symbol::parse(i, c)? {
            Symbol::Open => pending.push(i),
            Symbol::Close => {
                let j = pending.pop().ok_or_else(|| DesignError::MalformedStructure {
                    position: i,
                    reason: "unmatched ')'".to_string(),
                })?;
                pairing[i] = Some(j);
                pairing[j] = Some(i);
            }
            Symbol::Unpaired | Symbol::Boundary => {}
        }
    }

    if let Some(&open) = pending.last() {
        return Err(DesignError::MalformedStructure {
            position: open,
            reason: "unmatched '('".to_string(),
        });
    }

    Ok(pairing)
}

/// Numeric codes of a padded structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaddedEncoding {
    codes: Vec<u8>,
    layout: Layout,
}

impl PaddedEncoding {
    /// Encode `dot_bracket` padded by `spec.radius` boundary symbols on both ends
    ///
    /// # Errors
    /// `MalformedStructure` for symbols outside `.()`.
    pub fn encode(dot_bracket: &str, spec: EncodingSpec) -> Result<Self> {
        let boundary = spec.mode.code(Symbol::Boundary);
        let mut codes = Vec::with_capacity(dot_bracket.len() + 2 * spec.radius);
        codes.extend(std::iter::repeat(boundary).take(spec.radius));
        for (i, c) in dot_bracket.chars().enumerate() {
            codes.push(spec.mode.code(Symbol::parse(i, c)?));
        }
        codes.extend(std::iter::repeat(boundary).take(spec.radius));

        Ok(Self {
            codes,
            layout: spec.layout,
        })
    }

    /// All codes, boundary included
    #[must_use]
    pub fn codes(&self) -> &[u8] {
        &self.codes
    }

    /// Element arrangement
    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the encoding has no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Contiguous slice of `width` elements starting at `start`
    ///
    /// # Errors
    /// `SiteOutOfRange` if the slice would run past the padding.
    pub fn window(&self, start: usize, width: usize) -> Result<WindowedObservation> {
        let codes = self
            .codes
            .get(start..start + width)
            .ok_or(DesignError::SiteOutOfRange {
                site: start + width,
                len: self.codes.len(),
            })?;
        Ok(WindowedObservation {
            codes: codes.to_vec(),
            layout: self.layout,
        })
    }
}

/// Fixed-width slice of a padded encoding around the assignment cursor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowedObservation {
    /// Codes in the window
    pub codes: Vec<u8>,
    /// Element arrangement
    pub layout: Layout,
}

impl WindowedObservation {
    /// Codes wrapped as single-element groups, `None` for flat windows
    #[must_use]
    pub fn groups(&self) -> Option<Vec<[u8; 1]>> {
        match self.layout {
            Layout::Grouped => Some(self.codes.iter().map(|&c| [c]).collect()),
            Layout::Flat => None,
        }
    }
}

impl Observation for WindowedObservation {
    fn to_vec(&self) -> Vec<f64> {
        self.codes.iter().map(|&c| f64::from(c)).collect()
    }

    fn shape(&self) -> Vec<usize> {
        match self.layout {
            Layout::Flat => vec![self.codes.len()],
            Layout::Grouped => vec![self.codes.len(), 1],
        }
    }
}

/// Every window of one encoding: fixed width, fixed layout, codes below the mode's cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpace {
    width: usize,
    mode: EncodingMode,
    layout: Layout,
}

impl WindowSpace {
    /// Number of codes per window
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }
}

impl ObservationSpace for WindowSpace {
    type Observation = WindowedObservation;

    fn contains(&self, obs: &WindowedObservation) -> bool {
        obs.layout == self.layout
            && obs.codes.len() == self.width
            && obs.codes.iter().all(|&c| c < self.mode.cardinality())
    }

    fn shape(&self) -> Vec<usize> {
        match self.layout {
            Layout::Flat => vec![self.width],
            Layout::Grouped => vec![self.width, 1],
        }
    }
}

/// A target secondary structure, immutable once built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetStructure {
    id: TargetId,
    dot_bracket: String,
    pairing: Vec<Option<usize>>,
    spec: EncodingSpec,
    padded_encoding: PaddedEncoding,
}

impl TargetStructure {
    /// Parse and encode a target structure
    ///
    /// # Errors
    /// `MalformedStructure` if the string is empty, has foreign symbols or
    /// unbalanced brackets.
    pub fn new(id: TargetId, dot_bracket: &str, spec: EncodingSpec) -> Result<Self> {
        let dot_bracket = dot_bracket.trim();
        if dot_bracket.is_empty() {
            return Err(DesignError::MalformedStructure {
                position: 0,
                reason: "empty structure".to_string(),
            });
        }

        let pairing = compute_pairing(dot_bracket)?;
        let padded_encoding = PaddedEncoding::encode(dot_bracket, spec)?;

        Ok(Self {
            id,
            dot_bracket: dot_bracket.to_string(),
            pairing,
            spec,
            padded_encoding,
        })
    }

    /// Identity of this target
    #[must_use]
    pub fn id(&self) -> TargetId {
        self.id
    }

    /// The structure in dot-bracket notation
    #[must_use]
    pub fn dot_bracket(&self) -> &str {
        &self.dot_bracket
    }

    /// Number of sites
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairing.len()
    }

    /// Always false, empty structures are rejected at construction
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairing.is_empty()
    }

    /// Partner of every site
    #[must_use]
    pub fn pairing_map(&self) -> &[Option<usize>] {
        &self.pairing
    }

    /// Partner of `site`, `None` for unpaired or out-of-range sites
    #[must_use]
    pub fn paired_site(&self, site: usize) -> Option<usize> {
        self.pairing.get(site).copied().flatten()
    }

    /// Parameters the padded encoding was built with
    #[must_use]
    pub fn encoding_spec(&self) -> EncodingSpec {
        self.spec
    }

    /// The padded numeric encoding
    #[must_use]
    pub fn padded_encoding(&self) -> &PaddedEncoding {
        &self.padded_encoding
    }

    /// Observation window for the site at `cursor`
    ///
    /// # Errors
    /// `SiteOutOfRange` unless `cursor < len()` and `width` matches the padding.
    pub fn window(&self, cursor: usize, width: usize) -> Result<WindowedObservation> {
        if cursor >= self.len() {
            return Err(DesignError::SiteOutOfRange {
                site: cursor,
                len: self.len(),
            });
        }
        self.padded_encoding.window(cursor, width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structural(radius: usize) -> EncodingSpec {
        EncodingSpec::new(radius, false, false)
    }

    /// Partner search by bracket counting, the quadratic reference
    fn brute_force_pairing(s: &str) -> Vec<Option<usize>> {
        let chars: Vec<char> = s.chars().collect();
        let mut pairing = vec![None; chars.len()];
        for i in 0..chars.len() {
            if chars[i] != '(' {
                continue;
            }
            let mut depth = 0i64;
            for (j, &c) in chars.iter().enumerate().skip(i) {
                match c {
                    '(' => depth += 1,
                    ')' => depth -= 1,
                    _ => continue,
                }
                if depth == 0 {
                    pairing[i] = Some(j);
                    pairing[j] = Some(i);
                    break;
                }
            }
        }
        pairing
    }

    #[test]
    fn test_pairing_small_hairpin() {
        let pairing = compute_pairing("..((..)).").unwrap();
        assert_eq!(
            pairing,
            vec![None, None, Some(7), Some(6), None, None, Some(3), Some(2), None]
        );
    }

    #[test]
    fn test_pairing_matches_bracket_counting() {
        for s in ["...(((.....))).", "(((())))", "((..)).((..))", "......", "(.(.).)"] {
            assert_eq!(compute_pairing(s).unwrap(), brute_force_pairing(s), "{s}");
        }
    }

    #[test]
    fn test_malformed_structures() {
        let err = compute_pairing("..(((())..").unwrap_err();
        assert!(matches!(err, DesignError::MalformedStructure { .. }));

        let err = compute_pairing("())(").unwrap_err();
        assert!(matches!(err, DesignError::MalformedStructure { position: 2, .. }));

        let err = compute_pairing("((.)").unwrap_err();
        assert!(matches!(err, DesignError::MalformedStructure { position: 0, .. }));

        let err = compute_pairing("(.x)").unwrap_err();
        assert!(matches!(err, DesignError::MalformedStructure { position: 2, .. }));
    }

    #[test]
    fn test_structural_encoding_with_padding() {
        let enc = PaddedEncoding::encode("..((..)).", structural(1)).unwrap();
        assert_eq!(enc.codes(), &[0, 0, 0, 1, 1, 0, 0, 1, 1, 0, 0]);
        assert_eq!(enc.layout(), Layout::Flat);
    }

    #[test]
    fn test_categorical_encoding() {
        let spec = EncodingSpec::new(3, false, true);
        let enc = PaddedEncoding::encode("...((...))..", spec).unwrap();
        assert_eq!(
            enc.codes(),
            &[3, 3, 3, 0, 0, 0, 1, 1, 0, 0, 0, 2, 2, 0, 0, 3, 3, 3]
        );
    }

    #[test]
    fn test_categorical_ignores_windowed_layout() {
        let spec = EncodingSpec::new(0, true, true);
        assert_eq!(spec.layout, Layout::Flat);
        let enc = PaddedEncoding::encode("...((...))..", spec).unwrap();
        assert_eq!(enc.codes(), &[0, 0, 0, 1, 1, 0, 0, 0, 2, 2, 0, 0]);
    }

    #[test]
    fn test_grouped_layout_wraps_codes() {
        let spec = EncodingSpec::new(3, true, false);
        let target = TargetStructure::new(1, "...((...))..", spec).unwrap();
        assert_eq!(target.padded_encoding().len(), 18);

        let window = target.window(3, spec.window_width()).unwrap();
        assert_eq!(window.shape(), vec![7, 1]);
        assert_eq!(
            window.groups().unwrap(),
            vec![[0], [0], [0], [1], [1], [0], [0]]
        );
    }

    #[test]
    fn test_window_edges() {
        let spec = structural(2);
        let target = TargetStructure::new(4, "((.))", spec).unwrap();
        let width = spec.window_width();

        assert_eq!(target.window(0, width).unwrap().codes, vec![0, 0, 1, 1, 0]);
        assert_eq!(target.window(4, width).unwrap().codes, vec![0, 1, 1, 0, 0]);
        assert!(matches!(
            target.window(5, width),
            Err(DesignError::SiteOutOfRange { site: 5, len: 5 })
        ));
    }

    #[test]
    fn test_target_remembers_its_encoding() {
        let spec = EncodingSpec::new(2, false, true);
        let target = TargetStructure::new(2, "(..)", spec).unwrap();
        assert_eq!(target.encoding_spec(), spec);
        assert_ne!(target.encoding_spec(), structural(2));
    }

    #[test]
    fn test_window_space_membership() {
        let spec = EncodingSpec::new(1, true, false);
        let space = spec.observation_space();
        assert_eq!(space.shape(), vec![3, 1]);

        let target = TargetStructure::new(1, "(.)", spec).unwrap();
        for cursor in 0..target.len() {
            assert!(space.contains(&target.window(cursor, space.width()).unwrap()));
        }

        let wide = target.padded_encoding().window(0, 5).unwrap();
        assert!(!space.contains(&wide));

        let categorical = TargetStructure::new(1, "(.)", EncodingSpec::new(1, false, true)).unwrap();
        let flat = categorical.window(0, 3).unwrap();
        assert_eq!(flat.codes, vec![3, 1, 0]);
        assert!(!space.contains(&flat));
        assert!(!EncodingSpec::new(1, false, false).observation_space().contains(&flat));
    }

    #[test]
    fn test_empty_structure_rejected() {
        assert!(matches!(
            TargetStructure::new(1, "  ", structural(0)),
            Err(DesignError::MalformedStructure { .. })
        ));
    }

    #[test]
    fn test_paired_site_lookup() {
        let target = TargetStructure::new(9, "..((..)).", structural(0)).unwrap();
        assert_eq!(target.id(), 9);
        assert_eq!(target.paired_site(2), Some(7));
        assert_eq!(target.paired_site(7), Some(2));
        assert_eq!(target.paired_site(0), None);
        assert_eq!(target.paired_site(100), None);
    }
}
