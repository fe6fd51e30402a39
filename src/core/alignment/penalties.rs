//! Penalty model shared by every aligner and the validator.
//!
//! Costs are non-negative; lower is better and a perfect alignment scores 0.
//! A maximal run of `L` insertions (or deletions) costs
//! `gap_open + gap_extend * L`. Soft clips and the two structural actions
//! are free.

use std::fmt;

use super::actions::Action;
use crate::align_opt::ConfigError;
use crate::defaults;

/// Affine-gap edit penalties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Penalties {
    pub mismatch: i32,
    pub unknown: i32,
    pub gap_open: i32,
    pub gap_extend: i32,
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            mismatch: defaults::MISMATCH_PENALTY,
            unknown: defaults::UNKNOWN_PENALTY,
            gap_open: defaults::GAP_OPEN_PENALTY,
            gap_extend: defaults::GAP_EXTEND_PENALTY,
        }
    }
}

impl Penalties {
    pub fn new(mismatch: i32, unknown: i32, gap_open: i32, gap_extend: i32) -> Result<Self, ConfigError> {
        let p = Self {
            mismatch,
            unknown,
            gap_open,
            gap_extend,
        };
        p.validate()?;
        Ok(p)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("mismatch", self.mismatch),
            ("unknown", self.unknown),
            ("gap open", self.gap_open),
            ("gap extend", self.gap_extend),
        ] {
            if value < 0 {
                return Err(ConfigError::InvalidPenalty { name, value });
            }
        }
        Ok(())
    }

    /// Cost of a single paired (read, template) action.
    #[inline(always)]
    pub fn substitution_cost(&self, action: Action) -> i32 {
        match action {
            Action::Mismatch => self.mismatch,
            Action::UnknownInRead | Action::UnknownInTemplate => self.unknown,
            _ => 0,
        }
    }

    /// Cost of one maximal gap run of `len` bases.
    #[inline(always)]
    pub fn gap_cost(&self, len: u32) -> i32 {
        if len == 0 {
            return 0;
        }
        self.gap_open
            .saturating_add(self.gap_extend.saturating_mul(len.min(i32::MAX as u32) as i32))
    }

    /// Score of a run list from the actions alone. Adjacent runs of the same
    /// gap type count as one gap.
    pub fn score_operations<I>(&self, runs: I) -> i32
    where
        I: IntoIterator<Item = (Action, u32)>,
    {
        let mut score: i32 = 0;
        let mut open_gap: Option<(Action, u32)> = None;
        for (action, len) in runs {
            if action.is_gap() {
                open_gap = match open_gap {
                    Some((gap, n)) if gap == action => Some((gap, n.saturating_add(len))),
                    Some((_, n)) => {
                        score = score.saturating_add(self.gap_cost(n));
                        Some((action, len))
                    }
                    None => Some((action, len)),
                };
                continue;
            }
            if let Some((_, n)) = open_gap.take() {
                score = score.saturating_add(self.gap_cost(n));
            }
            let per_base = self.substitution_cost(action);
            score = score.saturating_add(per_base.saturating_mul(len.min(i32::MAX as u32) as i32));
        }
        if let Some((_, n)) = open_gap {
            score = score.saturating_add(self.gap_cost(n));
        }
        score
    }
}

impl fmt::Display for Penalties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.mismatch, self.unknown, self.gap_open, self.gap_extend
        )
    }
}

// ============================================================================
// INDEL PENALTY TABLE
// ============================================================================

/// Per-length indel penalties with linear extrapolation past the table.
///
/// `penalty(L) = table[L - 1]` for `L <= k`, otherwise
/// `table[k - 1] + round(slope * (L - k))`.
#[derive(Debug, Clone, PartialEq)]
pub struct IndelPenaltyTable {
    insertions: Vec<i32>,
    deletions: Vec<i32>,
    insertion_slope: f64,
    deletion_slope: f64,
}

impl IndelPenaltyTable {
    pub fn new(
        insertions: Vec<i32>,
        deletions: Vec<i32>,
        insertion_slope: f64,
        deletion_slope: f64,
    ) -> Result<Self, ConfigError> {
        check_direction("insertion", &insertions, insertion_slope)?;
        check_direction("deletion", &deletions, deletion_slope)?;
        Ok(Self {
            insertions,
            deletions,
            insertion_slope,
            deletion_slope,
        })
    }

    /// Table that reproduces the affine cost model exactly.
    pub fn from_affine(penalties: &Penalties) -> Self {
        let first = penalties.gap_cost(1);
        let slope = penalties.gap_extend as f64;
        Self {
            insertions: vec![first],
            deletions: vec![first],
            insertion_slope: slope,
            deletion_slope: slope,
        }
    }

    /// Parse `ins=20,21,22;del=20,21;slope=1,1`. `slope` is optional and
    /// defaults to the difference of the last two entries (or 0).
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let mut insertions = None;
        let mut deletions = None;
        let mut slopes = None;
        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| ConfigError::IndelTable(format!("expected key=value, got '{part}'")))?;
            match key.trim() {
                "ins" => insertions = Some(parse_int_list(value)?),
                "del" => deletions = Some(parse_int_list(value)?),
                "slope" => {
                    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
                    if parts.len() != 2 {
                        return Err(ConfigError::IndelTable(format!(
                            "slope needs two values (insertion,deletion), got '{value}'"
                        )));
                    }
                    let parse = |v: &str| {
                        v.parse::<f64>()
                            .map_err(|_| ConfigError::IndelTable(format!("bad slope '{v}'")))
                    };
                    slopes = Some((parse(parts[0])?, parse(parts[1])?));
                }
                other => {
                    return Err(ConfigError::IndelTable(format!("unknown key '{other}'")));
                }
            }
        }
        let insertions = insertions.ok_or_else(|| ConfigError::IndelTable("missing ins=".into()))?;
        let deletions = deletions.ok_or_else(|| ConfigError::IndelTable("missing del=".into()))?;
        let (ins_slope, del_slope) =
            slopes.unwrap_or_else(|| (implied_slope(&insertions), implied_slope(&deletions)));
        Self::new(insertions, deletions, ins_slope, del_slope)
    }

    #[inline]
    pub fn insertion(&self, len: u32) -> i32 {
        lookup(&self.insertions, self.insertion_slope, len)
    }

    #[inline]
    pub fn deletion(&self, len: u32) -> i32 {
        lookup(&self.deletions, self.deletion_slope, len)
    }
}

fn check_direction(name: &'static str, table: &[i32], slope: f64) -> Result<(), ConfigError> {
    if table.is_empty() {
        return Err(ConfigError::IndelTable(format!("{name} table is empty")));
    }
    if let Some(&v) = table.iter().find(|&&v| v < 0) {
        return Err(ConfigError::IndelTable(format!("{name} penalty {v} is negative")));
    }
    if table.windows(2).any(|w| w[1] < w[0]) {
        return Err(ConfigError::IndelTable(format!(
            "{name} penalties must not decrease with length"
        )));
    }
    if !slope.is_finite() || slope < 0.0 {
        return Err(ConfigError::IndelTable(format!("{name} slope {slope} is invalid")));
    }
    Ok(())
}

fn implied_slope(table: &[i32]) -> f64 {
    match table {
        [.., a, b] => (*b - *a) as f64,
        _ => 0.0,
    }
}

fn parse_int_list(value: &str) -> Result<Vec<i32>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .map(|v| {
            v.parse::<i32>()
                .map_err(|_| ConfigError::IndelTable(format!("bad penalty '{v}'")))
        })
        .collect()
}

#[inline]
fn lookup(table: &[i32], slope: f64, len: u32) -> i32 {
    if len == 0 {
        return 0;
    }
    let k = table.len();
    let len = len as usize;
    if len <= k {
        return table[len - 1];
    }
    let extra = (slope * (len - k) as f64).round();
    let last = table[k - 1] as f64;
    (last + extra).min(i32::MAX as f64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_penalties() {
        let p = Penalties::default();
        assert_eq!((p.mismatch, p.unknown, p.gap_open, p.gap_extend), (9, 5, 19, 1));
        assert_eq!(p.gap_cost(1), 20);
        assert_eq!(p.gap_cost(3), 22);
        assert_eq!(p.to_string(), "9,5,19,1");
    }

    #[test]
    fn test_rejects_negative() {
        assert!(matches!(
            Penalties::new(9, -1, 19, 1),
            Err(ConfigError::InvalidPenalty { name: "unknown", value: -1 })
        ));
    }

    #[test]
    fn test_score_operations_merges_gaps() {
        let p = Penalties::default();
        let runs = [
            (Action::Match, 3),
            (Action::InsertReadBase, 1),
            (Action::InsertReadBase, 2),
            (Action::DeleteTemplateBase, 1),
            (Action::Mismatch, 2),
            (Action::UnknownInTemplate, 1),
            (Action::SoftClip, 4),
            (Action::StructuralGap, 6),
        ];
        // insertion of 3 (22) + deletion of 1 (20) + 2 mismatches (18) + unknown (5)
        assert_eq!(p.score_operations(runs), 22 + 20 + 18 + 5);
    }

    #[test]
    fn test_indel_table_extrapolation() {
        let t = IndelPenaltyTable::parse("ins=20,21,22;del=20,21;slope=1.5,0.4").unwrap();
        assert_eq!(t.insertion(1), 20);
        assert_eq!(t.insertion(3), 22);
        assert_eq!(t.insertion(4), 22 + 2); // round(1.5)
        assert_eq!(t.insertion(5), 25);
        assert_eq!(t.deletion(2), 21);
        assert_eq!(t.deletion(3), 21); // round(0.4)
        assert_eq!(t.deletion(4), 22); // round(0.8)
    }

    #[test]
    fn test_indel_table_implied_slope() {
        let t = IndelPenaltyTable::parse("ins=20,23;del=20").unwrap();
        assert_eq!(t.insertion(4), 29);
        assert_eq!(t.deletion(9), 20);
    }

    #[test]
    fn test_indel_table_from_affine_matches_gap_cost() {
        let p = Penalties::default();
        let t = IndelPenaltyTable::from_affine(&p);
        for len in 1..20 {
            assert_eq!(t.insertion(len), p.gap_cost(len));
            assert_eq!(t.deletion(len), p.gap_cost(len));
        }
    }

    #[test]
    fn test_indel_table_rejects_malformed() {
        assert!(IndelPenaltyTable::parse("ins=;del=20").is_err());
        assert!(IndelPenaltyTable::parse("ins=20,19;del=20").is_err());
        assert!(IndelPenaltyTable::parse("ins=20;del=-1").is_err());
        assert!(IndelPenaltyTable::parse("ins=20;del=20;slope=1,-2").is_err());
        assert!(IndelPenaltyTable::parse("ins=20;del=20;slope=1").is_err());
        assert!(IndelPenaltyTable::parse("del=20").is_err());
        assert!(IndelPenaltyTable::parse("ins=20;del=20;wat=3").is_err());
        assert!(IndelPenaltyTable::new(vec![], vec![1], 0.0, 0.0).is_err());
        assert!(IndelPenaltyTable::new(vec![1], vec![1], f64::NAN, 0.0).is_err());
    }
}
