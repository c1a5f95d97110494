use crate::error::{Result, SearchError};

/// Affine gap penalties. A gap of length `k` costs `open + k * extend`.
///
/// Both values are penalties (non-negative); kernels subtract them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GapCosts {
    pub open: i32,
    pub extend: i32,
}

impl GapCosts {
    pub fn new(open: i32, extend: i32) -> Result<Self> {
        let gaps = GapCosts { open, extend };
        gaps.validate()?;
        Ok(gaps)
    }

    pub fn validate(&self) -> Result<()> {
        if self.open < 0 || self.extend < 0 {
            return Err(SearchError::config(format!(
                "gap costs must be non-negative (open={}, extend={})",
                self.open, self.extend
            )));
        }
        Ok(())
    }

    /// Penalty for the first position of a gap.
    #[inline]
    pub fn open_extend(&self) -> i64 {
        self.open as i64 + self.extend as i64
    }

    /// Total penalty for a gap of `len` positions (zero for `len == 0`).
    #[inline]
    pub fn cost(&self, len: usize) -> i64 {
        if len == 0 {
            0
        } else {
            self.open as i64 + len as i64 * self.extend as i64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_cost_affine() {
        let g = GapCosts::new(3, 1).unwrap();
        assert_eq!(g.cost(0), 0);
        assert_eq!(g.cost(1), 4);
        assert_eq!(g.cost(5), 8);
        assert_eq!(g.open_extend(), 4);
    }

    #[test]
    fn test_negative_gap_rejected() {
        assert!(matches!(GapCosts::new(-1, 1), Err(SearchError::Config(_))));
        assert!(matches!(GapCosts::new(1, -2), Err(SearchError::Config(_))));
        assert!(GapCosts::new(0, 0).is_ok());
    }
}
