//! Carriage pass direction

use std::fmt;

use serde::{Deserialize, Serialize};

use super::needle::Needle;

/// Direction the carriage moves across the beds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PassDirection {
    /// Increasing needle positions (`+`)
    #[default]
    #[serde(rename = "+")]
    LeftToRight,
    /// Decreasing needle positions (`-`)
    #[serde(rename = "-")]
    RightToLeft,
}

impl PassDirection {
    pub fn opposite(self) -> Self {
        match self {
            PassDirection::LeftToRight => PassDirection::RightToLeft,
            PassDirection::RightToLeft => PassDirection::LeftToRight,
        }
    }

    /// Sort needles in the order the carriage reaches them
    pub fn sort_needles(self, needles: &mut [Needle]) {
        match self {
            PassDirection::LeftToRight => {
                needles.sort_by_key(|n| (n.position, n.side, n.is_slider))
            }
            PassDirection::RightToLeft => needles.sort_by_key(|n| {
                (std::cmp::Reverse(n.position), n.side, n.is_slider)
            }),
        }
    }
}

impl fmt::Display for PassDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassDirection::LeftToRight => write!(f, "+"),
            PassDirection::RightToLeft => write!(f, "-"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite() {
        assert_eq!(PassDirection::default(), PassDirection::LeftToRight);
        assert_eq!(
            PassDirection::LeftToRight.opposite(),
            PassDirection::RightToLeft
        );
        assert_eq!(PassDirection::RightToLeft.to_string(), "-");
    }

    #[test]
    fn test_sort_needles() {
        let mut needles = vec![Needle::back(2), Needle::front(5), Needle::front(2)];
        PassDirection::RightToLeft.sort_needles(&mut needles);
        assert_eq!(
            needles,
            vec![Needle::front(5), Needle::front(2), Needle::back(2)]
        );
        PassDirection::LeftToRight.sort_needles(&mut needles);
        assert_eq!(
            needles,
            vec![Needle::front(2), Needle::back(2), Needle::front(5)]
        );
    }
}
