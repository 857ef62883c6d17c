//! Yarn segments
//!
//! Each carrier feeds one yarn. Cutting the yarn (outhook) starts a new
//! segment, so loops made after the cut are not continuous with earlier ones.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::carriers::CarrierId;

/// Identity of one continuous piece of yarn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YarnId {
    pub carrier: CarrierId,
    pub segment: u32,
}

impl YarnId {
    /// First yarn segment fed by a carrier
    pub fn new(carrier: CarrierId) -> Self {
        Self {
            carrier,
            segment: 0,
        }
    }

    /// The yarn that continues after cutting this one
    pub fn cut(self) -> Self {
        Self {
            carrier: self.carrier,
            segment: self.segment + 1,
        }
    }
}

impl fmt::Display for YarnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "yarn {}.{}", self.carrier, self.segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_starts_new_segment() {
        let yarn = YarnId::new(CarrierId::new(2));
        let cut = yarn.cut();
        assert_ne!(yarn, cut);
        assert_eq!(cut.carrier, yarn.carrier);
        assert_eq!(cut.segment, 1);
        assert_eq!(cut.to_string(), "yarn 2.1");
    }
}
