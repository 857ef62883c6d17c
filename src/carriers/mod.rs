//! Yarn Carrier System
//!
//! Carrier life-cycle (in, inhook, releasehook, out, outhook), yarn
//! continuity across cuts, and the sets of carriers used to make loops.

mod carrier;
mod insertion;

pub use carrier::{Carrier, CarrierId, CarrierState};
pub use insertion::CarrierSystem;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered carriers feeding one operation (more than one when plating)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarrierSet(Vec<CarrierId>);

impl CarrierSet {
    pub fn new(carriers: Vec<CarrierId>) -> Self {
        Self(carriers)
    }

    pub fn single(carrier: CarrierId) -> Self {
        Self(vec![carrier])
    }

    pub fn iter(&self) -> impl Iterator<Item = CarrierId> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<CarrierId> for CarrierSet {
    fn from(carrier: CarrierId) -> Self {
        Self::single(carrier)
    }
}

impl FromIterator<CarrierId> for CarrierSet {
    fn from_iter<I: IntoIterator<Item = CarrierId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for CarrierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", names.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carrier_set_display() {
        let set: CarrierSet = [1, 3].into_iter().map(CarrierId::new).collect();
        assert_eq!(set.to_string(), "1 3");
        assert_eq!(CarrierSet::from(CarrierId::new(2)).to_string(), "2");
    }
}
