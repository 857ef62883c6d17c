//! Needle identity
//!
//! A needle is a plain value: bed side, position and whether it is a slider.
//! The loops a needle holds live in its [`MachineBed`](super::MachineBed).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MachineError;

/// Bed side of a needle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Front,
    Back,
}

impl Side {
    /// The other bed
    pub fn opposite(self) -> Self {
        match self {
            Side::Front => Side::Back,
            Side::Back => Side::Front,
        }
    }

    /// Knitout bed prefix
    pub fn prefix(self) -> char {
        match self {
            Side::Front => 'f',
            Side::Back => 'b',
        }
    }
}

/// Identity of a needle on the machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Needle {
    pub side: Side,
    pub position: usize,
    pub is_slider: bool,
}

impl Needle {
    pub fn new(side: Side, position: usize, is_slider: bool) -> Self {
        Self {
            side,
            position,
            is_slider,
        }
    }

    /// Ordinary front bed needle
    pub fn front(position: usize) -> Self {
        Self::new(Side::Front, position, false)
    }

    /// Ordinary back bed needle
    pub fn back(position: usize) -> Self {
        Self::new(Side::Back, position, false)
    }

    /// Front bed slider
    pub fn front_slider(position: usize) -> Self {
        Self::new(Side::Front, position, true)
    }

    /// Back bed slider
    pub fn back_slider(position: usize) -> Self {
        Self::new(Side::Back, position, true)
    }

    pub fn is_front(&self) -> bool {
        self.side == Side::Front
    }

    pub fn is_back(&self) -> bool {
        self.side == Side::Back
    }

    /// Needle at the same position on the opposite bed
    pub fn opposite(&self) -> Self {
        Self::new(self.side.opposite(), self.position, self.is_slider)
    }

    /// Slider at this needle's bed and position
    pub fn slider(&self) -> Self {
        Self::new(self.side, self.position, true)
    }

    /// Ordinary needle at this needle's bed and position
    pub fn main_needle(&self) -> Self {
        Self::new(self.side, self.position, false)
    }
}

impl fmt::Display for Needle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.side.prefix())?;
        if self.is_slider {
            write!(f, "s")?;
        }
        write!(f, "{}", self.position)
    }
}

impl FromStr for Needle {
    type Err = MachineError;

    /// Parse knitout needle notation: `f3`, `b12`, `fs0`, `bs7`
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || MachineError::InvalidNeedle {
            text: text.to_string(),
        };
        let trimmed = text.trim();
        let mut chars = trimmed.chars();
        let side = match chars.next() {
            Some('f') => Side::Front,
            Some('b') => Side::Back,
            _ => return Err(invalid()),
        };
        let rest = chars.as_str();
        let (is_slider, digits) = match rest.strip_prefix('s') {
            Some(digits) => (true, digits),
            None => (false, rest),
        };
        let position = digits.parse::<usize>().map_err(|_| invalid())?;
        Ok(Self::new(side, position, is_slider))
    }
}

impl Serialize for Needle {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Needle {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_knitout_names() {
        assert_eq!(Needle::front(3).to_string(), "f3");
        assert_eq!(Needle::back(0).to_string(), "b0");
        assert_eq!(Needle::front_slider(12).to_string(), "fs12");
        assert_eq!(Needle::back_slider(7).to_string(), "bs7");
    }

    #[test]
    fn test_parse_knitout_names() {
        assert_eq!("f3".parse::<Needle>().unwrap(), Needle::front(3));
        assert_eq!("bs7".parse::<Needle>().unwrap(), Needle::back_slider(7));
        assert!("x3".parse::<Needle>().is_err());
        assert!("f".parse::<Needle>().is_err());
        assert!("fs-1".parse::<Needle>().is_err());
    }

    #[test]
    fn test_opposite_keeps_position_and_slider() {
        let needle = Needle::front_slider(5);
        assert_eq!(needle.opposite(), Needle::back_slider(5));
        assert_eq!(needle.opposite().opposite(), needle);
        assert_eq!(needle.main_needle(), Needle::front(5));
    }
}
