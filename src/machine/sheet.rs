//! Sheet addressing
//!
//! At gauge `g` the physical bed interleaves `g` virtual sheets. Physical
//! position `p` belongs to sheet `p % g` at sheet position `p / g`; the `g`
//! physical positions sharing a sheet position form one gauge group.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::needle::{Needle, Side};
use crate::error::{MachineError, Result};

/// Largest supported gauge
pub const MAX_GAUGE: usize = 10;

/// Check that a gauge is in `1..=MAX_GAUGE`
pub fn check_gauge(gauge: usize) -> Result<()> {
    if gauge == 0 || gauge > MAX_GAUGE {
        return Err(MachineError::GaugeOutOfRange {
            gauge,
            max_gauge: MAX_GAUGE,
        });
    }
    Ok(())
}

/// Check that `sheet` is a sheet at `gauge`
pub fn check_sheet(sheet: usize, gauge: usize) -> Result<()> {
    check_gauge(gauge)?;
    if sheet >= gauge {
        return Err(MachineError::SheetOutOfRange { sheet, gauge });
    }
    Ok(())
}

/// A needle addressed by sheet and sheet position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SheetNeedle {
    pub side: Side,
    pub sheet_pos: usize,
    pub sheet: usize,
    pub gauge: usize,
    pub is_slider: bool,
}

impl SheetNeedle {
    pub fn new(side: Side, sheet_pos: usize, sheet: usize, gauge: usize) -> Result<Self> {
        check_sheet(sheet, gauge)?;
        Ok(Self {
            side,
            sheet_pos,
            sheet,
            gauge,
            is_slider: false,
        })
    }

    pub fn slider(side: Side, sheet_pos: usize, sheet: usize, gauge: usize) -> Result<Self> {
        let mut needle = Self::new(side, sheet_pos, sheet, gauge)?;
        needle.is_slider = true;
        Ok(needle)
    }

    /// Locate a physical needle within the sheets of `gauge`
    pub fn from_needle(needle: Needle, gauge: usize) -> Result<Self> {
        check_gauge(gauge)?;
        Ok(Self {
            side: needle.side,
            sheet_pos: needle.position / gauge,
            sheet: needle.position % gauge,
            gauge,
            is_slider: needle.is_slider,
        })
    }

    /// Physical needle position
    ///
    /// Saturates at `usize::MAX` for sheet positions past any bed.
    pub fn position(&self) -> usize {
        self.checked_position().unwrap_or(usize::MAX)
    }

    /// Physical needle position, or `None` if it does not fit in a `usize`
    pub fn checked_position(&self) -> Option<usize> {
        self.gauge
            .checked_mul(self.sheet_pos)
            .and_then(|offset| offset.checked_add(self.sheet))
    }

    /// The physical needle
    pub fn needle(&self) -> Needle {
        Needle::new(self.side, self.position(), self.is_slider)
    }

    /// Same sheet position on every other sheet of the gauge group
    pub fn gauge_neighbors(&self) -> Vec<SheetNeedle> {
        (0..self.gauge)
            .filter(|&sheet| sheet != self.sheet)
            .map(|sheet| SheetNeedle { sheet, ..*self })
            .collect()
    }
}

impl fmt::Display for SheetNeedle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.side.prefix())?;
        if self.is_slider {
            write!(f, "s")?;
        }
        write!(f, "{}:s{}:g{}", self.sheet_pos, self.sheet, self.gauge)
    }
}

/// Names a sheet at a gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SheetIdentifier {
    pub sheet: usize,
    pub gauge: usize,
}

impl SheetIdentifier {
    pub fn new(sheet: usize, gauge: usize) -> Result<Self> {
        check_sheet(sheet, gauge)?;
        Ok(Self { sheet, gauge })
    }

    /// Parse `s1:g2`, or `s1` at `default_gauge`
    pub fn parse(text: &str, default_gauge: usize) -> Result<Self> {
        let invalid = || MachineError::InvalidSheet {
            text: text.to_string(),
        };
        let body = text.trim().strip_prefix('s').ok_or_else(invalid)?;
        let (sheet, gauge) = match body.split_once(":g") {
            Some((sheet, gauge)) => (sheet, gauge.parse::<usize>().map_err(|_| invalid())?),
            None => (body, default_gauge),
        };
        let sheet = sheet.parse::<usize>().map_err(|_| invalid())?;
        Self::new(sheet, gauge)
    }

    /// Needle of this sheet on a bed
    pub fn needle(&self, side: Side, sheet_pos: usize) -> SheetNeedle {
        SheetNeedle {
            side,
            sheet_pos,
            sheet: self.sheet,
            gauge: self.gauge,
            is_slider: false,
        }
    }
}

impl FromStr for SheetIdentifier {
    type Err = MachineError;

    fn from_str(text: &str) -> Result<Self> {
        Self::parse(text, 1)
    }
}

impl fmt::Display for SheetIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}:g{}", self.sheet, self.gauge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0, 1 ; "gauge one")]
    #[test_case(7, 2 ; "gauge two")]
    #[test_case(13, 3 ; "gauge three")]
    #[test_case(29, 10 ; "max gauge")]
    fn test_position_round_trip(position: usize, gauge: usize) {
        let needle = Needle::back(position);
        let sheet_needle = SheetNeedle::from_needle(needle, gauge).unwrap();
        assert!(sheet_needle.sheet < gauge);
        assert_eq!(sheet_needle.needle(), needle);
    }

    #[test]
    fn test_sheet_needle_position() {
        let needle = SheetNeedle::new(Side::Front, 3, 1, 2).unwrap();
        assert_eq!(needle.position(), 7);
        assert_eq!(needle.needle(), Needle::front(7));
        assert_eq!(needle.to_string(), "f3:s1:g2");
    }

    #[test]
    fn test_position_overflow_saturates() {
        let needle = SheetNeedle::new(Side::Front, usize::MAX / 2, 1, 4).unwrap();
        assert_eq!(needle.checked_position(), None);
        assert_eq!(needle.position(), usize::MAX);
    }

    #[test]
    fn test_gauge_neighbors() {
        let needle = SheetNeedle::new(Side::Front, 2, 1, 3).unwrap();
        let positions: Vec<usize> = needle
            .gauge_neighbors()
            .iter()
            .map(|n| n.position())
            .collect();
        assert_eq!(positions, vec![6, 8]);
    }

    #[test]
    fn test_invalid_gauge_and_sheet() {
        assert_eq!(
            SheetNeedle::new(Side::Front, 0, 0, 0).unwrap_err().error_code(),
            "GAUGE_OUT_OF_RANGE"
        );
        assert_eq!(
            SheetNeedle::new(Side::Front, 0, 0, MAX_GAUGE + 1)
                .unwrap_err()
                .error_code(),
            "GAUGE_OUT_OF_RANGE"
        );
        assert_eq!(
            SheetNeedle::new(Side::Front, 0, 2, 2).unwrap_err().error_code(),
            "SHEET_OUT_OF_RANGE"
        );
    }

    #[test]
    fn test_sheet_identifier_parse() {
        assert_eq!(
            SheetIdentifier::parse("s1:g4", 2).unwrap(),
            SheetIdentifier { sheet: 1, gauge: 4 }
        );
        assert_eq!(
            SheetIdentifier::parse("s1", 2).unwrap(),
            SheetIdentifier { sheet: 1, gauge: 2 }
        );
        assert_eq!(
            SheetIdentifier::parse("s3", 2).unwrap_err().error_code(),
            "SHEET_OUT_OF_RANGE"
        );
        assert!(SheetIdentifier::parse("t1", 2).is_err());
        assert_eq!(
            SheetIdentifier::new(2, 3).unwrap().to_string(),
            "s2:g3"
        );
    }
}
