use serde::{Deserialize, Serialize};
use std::fmt;

/// Tinybars per hbar.
pub const TINYBARS_PER_HBAR: u64 = 100_000_000;

/// Native currency amount, stored as an exact number of tinybars.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Hbar(u64);

impl Hbar {
    pub const ZERO: Hbar = Hbar(0);

    pub const fn from_tinybars(tinybars: u64) -> Self {
        Self(tinybars)
    }

    /// Whole hbars, saturating at `u64::MAX` tinybars.
    pub const fn from_hbars(hbars: u64) -> Self {
        Self(hbars.saturating_mul(TINYBARS_PER_HBAR))
    }

    pub const fn to_tinybars(self) -> u64 {
        self.0
    }

    pub fn checked_add(self, other: Hbar) -> Option<Hbar> {
        self.0.checked_add(other.0).map(Hbar)
    }

    pub fn checked_sub(self, other: Hbar) -> Option<Hbar> {
        self.0.checked_sub(other.0).map(Hbar)
    }
}

impl fmt::Display for Hbar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / TINYBARS_PER_HBAR;
        let fraction = self.0 % TINYBARS_PER_HBAR;
        if fraction == 0 {
            write!(f, "{} ℏ", whole)
        } else {
            let digits = format!("{:08}", fraction);
            write!(f, "{}.{} ℏ", whole, digits.trim_end_matches('0'))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_comparison_is_exact() {
        let ten = Hbar::from_hbars(10);
        assert!(ten <= Hbar::from_hbars(10));
        assert!(Hbar::from_tinybars(ten.to_tinybars() + 1) > ten);
    }

    #[test]
    fn test_display() {
        assert_eq!(Hbar::from_hbars(5).to_string(), "5 ℏ");
        assert_eq!(Hbar::from_tinybars(150_000_000).to_string(), "1.5 ℏ");
        assert_eq!(Hbar::from_tinybars(1).to_string(), "0.00000001 ℏ");
    }

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(Hbar::ZERO.checked_sub(Hbar::from_tinybars(1)), None);
        assert_eq!(
            Hbar::from_hbars(1).checked_add(Hbar::from_hbars(2)),
            Some(Hbar::from_hbars(3))
        );
    }
}
