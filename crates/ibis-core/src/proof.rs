//! Certificates returned by contractors, propagators and provers.

use serde::{Deserialize, Serialize};

/// Proof certificate, ordered by strength of conclusion.
///
/// A conjunction of certified facts composes by pointwise minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Proof {
    /// Empty solution set.
    Empty,
    /// No proof is derived.
    Maybe,
    /// Proof of existence of a solution.
    Feasible,
    /// Proof of an inner box.
    Inner,
    /// Proof of optimality.
    Optimal,
}

impl std::fmt::Display for Proof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Proof::Empty => "empty",
            Proof::Maybe => "maybe",
            Proof::Feasible => "feasible",
            Proof::Inner => "inner",
            Proof::Optimal => "optimal",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Proof::Empty < Proof::Maybe);
        assert!(Proof::Maybe < Proof::Feasible);
        assert!(Proof::Feasible < Proof::Inner);
        assert!(Proof::Inner < Proof::Optimal);
    }

    #[test]
    fn test_conjunction_is_min() {
        assert_eq!(Proof::Inner.min(Proof::Maybe), Proof::Maybe);
        assert_eq!(Proof::Empty.min(Proof::Optimal), Proof::Empty);
    }

    #[test]
    fn test_display() {
        assert_eq!(Proof::Feasible.to_string(), "feasible");
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&Proof::Inner).unwrap();
        let p: Proof = serde_json::from_str(&json).unwrap();
        assert_eq!(p, Proof::Inner);
    }
}
