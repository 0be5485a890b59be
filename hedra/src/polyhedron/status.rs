//! The lazy-evaluation status word of a polyhedron.

use bitflags::bitflags;

bitflags! {
    /// Which pieces of the double description are currently meaningful.
    ///
    /// Exactly one of three shapes classifies a polyhedron at all times:
    /// marked empty with no generator rows; the zero-dimensional universe
    /// with both systems rowless; or a positive-dimensional set with at
    /// least one of the two systems up to date. At most one system may
    /// carry pending rows at a time.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Status: u16 {
        const EMPTY = 1;
        const ZERO_DIM_UNIV = 1 << 1;
        const C_UP_TO_DATE = 1 << 2;
        const G_UP_TO_DATE = 1 << 3;
        const C_MINIMIZED = 1 << 4;
        const G_MINIMIZED = 1 << 5;
        const SAT_C_UP_TO_DATE = 1 << 6;
        const SAT_G_UP_TO_DATE = 1 << 7;
        const C_PENDING = 1 << 8;
        const G_PENDING = 1 << 9;
    }
}

/// The dump tokens, in dump order.
pub(crate) const TOKENS: [(Status, &str); 10] = [
    (Status::ZERO_DIM_UNIV, "ZE"),
    (Status::EMPTY, "EM"),
    (Status::C_MINIMIZED, "CM"),
    (Status::G_MINIMIZED, "GM"),
    (Status::C_UP_TO_DATE, "CS"),
    (Status::G_UP_TO_DATE, "GS"),
    (Status::C_PENDING, "CP"),
    (Status::G_PENDING, "GP"),
    (Status::SAT_C_UP_TO_DATE, "SC"),
    (Status::SAT_G_UP_TO_DATE, "SG"),
];

impl Status {
    /// Structural sanity of the flag combination itself.
    pub(crate) fn ok(self) -> bool {
        if self.contains(Status::EMPTY) || self.contains(Status::ZERO_DIM_UNIV) {
            // A trivial polyhedron carries no other flags.
            return (self & !(Status::EMPTY | Status::ZERO_DIM_UNIV)).is_empty()
                && self != Status::EMPTY | Status::ZERO_DIM_UNIV;
        }
        if self.contains(Status::C_MINIMIZED) && !self.contains(Status::C_UP_TO_DATE) {
            return false;
        }
        if self.contains(Status::G_MINIMIZED) && !self.contains(Status::G_UP_TO_DATE) {
            return false;
        }
        if self.contains(Status::C_PENDING) && self.contains(Status::G_PENDING) {
            return false;
        }
        if self.contains(Status::C_PENDING) || self.contains(Status::G_PENDING) {
            // Pending rows only make sense over a fully minimized prefix.
            if !self.contains(Status::C_MINIMIZED) || !self.contains(Status::G_MINIMIZED) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trivial_states_are_exclusive() {
        assert!(Status::EMPTY.ok());
        assert!(Status::ZERO_DIM_UNIV.ok());
        assert!(!(Status::EMPTY | Status::ZERO_DIM_UNIV).ok());
        assert!(!(Status::EMPTY | Status::C_UP_TO_DATE).ok());
    }

    #[test]
    fn minimized_requires_up_to_date() {
        assert!(!Status::C_MINIMIZED.ok());
        assert!((Status::C_MINIMIZED | Status::C_UP_TO_DATE).ok());
    }

    #[test]
    fn single_pending_side() {
        let minimized = Status::C_UP_TO_DATE
            | Status::G_UP_TO_DATE
            | Status::C_MINIMIZED
            | Status::G_MINIMIZED;
        assert!((minimized | Status::C_PENDING).ok());
        assert!(!(minimized | Status::C_PENDING | Status::G_PENDING).ok());
        assert!(!(Status::C_UP_TO_DATE | Status::C_PENDING).ok());
    }
}
