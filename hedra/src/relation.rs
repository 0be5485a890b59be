//! Results of relation probes between domains and single constraints or
//! generators.

use bitflags::bitflags;

bitflags! {
    /// How a polyhedron or grid relates to the set a constraint defines.
    ///
    /// Only logically consistent combinations are produced; for instance
    /// `SATURATES` always comes with `IS_INCLUDED` or `IS_DISJOINT`,
    /// except on the empty element where all three hold.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct PolyConRelation: u8 {
        /// Every point satisfies the constraint with equality.
        const SATURATES = 1;
        /// Every point satisfies the constraint.
        const IS_INCLUDED = 1 << 1;
        /// No point satisfies the constraint.
        const IS_DISJOINT = 1 << 2;
        /// Some points satisfy the constraint and some do not.
        const STRICTLY_INTERSECTS = 1 << 3;
    }
}

impl PolyConRelation {
    /// Whether this relation implies every bit of `other`.
    pub fn implies(self, other: PolyConRelation) -> bool {
        self.contains(other)
    }
}

bitflags! {
    /// How a polyhedron relates to a single generator.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct PolyGenRelation: u8 {
        /// Adding the generator would not change the set.
        const SUBSUMES = 1;
    }
}

impl PolyGenRelation {
    pub fn nothing() -> Self {
        PolyGenRelation::empty()
    }

    pub fn subsumes() -> Self {
        PolyGenRelation::SUBSUMES
    }

    /// Whether this relation implies every bit of `other`.
    pub fn implies(self, other: PolyGenRelation) -> bool {
        self.contains(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implication_is_bit_containment() {
        let r = PolyConRelation::SATURATES | PolyConRelation::IS_INCLUDED;
        assert!(r.implies(PolyConRelation::SATURATES));
        assert!(r.implies(PolyConRelation::IS_INCLUDED));
        assert!(!r.implies(PolyConRelation::IS_DISJOINT));
        assert!(PolyGenRelation::subsumes().implies(PolyGenRelation::SUBSUMES));
        assert!(!PolyGenRelation::nothing().implies(PolyGenRelation::SUBSUMES));
    }
}
