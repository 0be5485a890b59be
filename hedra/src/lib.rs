#![allow(clippy::needless_range_loop)]
#![allow(clippy::len_without_is_empty)]
#![allow(clippy::result_large_err)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Numerical abstract domains over exact rational arithmetic.
//!
//! The central objects are convex [`Polyhedron`]s kept in double
//! description (constraints and generators maintained together with their
//! saturation matrices and converted lazily, Chernikova-style) and integer
//! [`Grid`]s (congruences and grid generators aligned by dimension kinds).
//! On top of the two engines sit the usual abstract-domain operations:
//! lattice meets and joins, affine transfer functions, space-dimension
//! surgery, widening and extrapolation operators, and relation probes.
//!
//! ```
//! use hedra::{Polyhedron, Rel, Topology, Variable};
//!
//! let a = Variable(0);
//! let b = Variable(1);
//! let mut square = Polyhedron::universe(Topology::Closed, 2);
//! square.add_constraint(a.ge(0)).unwrap();
//! square.add_constraint(a.le(1)).unwrap();
//! square.add_constraint(b.ge(0)).unwrap();
//! square.add_constraint(b.le(1)).unwrap();
//! assert!(!square.is_empty().unwrap());
//! assert_eq!(square.affine_dimension().unwrap(), 2);
//! ```

pub mod ascii;
pub mod congruence;
pub mod constraint;
pub mod domain;
pub mod engine;
pub mod error;
pub mod generator;
pub mod grid;
pub mod grid_generator;
pub mod linear_system;
pub mod mip;
pub mod polyhedron;
pub mod relation;
pub mod row;
pub mod scalar_products;

pub use congruence::{Congruence, CongruenceSystem};
pub use constraint::{Constraint, ConstraintKind, ConstraintSystem, Rel, RelSymbol};
pub use domain::NumericalDomain;
pub use engine::Engine;
pub use error::{Error, Result};
pub use generator::{Generator, GeneratorKind, GeneratorSystem};
pub use grid::{DimKind, Grid};
pub use grid_generator::{GridGenerator, GridGeneratorKind, GridGeneratorSystem};
pub use hedra_num::{Coefficient, LinearExpr, Variable};
pub use mip::{MipProblem, MipStatus};
pub use polyhedron::Polyhedron;
pub use relation::{PolyConRelation, PolyGenRelation};
pub use row::Topology;
