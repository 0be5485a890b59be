//! Convex polyhedra in double description form.

mod affine;
mod ascii;
mod conversion;
mod dims;
mod minimize;
mod ops;
mod probes;
mod simplify;
mod status;
mod widenings;

pub use widenings::{Bhrz03Certificate, H79Certificate};

use crate::constraint::{Constraint, ConstraintSystem};
use crate::error::{Error, Result};
use crate::generator::{Generator, GeneratorSystem};
use crate::row::Topology;
use hedra_util::BitMatrix;
use num::Zero;
use status::Status;

/// A convex polyhedron over the rationals, closed or not necessarily
/// closed, kept as a constraint system and a generator system with the
/// saturation matrices relating them.
///
/// Either system may be out of date; conversions run lazily, driven by
/// the status word, and integrate pending rows incrementally when the
/// dual representation is already minimized.
#[derive(Clone, Debug)]
pub struct Polyhedron {
    topology: Topology,
    space_dim: usize,
    con_sys: ConstraintSystem,
    gen_sys: GeneratorSystem,
    /// Rows indexed by generators, columns by constraints.
    sat_c: BitMatrix,
    /// Rows indexed by constraints, columns by generators.
    sat_g: BitMatrix,
    status: Status,
}

impl Polyhedron {
    /// The universe polyhedron of the given space dimension.
    pub fn universe(topology: Topology, space_dim: usize) -> Self {
        let mut ph = Self {
            topology,
            space_dim,
            con_sys: ConstraintSystem::with_columns(
                topology,
                if space_dim == 0 {
                    0
                } else {
                    space_dim + topology.extra_columns()
                },
            ),
            gen_sys: GeneratorSystem::with_columns(
                topology,
                if space_dim == 0 {
                    0
                } else {
                    space_dim + topology.extra_columns()
                },
            ),
            sat_c: BitMatrix::new(),
            sat_g: BitMatrix::new(),
            status: Status::empty(),
        };
        if space_dim == 0 {
            ph.status = Status::ZERO_DIM_UNIV;
            return ph;
        }
        match topology {
            Topology::Closed => {
                ph.con_sys
                    .insert(crate::constraint::Rel::ge(hedra_num::LinearExpr::from(1), 0));
            }
            Topology::Nnc => {
                ph.con_sys.insert(Constraint::epsilon_leq_one(space_dim));
                ph.con_sys.insert(Constraint::epsilon_geq_zero(space_dim));
            }
        }
        ph.status = Status::C_UP_TO_DATE | Status::C_MINIMIZED;
        ph
    }

    /// The empty polyhedron of the given space dimension.
    pub fn empty(topology: Topology, space_dim: usize) -> Self {
        Self {
            topology,
            space_dim,
            con_sys: ConstraintSystem::with_columns(
                topology,
                if space_dim == 0 {
                    0
                } else {
                    space_dim + topology.extra_columns()
                },
            ),
            gen_sys: GeneratorSystem::with_columns(
                topology,
                if space_dim == 0 {
                    0
                } else {
                    space_dim + topology.extra_columns()
                },
            ),
            sat_c: BitMatrix::new(),
            sat_g: BitMatrix::new(),
            status: Status::EMPTY,
        }
    }

    /// The polyhedron of all solutions of `cs`.
    ///
    /// Fails when `cs` cannot be converted to `topology` without loss,
    /// i.e. when a strict inequality would have to become closed.
    pub fn from_constraints(topology: Topology, cs: ConstraintSystem) -> Result<Self> {
        let space_dim = cs.space_dimension();
        if space_dim == 0 {
            // Zero-dimensional constraints are all trivial: the system is
            // either unsatisfiable or describes the universe point.
            return Ok(if cs.iter().any(Constraint::is_inconsistent) {
                Self::empty(topology, 0)
            } else {
                Self::universe(topology, 0)
            });
        }
        let mut cs = cs;
        cs.adjust_topology_and_space_dimension(topology, space_dim)?;
        // The universe rows stay: closed polyhedra keep their positivity
        // witness, NNC polyhedra their epsilon bounds.
        let mut ph = Self::universe(topology, space_dim);
        for c in cs.iter() {
            ph.con_sys.insert(c.clone());
        }
        ph.con_sys.unset_pending_rows();
        ph.status = Status::C_UP_TO_DATE;
        Ok(ph)
    }

    /// The polyhedron spanned by `gs`.
    ///
    /// An empty system yields the empty polyhedron; a non-empty system
    /// must contain at least one point.
    pub fn from_generators(topology: Topology, gs: GeneratorSystem) -> Result<Self> {
        let space_dim = gs.space_dimension();
        if gs.has_no_rows() {
            return Ok(Self::empty(topology, space_dim));
        }
        if !gs.has_points() {
            return Err(Error::InvalidArgument {
                op: "Polyhedron::from_generators",
                reason: "a non-empty generator system needs at least one point",
            });
        }
        if space_dim == 0 {
            return Ok(Self::universe(topology, 0));
        }
        let mut gs = gs;
        gs.adjust_topology_and_space_dimension(topology, space_dim)?;
        if topology == Topology::Nnc {
            gs.add_corresponding_closure_points();
        }
        gs.unset_pending_rows();
        let mut ph = Self::empty(topology, space_dim);
        ph.gen_sys = gs;
        ph.status = Status::G_UP_TO_DATE;
        Ok(ph)
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn is_necessarily_closed(&self) -> bool {
        self.topology == Topology::Closed
    }

    pub fn space_dimension(&self) -> usize {
        self.space_dim
    }

    // Status bit helpers, named after the transitions they witness.

    pub(crate) fn marked_empty(&self) -> bool {
        self.status.contains(Status::EMPTY)
    }

    pub(crate) fn constraints_are_up_to_date(&self) -> bool {
        self.status.contains(Status::C_UP_TO_DATE)
    }

    pub(crate) fn generators_are_up_to_date(&self) -> bool {
        self.status.contains(Status::G_UP_TO_DATE)
    }

    pub(crate) fn constraints_are_minimized(&self) -> bool {
        self.status.contains(Status::C_MINIMIZED)
    }

    pub(crate) fn generators_are_minimized(&self) -> bool {
        self.status.contains(Status::G_MINIMIZED)
    }

    pub(crate) fn sat_c_is_up_to_date(&self) -> bool {
        self.status.contains(Status::SAT_C_UP_TO_DATE)
    }

    pub(crate) fn sat_g_is_up_to_date(&self) -> bool {
        self.status.contains(Status::SAT_G_UP_TO_DATE)
    }

    pub(crate) fn has_pending_constraints(&self) -> bool {
        self.status.contains(Status::C_PENDING)
    }

    pub(crate) fn has_pending_generators(&self) -> bool {
        self.status.contains(Status::G_PENDING)
    }

    pub(crate) fn has_something_pending(&self) -> bool {
        self.status
            .intersects(Status::C_PENDING | Status::G_PENDING)
    }

    /// Pending rows are only worth accumulating over a fully minimized
    /// double description with valid saturation information.
    pub(crate) fn can_have_something_pending(&self) -> bool {
        self.status.contains(
            Status::C_MINIMIZED
                | Status::G_MINIMIZED
                | Status::SAT_C_UP_TO_DATE
                | Status::SAT_G_UP_TO_DATE,
        )
    }

    pub(crate) fn set_empty(&mut self) {
        self.status = Status::EMPTY;
        let columns = self.space_dim + self.topology.extra_columns();
        self.con_sys = ConstraintSystem::with_columns(self.topology, columns);
        self.gen_sys = GeneratorSystem::with_columns(self.topology, columns);
        self.sat_c.clear();
        self.sat_g.clear();
    }

    pub(crate) fn set_zero_dim_univ(&mut self) {
        self.status = Status::ZERO_DIM_UNIV;
        self.space_dim = 0;
        self.con_sys = ConstraintSystem::with_columns(self.topology, 0);
        self.gen_sys = GeneratorSystem::with_columns(self.topology, 0);
        self.sat_c.clear();
        self.sat_g.clear();
    }

    pub(crate) fn set_flags(&mut self, flags: Status) {
        self.status.insert(flags);
    }

    pub(crate) fn clear_flags(&mut self, flags: Status) {
        self.status.remove(flags);
    }

    pub(crate) fn status(&self) -> Status {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    pub(crate) fn con_sys(&self) -> &ConstraintSystem {
        &self.con_sys
    }

    pub(crate) fn gen_sys(&self) -> &GeneratorSystem {
        &self.gen_sys
    }

    pub(crate) fn sat_c(&self) -> &BitMatrix {
        &self.sat_c
    }

    pub(crate) fn sat_g(&self) -> &BitMatrix {
        &self.sat_g
    }

    /// Structural consistency of the representation; used by the loader
    /// and by debug assertions.
    pub(crate) fn ok(&self) -> bool {
        if !self.status.ok() {
            return false;
        }
        if self.con_sys.topology() != self.topology || self.gen_sys.topology() != self.topology {
            return false;
        }
        if self.marked_empty() {
            return self.gen_sys.has_no_rows() && !self.has_something_pending();
        }
        if self.status.contains(Status::ZERO_DIM_UNIV) {
            return self.space_dim == 0
                && self.con_sys.has_no_rows()
                && self.gen_sys.has_no_rows();
        }
        if self.space_dim == 0 {
            return false;
        }
        if !self.constraints_are_up_to_date() && !self.generators_are_up_to_date() {
            return false;
        }
        let columns = self.space_dim + self.topology.extra_columns();
        if self.constraints_are_up_to_date() {
            if self.con_sys.num_columns() != columns {
                return false;
            }
            if self.con_sys.first_pending_row() == 0 {
                return false;
            }
            // A satisfiable constraint system needs a positivity witness.
            let has_positivity = self
                .con_sys
                .iter()
                .any(|c| !c.inhomogeneous_term().is_zero());
            if !has_positivity {
                return false;
            }
        }
        if self.generators_are_up_to_date() {
            if self.gen_sys.num_columns() != columns {
                return false;
            }
            if self.gen_sys.first_pending_row() == 0 {
                return false;
            }
            if !self.gen_sys.has_points() {
                return false;
            }
        }
        if self.sat_c_is_up_to_date()
            && (self.sat_c.num_rows() != self.gen_sys.first_pending_row()
                || self.sat_c.num_columns() != self.con_sys.first_pending_row())
        {
            return false;
        }
        if self.sat_g_is_up_to_date()
            && (self.sat_g.num_rows() != self.con_sys.first_pending_row()
                || self.sat_g.num_columns() != self.gen_sys.first_pending_row())
        {
            return false;
        }
        if self.has_pending_constraints() && self.con_sys.num_pending_rows() == 0 {
            return false;
        }
        if self.has_pending_generators() && self.gen_sys.num_pending_rows() == 0 {
            return false;
        }
        true
    }

    pub(crate) fn check_topologies(&self, other: &Polyhedron, op: &'static str) -> Result<()> {
        if self.topology != other.topology {
            return Err(Error::TopologyMismatch { op });
        }
        Ok(())
    }

    pub(crate) fn check_same_dimension(&self, other: &Polyhedron, op: &'static str) -> Result<()> {
        if self.space_dim != other.space_dim {
            return Err(Error::DimensionIncompatible {
                op,
                receiver_dim: self.space_dim,
                operand_dim: other.space_dim,
            });
        }
        Ok(())
    }

    pub(crate) fn check_operand_dimension(
        &self,
        operand_dim: usize,
        op: &'static str,
    ) -> Result<()> {
        if operand_dim > self.space_dim {
            return Err(Error::DimensionIncompatible {
                op,
                receiver_dim: self.space_dim,
                operand_dim,
            });
        }
        Ok(())
    }
}
