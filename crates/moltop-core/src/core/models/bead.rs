use super::ids::{BeadId, BeadTypeId, MoleculeId, ResidueId};
use nalgebra::Vector3;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Represents the shape symmetry of a bead.
///
/// Coarse-grained sites are either isotropic point particles or carry an
/// orientation, which matters to mapping and analysis code downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BeadSymmetry {
    /// An isotropic site with no orientation of its own.
    #[default]
    Spherical,
    /// An anisotropic site with three principal axes.
    Ellipsoidal,
}

#[derive(Debug, Error)]
#[error("Invalid bead symmetry string")]
pub struct ParseBeadSymmetryError;

impl FromStr for BeadSymmetry {
    type Err = ParseBeadSymmetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "sphere" | "spherical" => Ok(BeadSymmetry::Spherical),
            "3" | "ellipsoid" | "ellipsoidal" => Ok(BeadSymmetry::Ellipsoidal),
            _ => Err(ParseBeadSymmetryError),
        }
    }
}

impl fmt::Display for BeadSymmetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                BeadSymmetry::Spherical => "Spherical",
                BeadSymmetry::Ellipsoidal => "Ellipsoidal",
            }
        )
    }
}

/// Represents a single particle site (atom or coarse-grained bead).
///
/// A bead is owned by exactly one [`Topology`](crate::core::models::system::Topology),
/// belongs to one residue from creation, and to at most one molecule once it
/// has been grouped. Position, velocity and force are per-frame data and are
/// each independently present or absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Bead {
    pub(crate) id: BeadId,
    /// The name of the bead (e.g. "CA", "CH3").
    pub name: String,
    pub(crate) type_id: BeadTypeId,
    pub(crate) residue: ResidueId,
    pub(crate) molecule: Option<MoleculeId>,
    /// The mass of the bead in simulation units.
    pub mass: f64,
    /// The charge of the bead in elementary charge units.
    pub charge: f64,
    /// The shape symmetry of the bead.
    pub symmetry: BeadSymmetry,
    /// The position of the bead, if the current frame carries one.
    pub position: Option<Vector3<f64>>,
    /// The velocity of the bead, if the current frame carries one.
    pub velocity: Option<Vector3<f64>>,
    /// The force on the bead, if the current frame carries one.
    pub force: Option<Vector3<f64>>,
}

impl Bead {
    pub(crate) fn new(
        id: BeadId,
        symmetry: BeadSymmetry,
        name: &str,
        type_id: BeadTypeId,
        residue: ResidueId,
        mass: f64,
        charge: f64,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            type_id,
            residue,
            molecule: None,
            mass,
            charge,
            symmetry,
            position: None,
            velocity: None,
            force: None,
        }
    }

    /// Returns the bead's id, equal to its creation-order index.
    pub fn id(&self) -> BeadId {
        self.id
    }

    /// Returns the id of the bead's registered type.
    pub fn type_id(&self) -> BeadTypeId {
        self.type_id
    }

    /// Returns the id of the residue this bead belongs to.
    pub fn residue(&self) -> ResidueId {
        self.residue
    }

    /// Returns the id of the molecule this bead has been grouped into, if any.
    pub fn molecule(&self) -> Option<MoleculeId> {
        self.molecule
    }
}
