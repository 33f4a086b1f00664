use super::ids::{BeadId, MoleculeId};
use std::fmt;

/// The bonded shape of an interaction, with its beads.
///
/// The variant set is closed and each variant has a fixed arity, so the
/// bead list is an array rather than a dynamically sized sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    /// A two-body bond.
    Bond([BeadId; 2]),
    /// A three-body angle; the center bead is the second entry.
    Angle([BeadId; 3]),
    /// A four-body dihedral.
    Dihedral([BeadId; 4]),
}

impl InteractionKind {
    /// Returns the number of beads the interaction spans.
    pub fn arity(&self) -> usize {
        self.bead_ids().len()
    }

    /// Returns the ordered bead ids of the interaction.
    pub fn bead_ids(&self) -> &[BeadId] {
        match self {
            InteractionKind::Bond(beads) => beads,
            InteractionKind::Angle(beads) => beads,
            InteractionKind::Dihedral(beads) => beads,
        }
    }

    /// Returns the variant name, e.g. for interaction labels.
    pub fn variant_name(&self) -> &'static str {
        match self {
            InteractionKind::Bond(_) => "bond",
            InteractionKind::Angle(_) => "angle",
            InteractionKind::Dihedral(_) => "dihedral",
        }
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.variant_name())?;
        for bead in self.bead_ids() {
            write!(f, " {bead}")?;
        }
        Ok(())
    }
}

/// Represents one bonded interaction within a topology.
///
/// Interactions are tagged with a free-form group name (e.g. "BONDS").
/// The owning topology assigns the group id on first use of a group name
/// and the index as the position within that group.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    kind: InteractionKind,
    group: String,
    group_id: Option<usize>,
    index: Option<usize>,
    molecule: Option<MoleculeId>,
}

impl Interaction {
    /// Creates a bond between two beads, tagged with `group`.
    pub fn bond(group: &str, bead1: BeadId, bead2: BeadId) -> Self {
        Self::new(group, InteractionKind::Bond([bead1, bead2]))
    }

    /// Creates an angle over three beads, tagged with `group`.
    pub fn angle(group: &str, bead1: BeadId, bead2: BeadId, bead3: BeadId) -> Self {
        Self::new(group, InteractionKind::Angle([bead1, bead2, bead3]))
    }

    /// Creates a dihedral over four beads, tagged with `group`.
    pub fn dihedral(
        group: &str,
        bead1: BeadId,
        bead2: BeadId,
        bead3: BeadId,
        bead4: BeadId,
    ) -> Self {
        Self::new(group, InteractionKind::Dihedral([bead1, bead2, bead3, bead4]))
    }

    fn new(group: &str, kind: InteractionKind) -> Self {
        Self {
            kind,
            group: group.to_string(),
            group_id: None,
            index: None,
            molecule: None,
        }
    }

    /// Assigns the interaction to a molecule before it is added to a topology.
    pub fn with_molecule(mut self, molecule: MoleculeId) -> Self {
        self.molecule = Some(molecule);
        self
    }

    /// Returns the bonded shape and beads.
    pub fn kind(&self) -> &InteractionKind {
        &self.kind
    }

    /// Returns the group name the interaction is tagged with.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the group id, once assigned by a topology.
    pub fn group_id(&self) -> Option<usize> {
        self.group_id
    }

    /// Returns the position within the group, once assigned by a topology.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Returns the owning molecule, if any.
    pub fn molecule(&self) -> Option<MoleculeId> {
        self.molecule
    }

    pub(crate) fn assign(&mut self, group_id: usize, index: usize) {
        self.group_id = Some(group_id);
        self.index = Some(index);
    }

    /// Returns a human-readable label, e.g. `molecule 0:BONDS:2`.
    pub fn label(&self) -> String {
        let molecule = self
            .molecule
            .map_or_else(|| "-".to_string(), |m| m.to_string());
        let index = self
            .index
            .map_or_else(|| "-".to_string(), |i| i.to_string());
        format!("molecule {molecule}:{}:{index}", self.group)
    }
}
