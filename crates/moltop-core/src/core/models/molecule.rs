use super::ids::{BeadId, InteractionId, MoleculeId};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("duplicate bead name '{name}' in molecule '{molecule}'")]
pub struct DuplicateBeadNameError {
    pub molecule: String,
    pub name: String,
}

/// Represents a molecule: an ordered, named grouping of beads plus the
/// bonded interactions among them.
///
/// A molecule references beads by id and never owns them; the owning
/// [`Topology`](crate::core::models::system::Topology) mediates membership so
/// that a bead belongs to at most one molecule. Local bead names are unique
/// within one molecule.
#[derive(Debug, Clone)]
pub struct Molecule {
    pub(crate) id: MoleculeId,
    name: String,
    beads: Vec<(BeadId, String)>,
    bead_name_map: HashMap<String, usize>,
    interactions: Vec<InteractionId>,
}

impl Molecule {
    pub(crate) fn new(id: MoleculeId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            beads: Vec::new(),
            bead_name_map: HashMap::new(),
            interactions: Vec::new(),
        }
    }

    /// Returns the molecule's id, equal to its creation-order index.
    pub fn id(&self) -> MoleculeId {
        self.id
    }

    /// Returns the molecule's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub(crate) fn add_bead(
        &mut self,
        bead: BeadId,
        local_name: &str,
    ) -> Result<(), DuplicateBeadNameError> {
        if self.bead_name_map.contains_key(local_name) {
            return Err(DuplicateBeadNameError {
                molecule: self.name.clone(),
                name: local_name.to_string(),
            });
        }
        self.bead_name_map
            .insert(local_name.to_string(), self.beads.len());
        self.beads.push((bead, local_name.to_string()));
        Ok(())
    }

    pub(crate) fn add_interaction(&mut self, interaction: InteractionId) {
        self.interactions.push(interaction);
    }

    /// Returns the number of beads in the molecule.
    pub fn bead_count(&self) -> usize {
        self.beads.len()
    }

    /// Returns the bead at the given position within the molecule.
    pub fn bead(&self, index: usize) -> Option<BeadId> {
        self.beads.get(index).map(|(id, _)| *id)
    }

    /// Returns the local name of the bead at the given position.
    pub fn bead_name(&self, index: usize) -> Option<&str> {
        self.beads.get(index).map(|(_, name)| name.as_str())
    }

    /// Looks up a bead by its molecule-local name.
    pub fn bead_by_name(&self, local_name: &str) -> Option<BeadId> {
        self.bead_name_map
            .get(local_name)
            .map(|&index| self.beads[index].0)
    }

    /// Returns the ordered (bead id, local name) pairs of the molecule.
    pub fn beads(&self) -> impl Iterator<Item = (BeadId, &str)> {
        self.beads.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// Returns the bonded interactions registered for this molecule.
    pub fn interactions(&self) -> &[InteractionId] {
        &self.interactions
    }
}
