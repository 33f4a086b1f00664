use super::ids::ResidueId;

/// Represents a residue: a named grouping label for beads.
///
/// Residues carry no structure of their own; beads reference them by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub(crate) id: ResidueId,
    /// The name of the residue (e.g. "ALA", "SOL").
    pub name: String,
}

impl Residue {
    pub(crate) fn new(id: ResidueId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }

    /// Returns the residue's id, equal to its creation-order index.
    pub fn id(&self) -> ResidueId {
        self.id
    }
}
