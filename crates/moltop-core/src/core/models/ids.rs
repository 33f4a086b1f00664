use std::fmt;

// Entity ids are plain arena indices: every entity lives in a contiguous
// growable container on `Topology` and its id equals its creation-order
// position in that container.
macro_rules! arena_id {
    ($($(#[$docs:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$docs])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub(crate) usize);

            impl $name {
                /// Creates an id from a raw arena index.
                pub fn new(index: usize) -> Self {
                    Self(index)
                }

                /// Returns the raw arena index.
                pub fn index(self) -> usize {
                    self.0
                }
            }

            impl From<usize> for $name {
                fn from(index: usize) -> Self {
                    Self(index)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

arena_id! {
    /// Identifies a bead within one `Topology`.
    BeadId,
    /// Identifies a residue within one `Topology`.
    ResidueId,
    /// Identifies a molecule within one `Topology`.
    MoleculeId,
    /// Identifies a bonded interaction within one `Topology`.
    InteractionId,
    /// Identifies a registered bead type within one `Topology`.
    BeadTypeId,
}
