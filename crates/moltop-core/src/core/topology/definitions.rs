use crate::core::models::system::{Topology, TopologyError};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// One run of consecutive beads to group into molecules.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MoleculeRange {
    /// Name given to every molecule created from this range.
    pub name: String,
    /// Zero-based index of the first bead of the range.
    #[serde(default)]
    pub first: usize,
    /// Number of beads per molecule.
    pub beads_per_molecule: usize,
    /// Number of molecules to create.
    pub molecule_count: usize,
}

/// A rename applied after grouping: a 1-based molecule selection and the
/// name it receives.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RenameRule {
    pub range: String,
    pub name: String,
}

/// A mass override for beads whose type name matches a wildcard pattern.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MassRule {
    pub pattern: String,
    pub mass: f64,
}

/// Declarative molecule-grouping definitions, loaded from a TOML document.
///
/// Used when the populated topology carries no explicit molecule
/// definitions: the ranges group beads into molecules, then renames and
/// mass overrides are applied, all through the regular [`Topology`]
/// operations.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct GroupingDefinitions {
    #[serde(default)]
    pub molecules: Vec<MoleculeRange>,
    #[serde(default)]
    pub renames: Vec<RenameRule>,
    #[serde(default)]
    pub masses: Vec<MassRule>,
}

impl GroupingDefinitions {
    /// Loads definitions from a TOML file.
    pub fn load(path: &Path) -> Result<Self, DefinitionsLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| DefinitionsLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| DefinitionsLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Applies the definitions to a topology: ranges first, then renames,
    /// then mass overrides.
    ///
    /// # Errors
    ///
    /// Propagates the first [`TopologyError`] hit; the caller re-drives
    /// `cleanup` and re-population on failure.
    pub fn apply(&self, topology: &mut Topology) -> Result<(), TopologyError> {
        for range in &self.molecules {
            topology.create_molecules_by_range(
                &range.name,
                range.first,
                range.beads_per_molecule,
                range.molecule_count,
            )?;
        }
        for rename in &self.renames {
            topology.rename_molecules(&rename.range, &rename.name)?;
        }
        for rule in &self.masses {
            topology.set_bead_type_mass(&rule.pattern, rule.mass);
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum DefinitionsLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}
