use super::bead::{Bead, BeadSymmetry};
use super::boundary::{BoundaryCondition, BoundaryError, BoxShape};
use super::ids::{BeadId, BeadTypeId, InteractionId, MoleculeId, ResidueId};
use super::interaction::{Interaction, InteractionKind};
use super::molecule::{DuplicateBeadNameError, Molecule};
use super::residue::Residue;
use crate::core::graph::edge::Edge;
use crate::core::graph::{Graph, GraphNode};
use crate::core::topology::exclusions::ExclusionList;
use crate::core::topology::registry::{BeadTypeIdCollision, BeadTypeRegistry};
use crate::core::utils::ranges::{RangeParseError, parse_range};
use crate::core::utils::wildcards::wildcard_match;
use nalgebra::{Matrix3, Vector3};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error(transparent)]
    BeadType(#[from] BeadTypeIdCollision),

    #[error(transparent)]
    DuplicateBeadName(#[from] DuplicateBeadNameError),

    #[error("bead {bead} already belongs to molecule {molecule}")]
    BeadAlreadyInMolecule { bead: BeadId, molecule: MoleculeId },

    #[error("unknown bead {0}")]
    UnknownBead(BeadId),

    #[error("unknown residue {0}")]
    UnknownResidue(ResidueId),

    #[error("unknown molecule {0}")]
    UnknownMolecule(MoleculeId),

    #[error("interaction in group '{group}' references unknown bead {bead}")]
    UnknownInteractionBead { group: String, bead: BeadId },

    #[error("bead {0} has no position in the current frame")]
    MissingPosition(BeadId),

    #[error(
        "molecule range for '{name}' selects beads [{first}, {end}) but the topology has {available}"
    )]
    BeadRangeOutOfBounds {
        name: String,
        first: usize,
        end: usize,
        available: usize,
    },

    #[error("molecule selection {index} is out of range; the topology has {count} molecules")]
    MoleculeIndexOutOfRange { index: usize, count: usize },

    #[error("molecules named '{name}' disagree on bead count ({first} vs {second})")]
    InconsistentMoleculeNaming {
        name: String,
        first: usize,
        second: usize,
    },

    #[error(transparent)]
    Range(#[from] RangeParseError),

    #[error(transparent)]
    Boundary(#[from] BoundaryError),
}

/// The aggregate root of the structural model: one `Topology` represents one
/// simulation frame.
///
/// The topology owns every bead, residue, molecule and bonded interaction,
/// the boundary condition, the bead-type registry and the derived exclusion
/// list. Entities live in contiguous arenas indexed by their ids, which are
/// creation-order indices; molecules and interactions reference beads by id
/// and never own them.
///
/// A topology is populated by a reader (one thread at a time), queried by
/// analysis code, and reset with [`cleanup`](Topology::cleanup) before the
/// next frame is read into it. There is no internal locking; independent
/// instances may be driven concurrently by independent threads.
#[derive(Debug, Default)]
pub struct Topology {
    beads: Vec<Bead>,
    residues: Vec<Residue>,
    molecules: Vec<Molecule>,
    interactions: Vec<Interaction>,
    interaction_groups: HashMap<String, usize>,
    interactions_by_group: HashMap<String, Vec<InteractionId>>,
    bead_types: BeadTypeRegistry,
    exclusions: ExclusionList,
    bc: BoundaryCondition,
    time: f64,
    step: usize,
}

impl Topology {
    /// Creates an empty topology with an open boundary condition.
    pub fn new() -> Self {
        Self::default()
    }

    // ----- creation ------------------------------------------------------

    /// Appends a new bead; its id equals the current bead count.
    ///
    /// Unseen bead types are registered on the fly. The residue id is not
    /// validated here: merge paths create beads and residues in one batch,
    /// and operations that need the residue perform the checked lookup.
    ///
    /// # Panics
    ///
    /// Panics when auto-registering a numeral-named type whose id is already
    /// taken. Mixing numeral and string type names is unsupported; callers
    /// that need the recoverable form pre-register via
    /// [`register_bead_type`](Topology::register_bead_type).
    pub fn create_bead(
        &mut self,
        symmetry: BeadSymmetry,
        name: &str,
        type_name: &str,
        residue: ResidueId,
        mass: f64,
        charge: f64,
    ) -> BeadId {
        match self.try_create_bead(symmetry, name, type_name, residue, mass, charge) {
            Ok(id) => id,
            Err(err) => panic!("create_bead: {err}"),
        }
    }

    fn try_create_bead(
        &mut self,
        symmetry: BeadSymmetry,
        name: &str,
        type_name: &str,
        residue: ResidueId,
        mass: f64,
        charge: f64,
    ) -> Result<BeadId, TopologyError> {
        let type_id = self.bead_types.register(type_name)?;
        let id = BeadId::new(self.beads.len());
        self.beads
            .push(Bead::new(id, symmetry, name, type_id, residue, mass, charge));
        Ok(id)
    }

    /// Appends a new residue; its id equals the current residue count.
    pub fn create_residue(&mut self, name: &str) -> ResidueId {
        let id = ResidueId::new(self.residues.len());
        self.residues.push(Residue::new(id, name));
        id
    }

    /// Appends a new, empty molecule; its id equals the current molecule
    /// count.
    pub fn create_molecule(&mut self, name: &str) -> MoleculeId {
        let id = MoleculeId::new(self.molecules.len());
        self.molecules.push(Molecule::new(id, name));
        id
    }

    /// Registers a bead type, returning its id. Idempotent for known names.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`BeadTypeIdCollision`] when a numeral name's
    /// id is already taken by another type.
    pub fn register_bead_type(&mut self, type_name: &str) -> Result<BeadTypeId, TopologyError> {
        Ok(self.bead_types.register(type_name)?)
    }

    /// Adds a bead to a molecule under a molecule-local name.
    ///
    /// # Errors
    ///
    /// Fails when either id is unknown, the bead already belongs to a
    /// molecule, or the local name is already used within the molecule.
    pub fn add_bead_to_molecule(
        &mut self,
        molecule: MoleculeId,
        bead: BeadId,
        local_name: &str,
    ) -> Result<(), TopologyError> {
        if molecule.index() >= self.molecules.len() {
            return Err(TopologyError::UnknownMolecule(molecule));
        }
        let entry = self
            .beads
            .get(bead.index())
            .ok_or(TopologyError::UnknownBead(bead))?;
        if let Some(owner) = entry.molecule() {
            return Err(TopologyError::BeadAlreadyInMolecule {
                bead,
                molecule: owner,
            });
        }
        self.molecules[molecule.index()].add_bead(bead, local_name)?;
        self.beads[bead.index()].molecule = Some(molecule);
        Ok(())
    }

    /// Adds a bonded interaction, assigning its group id and its index
    /// within the group.
    ///
    /// The group id comes from the per-topology name table: the first
    /// occurrence of a group name allocates the next id, and the assignment
    /// is stable for that name. If the interaction carries a molecule id it
    /// is also registered with that molecule.
    ///
    /// # Errors
    ///
    /// Fails when the interaction references an unknown bead or molecule.
    pub fn add_bonded_interaction(
        &mut self,
        mut interaction: Interaction,
    ) -> Result<InteractionId, TopologyError> {
        for &bead in interaction.kind().bead_ids() {
            if bead.index() >= self.beads.len() {
                return Err(TopologyError::UnknownInteractionBead {
                    group: interaction.group().to_string(),
                    bead,
                });
            }
        }
        if let Some(molecule) = interaction.molecule()
            && molecule.index() >= self.molecules.len()
        {
            return Err(TopologyError::UnknownMolecule(molecule));
        }

        let next_group_id = self.interaction_groups.len();
        let group_id = *self
            .interaction_groups
            .entry(interaction.group().to_string())
            .or_insert(next_group_id);

        let id = InteractionId::new(self.interactions.len());
        let in_group = self
            .interactions_by_group
            .entry(interaction.group().to_string())
            .or_default();
        interaction.assign(group_id, in_group.len());
        in_group.push(id);

        if let Some(molecule) = interaction.molecule() {
            self.molecules[molecule.index()].add_interaction(id);
        }
        self.interactions.push(interaction);
        Ok(id)
    }

    // ----- interactions and exclusions -----------------------------------

    /// Returns all bonded interactions, in insertion order.
    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Returns an interaction by id.
    pub fn interaction(&self, id: InteractionId) -> Option<&Interaction> {
        self.interactions.get(id.index())
    }

    /// Returns the interactions tagged with a group name, in group order.
    /// Unknown groups yield an empty sequence, not an error.
    pub fn interactions_in_group(&self, group: &str) -> Vec<&Interaction> {
        self.interactions_by_group
            .get(group)
            .map(|ids| {
                ids.iter()
                    .map(|id| &self.interactions[id.index()])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the id assigned to an interaction group name, if any.
    pub fn interaction_group_id(&self, group: &str) -> Option<usize> {
        self.interaction_groups.get(group).copied()
    }

    /// Recomputes the exclusion list from the current bonded interactions:
    /// every pair of beads sharing an interaction is excluded.
    ///
    /// The rebuild is total; it must be re-invoked after any change to the
    /// bonded interactions, and calling it twice without intervening changes
    /// yields an identical list.
    pub fn rebuild_exclusions(&mut self) {
        self.exclusions.clear();
        for interaction in &self.interactions {
            self.exclusions.exclude_all(interaction.kind().bead_ids());
        }
        debug!(
            interactions = self.interactions.len(),
            beads = self.exclusions.bead_count(),
            "rebuilt exclusion list"
        );
    }

    /// Returns the current exclusion list.
    pub fn exclusions(&self) -> &ExclusionList {
        &self.exclusions
    }

    // ----- boundary condition and frame metadata --------------------------

    /// Replaces the cell matrix; the box shape is re-derived from it.
    pub fn set_box(&mut self, matrix: Matrix3<f64>) {
        self.bc.set_matrix(matrix);
    }

    /// Returns the boundary condition.
    pub fn boundary(&self) -> &BoundaryCondition {
        &self.bc
    }

    /// Returns the cell matrix.
    pub fn box_matrix(&self) -> &Matrix3<f64> {
        self.bc.matrix()
    }

    /// Returns the derived box shape.
    pub fn box_shape(&self) -> BoxShape {
        self.bc.shape()
    }

    /// Classifies a cell matrix without constructing a boundary condition.
    pub fn auto_detect_box_type(matrix: &Matrix3<f64>) -> BoxShape {
        BoundaryCondition::detect_shape(matrix)
    }

    /// Computes the minimum-image displacement from `r_i` to `r_j` under the
    /// current box shape.
    pub fn bc_shortest_connection(&self, r_i: &Vector3<f64>, r_j: &Vector3<f64>) -> Vector3<f64> {
        self.bc.shortest_connection(r_i, r_j)
    }

    /// Computes the minimum-image displacement between two beads.
    ///
    /// # Errors
    ///
    /// Fails when a bead is unknown or carries no position in the current
    /// frame.
    pub fn dist(&self, bead1: BeadId, bead2: BeadId) -> Result<Vector3<f64>, TopologyError> {
        let r_i = self.bead_position(bead1)?;
        let r_j = self.bead_position(bead2)?;
        Ok(self.bc.shortest_connection(&r_i, &r_j))
    }

    fn bead_position(&self, bead: BeadId) -> Result<Vector3<f64>, TopologyError> {
        self.beads
            .get(bead.index())
            .ok_or(TopologyError::UnknownBead(bead))?
            .position
            .ok_or(TopologyError::MissingPosition(bead))
    }

    /// Returns the cell volume; zero for an open box.
    pub fn box_volume(&self) -> f64 {
        self.bc.volume()
    }

    /// Returns the smallest perpendicular distance between opposing cell
    /// faces.
    ///
    /// # Errors
    ///
    /// Fails for an open box, which has no finite cell.
    pub fn shortest_box_size(&self) -> Result<f64, TopologyError> {
        Ok(self.bc.shortest_dimension()?)
    }

    /// Returns the simulation time of the current frame.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    /// Returns the step number of the current frame.
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn set_step(&mut self, step: usize) {
        self.step = step;
    }

    // ----- queries --------------------------------------------------------

    pub fn bead_count(&self) -> usize {
        self.beads.len()
    }

    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    pub fn molecule_count(&self) -> usize {
        self.molecules.len()
    }

    pub fn interaction_count(&self) -> usize {
        self.interactions.len()
    }

    /// Returns all beads, in id order.
    pub fn beads(&self) -> &[Bead] {
        &self.beads
    }

    /// Returns a bead by id.
    pub fn bead(&self, id: BeadId) -> Option<&Bead> {
        self.beads.get(id.index())
    }

    /// Returns a mutable bead by id, e.g. for readers filling in frame data.
    pub fn bead_mut(&mut self, id: BeadId) -> Option<&mut Bead> {
        self.beads.get_mut(id.index())
    }

    /// Returns all residues, in id order.
    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    /// Returns a residue by id.
    pub fn residue(&self, id: ResidueId) -> Option<&Residue> {
        self.residues.get(id.index())
    }

    /// Returns all molecules, in id order.
    pub fn molecules(&self) -> &[Molecule] {
        &self.molecules
    }

    /// Returns a molecule by id.
    pub fn molecule(&self, id: MoleculeId) -> Option<&Molecule> {
        self.molecules.get(id.index())
    }

    /// Returns the first molecule with the given name.
    pub fn molecule_by_name(&self, name: &str) -> Option<&Molecule> {
        self.molecules.iter().find(|mol| mol.name() == name)
    }

    /// Returns whether a bead type name has been registered.
    pub fn bead_type_exists(&self, type_name: &str) -> bool {
        self.bead_types.contains(type_name)
    }

    /// Returns the id of a registered bead type name.
    pub fn bead_type_id(&self, type_name: &str) -> Option<BeadTypeId> {
        self.bead_types.id(type_name)
    }

    /// Returns the name registered for a bead type id.
    pub fn bead_type_name(&self, id: BeadTypeId) -> Option<&str> {
        self.bead_types.name(id)
    }

    // ----- lifecycle ------------------------------------------------------

    /// Destroys all owned entities and resets the boundary condition to an
    /// open box and time and step to zero.
    ///
    /// Bead-type ids and interaction-group id assignments survive: callers
    /// cache them across frames, and re-reading the same structure must
    /// reproduce them. Called before re-reading a frame into this instance.
    pub fn cleanup(&mut self) {
        self.beads.clear();
        self.residues.clear();
        self.molecules.clear();
        self.interactions.clear();
        self.interactions_by_group.clear();
        self.exclusions.clear();
        self.bc = BoundaryCondition::open();
        self.time = 0.0;
        self.step = 0;
        debug!("topology cleaned up");
    }

    /// Merges another topology into this one.
    ///
    /// Incoming residues are renumbered contiguously after the existing
    /// ones, incoming beads keep their relative residue offsets, and
    /// incoming molecules are regenerated against this topology's own bead
    /// copies (entities are never shared between instances). Bonded
    /// interactions are not merged.
    pub fn add(&mut self, other: &Topology) -> Result<(), TopologyError> {
        let residue_offset = self.residues.len();
        let bead_offset = self.beads.len();

        for residue in &other.residues {
            self.create_residue(&residue.name);
        }
        for bead in &other.beads {
            let type_name = other
                .bead_types
                .name(bead.type_id())
                .expect("bead type is registered in its own topology");
            self.try_create_bead(
                bead.symmetry,
                &bead.name,
                type_name,
                ResidueId::new(bead.residue().index() + residue_offset),
                bead.mass,
                bead.charge,
            )?;
        }
        for molecule in &other.molecules {
            let id = self.create_molecule(molecule.name());
            for (bead, local_name) in molecule.beads() {
                self.add_bead_to_molecule(id, BeadId::new(bead.index() + bead_offset), local_name)?;
            }
        }
        debug!(
            beads = other.beads.len(),
            residues = other.residues.len(),
            molecules = other.molecules.len(),
            "merged topology"
        );
        Ok(())
    }

    /// Replaces this topology's content with a copy of another's: boundary
    /// condition, time, step, residues, beads (including per-frame vectors)
    /// and molecules with their local bead names.
    ///
    /// No entity is shared with `other` afterwards.
    pub fn copy_topology_data(&mut self, other: &Topology) -> Result<(), TopologyError> {
        self.cleanup();
        self.bc = other.bc.clone();
        self.time = other.time;
        self.step = other.step;

        for residue in &other.residues {
            self.create_residue(&residue.name);
        }
        for bead in &other.beads {
            let type_name = other
                .bead_types
                .name(bead.type_id())
                .expect("bead type is registered in its own topology");
            let id = self.try_create_bead(
                bead.symmetry,
                &bead.name,
                type_name,
                bead.residue(),
                bead.mass,
                bead.charge,
            )?;
            let copy = &mut self.beads[id.index()];
            copy.position = bead.position;
            copy.velocity = bead.velocity;
            copy.force = bead.force;
        }
        for molecule in &other.molecules {
            let id = self.create_molecule(molecule.name());
            for (bead, local_name) in molecule.beads() {
                self.add_bead_to_molecule(id, bead, local_name)?;
            }
        }
        Ok(())
    }

    // ----- auto-grouping ---------------------------------------------------

    /// Groups consecutive runs of beads into molecules: `molecule_count`
    /// molecules of `beads_per_molecule` beads each, starting at bead
    /// `first`. Local names are `<residue>:<residue-name>:<bead-name>` with
    /// the residue number relative to each molecule's first bead.
    ///
    /// # Errors
    ///
    /// Fails fast — creating nothing — when the selection reaches past the
    /// last bead, and mid-way when a bead is already grouped or a local name
    /// repeats; the caller is expected to discard and re-populate then.
    pub fn create_molecules_by_range(
        &mut self,
        name: &str,
        first: usize,
        beads_per_molecule: usize,
        molecule_count: usize,
    ) -> Result<(), TopologyError> {
        if beads_per_molecule == 0 || molecule_count == 0 {
            return Ok(());
        }
        let end = beads_per_molecule
            .checked_mul(molecule_count)
            .and_then(|total| first.checked_add(total))
            .unwrap_or(usize::MAX);
        if end > self.beads.len() {
            return Err(TopologyError::BeadRangeOutOfBounds {
                name: name.to_string(),
                first,
                end,
                available: self.beads.len(),
            });
        }

        for chunk in 0..molecule_count {
            let start = first + chunk * beads_per_molecule;
            let residue_offset = self.beads[start].residue().index() as i64;
            let mut entries = Vec::with_capacity(beads_per_molecule);
            for index in start..start + beads_per_molecule {
                let bead = &self.beads[index];
                let residue = self
                    .residues
                    .get(bead.residue().index())
                    .ok_or(TopologyError::UnknownResidue(bead.residue()))?;
                let local_name = format!(
                    "{}:{}:{}",
                    bead.residue().index() as i64 - residue_offset + 1,
                    residue.name,
                    bead.name
                );
                entries.push((bead.id(), local_name));
            }
            let molecule = self.create_molecule(name);
            for (bead, local_name) in entries {
                self.add_bead_to_molecule(molecule, bead, &local_name)?;
            }
        }
        Ok(())
    }

    /// Creates one molecule per residue, named after it, and assigns every
    /// bead to its residue's molecule.
    pub fn create_molecules_by_residue(&mut self) -> Result<(), TopologyError> {
        let molecule_offset = self.molecules.len();
        for index in 0..self.residues.len() {
            let name = self.residues[index].name.clone();
            self.create_molecule(&name);
        }

        let mut assignments = Vec::with_capacity(self.beads.len());
        for bead in &self.beads {
            let residue = self
                .residues
                .get(bead.residue().index())
                .ok_or(TopologyError::UnknownResidue(bead.residue()))?;
            assignments.push((
                bead.id(),
                MoleculeId::new(molecule_offset + bead.residue().index()),
                format!("1:{}:{}", residue.name, bead.name),
            ));
        }
        for (bead, molecule, local_name) in assignments {
            self.add_bead_to_molecule(molecule, bead, &local_name)?;
        }
        Ok(())
    }

    /// Groups every bead into one single molecule.
    pub fn create_one_big_molecule(&mut self, name: &str) -> Result<(), TopologyError> {
        let mut entries = Vec::with_capacity(self.beads.len());
        for bead in &self.beads {
            let residue = self
                .residues
                .get(bead.residue().index())
                .ok_or(TopologyError::UnknownResidue(bead.residue()))?;
            entries.push((
                bead.id(),
                format!(
                    "{}:{}:{}",
                    bead.residue().index() + 1,
                    residue.name,
                    bead.name
                ),
            ));
        }
        let molecule = self.create_molecule(name);
        for (bead, local_name) in entries {
            self.add_bead_to_molecule(molecule, bead, &local_name)?;
        }
        Ok(())
    }

    // ----- bulk edits ------------------------------------------------------

    /// Renames the molecules selected by a 1-based range expression (e.g.
    /// `"2"`, `"1-3"`, `"1:2:7"`).
    ///
    /// The selection is validated in full before anything is renamed.
    pub fn rename_molecules(&mut self, range: &str, name: &str) -> Result<(), TopologyError> {
        let selection = parse_range(range)?;
        for &index in &selection {
            if index == 0 || index > self.molecules.len() {
                return Err(TopologyError::MoleculeIndexOutOfRange {
                    index,
                    count: self.molecules.len(),
                });
            }
        }
        for &index in &selection {
            self.molecules[index - 1].set_name(name);
        }
        Ok(())
    }

    /// Retypes every bead whose type name matches the wildcard pattern,
    /// registering `new_name` if needed. Returns the number of retyped
    /// beads; a pattern matching nothing is a no-op.
    pub fn rename_bead_type(
        &mut self,
        pattern: &str,
        new_name: &str,
    ) -> Result<usize, TopologyError> {
        let matching: Vec<usize> = self
            .beads
            .iter()
            .enumerate()
            .filter(|(_, bead)| {
                self.bead_types
                    .name(bead.type_id())
                    .is_some_and(|type_name| wildcard_match(pattern, type_name))
            })
            .map(|(index, _)| index)
            .collect();
        if matching.is_empty() {
            return Ok(0);
        }
        let new_id = self.bead_types.register(new_name)?;
        let count = matching.len();
        for index in matching {
            self.beads[index].type_id = new_id;
        }
        Ok(count)
    }

    /// Sets the mass of every bead whose type name matches the wildcard
    /// pattern. Returns the number of beads touched.
    pub fn set_bead_type_mass(&mut self, pattern: &str, mass: f64) -> usize {
        let registry = &self.bead_types;
        let mut count = 0;
        for bead in &mut self.beads {
            if registry
                .name(bead.type_id)
                .is_some_and(|type_name| wildcard_match(pattern, type_name))
            {
                bead.mass = mass;
                count += 1;
            }
        }
        count
    }

    /// Verifies that molecules sharing a name have the same bead count.
    ///
    /// # Errors
    ///
    /// Returns the first disagreement found.
    pub fn check_molecule_naming(&self) -> Result<(), TopologyError> {
        let mut bead_counts: HashMap<&str, usize> = HashMap::new();
        for molecule in &self.molecules {
            match bead_counts.entry(molecule.name()) {
                Entry::Occupied(entry) => {
                    if *entry.get() != molecule.bead_count() {
                        return Err(TopologyError::InconsistentMoleculeNaming {
                            name: molecule.name().to_string(),
                            first: *entry.get(),
                            second: molecule.bead_count(),
                        });
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert(molecule.bead_count());
                }
            }
        }
        Ok(())
    }

    // ----- structural comparison -------------------------------------------

    /// Builds the comparison graph of one molecule: a vertex per bead
    /// (carrying its name, type name and mass) and an edge per bond
    /// interaction registered with the molecule.
    ///
    /// Two molecules are structurally equivalent when their graphs' canonical
    /// ids are equal, independent of how their beads happen to be numbered.
    pub fn molecule_graph(&self, molecule: MoleculeId) -> Option<Graph> {
        let mol = self.molecules.get(molecule.index())?;

        let mut nodes = BTreeMap::new();
        for (bead_id, _) in mol.beads() {
            let bead = self.bead(bead_id)?;
            let mut node = GraphNode::new();
            node.set_string("name", &bead.name);
            if let Some(type_name) = self.bead_types.name(bead.type_id()) {
                node.set_string("type", type_name);
            }
            node.set_double("mass", bead.mass);
            nodes.insert(bead_id.index(), node);
        }

        let mut edges = Vec::new();
        for &id in mol.interactions() {
            let interaction = self.interaction(id)?;
            if let InteractionKind::Bond([a, b]) = interaction.kind() {
                edges.push(Edge::new(a.index(), b.index()));
            }
        }
        Some(Graph::new(edges, nodes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds `n` water molecules (residue SOL, beads O/H1/H2, two bonds in
    /// group "BONDS" per molecule), grouped one molecule per residue.
    fn water_topology(n: usize) -> Topology {
        let mut top = Topology::new();
        for _ in 0..n {
            let residue = top.create_residue("SOL");
            let o = top.create_bead(BeadSymmetry::Spherical, "O", "OW", residue, 15.999, -0.8);
            let h1 = top.create_bead(BeadSymmetry::Spherical, "H1", "HW", residue, 1.008, 0.4);
            let h2 = top.create_bead(BeadSymmetry::Spherical, "H2", "HW", residue, 1.008, 0.4);
            let molecule = top.create_molecule("SOL");
            top.add_bead_to_molecule(molecule, o, "1:SOL:O").unwrap();
            top.add_bead_to_molecule(molecule, h1, "1:SOL:H1").unwrap();
            top.add_bead_to_molecule(molecule, h2, "1:SOL:H2").unwrap();
            top.add_bonded_interaction(Interaction::bond("BONDS", o, h1).with_molecule(molecule))
                .unwrap();
            top.add_bonded_interaction(Interaction::bond("BONDS", o, h2).with_molecule(molecule))
                .unwrap();
        }
        top
    }

    mod creation {
        use super::*;

        #[test]
        fn bead_ids_are_contiguous_creation_order() {
            let mut top = Topology::new();
            let residue = top.create_residue("R");
            for expected in 0..5 {
                let id = top.create_bead(
                    BeadSymmetry::Spherical,
                    "B",
                    "T",
                    residue,
                    1.0,
                    0.0,
                );
                assert_eq!(id, BeadId::new(expected));
                assert_eq!(top.bead(id).unwrap().id(), id);
            }
            assert_eq!(top.bead_count(), 5);
        }

        #[test]
        fn create_bead_registers_unseen_types() {
            let mut top = Topology::new();
            let residue = top.create_residue("R");
            top.create_bead(BeadSymmetry::Spherical, "B", "CG1", residue, 1.0, 0.0);
            assert!(top.bead_type_exists("CG1"));
            let type_id = top.bead_type_id("CG1").unwrap();
            assert_eq!(top.bead_type_name(type_id), Some("CG1"));
        }

        #[test]
        #[should_panic(expected = "create_bead")]
        fn create_bead_panics_on_numeral_type_collision() {
            let mut top = Topology::new();
            let residue = top.create_residue("R");
            // "A" takes id 0; the numeral "0" then collides.
            top.create_bead(BeadSymmetry::Spherical, "B", "A", residue, 1.0, 0.0);
            top.create_bead(BeadSymmetry::Spherical, "B", "0", residue, 1.0, 0.0);
        }

        #[test]
        fn register_bead_type_surfaces_the_collision_as_error() {
            let mut top = Topology::new();
            top.register_bead_type("A").unwrap();
            let err = top.register_bead_type("0").unwrap_err();
            assert!(matches!(err, TopologyError::BeadType(_)));
        }

        #[test]
        fn residue_and_molecule_ids_follow_creation_order() {
            let mut top = Topology::new();
            assert_eq!(top.create_residue("R1"), ResidueId::new(0));
            assert_eq!(top.create_residue("R2"), ResidueId::new(1));
            assert_eq!(top.create_molecule("M1"), MoleculeId::new(0));
            assert_eq!(top.create_molecule("M2"), MoleculeId::new(1));
            assert_eq!(top.residue(ResidueId::new(1)).unwrap().name, "R2");
            assert_eq!(top.molecule_by_name("M1").unwrap().id(), MoleculeId::new(0));
        }

        #[test]
        fn a_bead_joins_at_most_one_molecule() {
            let mut top = Topology::new();
            let residue = top.create_residue("R");
            let bead = top.create_bead(BeadSymmetry::Spherical, "B", "T", residue, 1.0, 0.0);
            let first = top.create_molecule("M1");
            let second = top.create_molecule("M2");
            top.add_bead_to_molecule(first, bead, "B").unwrap();
            let err = top.add_bead_to_molecule(second, bead, "B").unwrap_err();
            assert!(matches!(
                err,
                TopologyError::BeadAlreadyInMolecule { molecule, .. } if molecule == first
            ));
            assert_eq!(top.bead(bead).unwrap().molecule(), Some(first));
        }
    }

    mod interactions {
        use super::*;

        #[test]
        fn group_ids_are_assigned_on_first_use() {
            let top = water_topology(2);
            assert_eq!(top.interaction_group_id("BONDS"), Some(0));
            assert_eq!(top.interaction_group_id("ANGLES"), None);
            for interaction in top.interactions() {
                assert_eq!(interaction.group_id(), Some(0));
            }
        }

        #[test]
        fn index_counts_position_within_group() {
            let mut top = water_topology(1);
            let beads: Vec<BeadId> = top.beads().iter().map(|b| b.id()).collect();
            top.add_bonded_interaction(Interaction::angle("ANGLES", beads[1], beads[0], beads[2]))
                .unwrap();
            let bonds = top.interactions_in_group("BONDS");
            assert_eq!(bonds.len(), 2);
            assert_eq!(bonds[0].index(), Some(0));
            assert_eq!(bonds[1].index(), Some(1));
            let angles = top.interactions_in_group("ANGLES");
            assert_eq!(angles.len(), 1);
            assert_eq!(angles[0].group_id(), Some(1));
            assert_eq!(angles[0].index(), Some(0));
        }

        #[test]
        fn unknown_group_yields_an_empty_sequence() {
            let top = water_topology(1);
            assert!(top.interactions_in_group("DIHEDRALS").is_empty());
        }

        #[test]
        fn dangling_bead_references_are_rejected() {
            let mut top = Topology::new();
            let residue = top.create_residue("R");
            let bead = top.create_bead(BeadSymmetry::Spherical, "B", "T", residue, 1.0, 0.0);
            let err = top
                .add_bonded_interaction(Interaction::bond("BONDS", bead, BeadId::new(99)))
                .unwrap_err();
            assert!(matches!(
                err,
                TopologyError::UnknownInteractionBead { bead, .. } if bead == BeadId::new(99)
            ));
            assert_eq!(top.interaction_count(), 0);
            assert!(top.interactions_in_group("BONDS").is_empty());
        }

        #[test]
        fn molecule_bound_interactions_register_with_the_molecule() {
            let top = water_topology(1);
            let molecule = top.molecule(MoleculeId::new(0)).unwrap();
            assert_eq!(molecule.interactions().len(), 2);
        }
    }

    mod exclusions {
        use super::*;

        #[test]
        fn bonds_exclude_their_bead_pairs() {
            let mut top = water_topology(1);
            top.rebuild_exclusions();
            let beads: Vec<BeadId> = top.beads().iter().map(|b| b.id()).collect();
            assert!(top.exclusions().is_excluded(beads[0], beads[1]));
            assert!(top.exclusions().is_excluded(beads[0], beads[2]));
            // H1 and H2 share no interaction.
            assert!(!top.exclusions().is_excluded(beads[1], beads[2]));
        }

        #[test]
        fn angles_exclude_all_three_pairs() {
            let mut top = water_topology(1);
            let beads: Vec<BeadId> = top.beads().iter().map(|b| b.id()).collect();
            top.add_bonded_interaction(Interaction::angle("ANGLES", beads[1], beads[0], beads[2]))
                .unwrap();
            top.rebuild_exclusions();
            assert!(top.exclusions().is_excluded(beads[1], beads[2]));
        }

        #[test]
        fn rebuild_is_idempotent() {
            let mut top = water_topology(3);
            top.rebuild_exclusions();
            let first = top.exclusions().clone();
            top.rebuild_exclusions();
            assert_eq!(&first, top.exclusions());
        }

        #[test]
        fn rebuild_is_total_not_incremental() {
            let mut top = water_topology(1);
            top.rebuild_exclusions();
            assert!(!top.exclusions().is_empty());
            // Dropping all interactions and rebuilding leaves nothing behind.
            top.cleanup();
            top.rebuild_exclusions();
            assert!(top.exclusions().is_empty());
        }
    }

    mod boundary {
        use super::*;

        #[test]
        fn auto_detect_box_type_classifies_matrices() {
            assert_eq!(
                Topology::auto_detect_box_type(&Matrix3::zeros()),
                BoxShape::Open
            );
            assert_eq!(
                Topology::auto_detect_box_type(&Matrix3::from_diagonal(&Vector3::new(
                    1.0, 1.0, 1.0
                ))),
                BoxShape::Orthorhombic
            );
            let mut tilted = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, 1.0));
            tilted[(2, 0)] = 0.3;
            assert_eq!(
                Topology::auto_detect_box_type(&tilted),
                BoxShape::Triclinic
            );
        }

        #[test]
        fn dist_wraps_through_the_box() {
            let mut top = water_topology(1);
            top.set_box(Matrix3::from_diagonal(&Vector3::new(10.0, 10.0, 10.0)));
            let beads: Vec<BeadId> = top.beads().iter().map(|b| b.id()).collect();
            top.bead_mut(beads[0]).unwrap().position = Some(Vector3::new(0.5, 0.0, 0.0));
            top.bead_mut(beads[1]).unwrap().position = Some(Vector3::new(9.5, 0.0, 0.0));
            let d = top.dist(beads[0], beads[1]).unwrap();
            assert!((d - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);
        }

        #[test]
        fn dist_requires_positions() {
            let top = water_topology(1);
            let beads: Vec<BeadId> = top.beads().iter().map(|b| b.id()).collect();
            assert!(matches!(
                top.dist(beads[0], beads[1]),
                Err(TopologyError::MissingPosition(_))
            ));
        }

        #[test]
        fn box_volume_and_shortest_size() {
            let mut top = Topology::new();
            assert_eq!(top.box_volume(), 0.0);
            assert!(matches!(
                top.shortest_box_size(),
                Err(TopologyError::Boundary(BoundaryError::OpenBoxDimension))
            ));
            top.set_box(Matrix3::from_diagonal(&Vector3::new(2.0, 3.0, 4.0)));
            assert_eq!(top.box_volume(), 24.0);
            assert!((top.shortest_box_size().unwrap() - 2.0).abs() < 1e-12);
        }
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn cleanup_matches_a_fresh_topology() {
            let mut top = water_topology(2);
            top.set_box(Matrix3::from_diagonal(&Vector3::new(5.0, 5.0, 5.0)));
            top.set_time(1.5);
            top.set_step(300);
            top.rebuild_exclusions();

            top.cleanup();

            assert_eq!(top.bead_count(), 0);
            assert_eq!(top.residue_count(), 0);
            assert_eq!(top.molecule_count(), 0);
            assert_eq!(top.interaction_count(), 0);
            assert!(top.exclusions().is_empty());
            assert_eq!(top.box_shape(), BoxShape::Open);
            assert_eq!(top.time(), 0.0);
            assert_eq!(top.step(), 0);
            assert!(top.interactions_in_group("BONDS").is_empty());
        }

        #[test]
        fn cleanup_keeps_externally_cached_ids() {
            let mut top = water_topology(1);
            let ow = top.bead_type_id("OW").unwrap();
            assert_eq!(top.interaction_group_id("BONDS"), Some(0));

            top.cleanup();

            // Cached type and group ids stay valid across frames.
            assert_eq!(top.bead_type_id("OW"), Some(ow));
            assert_eq!(top.interaction_group_id("BONDS"), Some(0));
            let residue = top.create_residue("SOL");
            let o = top.create_bead(BeadSymmetry::Spherical, "O", "OW", residue, 15.999, -0.8);
            assert_eq!(top.bead(o).unwrap().type_id(), ow);
        }

        #[test]
        fn add_offsets_residues_and_copies_entities() {
            let mut destination = water_topology(2);
            let source = water_topology(1);

            destination.add(&source).unwrap();

            assert_eq!(destination.residue_count(), 3);
            assert_eq!(destination.bead_count(), 9);
            assert_eq!(destination.molecule_count(), 3);
            // Every merged bead sits in a residue shifted by the prior count.
            for bead in &destination.beads()[6..] {
                assert_eq!(bead.residue(), ResidueId::new(2));
            }
            // Merged molecules reference the destination's own beads.
            let merged = destination.molecule(MoleculeId::new(2)).unwrap();
            let members: Vec<BeadId> = merged.beads().map(|(id, _)| id).collect();
            assert_eq!(
                members,
                vec![BeadId::new(6), BeadId::new(7), BeadId::new(8)]
            );
            assert_eq!(merged.bead_name(0), Some("1:SOL:O"));
        }

        #[test]
        fn copy_topology_data_replaces_content() {
            let mut source = water_topology(1);
            source.set_box(Matrix3::from_diagonal(&Vector3::new(7.0, 7.0, 7.0)));
            source.set_time(2.5);
            source.set_step(50);
            let first = BeadId::new(0);
            source.bead_mut(first).unwrap().position = Some(Vector3::new(1.0, 2.0, 3.0));

            let mut destination = water_topology(3);
            destination.copy_topology_data(&source).unwrap();

            assert_eq!(destination.bead_count(), 3);
            assert_eq!(destination.residue_count(), 1);
            assert_eq!(destination.molecule_count(), 1);
            assert_eq!(destination.box_shape(), BoxShape::Orthorhombic);
            assert_eq!(destination.time(), 2.5);
            assert_eq!(destination.step(), 50);
            assert_eq!(
                destination.bead(first).unwrap().position,
                Some(Vector3::new(1.0, 2.0, 3.0))
            );
            let molecule = destination.molecule(MoleculeId::new(0)).unwrap();
            assert_eq!(molecule.bead_name(2), Some("1:SOL:H2"));
        }

        #[test]
        fn topology_is_send() {
            fn assert_send<T: Send>() {}
            assert_send::<Topology>();
        }
    }

    mod grouping {
        use super::*;

        /// Six ungrouped beads over two residues, three beads each.
        fn ungrouped_topology() -> Topology {
            let mut top = Topology::new();
            for _ in 0..2 {
                let residue = top.create_residue("ETH");
                for b in 0..3 {
                    top.create_bead(
                        BeadSymmetry::Spherical,
                        &format!("C{b}"),
                        "C",
                        residue,
                        12.011,
                        0.0,
                    );
                }
            }
            top
        }

        #[test]
        fn by_range_groups_consecutive_runs() {
            let mut top = ungrouped_topology();
            top.create_molecules_by_range("ETH", 0, 3, 2).unwrap();
            assert_eq!(top.molecule_count(), 2);
            for molecule in top.molecules() {
                assert_eq!(molecule.bead_count(), 3);
            }
            assert_eq!(
                top.molecule(MoleculeId::new(0)).unwrap().bead_name(0),
                Some("1:ETH:C0")
            );
            for bead in top.beads() {
                assert!(bead.molecule().is_some());
            }
        }

        #[test]
        fn by_range_rejects_selections_past_the_last_bead() {
            let mut top = ungrouped_topology();
            let err = top.create_molecules_by_range("ETH", 0, 4, 2).unwrap_err();
            assert!(matches!(err, TopologyError::BeadRangeOutOfBounds { .. }));
            // Fail-fast: nothing was created.
            assert_eq!(top.molecule_count(), 0);
        }

        #[test]
        fn by_range_with_zero_molecules_is_a_no_op() {
            let mut top = ungrouped_topology();
            top.create_molecules_by_range("ETH", 0, 3, 0).unwrap();
            assert_eq!(top.molecule_count(), 0);
        }

        #[test]
        fn by_residue_creates_one_molecule_per_residue() {
            let mut top = ungrouped_topology();
            top.create_molecules_by_residue().unwrap();
            assert_eq!(top.molecule_count(), 2);
            let first = top.molecule(MoleculeId::new(0)).unwrap();
            assert_eq!(first.name(), "ETH");
            assert_eq!(first.bead_count(), 3);
            assert_eq!(first.bead_by_name("1:ETH:C1"), Some(BeadId::new(1)));
        }

        #[test]
        fn one_big_molecule_takes_everything() {
            let mut top = ungrouped_topology();
            top.create_one_big_molecule("ALL").unwrap();
            assert_eq!(top.molecule_count(), 1);
            let molecule = top.molecule(MoleculeId::new(0)).unwrap();
            assert_eq!(molecule.bead_count(), 6);
            // Labels carry the absolute 1-based residue number.
            assert_eq!(molecule.bead_name(3), Some("2:ETH:C0"));
        }

        #[test]
        fn grouping_twice_is_rejected() {
            let mut top = ungrouped_topology();
            top.create_molecules_by_residue().unwrap();
            let err = top.create_one_big_molecule("ALL").unwrap_err();
            assert!(matches!(err, TopologyError::BeadAlreadyInMolecule { .. }));
        }
    }

    mod bulk_edits {
        use super::*;

        #[test]
        fn rename_molecules_applies_to_the_selection() {
            let mut top = water_topology(3);
            top.rename_molecules("1-2", "WATER").unwrap();
            assert_eq!(top.molecule(MoleculeId::new(0)).unwrap().name(), "WATER");
            assert_eq!(top.molecule(MoleculeId::new(1)).unwrap().name(), "WATER");
            assert_eq!(top.molecule(MoleculeId::new(2)).unwrap().name(), "SOL");
        }

        #[test]
        fn rename_molecules_validates_before_renaming() {
            let mut top = water_topology(2);
            let err = top.rename_molecules("2-5", "WATER").unwrap_err();
            assert!(matches!(
                err,
                TopologyError::MoleculeIndexOutOfRange { index: 3, count: 2 }
            ));
            // Nothing was renamed, including the in-range molecule 2.
            assert_eq!(top.molecule(MoleculeId::new(1)).unwrap().name(), "SOL");
        }

        #[test]
        fn rename_bead_type_retypes_matching_beads() {
            let mut top = water_topology(1);
            let count = top.rename_bead_type("H*", "HX").unwrap();
            assert_eq!(count, 2);
            let hx = top.bead_type_id("HX").unwrap();
            assert_eq!(top.bead(BeadId::new(1)).unwrap().type_id(), hx);
            assert_eq!(top.bead(BeadId::new(2)).unwrap().type_id(), hx);
            assert_ne!(top.bead(BeadId::new(0)).unwrap().type_id(), hx);
        }

        #[test]
        fn rename_bead_type_without_matches_registers_nothing() {
            let mut top = water_topology(1);
            assert_eq!(top.rename_bead_type("XYZ*", "NEW").unwrap(), 0);
            assert!(!top.bead_type_exists("NEW"));
        }

        #[test]
        fn set_bead_type_mass_touches_matching_beads() {
            let mut top = water_topology(1);
            assert_eq!(top.set_bead_type_mass("HW", 2.014), 2);
            assert_eq!(top.bead(BeadId::new(1)).unwrap().mass, 2.014);
            assert_eq!(top.bead(BeadId::new(0)).unwrap().mass, 15.999);
        }

        #[test]
        fn check_molecule_naming_rejects_mismatched_bead_counts() {
            let mut top = water_topology(2);
            assert!(top.check_molecule_naming().is_ok());
            let extra = top.create_molecule("SOL");
            let residue = top.create_residue("SOL");
            let bead = top.create_bead(BeadSymmetry::Spherical, "O", "OW", residue, 15.999, -0.8);
            top.add_bead_to_molecule(extra, bead, "1:SOL:O").unwrap();
            let err = top.check_molecule_naming().unwrap_err();
            assert!(matches!(
                err,
                TopologyError::InconsistentMoleculeNaming { first: 3, second: 1, .. }
            ));
        }
    }

    mod comparison {
        use super::*;

        #[test]
        fn equivalent_molecules_share_a_canonical_graph_id() {
            let top = water_topology(2);
            let first = top.molecule_graph(MoleculeId::new(0)).unwrap();
            let second = top.molecule_graph(MoleculeId::new(1)).unwrap();
            // Different beads and vertex ids, identical structure.
            assert_eq!(first, second);
            assert_eq!(first.id(), second.id());
        }

        #[test]
        fn different_structures_get_different_ids() {
            let mut top = water_topology(1);
            let residue = top.create_residue("ION");
            let na = top.create_bead(BeadSymmetry::Spherical, "NA", "NA", residue, 22.99, 1.0);
            let ion = top.create_molecule("NA");
            top.add_bead_to_molecule(ion, na, "1:ION:NA").unwrap();

            let water = top.molecule_graph(MoleculeId::new(0)).unwrap();
            let sodium = top.molecule_graph(MoleculeId::new(1)).unwrap();
            assert_ne!(water, sodium);
        }

        #[test]
        fn unknown_molecule_has_no_graph() {
            let top = water_topology(1);
            assert!(top.molecule_graph(MoleculeId::new(5)).is_none());
        }
    }
}
