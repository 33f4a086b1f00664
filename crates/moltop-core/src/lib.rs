//! # moltop Core Library
//!
//! A molecular-topology engine for particle-based simulations: it maintains
//! the structural model of one simulation frame — beads grouped into
//! residues and molecules, connected by bonded interactions, embedded in a
//! periodic or open cell — and provides a generic graph-canonicalization
//! utility used to classify and compare such structures.
//!
//! ## Architectural Philosophy
//!
//! The library deliberately covers only the in-memory model and its
//! invariants. Readers populate a [`core::models::system::Topology`] once
//! per frame through its creation operations; analysis code queries it and
//! builds comparison graphs from its connectivity. File formats, the
//! per-frame evaluation loop and potential functions are external
//! collaborators with their own crates.
//!
//! Two rules shape the design:
//!
//! - **Single aggregate ownership.** One `Topology` owns every entity of
//!   one frame. Entities are stored in contiguous arenas and referenced by
//!   creation-order ids, so copying or merging topologies never shares
//!   ownership between instances, and resetting for the next frame is a
//!   container clear.
//! - **Content-derived identity.** Graph comparison never looks at how
//!   vertices happen to be numbered: a graph's canonical id is computed
//!   from node content alone, making structural equivalence checks stable
//!   across renumbering and re-reading.

pub mod core;
