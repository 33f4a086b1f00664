use crate::core::models::ids::BeadTypeId;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error(
    "bead type '{name}' is a numeral and its id {id} is already registered; \
     mixing numeral and string bead type names is not supported"
)]
pub struct BeadTypeIdCollision {
    pub name: String,
    pub id: usize,
}

/// Maps bead type names to stable small integer ids for fast comparisons.
///
/// String-named types receive the lowest unused non-negative id. A type name
/// that is itself a numeral claims that numeral as its id, so that type ids
/// stay aligned with external numbering schemes; if that id is already taken
/// the registration is a hard consistency error.
#[derive(Debug, Clone, Default)]
pub struct BeadTypeRegistry {
    ids: HashMap<String, BeadTypeId>,
    names: BTreeMap<BeadTypeId, String>,
}

fn is_numeral(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

impl BeadTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether a type name has been registered.
    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    /// Looks up the id of a registered type name.
    pub fn id(&self, name: &str) -> Option<BeadTypeId> {
        self.ids.get(name).copied()
    }

    /// Looks up the name registered for a type id.
    pub fn name(&self, id: BeadTypeId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterates over (id, name) pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (BeadTypeId, &str)> {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// Registers a type name, returning its id.
    ///
    /// Registration is idempotent: a name that is already registered keeps
    /// its id. Numeral names claim their own value as id; an overly long
    /// numeral that does not fit the id range is treated as an ordinary
    /// string name.
    ///
    /// # Errors
    ///
    /// Returns [`BeadTypeIdCollision`] when a numeral name's id is already
    /// taken by another type.
    pub fn register(&mut self, name: &str) -> Result<BeadTypeId, BeadTypeIdCollision> {
        if let Some(id) = self.ids.get(name) {
            return Ok(*id);
        }

        let mut id = 0usize;
        if is_numeral(name)
            && let Ok(wanted) = name.parse::<usize>()
        {
            if self.names.contains_key(&BeadTypeId::new(wanted)) {
                return Err(BeadTypeIdCollision {
                    name: name.to_string(),
                    id: wanted,
                });
            }
            id = wanted;
        } else {
            while self.names.contains_key(&BeadTypeId::new(id)) {
                id += 1;
            }
        }

        let id = BeadTypeId::new(id);
        self.ids.insert(name.to_string(), id);
        self.names.insert(id, name.to_string());
        Ok(id)
    }
}
