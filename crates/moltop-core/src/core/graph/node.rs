use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// A typed key/value payload attached to a graph vertex.
///
/// A node holds integer, floating-point and string scalars, each keyed by
/// name, and has no identity beyond that content: two nodes with equal
/// content are equal wherever they sit in a graph. The content is folded
/// into a deterministic string id (entries sorted by key, integers first,
/// then floats, then strings) which the graph canonicalization builds on.
#[derive(Debug, Clone, Default)]
pub struct GraphNode {
    int_values: BTreeMap<String, i64>,
    double_values: BTreeMap<String, f64>,
    string_values: BTreeMap<String, String>,
    id: String,
}

impl GraphNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a node from complete value maps.
    pub fn with_values(
        int_values: BTreeMap<String, i64>,
        double_values: BTreeMap<String, f64>,
        string_values: BTreeMap<String, String>,
    ) -> Self {
        let mut node = Self {
            int_values,
            double_values,
            string_values,
            id: String::new(),
        };
        node.rebuild_id();
        node
    }

    /// Sets an integer entry.
    pub fn set_int(&mut self, key: &str, value: i64) {
        self.int_values.insert(key.to_string(), value);
        self.rebuild_id();
    }

    /// Sets a floating-point entry.
    pub fn set_double(&mut self, key: &str, value: f64) {
        self.double_values.insert(key.to_string(), value);
        self.rebuild_id();
    }

    /// Sets a string entry.
    pub fn set_string(&mut self, key: &str, value: &str) {
        self.string_values
            .insert(key.to_string(), value.to_string());
        self.rebuild_id();
    }

    /// Returns an integer entry.
    pub fn int(&self, key: &str) -> Option<i64> {
        self.int_values.get(key).copied()
    }

    /// Returns a floating-point entry.
    pub fn double(&self, key: &str) -> Option<f64> {
        self.double_values.get(key).copied()
    }

    /// Returns a string entry.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.string_values.get(key).map(String::as_str)
    }

    /// Returns the deterministic serialization of the node's content.
    pub fn id(&self) -> &str {
        &self.id
    }

    fn rebuild_id(&mut self) {
        // BTreeMap iteration is already sorted by key.
        let mut id = String::new();
        for (key, value) in &self.int_values {
            id.push_str(key);
            id.push_str(&value.to_string());
        }
        for (key, value) in &self.double_values {
            id.push_str(key);
            id.push_str(&value.to_string());
        }
        for (key, value) in &self.string_values {
            id.push_str(key);
            id.push_str(value);
        }
        self.id = id;
    }
}

impl PartialEq for GraphNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for GraphNode {}

impl PartialOrd for GraphNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GraphNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_concatenates_sorted_entries() {
        let mut node = GraphNode::new();
        node.set_int("b", 2);
        node.set_int("a", 1);
        assert_eq!(node.id(), "a1b2");
    }

    #[test]
    fn id_orders_ints_before_doubles_before_strings() {
        let mut node = GraphNode::new();
        node.set_string("name", "CA");
        node.set_double("mass", 12.011);
        node.set_int("z", 6);
        assert_eq!(node.id(), "z6mass12.011nameCA");
    }

    #[test]
    fn id_updates_on_every_mutation() {
        let mut node = GraphNode::new();
        assert_eq!(node.id(), "");
        node.set_int("a", 0);
        assert_eq!(node.id(), "a0");
        node.set_int("a", 5);
        assert_eq!(node.id(), "a5");
    }

    #[test]
    fn whole_doubles_serialize_without_fraction() {
        let mut node = GraphNode::new();
        node.set_double("m", 1.0);
        assert_eq!(node.id(), "m1");
    }

    #[test]
    fn equality_follows_content_not_insertion_order() {
        let mut first = GraphNode::new();
        first.set_int("a", 1);
        first.set_string("s", "x");

        let mut second = GraphNode::new();
        second.set_string("s", "x");
        second.set_int("a", 1);

        assert_eq!(first, second);

        second.set_int("a", 2);
        assert_ne!(first, second);
    }

    #[test]
    fn ordering_compares_serialized_content() {
        let mut small = GraphNode::new();
        small.set_int("a", 1);
        let mut large = GraphNode::new();
        large.set_int("b", 1);
        assert!(small < large);
    }

    #[test]
    fn typed_getters_do_not_cross_kinds() {
        let mut node = GraphNode::new();
        node.set_int("x", 3);
        assert_eq!(node.int("x"), Some(3));
        assert_eq!(node.double("x"), None);
        assert_eq!(node.string("x"), None);
        assert_eq!(node.int("y"), None);
    }
}
