//! Ordered column-to-value mapping for a single row

use super::value::Value;

/// Which side wins when two records share a column name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Values from the merged-in record replace existing ones
    PreferIncoming,
    /// Existing values are kept; only new columns are added
    PreferExisting,
}

/// A single row: column names mapped to values, in insertion order
///
/// Keys are unique. Replacing the value of an existing key keeps the key at
/// its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Record { fields: Vec::new() }
    }

    /// Insert a value, returning the previous value for that key
    pub fn insert<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((key, value));
                None
            }
        }
    }

    /// Builder-style insert
    pub fn with<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    /// Remove a column, returning its value
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let pos = self.fields.iter().position(|(k, _)| k == key)?;
        Some(self.fields.remove(pos).1)
    }

    /// Column names in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether both records carry exactly the same set of keys
    pub fn same_keys(&self, other: &Record) -> bool {
        self.len() == other.len() && self.keys().all(|k| other.contains_key(k))
    }

    /// Merge another record into this one
    ///
    /// New keys are appended in the order of `other`. On a key collision
    /// `policy` decides which value survives; the key keeps its position.
    pub fn merge(&mut self, other: Record, policy: MergePolicy) {
        for (key, value) in other.fields {
            if self.contains_key(&key) && policy == MergePolicy::PreferExisting {
                continue;
            }
            self.insert(key, value);
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut record = Record::new().with("a", 1).with("b", 2);
        let old = record.insert("a", 10);
        assert_eq!(old, Some(Value::Integer(1)));
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(record.get("a"), Some(&Value::Integer(10)));
    }

    #[test]
    fn test_merge_prefers_incoming_on_collision() {
        let mut props = Record::new().with("label", 1).with("area", 12);
        let featurized = Record::new().with("area", 99.5).with("mean", 3.0);
        props.merge(featurized, MergePolicy::PreferIncoming);

        assert_eq!(props.keys().collect::<Vec<_>>(), vec!["label", "area", "mean"]);
        assert_eq!(props.get("area"), Some(&Value::Float(99.5)));
        assert_eq!(props.get("label"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_merge_prefers_existing_on_collision() {
        let mut row = Record::new().with("label", 1).with("area", 12);
        row.merge(Record::new().with("area", 0).with("extra", "x"), MergePolicy::PreferExisting);

        assert_eq!(row.get("area"), Some(&Value::Integer(12)));
        assert_eq!(row.get("extra"), Some(&Value::Text("x".to_string())));
    }

    #[test]
    fn test_same_keys_ignores_order() {
        let a = Record::new().with("min", 0).with("max", 1);
        let b = Record::new().with("max", 5).with("min", 2);
        let c = Record::new().with("min", 0);
        assert!(a.same_keys(&b));
        assert!(!a.same_keys(&c));
    }
}
