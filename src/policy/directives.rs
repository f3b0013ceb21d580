// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Insertion-ordered directive map

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Directive name -> ordered, duplicate-free source list.
///
/// Order of directives is the order they were first inserted, which keeps
/// serialization deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveMap {
    entries: Vec<(String, Vec<String>)>,
}

impl DirectiveMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of directives
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no directive is present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sources of a directive
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, sources)| sources.as_slice())
    }

    /// Whether a directive is present (possibly with no sources)
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    /// Whether `source` is listed under `name`
    pub fn contains_source(&self, name: &str, source: &str) -> bool {
        self.get(name)
            .map(|sources| sources.iter().any(|s| s == source))
            .unwrap_or(false)
    }

    /// Directive names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Iterate directives in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(n, sources)| (n.as_str(), sources.as_slice()))
    }

    /// Replace the sources of `name`, keeping its position if present.
    /// Repeated sources collapse to their first occurrence.
    pub fn set<I, S>(&mut self, name: &str, sources: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut deduped: Vec<String> = Vec::new();
        for source in sources {
            let source = source.into();
            if !deduped.contains(&source) {
                deduped.push(source);
            }
        }

        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = deduped,
            None => self.entries.push((name.to_string(), deduped)),
        }
    }

    /// Append `source` to `name`, creating the directive if needed.
    /// Returns false when the source was already listed.
    pub fn insert_source(&mut self, name: &str, source: &str) -> bool {
        let idx = match self.entries.iter().position(|(n, _)| n == name) {
            Some(idx) => idx,
            None => {
                self.entries.push((name.to_string(), Vec::new()));
                self.entries.len() - 1
            }
        };
        let sources = &mut self.entries[idx].1;

        if sources.iter().any(|s| s == source) {
            return false;
        }
        sources.push(source.to_string());
        true
    }

    /// Order-insensitive view, used for comparisons
    pub fn to_source_sets(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.entries
            .iter()
            .map(|(n, sources)| (n.clone(), sources.iter().cloned().collect()))
            .collect()
    }
}

impl<N, S> FromIterator<(N, Vec<S>)> for DirectiveMap
where
    N: AsRef<str>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (N, Vec<S>)>>(iter: T) -> Self {
        let mut map = DirectiveMap::new();
        for (name, sources) in iter {
            map.set(name.as_ref(), sources);
        }
        map
    }
}

impl Serialize for DirectiveMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, sources) in &self.entries {
            map.serialize_entry(name, sources)?;
        }
        map.end()
    }
}

struct DirectiveMapVisitor;

impl<'de> Visitor<'de> for DirectiveMapVisitor {
    type Value = DirectiveMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of directive names to lists of sources")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = DirectiveMap::new();
        while let Some((name, sources)) = access.next_entry::<String, Vec<String>>()? {
            map.set(&name, sources);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for DirectiveMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DirectiveMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_source_dedupes() {
        let mut map = DirectiveMap::new();
        assert!(map.insert_source("img-src", "https://a.example/x.png"));
        assert!(!map.insert_source("img-src", "https://a.example/x.png"));
        assert_eq!(map.get("img-src").unwrap().len(), 1);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut map = DirectiveMap::new();
        map.set("default-src", ["'self'"]);
        map.set("script-src", ["'self'"]);
        map.set("default-src", ["'none'", "'none'"]);

        let names: Vec<&str> = map.names().collect();
        assert_eq!(names, vec!["default-src", "script-src"]);
        assert_eq!(map.get("default-src").unwrap(), ["'none'".to_string()]);
    }

    #[test]
    fn test_json_preserves_order() {
        let json = r#"{"style-src":["'self'"],"default-src":["'self'"],"img-src":[]}"#;
        let map: DirectiveMap = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = map.names().collect();
        assert_eq!(names, vec!["style-src", "default-src", "img-src"]);
        assert_eq!(serde_json::to_string(&map).unwrap(), json);
    }

    #[test]
    fn test_source_sets_ignore_order() {
        let a: DirectiveMap = vec![("script-src", vec!["'self'", "https://x"])]
            .into_iter()
            .collect();
        let b: DirectiveMap = vec![("script-src", vec!["https://x", "'self'"])]
            .into_iter()
            .collect();
        assert_ne!(a, b);
        assert_eq!(a.to_source_sets(), b.to_source_sets());
    }
}
