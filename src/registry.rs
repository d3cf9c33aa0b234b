//! Registry: accumulate assembled entries across files, keyed by ref.
//!
//! A second registration for a known ref is merged field by field into the
//! first. Later explicit values win; absent values never erase present ones.
//! Schema trees merge recursively by key.

use crate::diagnostics::Problem;
use crate::model::{Endpoint, ObjectDoc, Origin};
use serde::Serialize;
use std::collections::btree_map::{self, BTreeMap};

/// Something the registry can hold and merge.
pub trait Registrable {
    fn reference(&self) -> &str;

    fn sources(&self) -> &[Origin];

    /// Check whether `later` may be merged into `self`. Called before any
    /// mutation so a rejected registration leaves `self` untouched.
    fn check_merge(&self, later: &Self) -> Result<(), Problem>;

    fn merge_from(&mut self, later: Self);
}

impl Registrable for Endpoint {
    fn reference(&self) -> &str {
        &self.reference
    }

    fn sources(&self) -> &[Origin] {
        &self.sources
    }

    fn check_merge(&self, later: &Self) -> Result<(), Problem> {
        match (self.uri.as_str(), later.uri.as_str()) {
            (Some(existing), Some(incoming)) if existing != incoming => Err(Problem::Conflict {
                reference: self.reference.clone(),
                existing: existing.to_string(),
                incoming: incoming.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn merge_from(&mut self, later: Self) {
        self.name.overlay(later.name);
        self.uri.overlay(later.uri);
        self.description.overlay(later.description);
        self.parameters.merge_from(later.parameters);
        self.returns.merge_from(later.returns);
        self.sources.extend(later.sources);
    }
}

impl Registrable for ObjectDoc {
    fn reference(&self) -> &str {
        &self.reference
    }

    fn sources(&self) -> &[Origin] {
        &self.sources
    }

    fn check_merge(&self, _later: &Self) -> Result<(), Problem> {
        Ok(())
    }

    fn merge_from(&mut self, later: Self) {
        self.name.overlay(later.name);
        self.description.overlay(later.description);
        self.properties.merge_from(later.properties);
        self.sources.extend(later.sources);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registered {
    Inserted,
    Merged,
}

/// Run-scoped map from ref to entry. Iterates in ref order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry<T> {
    entries: BTreeMap<String, T>,
}

pub type EndpointRegistry = Registry<Endpoint>;
pub type ObjectRegistry = Registry<ObjectDoc>;

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: Registrable> Registry<T> {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Insert a new ref, or merge into the existing one. On conflict the
    /// existing entry is kept unchanged and the incoming one is dropped.
    pub fn register(&mut self, entry: T) -> Result<Registered, Problem> {
        match self.entries.entry(entry.reference().to_string()) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(entry);
                Ok(Registered::Inserted)
            }
            btree_map::Entry::Occupied(mut slot) => {
                slot.get().check_merge(&entry)?;
                slot.get_mut().merge_from(entry);
                Ok(Registered::Merged)
            }
        }
    }

    pub fn get(&self, reference: &str) -> Option<&T> {
        self.entries.get(reference)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }
}

impl<T: Serialize> Serialize for Registry<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}

/// Both registries of a run: the output model handed to emitters.
#[derive(Debug, Default, Serialize)]
pub struct Catalog {
    #[serde(rename = "actions")]
    pub endpoints: EndpointRegistry,
    pub objects: ObjectRegistry,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldNode, Setting};
    use pretty_assertions::assert_eq;

    fn user_returns(id_description: &str) -> FieldNode {
        let mut root = FieldNode::root();
        let user = root.child_entry("user");
        user.type_hint = Setting::text("Object");
        let id = user.child_entry("id");
        id.type_hint = Setting::text("Integer");
        id.description = Setting::text(id_description);
        root
    }

    fn get_user(uri: &str, id_description: &str, line: usize) -> Endpoint {
        Endpoint {
            name: Setting::text("Get User"),
            reference: "/MyApp/User/Get".to_string(),
            uri: Setting::text(uri),
            description: Setting::text("Fetch a user from the application."),
            returns: user_returns(id_description),
            sources: vec![Origin::new("test.php", line)],
            ..Default::default()
        }
    }

    #[test]
    fn later_adds_uri_and_keeps_prior_description() {
        let mut registry = EndpointRegistry::new();
        let first = get_user("", "The unique ID that represents this user in the system.", 4);
        assert_eq!(registry.register(first), Ok(Registered::Inserted));
        assert_eq!(registry.register(get_user("/api/user/get", "", 4)), Ok(Registered::Merged));

        let merged = registry.get("/MyApp/User/Get").unwrap();
        assert_eq!(merged.uri.as_str(), Some("/api/user/get"));
        assert_eq!(
            merged.returns.lookup("user.id").unwrap().description.as_str(),
            Some("The unique ID that represents this user in the system.")
        );
        assert_eq!(merged.sources.len(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn merging_empty_registration_is_identity() {
        let mut registry = EndpointRegistry::new();
        let original = get_user("/api/user/get", "The id.", 4);
        registry.register(original.clone()).unwrap();
        registry
            .register(Endpoint {
                reference: original.reference.clone(),
                ..Default::default()
            })
            .unwrap();

        let merged = registry.get(&original.reference).unwrap();
        assert_eq!(merged, &original);
    }

    #[test]
    fn explicit_later_values_win() {
        let mut registry = EndpointRegistry::new();
        registry.register(get_user("/a", "Old.", 1)).unwrap();
        let mut later = get_user("/a", "New.", 9);
        later.name = Setting::text("Fetch User");
        registry.register(later).unwrap();

        let merged = registry.get("/MyApp/User/Get").unwrap();
        assert_eq!(merged.name.as_str(), Some("Fetch User"));
        assert_eq!(merged.returns.lookup("user.id").unwrap().description.as_str(), Some("New."));
    }

    #[test]
    fn conflicting_uri_rejected_and_earlier_kept() {
        let mut registry = EndpointRegistry::new();
        registry.register(get_user("/api/user/get", "Kept.", 1)).unwrap();
        let mut later = get_user("/api/v2/user", "Dropped.", 9);
        later.name = Setting::text("Other");

        let err = registry.register(later).unwrap_err();
        assert_eq!(
            err,
            Problem::Conflict {
                reference: "/MyApp/User/Get".to_string(),
                existing: "/api/user/get".to_string(),
                incoming: "/api/v2/user".to_string(),
            }
        );
        let kept = registry.get("/MyApp/User/Get").unwrap();
        assert_eq!(kept.name.as_str(), Some("Get User"));
        assert_eq!(kept.sources.len(), 1);
    }

    #[test]
    fn objects_merge_without_conflict() {
        let mut registry = ObjectRegistry::new();
        let mut first = ObjectDoc {
            reference: "/Application/User".to_string(),
            description: Setting::text("A user."),
            ..Default::default()
        };
        first.properties.child_entry("id");
        registry.register(first).unwrap();

        let mut second = ObjectDoc {
            reference: "/Application/User".to_string(),
            name: Setting::text("User"),
            ..Default::default()
        };
        second.properties.child_entry("email");
        registry.register(second).unwrap();

        let merged = registry.get("/Application/User").unwrap();
        assert_eq!(merged.name.as_str(), Some("User"));
        assert_eq!(merged.description.as_str(), Some("A user."));
        assert_eq!(merged.properties.children.len(), 2);
    }

    #[test]
    fn iterates_in_ref_order() {
        let mut registry = EndpointRegistry::new();
        for r in ["/b", "/a", "/c"] {
            registry
                .register(Endpoint {
                    reference: r.to_string(),
                    ..Default::default()
                })
                .unwrap();
        }
        let refs: Vec<_> = registry.iter().map(|e| e.reference.as_str()).collect();
        assert_eq!(refs, ["/a", "/b", "/c"]);
    }
}
