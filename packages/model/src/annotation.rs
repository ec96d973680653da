use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Character-level markup such as `textStyle/bold` or `link/wikiLink`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub annotation_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, Value>>,
}

impl Annotation {
    pub fn new(annotation_type: impl Into<String>) -> Self {
        Self {
            annotation_type: annotation_type.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Content hash: the canonical JSON text of the annotation (keys sorted, empty data omitted)
    pub fn hash(&self) -> String {
        let canonical = self.normalized();
        serde_json::to_string(&canonical).unwrap_or_default()
    }

    /// Copy with an empty data map dropped
    pub fn normalized(&self) -> Self {
        Self {
            annotation_type: self.annotation_type.clone(),
            data: self.data.clone().filter(|data| !data.is_empty()),
        }
    }

    /// Part of the type before the first `/`
    pub fn base_type(&self) -> &str {
        split_type(&self.annotation_type).0
    }

    /// Part of the type after the first `/`, empty when there is none
    pub fn sub_type(&self) -> &str {
        split_type(&self.annotation_type).1
    }

    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.as_ref()?.get(key)?.as_str()
    }
}

pub fn split_type(annotation_type: &str) -> (&str, &str) {
    annotation_type
        .split_once('/')
        .unwrap_or((annotation_type, ""))
}

/// Set of annotations keyed by their hash. Iteration is in hash order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationSet(BTreeMap<String, Annotation>);

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an annotation; returns false if it was already present
    pub fn insert(&mut self, annotation: Annotation) -> bool {
        let hash = annotation.hash();
        self.insert_hashed(hash, annotation)
    }

    pub fn insert_hashed(&mut self, hash: String, annotation: Annotation) -> bool {
        if self.0.contains_key(&hash) {
            return false;
        }
        self.0.insert(hash, annotation);
        true
    }

    pub fn remove(&mut self, hash: &str) -> Option<Annotation> {
        self.0.remove(hash)
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.0.contains_key(hash)
    }

    pub fn contains_annotation(&self, annotation: &Annotation) -> bool {
        self.contains(&annotation.hash())
    }

    pub fn get(&self, hash: &str) -> Option<&Annotation> {
        self.0.get(hash)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Annotation)> {
        self.0.iter()
    }

    pub fn hashes(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.0.values()
    }

    /// Keep only the annotations also present in `other`
    pub fn retain_common(&mut self, other: &AnnotationSet) {
        self.0.retain(|hash, _| other.contains(hash));
    }
}

impl FromIterator<Annotation> for AnnotationSet {
    fn from_iter<I: IntoIterator<Item = Annotation>>(iter: I) -> Self {
        let mut set = AnnotationSet::new();
        for annotation in iter {
            set.insert(annotation);
        }
        set
    }
}
