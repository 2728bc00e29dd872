//! Results returned by [`EntityRepository`](crate::EntityRepository).

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::value::Value;

/// One hydrated row.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    entity: String,
    id: Uuid,
    fields: BTreeMap<String, Value>,
    associations: BTreeMap<String, AssociationValue>,
}

impl Entity {
    pub(crate) fn new(entity: &str, id: Uuid, fields: BTreeMap<String, Value>) -> Self {
        Self {
            entity: entity.to_owned(),
            id,
            fields,
            associations: BTreeMap::new(),
        }
    }

    pub(crate) fn set_association(&mut self, name: &str, value: AssociationValue) {
        self.associations.insert(name.to_owned(), value);
    }

    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Field value by field name; `None` for unknown fields.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    /// Loaded association; `None` when it was not requested.
    #[must_use]
    pub fn association(&self, name: &str) -> Option<&AssociationValue> {
        self.associations.get(name)
    }

    /// Loaded to-one association. `None` when not requested, not set or hidden.
    #[must_use]
    pub fn one(&self, name: &str) -> Option<&Entity> {
        match self.associations.get(name)? {
            AssociationValue::One(entity) => entity.as_deref(),
            AssociationValue::Many(_) => None,
        }
    }

    /// Loaded to-many association; empty when not requested.
    #[must_use]
    pub fn many(&self, name: &str) -> &[Entity] {
        match self.associations.get(name) {
            Some(AssociationValue::Many(entities)) => entities,
            _ => &[],
        }
    }
}

/// Value of a loaded association.
#[derive(Debug, Clone, PartialEq)]
pub enum AssociationValue {
    One(Option<Box<Entity>>),
    Many(Vec<Entity>),
}

/// Entities matching a search, in result order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntitySearchResult {
    total: u64,
    entities: Vec<Entity>,
    aggregations: AggregationResultCollection,
}

impl EntitySearchResult {
    pub(crate) fn new(
        total: u64,
        entities: Vec<Entity>,
        aggregations: AggregationResultCollection,
    ) -> Self {
        Self {
            total,
            entities,
            aggregations,
        }
    }

    #[must_use]
    pub fn has(&self, id: Uuid) -> bool {
        self.entities.iter().any(|e| e.id == id)
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// Number of visible matches ignoring limit and offset.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub fn ids(&self) -> Vec<Uuid> {
        self.entities.iter().map(|e| e.id).collect()
    }

    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn aggregations(&self) -> &AggregationResultCollection {
        &self.aggregations
    }
}

/// Ids matching a search, in result order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdSearchResult {
    total: u64,
    ids: Vec<Uuid>,
}

impl IdSearchResult {
    pub(crate) fn new(total: u64, ids: Vec<Uuid>) -> Self {
        Self { total, ids }
    }

    #[must_use]
    pub fn ids(&self) -> &[Uuid] {
        &self.ids
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub fn contains(&self, id: Uuid) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A terms bucket: one distinct value and the root ids carrying it.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub key: Value,
    pub ids: Vec<Uuid>,
}

impl Bucket {
    #[must_use]
    pub fn count(&self) -> usize {
        self.ids.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregationResult {
    /// Distinct values, ascending.
    Value(Vec<Value>),
    /// One bucket per distinct value, ascending by key.
    Terms(Vec<Bucket>),
    /// Number of distinct values.
    Count(u64),
    /// `None` when no value contributed.
    Metric(Option<f64>),
}

impl AggregationResult {
    #[must_use]
    pub fn values(&self) -> Option<&[Value]> {
        match self {
            Self::Value(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub fn buckets(&self) -> Option<&[Bucket]> {
        match self {
            Self::Terms(buckets) => Some(buckets),
            _ => None,
        }
    }

    #[must_use]
    pub fn count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn metric(&self) -> Option<f64> {
        match self {
            Self::Metric(m) => *m,
            _ => None,
        }
    }
}

/// Aggregation results by aggregation name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationResultCollection {
    results: BTreeMap<String, AggregationResult>,
}

impl AggregationResultCollection {
    pub(crate) fn insert(&mut self, name: &str, result: AggregationResult) {
        self.results.insert(name.to_owned(), result);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AggregationResult> {
        self.results.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AggregationResult)> {
        self.results.iter().map(|(k, v)| (k.as_str(), v))
    }
}
