//! In-process [`DocumentStore`] that evaluates typed pipelines directly.
//!
//! Collections are plain vectors of JSON documents kept in insertion order.
//! Clones share the same data, so a test can keep a handle for mutation
//! while the service holds another.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use propstore_model::{ObjectId, fields};
use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::pipeline::{
    CleanupRule, CleanupStage, JoinStage, MatchPredicate, MatchTerm, Pipeline,
    Stage,
};

use super::{AggregateBatch, DocumentStore};

type Collections = HashMap<String, Vec<Value>>;

#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, collection: &str, document: Value) {
        let mut guard = self.collections.write().await;
        guard.entry(collection.to_string()).or_default().push(document);
    }

    pub async fn insert_many(
        &self,
        collection: &str,
        documents: impl IntoIterator<Item = Value>,
    ) {
        let mut guard = self.collections.write().await;
        guard
            .entry(collection.to_string())
            .or_default()
            .extend(documents);
    }

    /// Serialize a typed record and store it.
    pub async fn insert_record<T: Serialize>(
        &self,
        collection: &str,
        record: &T,
    ) -> StoreResult<()> {
        let document = serde_json::to_value(record)
            .map_err(|e| StoreError::Rejected(e.to_string()))?;
        self.insert(collection, document).await;
        Ok(())
    }

    /// Apply `update` to every document matching `filter`. Returns how many
    /// documents were touched.
    pub async fn update_where(
        &self,
        collection: &str,
        filter: impl Fn(&Value) -> bool,
        mut update: impl FnMut(&mut Value),
    ) -> usize {
        let mut guard = self.collections.write().await;
        let Some(documents) = guard.get_mut(collection) else {
            return 0;
        };

        let mut touched = 0;
        for document in documents.iter_mut().filter(|doc| filter(doc)) {
            update(document);
            touched += 1;
        }
        touched
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    pub async fn is_empty(&self) -> bool {
        self.collections.read().await.values().all(Vec::is_empty)
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn aggregate(&self, pipeline: &Pipeline) -> StoreResult<AggregateBatch> {
        let guard = self.collections.read().await;
        let batch = evaluate(&guard, pipeline)?;
        debug!(
            "in-memory aggregate on {}: {} stages, {} documents",
            pipeline.collection(),
            pipeline.len(),
            batch.documents.len()
        );
        Ok(batch)
    }
}

fn evaluate(
    collections: &Collections,
    pipeline: &Pipeline,
) -> StoreResult<AggregateBatch> {
    let mut documents = collections
        .get(pipeline.collection())
        .cloned()
        .unwrap_or_default();
    let mut oversize_dropped = None;

    for stage in pipeline.stages() {
        documents = match stage {
            Stage::Match(predicate) => {
                let matcher = Matcher::compile(predicate)?;
                documents
                    .into_iter()
                    .filter(|doc| matcher.matches(doc))
                    .collect()
            }
            Stage::Join(join) => {
                let foreign = collections
                    .get(&join.from)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                documents
                    .into_iter()
                    .map(|doc| attach(doc, join, foreign))
                    .collect()
            }
            Stage::Cleanup(cleanup) => documents
                .into_iter()
                .map(|doc| clean(doc, cleanup))
                .collect(),
            Stage::SizeGuard(guard) => {
                let before = documents.len();
                let mut kept = Vec::with_capacity(before);
                for doc in documents {
                    if serialized_len(&doc)? <= guard.max_bytes {
                        kept.push(doc);
                    }
                }
                let dropped = (before - kept.len()) as u64;
                oversize_dropped =
                    Some(oversize_dropped.unwrap_or(0) + dropped);
                kept
            }
            Stage::Skip(n) => documents
                .into_iter()
                .skip(usize::try_from(*n).unwrap_or(usize::MAX))
                .collect(),
            Stage::Limit(n) => documents
                .into_iter()
                .take(usize::try_from(*n).unwrap_or(usize::MAX))
                .collect(),
            Stage::Count(count) => {
                // A count over nothing produces no document at all.
                if documents.is_empty() {
                    Vec::new()
                } else {
                    let mut doc = Map::new();
                    doc.insert(
                        count.output.to_string(),
                        Value::from(documents.len()),
                    );
                    vec![Value::Object(doc)]
                }
            }
        };
    }

    Ok(AggregateBatch {
        documents,
        oversize_dropped,
    })
}

fn serialized_len(doc: &Value) -> StoreResult<u64> {
    serde_json::to_vec(doc)
        .map(|bytes| bytes.len() as u64)
        .map_err(|e| StoreError::Rejected(e.to_string()))
}

fn attach(mut doc: Value, join: &JoinStage, foreign: &[Value]) -> Value {
    let related: Vec<Value> = match doc.get(join.local_field) {
        Some(key) if !key.is_null() => foreign
            .iter()
            .filter(|candidate| candidate.get(join.foreign_field) == Some(key))
            .take(join.cap.get() as usize)
            .cloned()
            .collect(),
        _ => Vec::new(),
    };

    if let Value::Object(map) = &mut doc {
        map.insert(join.output.to_string(), Value::Array(related));
    }
    doc
}

fn clean(mut doc: Value, cleanup: &CleanupStage) -> Value {
    let Value::Object(map) = &mut doc else {
        return doc;
    };

    for rule in &cleanup.rules {
        let items = match map.remove(rule.field()) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };

        let cleaned = match rule {
            CleanupRule::First { .. } => {
                items.into_iter().next().unwrap_or(Value::Null)
            }
            CleanupRule::KeepFlagged { flag, cap, .. } => Value::Array(
                items
                    .into_iter()
                    .filter(|item| item.get(*flag) == Some(&Value::Bool(true)))
                    .take(cap.get() as usize)
                    .collect(),
            ),
            CleanupRule::Truncate { cap, .. } => Value::Array(
                items.into_iter().take(cap.get() as usize).collect(),
            ),
        };
        map.insert(rule.field().to_string(), cleaned);
    }
    doc
}

/// A match predicate prepared for repeated evaluation.
struct Matcher<'a> {
    terms: Vec<CompiledTerm<'a>>,
}

enum CompiledTerm<'a> {
    Contains {
        field: &'static str,
        pattern: Regex,
    },
    Range {
        field: &'static str,
        min: Option<Decimal>,
        max: Option<Decimal>,
    },
    Id(&'a ObjectId),
    Key {
        field: &'static str,
        value: &'a str,
    },
}

impl<'a> Matcher<'a> {
    fn compile(predicate: &'a MatchPredicate) -> StoreResult<Self> {
        let terms = predicate
            .terms()
            .iter()
            .map(|term| -> StoreResult<CompiledTerm<'a>> {
                Ok(match term {
                    MatchTerm::Contains { field, needle } => {
                        let pattern = RegexBuilder::new(&regex::escape(needle))
                            .case_insensitive(true)
                            .build()
                            .map_err(|e| StoreError::Rejected(e.to_string()))?;
                        CompiledTerm::Contains {
                            field: *field,
                            pattern,
                        }
                    }
                    MatchTerm::Range { field, min, max } => CompiledTerm::Range {
                        field: *field,
                        min: *min,
                        max: *max,
                    },
                    MatchTerm::IdEquals(id) => CompiledTerm::Id(id),
                    MatchTerm::KeyEquals { field, value } => CompiledTerm::Key {
                        field: *field,
                        value: value.as_str(),
                    },
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Self { terms })
    }

    fn matches(&self, doc: &Value) -> bool {
        self.terms.iter().all(|term| match term {
            CompiledTerm::Contains { field, pattern } => doc
                .get(*field)
                .and_then(Value::as_str)
                .is_some_and(|text| pattern.is_match(text)),
            CompiledTerm::Range { field, min, max } => {
                let Some(value) = doc.get(*field).and_then(decimal_of) else {
                    return false;
                };
                min.is_none_or(|min| value >= min)
                    && max.is_none_or(|max| value <= max)
            }
            CompiledTerm::Id(id) => doc
                .get(fields::ID)
                .and_then(object_id_of)
                .is_some_and(|stored| stored == **id),
            CompiledTerm::Key { field, value } => {
                doc.get(*field).and_then(Value::as_str) == Some(*value)
            }
        })
    }
}

/// Reads decimals stored as strings, plain numbers or `$numberDecimal`.
fn decimal_of(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(raw) => Decimal::from_str(raw.trim()).ok(),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Some(Decimal::from(int))
            } else {
                number.as_f64().and_then(|f| Decimal::try_from(f).ok())
            }
        }
        Value::Object(map) => map.get("$numberDecimal").and_then(decimal_of),
        _ => None,
    }
}

fn object_id_of(value: &Value) -> Option<ObjectId> {
    match value {
        Value::String(raw) => ObjectId::parse_str(raw).ok(),
        Value::Object(map) => map.get("$oid").and_then(object_id_of),
        _ => None,
    }
}
