//! In-memory storage manager.
//!
//! This module provides a simple but fully functional storage manager that
//! keeps records as BSON values in maps behind an async-safe read-write lock.

use std::{collections::BTreeMap, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::Bson;
use mea::rwlock::RwLock;
use tracing::debug;

use repolayer_core::{
    error::{RepositoryError, RepositoryResult},
    manager::StorageManager,
    plan::{QueryKind, QueryPlan},
    query::{Selection, SortDirection},
};

use crate::evaluator::{RecordMatcher, compare_records};

// Records are keyed by the rendered identifier value. The inner map is
// ordered so unsorted query results come back in a stable identifier order.
type CollectionMap = BTreeMap<String, Bson>;
type StoreMap = HashMap<String, CollectionMap>;

/// Thread-safe in-memory storage manager.
///
/// Implements [`StorageManager`] over plain maps, which makes it the natural
/// manager for tests and for embedding without an external database. Queries
/// scan all records in a collection (no indexing), so it is suited to small
/// to medium datasets.
///
/// # Thread Safety
///
/// `InMemoryManager` is cloneable and uses an `Arc`-wrapped internal state,
/// allowing it to be safely shared across async tasks. Clones of the same
/// instance share the same underlying data.
///
/// # Limitations
///
/// Literal queries have no in-memory interpreter and are rejected with
/// [`RepositoryError::Backend`]; use derived or default methods against this
/// manager.
#[derive(Default, Clone, Debug)]
pub struct InMemoryManager {
    /// The main storage map: collection name -> (record id -> record)
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryManager {
    /// Creates a new empty in-memory manager.
    pub fn new() -> Self {
        Self { store: Arc::new(RwLock::new(StoreMap::new())) }
    }

    /// Number of records currently stored in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        self.store
            .read()
            .await
            .get(collection)
            .map(CollectionMap::len)
            .unwrap_or(0)
    }

    /// Whether a collection holds no records.
    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }

    fn select(records: Vec<Bson>, selection: &Selection) -> Vec<Bson> {
        let mut records = records;

        if let Some(sort) = &selection.sort {
            records.sort_by(|a, b| {
                let ordering = compare_records(a, b, &sort.field);
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        records
            .into_iter()
            .skip(selection.offset.unwrap_or(0))
            .take(selection.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

#[async_trait]
impl StorageManager for InMemoryManager {
    async fn execute_query(&self, plan: QueryPlan) -> RepositoryResult<Vec<Bson>> {
        if let Some(literal) = &plan.literal {
            return Err(RepositoryError::Backend(format!(
                "in-memory manager cannot interpret literal query: {literal}"
            )));
        }

        debug!(collection = %plan.collection, kind = ?plan.kind, "executing query plan");

        let store = self.store.read().await;
        let collection_map = match store.get(&plan.collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        let matched = match &plan.selection.filter {
            Some(filter) => RecordMatcher::filter_records(collection_map.values(), filter),
            None => collection_map.values().cloned().collect(),
        };

        Ok(Self::select(matched, &plan.selection))
    }

    async fn execute_update(&self, plan: QueryPlan) -> RepositoryResult<u64> {
        debug!(collection = %plan.collection, kind = ?plan.kind, "executing update plan");

        match plan.kind {
            QueryKind::Save => {
                let mut store = self.store.write().await;
                let collection_map = store
                    .entry(plan.collection.clone())
                    .or_default();

                let affected = plan.documents.len() as u64;
                for (id, record) in plan.documents {
                    // Save is an upsert: an existing record with the same
                    // identifier is replaced.
                    collection_map.insert(id.to_string(), record);
                }

                Ok(affected)
            }
            QueryKind::Delete => {
                let mut store = self.store.write().await;
                let collection_map = match store.get_mut(&plan.collection) {
                    Some(col) => col,
                    None => return Ok(0),
                };

                let doomed: Vec<String> = match &plan.selection.filter {
                    Some(filter) => collection_map
                        .iter()
                        .filter(|(_, record)| {
                            RecordMatcher::new(record).matches(filter).unwrap_or(false)
                        })
                        .map(|(key, _)| key.clone())
                        .collect(),
                    None => collection_map.keys().cloned().collect(),
                };

                let affected = doomed.len() as u64;
                for key in doomed {
                    collection_map.remove(&key);
                }

                Ok(affected)
            }
            _ => Err(RepositoryError::Backend(format!(
                "in-memory manager cannot execute {:?} as an update",
                plan.kind
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use repolayer_core::query::{Filter, Sort};

    fn query_plan(collection: &str, selection: Selection) -> QueryPlan {
        QueryPlan {
            kind: QueryKind::Find,
            collection: collection.to_string(),
            selection,
            literal: None,
            bindings: HashMap::new(),
            documents: Vec::new(),
        }
    }

    fn save_plan(collection: &str, documents: Vec<(Bson, Bson)>) -> QueryPlan {
        QueryPlan {
            kind: QueryKind::Save,
            collection: collection.to_string(),
            selection: Selection::new(),
            literal: None,
            bindings: HashMap::new(),
            documents,
        }
    }

    fn delete_plan(collection: &str, selection: Selection) -> QueryPlan {
        QueryPlan {
            kind: QueryKind::Delete,
            collection: collection.to_string(),
            selection,
            literal: None,
            bindings: HashMap::new(),
            documents: Vec::new(),
        }
    }

    fn user(id: i64, name: &str, age: i64) -> (Bson, Bson) {
        (
            Bson::from(id),
            Bson::Document(doc! { "id": id, "name": name, "age": age }),
        )
    }

    async fn seeded() -> InMemoryManager {
        let manager = InMemoryManager::new();
        manager
            .execute_update(save_plan(
                "users",
                vec![user(1, "Ada", 36), user(2, "Grace", 40), user(3, "Edsger", 30)],
            ))
            .await
            .unwrap();
        manager
    }

    #[tokio::test]
    async fn unknown_collection_yields_empty_results() {
        let manager = InMemoryManager::new();
        let records = manager
            .execute_query(query_plan("users", Selection::new()))
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn save_then_query_round_trips() {
        let manager = seeded().await;
        assert_eq!(manager.len("users").await, 3);

        let records = manager
            .execute_query(query_plan(
                "users",
                Selection::filtered(Filter::eq("name", "Ada")),
            ))
            .await
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].as_document().unwrap().get("age"),
            Some(&Bson::Int64(36))
        );
    }

    #[tokio::test]
    async fn save_replaces_record_with_same_identifier() {
        let manager = seeded().await;

        manager
            .execute_update(save_plan("users", vec![user(1, "Ada", 37)]))
            .await
            .unwrap();
        assert_eq!(manager.len("users").await, 3);

        let records = manager
            .execute_query(query_plan(
                "users",
                Selection::filtered(Filter::eq("id", 1i64)),
            ))
            .await
            .unwrap();
        assert_eq!(
            records[0].as_document().unwrap().get("age"),
            Some(&Bson::Int64(37))
        );
    }

    #[tokio::test]
    async fn delete_removes_matching_records_and_reports_count() {
        let manager = seeded().await;

        let affected = manager
            .execute_update(delete_plan(
                "users",
                Selection::filtered(Filter::gte("age", 36i64)),
            ))
            .await
            .unwrap();
        assert_eq!(affected, 2);
        assert_eq!(manager.len("users").await, 1);

        let affected = manager
            .execute_update(delete_plan("users", Selection::new()))
            .await
            .unwrap();
        assert_eq!(affected, 1);
        assert!(manager.is_empty("users").await);
    }

    #[tokio::test]
    async fn sorting_and_windowing_apply_after_filtering() {
        let manager = seeded().await;

        let selection = Selection::builder()
            .filter(Filter::gt("age", 0i64))
            .sort("age", SortDirection::Desc)
            .limit(2)
            .build();

        let records = manager
            .execute_query(query_plan("users", selection))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].as_document().unwrap().get("name"),
            Some(&Bson::from("Grace"))
        );
        assert_eq!(
            records[1].as_document().unwrap().get("name"),
            Some(&Bson::from("Ada"))
        );

        let mut offset_selection = Selection::new();
        offset_selection.sort = Some(Sort {
            field: "age".to_string(),
            direction: SortDirection::Asc,
        });
        offset_selection.offset = Some(1);

        let records = manager
            .execute_query(query_plan("users", offset_selection))
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].as_document().unwrap().get("name"),
            Some(&Bson::from("Ada"))
        );
    }

    #[tokio::test]
    async fn unsorted_results_follow_identifier_order() {
        let manager = seeded().await;

        let records = manager
            .execute_query(query_plan("users", Selection::new()))
            .await
            .unwrap();
        let names: Vec<_> = records
            .iter()
            .map(|r| r.as_document().unwrap().get_str("name").unwrap())
            .collect();
        assert_eq!(names, vec!["Ada", "Grace", "Edsger"]);
    }

    #[tokio::test]
    async fn literal_plans_are_rejected() {
        let manager = seeded().await;

        let mut plan = query_plan("users", Selection::new());
        plan.literal = Some("select * from users".to_string());

        let err = manager.execute_query(plan).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Backend(_)));
    }

    #[tokio::test]
    async fn clones_share_state() {
        let manager = InMemoryManager::new();
        let clone = manager.clone();

        clone
            .execute_update(save_plan("users", vec![user(9, "Barbara", 33)]))
            .await
            .unwrap();
        assert_eq!(manager.len("users").await, 1);
    }
}
