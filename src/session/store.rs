//! Per-session collection store — in-memory, keyed by session id.
//!
//! The store is deliberately decoupled from the HTTP session mechanism: it
//! only sees opaque `SessionId` keys, so it can be swapped for a real backend
//! without touching the cookie layer or the handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::id::SessionId;
use crate::jobs::model::{JobPosting, next_id};

/// Backend-agnostic interface over one session's job collection.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Full ordered collection for this session (seeding it if new).
    async fn list(&self, sid: &SessionId) -> Vec<JobPosting>;

    /// Look up one posting by id.
    async fn get(&self, sid: &SessionId, id: u64) -> Option<JobPosting>;

    /// Append a new posting built from `fields`, assigning the next id.
    async fn create(&self, sid: &SessionId, fields: Map<String, Value>) -> JobPosting;

    /// Replace the posting with the given id in place. Full replace, not a
    /// merge; the stored id always equals `id` regardless of the body.
    async fn replace(
        &self,
        sid: &SessionId,
        id: u64,
        fields: Map<String, Value>,
    ) -> Option<JobPosting>;

    /// Remove the posting with the given id, returning it.
    async fn remove(&self, sid: &SessionId, id: u64) -> Option<JobPosting>;
}

struct SessionEntry {
    jobs: Vec<JobPosting>,
    last_seen: DateTime<Utc>,
}

/// In-memory `CollectionStore` holding one collection per session.
///
/// Every operation runs under a single write-lock acquisition, so operations
/// on the same session (and in this implementation, across sessions) are
/// serialized. That closes the read-modify-write race on id assignment.
pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    seed: Vec<JobPosting>,
    idle_ttl: Duration,
}

impl MemoryStore {
    /// Create a store seeding new sessions from `seed`, pruning sessions idle
    /// longer than `idle_ttl_secs`.
    pub fn new(seed: Vec<JobPosting>, idle_ttl_secs: u64) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            seed,
            idle_ttl: Duration::seconds(idle_ttl_secs as i64),
        })
    }

    /// Drop sessions idle past the TTL. Returns how many were removed.
    pub async fn sweep_idle(&self) -> usize {
        let cutoff = Utc::now() - self.idle_ttl;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_seen >= cutoff);
        let removed = before - sessions.len();
        if removed > 0 {
            info!(count = removed, "Swept idle sessions");
        }
        removed
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Run `f` against this session's collection, seeding it on first access.
    async fn with_entry<T>(&self, sid: &SessionId, f: impl FnOnce(&mut Vec<JobPosting>) -> T) -> T {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(sid.clone()).or_insert_with(|| {
            debug!(session = %sid, "Seeding new session collection");
            SessionEntry {
                // Deep copy; the seed template itself is never handed out.
                jobs: self.seed.clone(),
                last_seen: Utc::now(),
            }
        });
        entry.last_seen = Utc::now();
        f(&mut entry.jobs)
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn list(&self, sid: &SessionId) -> Vec<JobPosting> {
        self.with_entry(sid, |jobs| jobs.clone()).await
    }

    async fn get(&self, sid: &SessionId, id: u64) -> Option<JobPosting> {
        self.with_entry(sid, |jobs| jobs.iter().find(|j| j.id == id).cloned())
            .await
    }

    async fn create(&self, sid: &SessionId, fields: Map<String, Value>) -> JobPosting {
        let created = self
            .with_entry(sid, |jobs| {
                let job = JobPosting::from_body(fields, next_id(jobs));
                jobs.push(job.clone());
                job
            })
            .await;
        info!(session = %sid, job_id = created.id, "Job created");
        created
    }

    async fn replace(
        &self,
        sid: &SessionId,
        id: u64,
        fields: Map<String, Value>,
    ) -> Option<JobPosting> {
        let replaced = self
            .with_entry(sid, |jobs| {
                let pos = jobs.iter().position(|j| j.id == id)?;
                let job = JobPosting::from_body(fields, id);
                jobs[pos] = job.clone();
                Some(job)
            })
            .await;
        if replaced.is_some() {
            info!(session = %sid, job_id = id, "Job replaced");
        }
        replaced
    }

    async fn remove(&self, sid: &SessionId, id: u64) -> Option<JobPosting> {
        let removed = self
            .with_entry(sid, |jobs| {
                let pos = jobs.iter().position(|j| j.id == id)?;
                Some(jobs.remove(pos))
            })
            .await;
        if removed.is_some() {
            info!(session = %sid, job_id = id, "Job deleted");
        }
        removed
    }
}

/// Spawn a background task that periodically sweeps idle sessions.
pub fn spawn_sweep_task(
    store: Arc<MemoryStore>,
    interval: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(interval);
        loop {
            interval.tick().await;
            store.sweep_idle().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::model::seed_postings;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn store() -> Arc<MemoryStore> {
        MemoryStore::new(seed_postings(), 3600)
    }

    #[tokio::test]
    async fn first_access_seeds_a_copy() {
        let store = store();
        let sid = SessionId::generate();
        assert_eq!(store.list(&sid).await, seed_postings());
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = store();
        let a = SessionId::generate();
        let b = SessionId::generate();

        store.create(&a, fields(json!({"title": "Only in A"}))).await;
        store.remove(&a, 1).await;

        // B's collection is still the pristine seed.
        assert_eq!(store.list(&b).await, seed_postings());
        assert_eq!(store.list(&a).await.len(), 3);
    }

    #[tokio::test]
    async fn create_assigns_max_plus_one() {
        let store = store();
        let sid = SessionId::generate();
        let created = store.create(&sid, fields(json!({"title": "New"}))).await;
        assert_eq!(created.id, 4);

        let jobs = store.list(&sid).await;
        assert_eq!(jobs.last().unwrap().id, 4);
    }

    #[tokio::test]
    async fn create_on_empty_collection_starts_at_one() {
        let store = MemoryStore::new(Vec::new(), 3600);
        let sid = SessionId::generate();
        let created = store.create(&sid, fields(json!({"title": "First"}))).await;
        assert_eq!(created.id, 1);
    }

    #[tokio::test]
    async fn create_ignores_client_supplied_id() {
        let store = store();
        let sid = SessionId::generate();
        let created = store
            .create(&sid, fields(json!({"id": 999, "title": "Sneaky"})))
            .await;
        assert_eq!(created.id, 4);
        assert!(!created.fields.contains_key("id"));
    }

    #[tokio::test]
    async fn replace_keeps_path_id_and_position() {
        let store = store();
        let sid = SessionId::generate();

        let replaced = store
            .replace(&sid, 2, fields(json!({"id": 42, "title": "Rewritten"})))
            .await
            .unwrap();
        assert_eq!(replaced.id, 2);

        let jobs = store.list(&sid).await;
        assert_eq!(jobs[1].id, 2);
        assert_eq!(jobs[1].fields["title"], json!("Rewritten"));
        // Full replace: old fields are gone.
        assert!(!jobs[1].fields.contains_key("company"));
    }

    #[tokio::test]
    async fn replace_missing_id_leaves_collection_unchanged() {
        let store = store();
        let sid = SessionId::generate();
        assert!(
            store
                .replace(&sid, 99, fields(json!({"title": "Ghost"})))
                .await
                .is_none()
        );
        assert_eq!(store.list(&sid).await, seed_postings());
    }

    #[tokio::test]
    async fn remove_takes_exactly_one_entry() {
        let store = store();
        let sid = SessionId::generate();

        let removed = store.remove(&sid, 1).await.unwrap();
        assert_eq!(removed.id, 1);

        let jobs = store.list(&sid).await;
        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|j| j.id != 1));

        // Double delete misses cleanly.
        assert!(store.remove(&sid, 1).await.is_none());
        assert_eq!(store.list(&sid).await.len(), 2);
    }

    #[tokio::test]
    async fn sweep_drops_idle_sessions() {
        let store = MemoryStore::new(seed_postings(), 0);
        let sid = SessionId::generate();
        store.list(&sid).await;
        assert_eq!(store.session_count().await, 1);

        // TTL of zero makes everything idle immediately.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert_eq!(store.sweep_idle().await, 1);
        assert_eq!(store.session_count().await, 0);

        // Next access reseeds from scratch.
        assert_eq!(store.list(&sid).await, seed_postings());
    }
}
