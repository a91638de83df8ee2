//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::*;
use super::DialogRuntime;
use crate::db::StoredSession;
use crate::lexicon::Publisher;
use crate::reply::Reply;
use crate::state_machine::{DialogContext, Event, SessionRecord};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ============================================================================
// In-Memory Session Store
// ============================================================================

/// Session store with versioned rows and injectable failures
#[allow(dead_code)]
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, StoredSession>>,
    /// Number of upcoming saves that report a conflict
    conflicts: Mutex<usize>,
    /// When set, every operation fails with a backend error
    failing: Mutex<bool>,
    /// Record of every successful save
    pub saves: Mutex<Vec<(String, SessionRecord)>>,
    pub deletes: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user's record at version 1
    pub fn with_record(self, user_id: &str, record: SessionRecord) -> Self {
        self.sessions.lock().unwrap().insert(
            user_id.to_string(),
            StoredSession {
                record,
                version: 1,
                updated_at: None,
            },
        );
        self
    }

    pub fn inject_conflicts(&self, count: usize) {
        *self.conflicts.lock().unwrap() = count;
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn record(&self, user_id: &str) -> Option<SessionRecord> {
        self.sessions
            .lock()
            .unwrap()
            .get(user_id)
            .map(|s| s.record.clone())
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }

    fn check_failing(&self) -> Result<(), StoreError> {
        if *self.failing.lock().unwrap() {
            return Err(StoreError::Backend("store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, user_id: &str) -> Result<StoredSession, StoreError> {
        self.check_failing()?;
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_else(StoredSession::absent))
    }

    async fn save(
        &self,
        user_id: &str,
        record: &SessionRecord,
        expected_version: i64,
    ) -> Result<i64, StoreError> {
        self.check_failing()?;
        {
            let mut conflicts = self.conflicts.lock().unwrap();
            if *conflicts > 0 {
                *conflicts -= 1;
                return Err(StoreError::Conflict);
            }
        }

        let mut sessions = self.sessions.lock().unwrap();
        let current = sessions.get(user_id).map_or(0, |s| s.version);
        if current != expected_version {
            return Err(StoreError::Conflict);
        }
        let version = expected_version + 1;
        sessions.insert(
            user_id.to_string(),
            StoredSession {
                record: record.clone(),
                version,
                updated_at: None,
            },
        );
        self.saves
            .lock()
            .unwrap()
            .push((user_id.to_string(), record.clone()));
        Ok(version)
    }

    async fn delete(&self, user_id: &str) -> Result<(), StoreError> {
        self.check_failing()?;
        self.sessions.lock().unwrap().remove(user_id);
        self.deletes.lock().unwrap().push(user_id.to_string());
        Ok(())
    }
}

// ============================================================================
// Mock Lesson Catalog
// ============================================================================

#[allow(dead_code)]
#[derive(Default)]
pub struct MockLessonCatalog {
    lessons: Mutex<HashMap<Publisher, Vec<Value>>>,
    failing: Mutex<bool>,
    /// Record of every publisher requested
    pub requests: Mutex<Vec<Publisher>>,
}

#[allow(dead_code)]
impl MockLessonCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lesson(self, doc: Value) -> Self {
        let publisher = doc
            .get("publisher")
            .and_then(Value::as_str)
            .and_then(Publisher::from_name)
            .expect("test lesson needs a known publisher");
        self.lessons
            .lock()
            .unwrap()
            .entry(publisher)
            .or_default()
            .push(doc);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

#[async_trait]
impl LessonCatalog for MockLessonCatalog {
    async fn lessons_for_publisher(&self, publisher: Publisher) -> Result<Vec<Value>, String> {
        self.requests.lock().unwrap().push(publisher);
        if *self.failing.lock().unwrap() {
            return Err("catalog unavailable".to_string());
        }
        Ok(self
            .lessons
            .lock()
            .unwrap()
            .get(&publisher)
            .cloned()
            .unwrap_or_default())
    }
}

// ============================================================================
// Test Runtime Builder
// ============================================================================

pub struct TestRuntime {
    pub runtime: DialogRuntime<Arc<InMemorySessionStore>, Arc<MockLessonCatalog>>,
    pub store: Arc<InMemorySessionStore>,
    pub catalog: Arc<MockLessonCatalog>,
}

#[allow(dead_code)]
impl TestRuntime {
    pub fn new() -> Self {
        Self::with(InMemorySessionStore::new(), MockLessonCatalog::new())
    }

    pub fn with(store: InMemorySessionStore, catalog: MockLessonCatalog) -> Self {
        let store = Arc::new(store);
        let catalog = Arc::new(catalog);
        Self {
            runtime: DialogRuntime::new(
                DialogContext::default(),
                Arc::clone(&store),
                Arc::clone(&catalog),
            ),
            store,
            catalog,
        }
    }

    /// Send an utterance as user U1 and return the reply text
    pub async fn say(&self, text: &str) -> String {
        self.send(Event::utterance(text))
            .await
            .map(|r| r.text)
            .unwrap_or_default()
    }

    pub async fn send(&self, event: Event) -> Option<Reply> {
        self.runtime.handle("U1", event).await
    }

    pub fn record(&self) -> SessionRecord {
        self.store.record("U1").unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MAX_ATTEMPTS;
    use crate::state_machine::state::{Mode, Step};
    use serde_json::json;

    fn kang_hsuan_catalog() -> MockLessonCatalog {
        MockLessonCatalog::new()
            .with_lesson(json!({"publisher": "康軒", "grade": 1, "semester": 1, "lesson": 1, "characters": ["我", "好"]}))
            .with_lesson(json!({"publisher": "康軒", "grade": 1, "semester": 1, "lesson": 2, "characters": [{"character": "喜"}, {"character": "歡"}]}))
            .with_lesson(json!({"publisher": "康軒", "grade": 1, "semester": 1, "lesson": 3, "characters": ["吃"]}))
            .with_lesson(json!({"publisher": "南一", "grade": 1, "semester": 1, "lesson": 1, "characters": ["吃"]}))
    }

    fn querying_record() -> SessionRecord {
        SessionRecord {
            mode: Mode::CumulativeQuery,
            step: Step::Querying.tag(),
            publisher: "康軒".to_string(),
            grade: 1,
            semester: 1,
            lesson: 2,
            preferred_publisher: "康軒".to_string(),
            preferred_grade: 1,
            preferred_semester: 1,
        }
    }

    /// Integration test: cold start through to a query result
    #[tokio::test]
    async fn test_full_wizard_and_query() {
        let rt = TestRuntime::with(InMemorySessionStore::new(), kang_hsuan_catalog());

        assert!(rt.say("查詢累積字詞").await.contains("請選擇出版社"));
        assert!(rt.say("康軒").await.contains("請選擇年級"));
        assert!(rt.say("1").await.contains("請選擇學期"));
        assert!(rt.say("上學期").await.contains("請輸入課次"));
        assert!(rt.say("2").await.contains("請輸入要查詢的字詞"));
        assert_eq!(rt.record().step(), Ok(Step::Querying));

        let saves_before = rt.store.save_count();
        let answer = rt.say("我好喜歡吃").await;
        assert!(answer.contains("已學過：我好喜歡"), "{answer}");
        assert!(answer.contains("尚未學過：吃"), "{answer}");
        assert!(answer.contains("已學 4/5 字"), "{answer}");
        assert_eq!(rt.store.save_count(), saves_before, "queries do not write");
        assert_eq!(rt.catalog.requests.lock().unwrap().as_slice(), &[Publisher::KangHsuan]);

        rt.say("退出").await;
        assert_eq!(rt.record().mode, Mode::Idle);
        assert!(rt.say("查詢累積字詞").await.contains("已記憶的設定"));
    }

    #[tokio::test]
    async fn test_catalog_failure_keeps_querying() {
        let catalog = kang_hsuan_catalog();
        catalog.set_failing(true);
        let rt = TestRuntime::with(
            InMemorySessionStore::new().with_record("U1", querying_record()),
            catalog,
        );

        assert_eq!(rt.say("我好").await, crate::reply::query_failed().text);
        assert_eq!(rt.record(), querying_record());

        rt.catalog.set_failing(false);
        assert!(rt.say("我好").await.contains("已學 2/2 字"));
    }

    #[tokio::test]
    async fn test_conflict_retried_then_succeeds() {
        let rt = TestRuntime::new();
        rt.store.inject_conflicts(MAX_ATTEMPTS - 1);

        let reply = rt.say("查詢累積字詞").await;
        assert!(reply.contains("請選擇出版社"));
        assert_eq!(rt.record().step(), Ok(Step::AwaitingPublisher));
        assert_eq!(rt.store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_persistent_conflict_gives_transient_failure() {
        let rt = TestRuntime::new();
        rt.store.inject_conflicts(MAX_ATTEMPTS);

        let reply = rt.say("查詢累積字詞").await;
        assert_eq!(reply, crate::reply::transient_failure().text);
        assert_eq!(rt.store.save_count(), 0);
        assert_eq!(rt.record(), SessionRecord::default());
    }

    #[tokio::test]
    async fn test_store_failure_sends_no_success_reply() {
        let rt = TestRuntime::new();
        rt.store.set_failing(true);

        assert_eq!(rt.say("查詢累積字詞").await, crate::reply::transient_failure().text);
        assert!(rt.send(Event::Unfollow).await.is_none());
    }

    #[tokio::test]
    async fn test_unfollow_deletes_session() {
        let rt = TestRuntime::with(
            InMemorySessionStore::new().with_record("U1", querying_record()),
            MockLessonCatalog::new(),
        );
        assert!(rt.send(Event::Unfollow).await.is_none());
        assert!(rt.store.record("U1").is_none());
        assert_eq!(rt.store.deletes.lock().unwrap().as_slice(), &["U1".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_step_discards_stored_session() {
        let corrupted = SessionRecord {
            mode: Mode::CumulativeQuery,
            step: 42,
            ..SessionRecord::default()
        };
        let rt = TestRuntime::with(
            InMemorySessionStore::new().with_record("U1", corrupted),
            MockLessonCatalog::new(),
        );

        assert_eq!(rt.say("我好").await, crate::reply::session_error().text);
        assert!(rt.store.record("U1").is_none());
        assert!(rt.say("查詢累積字詞").await.contains("請選擇出版社"));
    }

    #[tokio::test]
    async fn test_read_only_commands_do_not_write() {
        let rt = TestRuntime::new();
        for text in ["我的設定", "印字帖", "幫助", "平板學寫字", "重設偏好", "隨便"] {
            rt.say(text).await;
        }
        assert!(rt.send(Event::NonText).await.is_some());
        assert!(rt.send(Event::Follow).await.is_some());
        assert_eq!(rt.store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_events_for_one_user_serialize() {
        let rt = Arc::new(TestRuntime::with(
            InMemorySessionStore::new(),
            kang_hsuan_catalog(),
        ));
        rt.say("查詢累積字詞").await;

        // Two racing answers to the publisher prompt: one advances the
        // wizard, the other lands on the grade step and is reprompted.
        let a = {
            let rt = Arc::clone(&rt);
            tokio::spawn(async move { rt.say("康軒").await })
        };
        let b = {
            let rt = Arc::clone(&rt);
            tokio::spawn(async move { rt.say("南一").await })
        };
        let replies = [a.await.unwrap(), b.await.unwrap()];

        assert_eq!(replies.iter().filter(|r| r.contains("請選擇年級")).count(), 1);
        assert_eq!(replies.iter().filter(|r| r.contains("請輸入正確的年級")).count(), 1);
        assert_eq!(rt.record().step(), Ok(Step::AwaitingGrade));
        assert_eq!(rt.store.save_count(), 2);
    }
}
