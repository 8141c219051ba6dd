//! In-Memory Reading Session Repository

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::application::ports::{
    ReadingSessionRepositoryPort, RepositoryError, SessionKey, SessionMutation,
};
use crate::domain::reading::{MaterialReadingSession, StudentId};

/// 内存阅读会话仓储
///
/// 变更在 DashMap 分片写锁内执行，对同一 key 的并发写串行化
pub struct InMemoryReadingSessionRepository {
    sessions: DashMap<SessionKey, MaterialReadingSession>,
}

impl InMemoryReadingSessionRepository {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 当前会话数量
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for InMemoryReadingSessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadingSessionRepositoryPort for InMemoryReadingSessionRepository {
    async fn find(
        &self,
        key: &SessionKey,
    ) -> Result<Option<MaterialReadingSession>, RepositoryError> {
        Ok(self.sessions.get(key).map(|s| s.clone()))
    }

    async fn insert_if_absent(
        &self,
        session: MaterialReadingSession,
    ) -> Result<MaterialReadingSession, RepositoryError> {
        let key = SessionKey::new(session.student_id().clone(), session.material_id().clone());
        match self.sessions.entry(key) {
            Entry::Occupied(existing) => Ok(existing.get().clone()),
            Entry::Vacant(slot) => {
                tracing::debug!(session_id = %session.id(), "Reading session stored");
                Ok(slot.insert(session).clone())
            }
        }
    }

    async fn update(
        &self,
        key: &SessionKey,
        mutation: SessionMutation,
    ) -> Result<MaterialReadingSession, RepositoryError> {
        let mut stored = self
            .sessions
            .get_mut(key)
            .ok_or_else(|| RepositoryError::NotFound(key.to_string()))?;

        let mut draft = stored.clone();
        mutation(&mut draft)?;
        *stored = draft.clone();
        Ok(draft)
    }

    async fn find_by_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<MaterialReadingSession>, RepositoryError> {
        let mut sessions: Vec<_> = self
            .sessions
            .iter()
            .filter(|entry| &entry.key().student_id == student_id)
            .map(|entry| entry.value().clone())
            .collect();
        sessions.sort_by_key(|s| std::cmp::Reverse(s.last_activity()));
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reading::{MaterialId, ReadingError};

    fn key(student: &str, material: &str) -> SessionKey {
        SessionKey::new(
            StudentId::new(student).unwrap(),
            MaterialId::new(material).unwrap(),
        )
    }

    fn session(k: &SessionKey, total_pages: i64) -> MaterialReadingSession {
        MaterialReadingSession::new(
            k.material_id.clone(),
            k.student_id.clone(),
            None,
            total_pages,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_if_absent_keeps_first() {
        let repo = InMemoryReadingSessionRepository::new();
        let k = key("stu", "mat");

        let first = repo.insert_if_absent(session(&k, 3)).await.unwrap();
        let second = repo.insert_if_absent(session(&k, 7)).await.unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(second.total_pages(), 3);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_mutation_leaves_state_untouched() {
        let repo = InMemoryReadingSessionRepository::new();
        let k = key("stu", "mat");
        repo.insert_if_absent(session(&k, 2)).await.unwrap();

        let err = repo
            .update(
                &k,
                Box::new(|s: &mut MaterialReadingSession| {
                    s.commit_page_time(1, 100)?;
                    s.start_page(2)
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Rejected(ReadingError::SequenceViolation { page: 2, .. })
        ));

        let stored = repo.find(&k).await.unwrap().unwrap();
        assert_eq!(stored.page(1).unwrap().time_spent(), 0);
    }

    #[tokio::test]
    async fn test_update_missing_session() {
        let repo = InMemoryReadingSessionRepository::new();
        let err = repo
            .update(
                &key("stu", "mat"),
                Box::new(|s: &mut MaterialReadingSession| s.start_page(1)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_commits_keep_maximum() {
        let repo = Arc::new(InMemoryReadingSessionRepository::new());
        let k = key("stu", "mat");
        repo.insert_if_absent(session(&k, 1)).await.unwrap();

        let mut tasks = Vec::new();
        for t in [30u64, 300, 90, 240, 60] {
            let repo = repo.clone();
            let k = k.clone();
            tasks.push(tokio::spawn(async move {
                repo.update(
                    &k,
                    Box::new(move |s: &mut MaterialReadingSession| {
                        s.commit_page_time(1, t).map(|_| ())
                    }),
                )
                .await
                .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let stored = repo.find(&k).await.unwrap().unwrap();
        assert_eq!(stored.page(1).unwrap().time_spent(), 300);
    }

    #[tokio::test]
    async fn test_find_by_student_filters() {
        let repo = InMemoryReadingSessionRepository::new();
        let a = key("alice", "m1");
        let b = key("alice", "m2");
        let c = key("bob", "m1");
        for k in [&a, &b, &c] {
            repo.insert_if_absent(session(k, 1)).await.unwrap();
        }

        let sessions = repo
            .find_by_student(&StudentId::new("alice").unwrap())
            .await
            .unwrap();
        assert_eq!(sessions.len(), 2);
        assert!(sessions.iter().all(|s| s.student_id().as_str() == "alice"));
    }
}
