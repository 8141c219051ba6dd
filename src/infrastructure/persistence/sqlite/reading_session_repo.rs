//! SQLite Reading Session Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection};
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{
    ReadingSessionRepositoryPort, RepositoryError, SessionKey, SessionMutation,
};
use crate::domain::reading::{
    CourseId, DwellPolicy, MaterialId, MaterialReadingSession, PageState, ReadingSessionId,
    StudentId,
};

/// SQLite Reading Session Repository
///
/// 会话行 + 每页一行；变更在事务内 "读取 → 领域校验 → 写回"
pub struct SqliteReadingSessionRepository {
    pool: DbPool,
}

impl SqliteReadingSessionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SessionRow {
    id: String,
    student_id: String,
    material_id: String,
    course_id: Option<String>,
    current_page: i64,
    session_start_time: String,
    last_activity: String,
}

#[derive(FromRow)]
struct PageRow {
    page_number: i64,
    time_spent: i64,
    is_completed: bool,
    min_time_required: i64,
    max_time_allowed: i64,
    start_time: Option<String>,
    end_time: Option<String>,
}

impl From<PageRow> for PageState {
    fn from(row: PageRow) -> Self {
        PageState::restore(
            row.page_number as u32,
            row.time_spent.max(0) as u64,
            row.is_completed,
            DwellPolicy {
                min_time_required: row.min_time_required as u64,
                max_time_allowed: row.max_time_allowed as u64,
            },
            row.start_time.as_deref().and_then(|t| parse_time(t).ok()),
            row.end_time.as_deref().and_then(|t| parse_time(t).ok()),
        )
    }
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepositoryError::SerializationError(e.to_string()))
}

fn serialization_error(e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::SerializationError(e.to_string())
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(e.to_string())
}

fn assemble(
    row: SessionRow,
    pages: Vec<PageRow>,
) -> Result<MaterialReadingSession, RepositoryError> {
    let id = Uuid::parse_str(&row.id).map_err(serialization_error)?;
    let course_id = row
        .course_id
        .map(CourseId::new)
        .transpose()
        .map_err(serialization_error)?;

    MaterialReadingSession::restore(
        ReadingSessionId::from_uuid(id),
        MaterialId::new(row.material_id).map_err(serialization_error)?,
        StudentId::new(row.student_id).map_err(serialization_error)?,
        course_id,
        row.current_page.max(1) as u32,
        pages.into_iter().map(PageState::from).collect(),
        parse_time(&row.session_start_time)?,
        parse_time(&row.last_activity)?,
    )
    .map_err(serialization_error)
}

async fn load_by_key(
    conn: &mut SqliteConnection,
    key: &SessionKey,
) -> Result<Option<MaterialReadingSession>, RepositoryError> {
    let row: Option<SessionRow> = sqlx::query_as(
        r#"
        SELECT id, student_id, material_id, course_id, current_page, session_start_time, last_activity
        FROM reading_sessions
        WHERE student_id = ? AND material_id = ?
        "#,
    )
    .bind(key.student_id.as_str())
    .bind(key.material_id.as_str())
    .fetch_optional(&mut *conn)
    .await
    .map_err(db_error)?;

    match row {
        Some(row) => load_pages(conn, row).await.map(Some),
        None => Ok(None),
    }
}

async fn load_pages(
    conn: &mut SqliteConnection,
    row: SessionRow,
) -> Result<MaterialReadingSession, RepositoryError> {
    let pages: Vec<PageRow> = sqlx::query_as(
        r#"
        SELECT page_number, time_spent, is_completed, min_time_required, max_time_allowed,
               start_time, end_time
        FROM reading_pages
        WHERE session_id = ?
        ORDER BY page_number
        "#,
    )
    .bind(row.id.as_str())
    .fetch_all(&mut *conn)
    .await
    .map_err(db_error)?;

    assemble(row, pages)
}

/// 写回单页，time_spent 与 is_completed 只增不减
async fn write_page(
    conn: &mut SqliteConnection,
    session_id: &ReadingSessionId,
    page: &PageState,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r#"
        UPDATE reading_pages SET
            time_spent = MAX(time_spent, ?),
            is_completed = MAX(is_completed, ?),
            start_time = ?,
            end_time = ?
        WHERE session_id = ? AND page_number = ?
        "#,
    )
    .bind(page.time_spent() as i64)
    .bind(page.is_completed())
    .bind(page.start_time().map(|t| t.to_rfc3339()))
    .bind(page.end_time().map(|t| t.to_rfc3339()))
    .bind(session_id.to_string())
    .bind(page.page_number() as i64)
    .execute(&mut *conn)
    .await
    .map_err(db_error)?;

    Ok(())
}

#[async_trait]
impl ReadingSessionRepositoryPort for SqliteReadingSessionRepository {
    async fn find(
        &self,
        key: &SessionKey,
    ) -> Result<Option<MaterialReadingSession>, RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        load_by_key(&mut *conn, key).await
    }

    async fn insert_if_absent(
        &self,
        session: MaterialReadingSession,
    ) -> Result<MaterialReadingSession, RepositoryError> {
        let key = SessionKey::new(session.student_id().clone(), session.material_id().clone());
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO reading_sessions (
                id, student_id, material_id, course_id, total_pages, current_page,
                completed_pages, session_start_time, last_activity
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (student_id, material_id) DO NOTHING
            "#,
        )
        .bind(session.id().to_string())
        .bind(session.student_id().as_str())
        .bind(session.material_id().as_str())
        .bind(session.course_id().map(|c| c.as_str()))
        .bind(session.total_pages() as i64)
        .bind(session.current_page() as i64)
        .bind(session.completed_pages() as i64)
        .bind(session.session_start_time().to_rfc3339())
        .bind(session.last_activity().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .rows_affected();

        if inserted == 0 {
            // 并发初始化：另一个请求已经创建
            let existing = load_by_key(&mut *tx, &key)
                .await?
                .ok_or_else(|| RepositoryError::NotFound(key.to_string()))?;
            tx.commit().await.map_err(db_error)?;
            return Ok(existing);
        }

        for page in session.pages() {
            sqlx::query(
                r#"
                INSERT INTO reading_pages (
                    session_id, page_number, time_spent, is_completed, min_time_required,
                    max_time_allowed, start_time, end_time
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(session.id().to_string())
            .bind(page.page_number() as i64)
            .bind(page.time_spent() as i64)
            .bind(page.is_completed())
            .bind(page.min_time_required() as i64)
            .bind(page.max_time_allowed() as i64)
            .bind(page.start_time().map(|t| t.to_rfc3339()))
            .bind(page.end_time().map(|t| t.to_rfc3339()))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        tracing::debug!(session_id = %session.id(), key = %key, "Reading session stored");
        Ok(session)
    }

    async fn update(
        &self,
        key: &SessionKey,
        mutation: SessionMutation,
    ) -> Result<MaterialReadingSession, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // 先执行一次写语句，使事务在读取之前就持有写锁
        let locked = sqlx::query(
            r#"
            UPDATE reading_sessions SET last_activity = last_activity
            WHERE student_id = ? AND material_id = ?
            "#,
        )
        .bind(key.student_id.as_str())
        .bind(key.material_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .rows_affected();
        if locked == 0 {
            return Err(RepositoryError::NotFound(key.to_string()));
        }

        let stored = load_by_key(&mut *tx, key)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(key.to_string()))?;

        // 被拒绝时 tx 直接丢弃，自动回滚
        let mut draft = stored.clone();
        mutation(&mut draft)?;

        for (before, after) in stored.pages().iter().zip(draft.pages()) {
            if before != after {
                write_page(&mut *tx, draft.id(), after).await?;
            }
        }

        sqlx::query(
            r#"
            UPDATE reading_sessions SET current_page = ?, completed_pages = ?, last_activity = ?
            WHERE id = ?
            "#,
        )
        .bind(draft.current_page() as i64)
        .bind(draft.completed_pages() as i64)
        .bind(draft.last_activity().to_rfc3339())
        .bind(draft.id().to_string())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        Ok(draft)
    }

    async fn find_by_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<MaterialReadingSession>, RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;

        let rows: Vec<SessionRow> = sqlx::query_as(
            r#"
            SELECT id, student_id, material_id, course_id, current_page, session_start_time,
                   last_activity
            FROM reading_sessions
            WHERE student_id = ?
            ORDER BY last_activity DESC
            "#,
        )
        .bind(student_id.as_str())
        .fetch_all(&mut *conn)
        .await
        .map_err(db_error)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in rows {
            sessions.push(load_pages(&mut *conn, row).await?);
        }
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reading::{ReadingError, MIN_TIME_REQUIRED_SECS};
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};

    async fn repo() -> SqliteReadingSessionRepository {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteReadingSessionRepository::new(pool)
    }

    fn key(student: &str) -> SessionKey {
        SessionKey::new(
            StudentId::new(student).unwrap(),
            MaterialId::new("material-42").unwrap(),
        )
    }

    fn session(k: &SessionKey, total_pages: i64) -> MaterialReadingSession {
        MaterialReadingSession::new(
            k.material_id.clone(),
            k.student_id.clone(),
            Some(CourseId::new("course-1").unwrap()),
            total_pages,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_find_round_trip() {
        let repo = repo().await;
        let k = key("stu");
        let created = repo.insert_if_absent(session(&k, 3)).await.unwrap();

        let loaded = repo.find(&k).await.unwrap().unwrap();
        assert_eq!(loaded.id(), created.id());
        assert_eq!(loaded.total_pages(), 3);
        assert_eq!(loaded.course_id().map(|c| c.as_str()), Some("course-1"));
        assert!(loaded.page(1).unwrap().can_proceed());
        assert!(!loaded.page(2).unwrap().can_proceed());
    }

    #[tokio::test]
    async fn test_insert_if_absent_returns_existing() {
        let repo = repo().await;
        let k = key("stu");
        let first = repo.insert_if_absent(session(&k, 3)).await.unwrap();
        let second = repo.insert_if_absent(session(&k, 9)).await.unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(second.total_pages(), 3);
    }

    #[tokio::test]
    async fn test_update_persists_completion() {
        let repo = repo().await;
        let k = key("stu");
        repo.insert_if_absent(session(&k, 2)).await.unwrap();

        let updated = repo
            .update(
                &k,
                Box::new(|s: &mut MaterialReadingSession| {
                    s.start_page(1)?;
                    s.commit_page_time(1, MIN_TIME_REQUIRED_SECS + 5)?;
                    s.complete_page(1).map(|_| ())
                }),
            )
            .await
            .unwrap();
        assert_eq!(updated.completed_pages(), 1);
        assert_eq!(updated.current_page(), 2);

        let loaded = repo.find(&k).await.unwrap().unwrap();
        assert_eq!(loaded.completed_pages(), 1);
        assert_eq!(loaded.current_page(), 2);
        assert_eq!(loaded.page(1).unwrap().time_spent(), MIN_TIME_REQUIRED_SECS + 5);
        assert!(loaded.page(2).unwrap().can_proceed());
    }

    #[tokio::test]
    async fn test_stale_checkpoint_does_not_lower_time() {
        let repo = repo().await;
        let k = key("stu");
        repo.insert_if_absent(session(&k, 1)).await.unwrap();

        for t in [120u64, 30] {
            repo.update(
                &k,
                Box::new(move |s: &mut MaterialReadingSession| {
                    s.commit_page_time(1, t).map(|_| ())
                }),
            )
            .await
            .unwrap();
        }

        let loaded = repo.find(&k).await.unwrap().unwrap();
        assert_eq!(loaded.page(1).unwrap().time_spent(), 120);
    }

    #[tokio::test]
    async fn test_rejected_update_rolls_back() {
        let repo = repo().await;
        let k = key("stu");
        repo.insert_if_absent(session(&k, 2)).await.unwrap();

        let err = repo
            .update(
                &k,
                Box::new(|s: &mut MaterialReadingSession| {
                    s.commit_page_time(1, 100)?;
                    s.complete_page(1).map(|_| ())
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Rejected(ReadingError::ThresholdNotMet { page: 1, .. })
        ));

        let loaded = repo.find(&k).await.unwrap().unwrap();
        assert_eq!(loaded.page(1).unwrap().time_spent(), 0);
    }

    #[tokio::test]
    async fn test_oversized_time_never_reaches_storage() {
        let repo = repo().await;
        let k = key("stu");
        repo.insert_if_absent(session(&k, 1)).await.unwrap();

        let err = repo
            .update(
                &k,
                Box::new(|s: &mut MaterialReadingSession| {
                    s.commit_page_time(1, u64::MAX).map(|_| ())
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Rejected(ReadingError::InvalidTimeSpent { page: 1, .. })
        ));

        let loaded = repo.find(&k).await.unwrap().unwrap();
        assert_eq!(loaded.page(1).unwrap().time_spent(), 0);
    }

    #[tokio::test]
    async fn test_update_missing_session() {
        let repo = repo().await;
        let err = repo
            .update(
                &key("nobody"),
                Box::new(|s: &mut MaterialReadingSession| s.start_page(1)),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_find_by_student() {
        let repo = repo().await;
        let alice = key("alice");
        let bob = key("bob");
        repo.insert_if_absent(session(&alice, 1)).await.unwrap();
        repo.insert_if_absent(session(&bob, 2)).await.unwrap();

        let sessions = repo.find_by_student(&alice.student_id).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].student_id(), &alice.student_id);
    }
}
