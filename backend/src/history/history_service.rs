use chrono::{DateTime, Duration, Utc};
use shared::{HistoryEntry, HistoryResponse, HistorySummary};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const DEFAULT_IDLE_TTL_MINUTES: i64 = 60;

struct SessionHistory {
    entries: Vec<HistoryEntry>,
    last_seen: DateTime<Utc>,
}

/// Per-session prediction history kept in memory.
///
/// A session untouched for longer than the idle TTL is dropped on the next
/// write to the service, so abandoned cookies do not accumulate.
#[derive(Clone)]
pub struct HistoryService {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHistory>>>,
    idle_ttl: Duration,
}

impl Default for HistoryService {
    fn default() -> Self {
        Self::with_idle_ttl(Duration::minutes(DEFAULT_IDLE_TTL_MINUTES))
    }
}

impl HistoryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub async fn append(&self, session: Uuid, entry: HistoryEntry) {
        self.append_many(session, vec![entry]).await;
    }

    pub async fn append_many(&self, session: Uuid, entries: Vec<HistoryEntry>) {
        if entries.is_empty() {
            return;
        }
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let expired = self.prune(&mut sessions, now);
        if expired > 0 {
            log::info!("Expired {} idle session histories", expired);
        }

        let history = sessions.entry(session).or_insert_with(|| SessionHistory {
            entries: Vec::new(),
            last_seen: now,
        });
        history.last_seen = now;
        history.entries.extend(entries);
        log::debug!("Session {} history has {} entries", session, history.entries.len());
    }

    /// Entries in insertion order. Reading counts as activity.
    pub async fn entries(&self, session: Uuid) -> Vec<HistoryEntry> {
        self.touch(session, |history| history.entries.clone())
            .await
            .unwrap_or_default()
    }

    pub async fn summary(&self, session: Uuid) -> HistorySummary {
        self.touch(session, |history| HistorySummary::from_entries(&history.entries))
            .await
            .unwrap_or_default()
    }

    pub async fn snapshot(&self, session: Uuid) -> HistoryResponse {
        let entries = self.entries(session).await;
        let summary = self.summary(session).await;
        HistoryResponse { entries, summary }
    }

    /// Drops the session's history, returning how many entries were removed.
    pub async fn clear(&self, session: Uuid) -> usize {
        self.sessions
            .write()
            .await
            .remove(&session)
            .map(|history| history.entries.len())
            .unwrap_or(0)
    }

    /// Drops every session idle at `now`, returning how many were removed.
    pub async fn expire_idle(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        self.prune(&mut sessions, now)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    fn prune(&self, sessions: &mut HashMap<Uuid, SessionHistory>, now: DateTime<Utc>) -> usize {
        let before = sessions.len();
        sessions.retain(|_, history| now - history.last_seen <= self.idle_ttl);
        before - sessions.len()
    }

    async fn touch<T, F>(&self, session: Uuid, read: F) -> Option<T>
    where
        F: FnOnce(&SessionHistory) -> T,
    {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let history = sessions.get_mut(&session)?;
        if now - history.last_seen > self.idle_ttl {
            sessions.remove(&session);
            return None;
        }
        history.last_seen = now;
        Some(read(history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::SentimentLabel;

    fn entry(text: &str, label: SentimentLabel) -> HistoryEntry {
        HistoryEntry::new(text, label, Some(80.0), Utc::now())
    }

    #[actix_web::test]
    async fn appends_in_order_per_session() {
        let service = HistoryService::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        service.append(alice, entry("first", SentimentLabel::Positive)).await;
        service.append(bob, entry("other", SentimentLabel::Negative)).await;
        service
            .append_many(
                alice,
                vec![
                    entry("second", SentimentLabel::Negative),
                    entry("third", SentimentLabel::Positive),
                ],
            )
            .await;

        let texts: Vec<String> = service
            .entries(alice)
            .await
            .into_iter()
            .map(|e| e.text)
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
        assert_eq!(service.entries(bob).await.len(), 1);
    }

    #[actix_web::test]
    async fn summary_tracks_labels() {
        let service = HistoryService::new();
        let session = Uuid::new_v4();
        assert_eq!(service.summary(session).await, HistorySummary::default());

        service.append(session, entry("a", SentimentLabel::Positive)).await;
        service.append(session, entry("b", SentimentLabel::Negative)).await;
        service.append(session, entry("c", SentimentLabel::Positive)).await;

        let summary = service.summary(session).await;
        assert_eq!((summary.total, summary.positive, summary.negative), (3, 2, 1));
        assert_eq!(service.snapshot(session).await.summary, summary);
    }

    #[actix_web::test]
    async fn clear_only_affects_one_session() {
        let service = HistoryService::new();
        let kept = Uuid::new_v4();
        let cleared = Uuid::new_v4();
        service.append(kept, entry("keep", SentimentLabel::Positive)).await;
        service.append(cleared, entry("drop", SentimentLabel::Negative)).await;

        assert_eq!(service.clear(cleared).await, 1);
        assert_eq!(service.clear(cleared).await, 0);
        assert!(service.entries(cleared).await.is_empty());
        assert_eq!(service.entries(kept).await.len(), 1);
    }

    #[actix_web::test]
    async fn idle_sessions_are_expired() {
        let service = HistoryService::with_idle_ttl(Duration::minutes(30));
        for _ in 0..100 {
            service
                .append(Uuid::new_v4(), entry("one-off", SentimentLabel::Positive))
                .await;
        }
        assert_eq!(service.session_count().await, 100);

        assert_eq!(service.expire_idle(Utc::now() + Duration::minutes(10)).await, 0);
        assert_eq!(service.expire_idle(Utc::now() + Duration::minutes(31)).await, 100);
        assert_eq!(service.session_count().await, 0);
    }

    #[actix_web::test]
    async fn writes_evict_sessions_past_the_ttl() {
        let service = HistoryService::with_idle_ttl(Duration::zero());
        let abandoned = Uuid::new_v4();
        service.append(abandoned, entry("stale", SentimentLabel::Negative)).await;
        std::thread::sleep(std::time::Duration::from_millis(5));

        let active = Uuid::new_v4();
        service.append(active, entry("fresh", SentimentLabel::Positive)).await;
        assert_eq!(service.session_count().await, 1);
        assert!(service.entries(abandoned).await.is_empty());
    }

    #[actix_web::test]
    async fn reading_keeps_a_session_alive() {
        let service = HistoryService::with_idle_ttl(Duration::minutes(30));
        let session = Uuid::new_v4();
        service.append(session, entry("kept", SentimentLabel::Positive)).await;

        assert_eq!(service.entries(session).await.len(), 1);
        assert_eq!(service.expire_idle(Utc::now() + Duration::minutes(29)).await, 0);
        assert_eq!(service.session_count().await, 1);
    }
}
