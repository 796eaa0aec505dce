//! Client-side mirror of the signed-in user's topics, plus the selected topic's
//! flashcards and score history.
//!
//! Read-after-write via full refresh: after any mutation the affected list is
//! fetched again from the store instead of being patched locally, so the cache
//! always reflects the store's validation, ownership checks and cascades.

use crate::database::RemoteStore;
use crate::errors::StoreError;
use crate::models::{Flashcard, Identity, ScoreRecord, Topic, TopicId};

#[derive(Clone, Debug, Default)]
pub struct TopicCache {
    topics: Vec<Topic>,
    selected: Option<Topic>,
    flashcards: Vec<Flashcard>,
    scores: Vec<ScoreRecord>,
}

fn sort_topics(topics: &mut [Topic]) {
    topics.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
}

impl TopicCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn selected(&self) -> Option<&Topic> {
        self.selected.as_ref()
    }

    pub fn flashcards(&self) -> &[Flashcard] {
        &self.flashcards
    }

    pub fn scores(&self) -> &[ScoreRecord] {
        &self.scores
    }

    pub fn find_topic(&self, topic_id: TopicId) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == topic_id)
    }

    /// Replaces the topic list, sorted by name ignoring case.
    ///
    /// On failure the whole cache is emptied, selection included, and the
    /// error is handed back for reporting. The selected topic is kept in step
    /// with the fresh list.
    pub async fn load_topics<S: RemoteStore + ?Sized>(
        &mut self,
        store: &S,
        caller: Option<&Identity>,
    ) -> Result<(), StoreError> {
        match store.list_topics(caller).await {
            Ok(mut topics) => {
                sort_topics(&mut topics);
                self.topics = topics;
                self.sync_selection();
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to load topics: {}", e);
                self.clear();
                Err(e)
            }
        }
    }

    fn sync_selection(&mut self) {
        let Some(selected_id) = self.selected.as_ref().map(|t| t.id) else {
            return;
        };
        match self.topics.iter().find(|t| t.id == selected_id) {
            Some(fresh) => self.selected = Some(fresh.clone()),
            None => {
                tracing::debug!("Selected topic {} no longer exists", selected_id);
                self.clear_selection();
            }
        }
    }

    /// Makes `topic` the active one and loads its cards and score history.
    ///
    /// Both lists are fetched before anything is replaced, so a failure leaves
    /// the previous selection intact, except `NotFound`, which drops it.
    pub async fn select_topic<S: RemoteStore + ?Sized>(
        &mut self,
        store: &S,
        caller: Option<&Identity>,
        topic: Topic,
    ) -> Result<(), StoreError> {
        let fetched = async {
            let cards = store.list_flashcards(caller, topic.id).await?;
            let scores = store.list_score_history(caller, topic.id).await?;
            Ok::<_, StoreError>((cards, scores))
        }
        .await;

        match fetched {
            Ok((cards, scores)) => {
                self.selected = Some(topic);
                self.set_flashcards(cards);
                self.set_scores(scores);
                Ok(())
            }
            Err(StoreError::NotFound) => {
                self.clear_selection();
                Err(StoreError::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    /// Re-fetches the flashcards of `topic_id` if it is still the selected topic.
    pub async fn load_flashcards<S: RemoteStore + ?Sized>(
        &mut self,
        store: &S,
        caller: Option<&Identity>,
        topic_id: TopicId,
    ) -> Result<(), StoreError> {
        let result = store.list_flashcards(caller, topic_id).await;
        if !self.is_selected(topic_id) {
            return result.map(|_| ());
        }
        match result {
            Ok(cards) => {
                self.set_flashcards(cards);
                Ok(())
            }
            Err(StoreError::NotFound) => {
                self.clear_selection();
                Err(StoreError::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    /// Re-fetches the score history of `topic_id` if it is still the selected topic.
    pub async fn load_score_history<S: RemoteStore + ?Sized>(
        &mut self,
        store: &S,
        caller: Option<&Identity>,
        topic_id: TopicId,
    ) -> Result<(), StoreError> {
        let result = store.list_score_history(caller, topic_id).await;
        if !self.is_selected(topic_id) {
            return result.map(|_| ());
        }
        match result {
            Ok(scores) => {
                self.set_scores(scores);
                Ok(())
            }
            Err(StoreError::NotFound) => {
                self.clear_selection();
                Err(StoreError::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    fn is_selected(&self, topic_id: TopicId) -> bool {
        self.selected.as_ref().is_some_and(|t| t.id == topic_id)
    }

    fn set_flashcards(&mut self, mut cards: Vec<Flashcard>) {
        cards.sort_by_key(|c| c.created_at);
        self.flashcards = cards;
    }

    fn set_scores(&mut self, mut scores: Vec<ScoreRecord>) {
        scores.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.scores = scores;
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.flashcards.clear();
        self.scores.clear();
    }

    pub fn clear(&mut self) {
        self.topics.clear();
        self.clear_selection();
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
            && self.selected.is_none()
            && self.flashcards.is_empty()
            && self.scores.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::recording::RecordingStore;
    use crate::models::ManualClock;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Arc;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 7, 0, 0).unwrap()
    }

    fn setup() -> (RecordingStore, Arc<ManualClock>, Identity) {
        let clock = Arc::new(ManualClock::new(start()));
        (
            RecordingStore::new(clock.clone()),
            clock,
            Identity::new("alice"),
        )
    }

    #[tokio::test]
    async fn test_topics_sorted_by_name_ignoring_case() {
        let (store, _, alice) = setup();
        for name in ["kanji", "Algebra", "Biology", "anatomy"] {
            store
                .inner()
                .create_topic(Some(&alice), name, start())
                .await
                .unwrap();
        }
        let mut cache = TopicCache::new();

        cache.load_topics(&store, Some(&alice)).await.unwrap();

        let names: Vec<&str> = cache.topics().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Algebra", "anatomy", "Biology", "kanji"]);
    }

    #[tokio::test]
    async fn test_failed_topic_load_empties_list() {
        let (store, _, alice) = setup();
        store
            .inner()
            .create_topic(Some(&alice), "Kanji", start())
            .await
            .unwrap();
        let mut cache = TopicCache::new();
        cache.load_topics(&store, Some(&alice)).await.unwrap();
        assert_eq!(cache.topics().len(), 1);

        store.fail("list_topics", StoreError::Transient("offline".to_string()));
        let result = cache.load_topics(&store, Some(&alice)).await;

        assert!(result.is_err());
        assert!(cache.topics().is_empty());
    }

    #[tokio::test]
    async fn test_failed_topic_load_drops_selection() {
        let (store, _, alice) = setup();
        let topic = store
            .inner()
            .create_topic(Some(&alice), "Kanji", start())
            .await
            .unwrap();
        store
            .inner()
            .create_flashcard(Some(&alice), topic.id, "水", "water")
            .await
            .unwrap();
        let mut cache = TopicCache::new();
        cache.load_topics(&store, Some(&alice)).await.unwrap();
        cache.select_topic(&store, Some(&alice), topic).await.unwrap();

        store.fail("list_topics", StoreError::Transient("offline".to_string()));
        let result = cache.load_topics(&store, Some(&alice)).await;

        assert!(matches!(result, Err(StoreError::Transient(_))));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_select_topic_loads_cards_and_newest_scores_first() {
        let (store, clock, alice) = setup();
        let topic = store
            .inner()
            .create_topic(Some(&alice), "Kanji", start())
            .await
            .unwrap();
        for front in ["水", "火"] {
            store
                .inner()
                .create_flashcard(Some(&alice), topic.id, front, "meaning")
                .await
                .unwrap();
            clock.advance_day();
        }
        store.inner().record_score(Some(&alice), topic.id, 1, 1).await.unwrap();
        clock.advance_day();
        store.inner().record_score(Some(&alice), topic.id, 2, 0).await.unwrap();

        let mut cache = TopicCache::new();
        cache.load_topics(&store, Some(&alice)).await.unwrap();
        cache
            .select_topic(&store, Some(&alice), topic.clone())
            .await
            .unwrap();

        assert_eq!(cache.selected().map(|t| t.id), Some(topic.id));
        let fronts: Vec<&str> = cache.flashcards().iter().map(|c| c.front.as_str()).collect();
        assert_eq!(fronts, vec!["水", "火"]);
        assert_eq!(cache.scores()[0].correct_count, 2);
        assert_eq!(cache.scores()[1].correct_count, 1);
    }

    #[tokio::test]
    async fn test_failed_selection_keeps_previous_state() {
        let (store, _, alice) = setup();
        let first = store
            .inner()
            .create_topic(Some(&alice), "Kanji", start())
            .await
            .unwrap();
        let second = store
            .inner()
            .create_topic(Some(&alice), "Kana", start())
            .await
            .unwrap();
        store
            .inner()
            .create_flashcard(Some(&alice), first.id, "水", "water")
            .await
            .unwrap();
        let mut cache = TopicCache::new();
        cache.select_topic(&store, Some(&alice), first.clone()).await.unwrap();

        store.fail(
            "list_score_history",
            StoreError::Transient("timeout".to_string()),
        );
        let result = cache.select_topic(&store, Some(&alice), second).await;

        assert!(matches!(result, Err(StoreError::Transient(_))));
        assert_eq!(cache.selected().map(|t| t.id), Some(first.id));
        assert_eq!(cache.flashcards().len(), 1);
    }

    #[tokio::test]
    async fn test_not_found_clears_selection() {
        let (store, _, alice) = setup();
        let topic = store
            .inner()
            .create_topic(Some(&alice), "Kanji", start())
            .await
            .unwrap();
        let mut cache = TopicCache::new();
        cache.select_topic(&store, Some(&alice), topic.clone()).await.unwrap();

        store.inner().delete_topic(Some(&alice), topic.id).await.unwrap();
        let result = cache.load_flashcards(&store, Some(&alice), topic.id).await;

        assert_eq!(result.unwrap_err(), StoreError::NotFound);
        assert!(cache.selected().is_none());
        assert!(cache.flashcards().is_empty());
    }

    #[tokio::test]
    async fn test_topic_reload_drops_deleted_selection() {
        let (store, _, alice) = setup();
        let topic = store
            .inner()
            .create_topic(Some(&alice), "Kanji", start())
            .await
            .unwrap();
        let mut cache = TopicCache::new();
        cache.load_topics(&store, Some(&alice)).await.unwrap();
        cache.select_topic(&store, Some(&alice), topic.clone()).await.unwrap();

        store.inner().delete_topic(Some(&alice), topic.id).await.unwrap();
        cache.load_topics(&store, Some(&alice)).await.unwrap();

        assert!(cache.is_empty());
    }
}
