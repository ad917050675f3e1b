//! Session history of completed videos, most recent first.

use crate::session::state::GeneratedVideo;
use std::collections::VecDeque;

/// Ordered list of completed videos. Lives only as long as the session.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<GeneratedVideo>,
}

impl History {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn prepend(&mut self, video: GeneratedVideo) {
        self.entries.push_front(video);
    }

    /// Removes an entry, releasing its asset once no other handle remains.
    pub(crate) fn remove(&mut self, id: u64) -> Option<GeneratedVideo> {
        let index = self.entries.iter().position(|v| v.id == id)?;
        self.entries.remove(index)
    }

    /// Looks up an entry by id.
    pub fn get(&self, id: u64) -> Option<&GeneratedVideo> {
        self.entries.iter().find(|v| v.id == id)
    }

    /// The most recent entry.
    pub fn latest(&self) -> Option<&GeneratedVideo> {
        self.entries.front()
    }

    /// Iterates most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &GeneratedVideo> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been generated yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::{VideoAsset, VideoConfig, VideoMetadata};
    use std::sync::Arc;

    fn video(id: u64) -> GeneratedVideo {
        GeneratedVideo {
            id,
            asset: Arc::new(VideoAsset::new(vec![0; 4], "video/mp4", VideoMetadata::default())),
            prompt: format!("prompt {}", id),
            created_at: chrono::Utc::now(),
            config: VideoConfig::default(),
        }
    }

    #[test]
    fn test_prepend_orders_most_recent_first() {
        let mut history = History::new();
        history.prepend(video(1));
        history.prepend(video(2));
        history.prepend(video(3));

        let ids: Vec<u64> = history.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(history.latest().unwrap().id, 3);
        assert_eq!(history.get(2).unwrap().prompt, "prompt 2");
        assert!(history.get(9).is_none());
    }

    #[test]
    fn test_remove_releases_asset() {
        let mut history = History::new();
        let entry = video(1);
        let weak = Arc::downgrade(&entry.asset);
        history.prepend(entry);

        let removed = history.remove(1).unwrap();
        assert!(history.is_empty());
        drop(removed);
        assert!(weak.upgrade().is_none());
        assert!(history.remove(1).is_none());
    }
}
