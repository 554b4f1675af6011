//! Thread store
//!
//! Holds the ordered threads of the loaded video. Threads are kept in a
//! persistent vector, so a snapshot is an O(1) immutable copy and a restore
//! is a single value swap.

use crate::types::{Comment, CommentId, Thread};
use im::Vector;
use serde::{Deserialize, Serialize};

/// Immutable copy of a store's contents, captured before an optimistic mutation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    threads: Vector<Thread>,
}

impl StoreSnapshot {
    /// Threads captured in this snapshot
    #[inline]
    #[must_use]
    pub fn threads(&self) -> &Vector<Thread> {
        &self.threads
    }

    /// Number of captured threads
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    /// Whether the snapshot holds no threads
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }
}

/// Entity removed by [`ThreadStore::remove_by_id`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removed {
    /// The id addressed a thread root; the whole thread went
    Thread(Thread),
    /// The id addressed a reply
    Reply {
        /// Parent thread
        thread_id: CommentId,
        /// The removed reply
        reply: Comment,
    },
}

/// Ordered sequence of threads, newest first
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ThreadStore {
    threads: Vector<Thread>,
}

impl ThreadStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current threads in display order
    #[inline]
    #[must_use]
    pub fn threads(&self) -> &Vector<Thread> {
        &self.threads
    }

    /// Number of threads
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    /// Whether the store holds no threads
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Total replies held across all threads
    #[must_use]
    pub fn reply_count_total(&self) -> usize {
        self.threads.iter().map(|t| t.replies.len()).sum()
    }

    /// Find a thread by its thread id
    #[must_use]
    pub fn thread(&self, id: &CommentId) -> Option<&Thread> {
        self.threads.iter().find(|t| t.id == *id)
    }

    /// Whether any thread, root, or reply carries `id`
    #[must_use]
    pub fn contains_id(&self, id: &CommentId) -> bool {
        self.threads.iter().any(|t| t.contains_id(id))
    }

    /// Generate a provisional id not held anywhere in the store
    #[must_use]
    pub fn fresh_provisional_id(&self) -> CommentId {
        loop {
            let id = CommentId::provisional();
            if !self.contains_id(&id) {
                return id;
            }
        }
    }

    /// Full resync: discard everything and install `threads` in order
    ///
    /// Provisional entities absent from `threads` silently disappear.
    pub fn replace_all(&mut self, threads: impl IntoIterator<Item = Thread>) {
        self.threads = threads.into_iter().collect();
    }

    /// Drop every thread
    #[inline]
    pub fn clear(&mut self) {
        self.threads = Vector::new();
    }

    /// Insert a thread as the first (newest) entry
    #[inline]
    pub fn insert_thread_at_front(&mut self, thread: Thread) {
        self.threads.push_front(thread);
    }

    /// Remove a thread by thread id; no-op if absent
    pub fn remove_thread(&mut self, id: &CommentId) -> Option<Thread> {
        let index = self.threads.iter().position(|t| t.id == *id)?;
        Some(self.threads.remove(index))
    }

    /// Append a reply to the named thread
    ///
    /// Returns `false` without touching the store when the thread is absent,
    /// which happens when a resync removed it while the write was in flight.
    pub fn append_reply_to_thread(&mut self, thread_id: &CommentId, reply: Comment) -> bool {
        let Some(thread) = self.threads.iter_mut().find(|t| t.id == *thread_id) else {
            return false;
        };
        thread.replies.push_back(reply);
        true
    }

    /// Remove the entity addressed by `id`; no-op if absent
    ///
    /// Thread roots and replies share one id space. Threads are scanned in
    /// order; the first thread whose id or root comment id equals `id` is
    /// removed whole, otherwise the first reply with that id is removed from
    /// its thread.
    pub fn remove_by_id(&mut self, id: &CommentId) -> Option<Removed> {
        let (index, reply_position) = self.threads.iter().enumerate().find_map(|(index, thread)| {
            if thread.is_addressed_by(id) {
                Some((index, None))
            } else {
                thread
                    .replies
                    .iter()
                    .position(|r| r.id == *id)
                    .map(|position| (index, Some(position)))
            }
        })?;

        match reply_position {
            None => Some(Removed::Thread(self.threads.remove(index))),
            Some(position) => {
                let thread = self.threads.get_mut(index)?;
                let reply = thread.replies.remove(position);
                Some(Removed::Reply {
                    thread_id: thread.id.clone(),
                    reply,
                })
            }
        }
    }

    /// Alias of [`remove_by_id`](Self::remove_by_id) named after the reply use case
    #[inline]
    pub fn remove_reply(&mut self, id: &CommentId) -> Option<Removed> {
        self.remove_by_id(id)
    }

    /// Capture an immutable copy of the current contents
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            threads: self.threads.clone(),
        }
    }

    /// Replace the current contents with a previously captured snapshot
    #[inline]
    pub fn restore(&mut self, snapshot: StoreSnapshot) {
        self.threads = snapshot.threads;
    }
}

impl FromIterator<Thread> for ThreadStore {
    fn from_iter<I: IntoIterator<Item = Thread>>(iter: I) -> Self {
        Self {
            threads: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Author;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn comment(id: &str) -> Comment {
        Comment::new(
            CommentId::confirmed(id),
            Author::new("viewer", ""),
            format!("body of {id}"),
            Utc::now(),
        )
    }

    fn thread(root: &str, replies: &[&str]) -> Thread {
        Thread::new(comment(root)).with_replies(replies.iter().map(|r| comment(r)))
    }

    #[test]
    fn insert_at_front_orders_newest_first() {
        let mut store = ThreadStore::from_iter([thread("t1", &[])]);
        store.insert_thread_at_front(Thread::new(comment("t2")));

        let ids: Vec<_> = store.threads().iter().map(|t| t.id.to_string()).collect();
        assert_eq!(ids, vec!["t2", "t1"]);
    }

    #[test]
    fn remove_thread_noop_when_absent() {
        let mut store = ThreadStore::from_iter([thread("t1", &[])]);
        assert!(store.remove_thread(&CommentId::confirmed("missing")).is_none());
        assert_eq!(store.len(), 1);
        assert!(store.remove_thread(&CommentId::confirmed("t1")).is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn append_reply_goes_last() {
        let mut store = ThreadStore::from_iter([thread("t1", &["r1"])]);
        assert!(store.append_reply_to_thread(&CommentId::confirmed("t1"), comment("r2")));

        let thread = store.thread(&CommentId::confirmed("t1")).unwrap();
        let ids: Vec<_> = thread.replies.iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
        // Informational count is not bumped by local appends
        assert_eq!(thread.reply_count, 1);
    }

    #[test]
    fn append_reply_to_missing_thread_is_noop() {
        let mut store = ThreadStore::from_iter([thread("t1", &[])]);
        let before = store.snapshot();
        assert!(!store.append_reply_to_thread(&CommentId::confirmed("gone"), comment("r1")));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn remove_by_id_removes_whole_thread_for_root_id() {
        let mut store = ThreadStore::from_iter([thread("c1", &["r1", "r2"]), thread("c2", &[])]);
        let removed = store.remove_by_id(&CommentId::confirmed("c1"));

        assert!(matches!(removed, Some(Removed::Thread(ref t)) if t.replies.len() == 2));
        assert_eq!(store.len(), 1);
        assert!(!store.contains_id(&CommentId::confirmed("r1")));
    }

    #[test]
    fn remove_by_id_matches_root_when_thread_id_differs() {
        let mut store = ThreadStore::new();
        store.insert_thread_at_front(Thread::new(comment("c1")).with_id(CommentId::confirmed("t1")));

        assert!(matches!(
            store.remove_by_id(&CommentId::confirmed("c1")),
            Some(Removed::Thread(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn remove_by_id_removes_single_reply() {
        let mut store = ThreadStore::from_iter([thread("c1", &["r1", "r2"])]);
        let removed = store.remove_reply(&CommentId::confirmed("r1"));

        match removed {
            Some(Removed::Reply { thread_id, reply }) => {
                assert_eq!(thread_id, CommentId::confirmed("c1"));
                assert_eq!(reply.id, CommentId::confirmed("r1"));
            }
            other => panic!("expected reply removal, got {other:?}"),
        }
        let thread = store.thread(&CommentId::confirmed("c1")).unwrap();
        assert_eq!(thread.replies.len(), 1);
    }

    #[test]
    fn remove_by_id_absent_is_noop() {
        let mut store = ThreadStore::from_iter([thread("c1", &["r1"])]);
        let before = store.clone();
        assert!(store.remove_by_id(&CommentId::confirmed("nope")).is_none());
        assert_eq!(store, before);
    }

    #[test]
    fn snapshot_is_unaffected_by_later_mutation() {
        let mut store = ThreadStore::from_iter([thread("c1", &["r1"])]);
        let snapshot = store.snapshot();

        store.remove_by_id(&CommentId::confirmed("r1"));
        store.insert_thread_at_front(Thread::new(comment("c2")));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.threads()[0].replies.len(), 1);

        store.restore(snapshot.clone());
        assert_eq!(store.snapshot(), snapshot);
    }

    #[test]
    fn fresh_provisional_id_is_unused() {
        let store = ThreadStore::from_iter([thread("c1", &["r1"])]);
        let id = store.fresh_provisional_id();
        assert!(id.is_provisional());
        assert!(!store.contains_id(&id));
    }

    #[test]
    fn reply_count_total_sums_held_replies() {
        let store = ThreadStore::from_iter([thread("c1", &["r1", "r2"]), thread("c2", &["r3"])]);
        assert_eq!(store.reply_count_total(), 3);
        assert_eq!(ThreadStore::new().reply_count_total(), 0);
    }

    #[test]
    fn store_serializes_as_json() {
        let store = ThreadStore::from_iter([thread("c1", &["r1"])]);
        let json = serde_json::to_string(&store).unwrap();
        let back: ThreadStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, store);
    }
}
