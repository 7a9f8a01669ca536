//! Shared, ordered message board.
//!
//! Every session appends to and reads from one [`BoardStore`]. A batch is
//! applied under a single lock acquisition, so readers observe either none or
//! all of it and posts from one batch stay contiguous.
//!
//! # Invariants
//!
//! - Posts are only ever appended; board order is acceptance order.
//! - `total_received` equals the number of posts accepted through
//!   [`BoardStore::append_batch`] since startup.
//! - No stored post has an empty body.

use std::sync::{Mutex, MutexGuard, PoisonError};

use corkboard_proto::Post;

use crate::error::BoardError;

/// A post as kept on the board, tagged with the client that sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPost {
    /// Post fields as received
    pub post: Post,
    /// Id of the session that posted it
    pub client_id: u64,
}

#[derive(Debug, Default)]
struct BoardInner {
    posts: Vec<StoredPost>,
    total_received: u64,
}

/// Thread-safe append-only board.
#[derive(Debug, Default)]
pub struct BoardStore {
    inner: Mutex<BoardInner>,
}

impl BoardStore {
    /// Empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch atomically.
    ///
    /// Returns the number of posts added.
    ///
    /// # Errors
    ///
    /// - [`BoardError::EmptyBatch`] when `posts` is empty
    /// - [`BoardError::EmptyBody`] when any post has an empty body; nothing
    ///   from the batch is stored
    pub fn append_batch(&self, posts: Vec<Post>, client_id: u64) -> Result<usize, BoardError> {
        if posts.is_empty() {
            return Err(BoardError::EmptyBatch);
        }
        if let Some(index) = posts.iter().position(|post| post.body.is_empty()) {
            return Err(BoardError::EmptyBody { index });
        }

        let added = posts.len();
        let mut inner = self.lock();
        inner.posts.extend(posts.into_iter().map(|post| StoredPost { post, client_id }));
        inner.total_received += added as u64;
        Ok(added)
    }

    /// Posts matching both filters, in board order.
    ///
    /// A `None` or empty filter matches everything. Matching is exact and
    /// byte-wise: no trimming, no case folding.
    pub fn snapshot_filtered(&self, author: Option<&[u8]>, title: Option<&[u8]>) -> Vec<Post> {
        let author = author.filter(|f| !f.is_empty());
        let title = title.filter(|f| !f.is_empty());

        self.lock()
            .posts
            .iter()
            .filter(|stored| author.is_none_or(|a| stored.post.author == a))
            .filter(|stored| title.is_none_or(|t| stored.post.title == t))
            .map(|stored| stored.post.clone())
            .collect()
    }

    /// Every stored post with its origin, in board order.
    pub fn snapshot(&self) -> Vec<StoredPost> {
        self.lock().posts.clone()
    }

    /// Posts and `total_received`, read under one lock.
    pub fn snapshot_with_total(&self) -> (Vec<StoredPost>, u64) {
        let inner = self.lock();
        (inner.posts.clone(), inner.total_received)
    }

    /// Number of stored posts.
    pub fn size(&self) -> usize {
        self.lock().posts.len()
    }

    /// Posts accepted from clients since startup.
    pub fn total_received(&self) -> u64 {
        self.lock().total_received
    }

    /// Replace the board with posts restored from disk.
    ///
    /// `total_received` is left alone: restored posts were not received by
    /// this process.
    pub fn restore(&self, posts: Vec<StoredPost>) {
        self.lock().posts = posts;
    }

    fn lock(&self) -> MutexGuard<'_, BoardInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    fn post(author: &'static str, title: &'static str, body: &'static str) -> Post {
        Post::new(author, title, body)
    }

    #[test]
    fn append_preserves_order() {
        let board = BoardStore::new();
        board.append_batch(vec![post("a", "t1", "one")], 1).unwrap();
        board.append_batch(vec![post("b", "t2", "two"), post("c", "t3", "three")], 2).unwrap();

        let bodies: Vec<_> = board.snapshot().into_iter().map(|s| s.post.body).collect();
        assert_eq!(bodies, ["one", "two", "three"]);
        assert_eq!(board.total_received(), 3);
        assert_eq!(board.size(), 3);
    }

    #[test]
    fn empty_batch_is_rejected() {
        let board = BoardStore::new();
        assert_eq!(board.append_batch(vec![], 1), Err(BoardError::EmptyBatch));
        assert_eq!(board.total_received(), 0);
    }

    #[test]
    fn empty_body_rejects_whole_batch() {
        let board = BoardStore::new();
        let result = board.append_batch(vec![post("a", "t", "ok"), post("b", "t", "")], 1);
        assert_eq!(result, Err(BoardError::EmptyBody { index: 1 }));
        assert_eq!(board.size(), 0);
        assert_eq!(board.total_received(), 0);
    }

    #[test]
    fn filters_are_exact_and_combined() {
        let board = BoardStore::new();
        board
            .append_batch(
                vec![
                    post("Alice", "News", "1"),
                    post("alice", "News", "2"),
                    post("Alice", "Other", "3"),
                    post("Bob", "News", "4"),
                ],
                1,
            )
            .unwrap();

        let bodies = |author: Option<&[u8]>, title: Option<&[u8]>| -> Vec<_> {
            board.snapshot_filtered(author, title).into_iter().map(|p| p.body).collect()
        };

        assert_eq!(bodies(None, None), ["1", "2", "3", "4"]);
        assert_eq!(bodies(Some(b"Alice"), None), ["1", "3"]);
        assert_eq!(bodies(None, Some(b"News")), ["1", "2", "4"]);
        assert_eq!(bodies(Some(b"Alice"), Some(b"News")), ["1"]);
        assert_eq!(bodies(Some(b""), Some(b"")), ["1", "2", "3", "4"]);
        assert!(bodies(Some(b"Alice "), None).is_empty());
    }

    #[test]
    fn restore_does_not_count_as_received() {
        let board = BoardStore::new();
        board.restore(vec![StoredPost { post: post("a", "t", "b"), client_id: 7 }]);
        assert_eq!(board.size(), 1);
        assert_eq!(board.total_received(), 0);
    }

    #[test]
    fn concurrent_batches_stay_contiguous() {
        let board = Arc::new(BoardStore::new());
        let handles: Vec<_> = (0..8u64)
            .map(|client| {
                let board = Arc::clone(&board);
                thread::spawn(move || {
                    for _ in 0..25 {
                        let batch = (0..3).map(|_| Post::new("w", "t", client.to_string())).collect();
                        board.append_batch(batch, client).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let (posts, total) = board.snapshot_with_total();
        assert_eq!(total, 8 * 25 * 3);
        assert_eq!(posts.len() as u64, total);
        for batch in posts.chunks(3) {
            assert!(batch.iter().all(|p| p.client_id == batch[0].client_id));
        }
    }
}
