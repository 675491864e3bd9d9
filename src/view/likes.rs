//! Like bucket transform
//!
//! Reaction rows share one table for both polarities. Views need them split
//! into independent liker and disliker lists so that counts and viewer
//! membership tests come from the same fetch.

use crate::data::Like;

/// Reaction rows for one target, partitioned by polarity.
#[derive(Debug, Clone, Default)]
pub struct LikeBuckets {
    /// User IDs that reacted with polarity true.
    pub likers: Vec<String>,
    /// User IDs that reacted with polarity false.
    pub dislikers: Vec<String>,
}

impl LikeBuckets {
    /// Partition raw like rows into polarity buckets.
    ///
    /// Rows for other targets must be filtered out before calling this;
    /// the transform only looks at polarity.
    pub fn from_rows(rows: &[Like]) -> Self {
        let mut buckets = Self::default();
        for row in rows {
            if row.liked {
                buckets.likers.push(row.liked_by.clone());
            } else {
                buckets.dislikers.push(row.liked_by.clone());
            }
        }
        buckets
    }

    pub fn likes_count(&self) -> i64 {
        self.likers.len() as i64
    }

    pub fn dislikes_count(&self) -> i64 {
        self.dislikers.len() as i64
    }

    pub fn has_liker(&self, user_id: &str) -> bool {
        self.likers.iter().any(|id| id == user_id)
    }

    pub fn has_disliker(&self, user_id: &str) -> bool {
        self.dislikers.iter().any(|id| id == user_id)
    }
}
