//! Read-side view assembly
//!
//! Write operations store normalized rows; read operations compose views
//! from small relation fetches merged by pure transforms. The pipeline for
//! every view is: fetch related rows (concurrently where independent),
//! partition likes into polarity buckets, compute viewer-relative flags,
//! assemble the serialized shape.

mod assemble;
mod flags;
mod likes;

pub use assemble::*;
pub use flags::{is_disliked, is_liked, is_owner};
pub use likes::LikeBuckets;
