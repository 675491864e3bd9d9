//! Viewer-relative flags
//!
//! Pure predicates computed against an optional viewer. An anonymous viewer
//! (None) yields false for every flag, never an error.

use super::likes::LikeBuckets;

pub fn is_owner(viewer_id: Option<&str>, owner_id: &str) -> bool {
    viewer_id == Some(owner_id)
}

pub fn is_liked(viewer_id: Option<&str>, buckets: &LikeBuckets) -> bool {
    viewer_id.is_some_and(|id| buckets.has_liker(id))
}

pub fn is_disliked(viewer_id: Option<&str>, buckets: &LikeBuckets) -> bool {
    viewer_id.is_some_and(|id| buckets.has_disliker(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buckets() -> LikeBuckets {
        LikeBuckets {
            likers: vec!["alice".to_string()],
            dislikers: vec!["bob".to_string()],
        }
    }

    #[test]
    fn anonymous_viewer_is_all_false() {
        assert!(!is_owner(None, "alice"));
        assert!(!is_liked(None, &buckets()));
        assert!(!is_disliked(None, &buckets()));
    }

    #[test]
    fn flags_follow_membership() {
        let b = buckets();
        assert!(is_liked(Some("alice"), &b));
        assert!(!is_disliked(Some("alice"), &b));
        assert!(is_disliked(Some("bob"), &b));
        assert!(!is_liked(Some("carol"), &b));
    }

    #[test]
    fn ownership_is_exact_id_match() {
        assert!(is_owner(Some("alice"), "alice"));
        assert!(!is_owner(Some("alice"), "bob"));
    }
}
