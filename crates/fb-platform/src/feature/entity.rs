//! Feature Entity
//!
//! Aggregate root for feature requests. Votes and comments are embedded
//! child collections owned exclusively by their feature: they are
//! created, read, and deleted only through the parent document.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use bson::serde_helpers::chrono_datetime_as_bson_datetime;

/// Status assigned to newly submitted features
pub const STATUS_NEW: &str = "New";

/// A vote is a membership fact: presence in `Feature::votes` means the
/// referenced user currently supports the feature. There is no separate
/// unvote record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    /// Voting user reference
    pub user: String,
}

/// Reaction on a comment, keyed by user and type. Storage only; no
/// toggle semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub user: String,
    #[serde(rename = "type")]
    pub reaction_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Comment ID, distinguishable within the parent feature and unique
    /// enough to locate the parent across the whole collection
    #[serde(rename = "_id")]
    pub id: String,

    /// Author reference
    pub user: String,

    pub text: String,

    #[serde(default)]
    pub reactions: Vec<Reaction>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: crate::TsidGenerator::generate(),
            user: author_id.into(),
            text: text.into(),
            reactions: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    /// TSID as Crockford Base32 string
    #[serde(rename = "_id")]
    pub id: String,

    pub title: String,

    pub description: String,

    /// Creating user reference
    pub user: String,

    #[serde(default = "default_status")]
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default)]
    pub votes: Vec<Vote>,

    #[serde(default)]
    pub comments: Vec<Comment>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

fn default_status() -> String {
    STATUS_NEW.to_string()
}

impl Feature {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        author_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: crate::TsidGenerator::generate(),
            title: title.into(),
            description: description.into(),
            user: author_id.into(),
            status: default_status(),
            image_url: None,
            votes: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn has_voted(&self, user_id: &str) -> bool {
        self.votes.iter().any(|v| v.user == user_id)
    }

    /// Flip vote membership for `user_id`. Returns true when the vote was
    /// added, false when removed. The persisted equivalent is a targeted
    /// `$pull`/`$push` in the repository; this in-memory form carries the
    /// same invariant: a user id appears at most once in the votes list.
    pub fn toggle_vote(&mut self, user_id: &str) -> bool {
        if self.has_voted(user_id) {
            self.votes.retain(|v| v.user != user_id);
            self.updated_at = Utc::now();
            false
        } else {
            self.votes.push(Vote { user: user_id.to_string() });
            self.updated_at = Utc::now();
            true
        }
    }

    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }

    pub fn comment_count(&self) -> usize {
        self.comments.len()
    }

    /// Append a comment; multiple comments per user are permitted.
    pub fn add_comment(&mut self, author_id: &str, text: impl Into<String>) -> Comment {
        let comment = Comment::new(author_id, text);
        self.comments.push(comment.clone());
        self.updated_at = Utc::now();
        comment
    }

    pub fn comment(&self, comment_id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    pub fn comment_mut(&mut self, comment_id: &str) -> Option<&mut Comment> {
        self.comments.iter_mut().find(|c| c.id == comment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_feature_is_empty() {
        let f = Feature::new("Dark mode", "Add a dark theme", "user-1");
        assert_eq!(f.status, STATUS_NEW);
        assert!(f.votes.is_empty());
        assert!(f.comments.is_empty());
        assert!(f.image_url.is_none());
    }

    #[test]
    fn toggle_vote_adds_then_removes() {
        let mut f = Feature::new("Dark mode", "desc", "author");

        assert!(f.toggle_vote("u1"));
        assert!(f.has_voted("u1"));
        assert_eq!(f.vote_count(), 1);

        assert!(!f.toggle_vote("u1"));
        assert!(!f.has_voted("u1"));
        assert_eq!(f.vote_count(), 0);
    }

    #[test]
    fn toggle_pair_restores_vote_set() {
        let mut f = Feature::new("Dark mode", "desc", "author");
        f.toggle_vote("u1");
        f.toggle_vote("u2");
        let before = f.votes.clone();

        f.toggle_vote("u3");
        f.toggle_vote("u3");

        assert_eq!(f.votes, before);
    }

    #[test]
    fn votes_are_a_set_keyed_by_user() {
        let mut f = Feature::new("Dark mode", "desc", "author");
        f.toggle_vote("u1");
        f.toggle_vote("u2");
        f.toggle_vote("u1");
        f.toggle_vote("u1");

        let users: Vec<&str> = f.votes.iter().map(|v| v.user.as_str()).collect();
        assert_eq!(users, vec!["u2", "u1"]);
    }

    #[test]
    fn comments_allow_multiple_per_user() {
        let mut f = Feature::new("Dark mode", "desc", "author");
        let first = f.add_comment("u2", "nice");
        let second = f.add_comment("u2", "still nice");

        assert_ne!(first.id, second.id);
        assert_eq!(f.comment_count(), 2);
        assert!(first.reactions.is_empty());
    }

    #[test]
    fn comment_text_is_editable_in_place() {
        let mut f = Feature::new("Dark mode", "desc", "author");
        let comment = f.add_comment("u2", "nice");

        f.comment_mut(&comment.id).unwrap().text = "great".to_string();
        assert_eq!(f.comment(&comment.id).unwrap().text, "great");
    }
}
