//! Feature Repository
//!
//! All vote and comment mutations are expressed as single targeted
//! updates on the feature document. Nothing in here does
//! fetch-mutate-save: a concurrent toggle on the same feature can never
//! lose a write.

use mongodb::{bson::{doc, Document}, options::ReturnDocument, Collection, Database};
use futures::TryStreamExt;

use crate::feature::entity::{Comment, Feature};
use crate::shared::error::Result;

/// Recognized sort modes for the feature listing. Anything else falls
/// back to default (insertion) ordering without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Descending vote count
    Votes,
    /// Descending comment count
    Comments,
    /// Descending creation time
    New,
    /// Descending vote count, ties broken by descending comment count
    Top,
}

impl SortMode {
    pub fn parse(option: &str) -> Option<Self> {
        match option {
            "votes" => Some(Self::Votes),
            "comments" => Some(Self::Comments),
            "new" => Some(Self::New),
            "top" => Some(Self::Top),
            _ => None,
        }
    }

    fn sort_doc(self) -> Document {
        match self {
            Self::Votes => doc! { "voteCount": -1 },
            Self::Comments => doc! { "commentCount": -1 },
            Self::New => doc! { "createdAt": -1 },
            Self::Top => doc! { "voteCount": -1, "commentCount": -1 },
        }
    }
}

pub struct FeatureRepository {
    collection: Collection<Feature>,
}

impl FeatureRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("features"),
        }
    }

    pub async fn insert(&self, feature: &Feature) -> Result<()> {
        self.collection.insert_one(feature).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Feature>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    pub async fn find_all(&self) -> Result<Vec<Feature>> {
        let cursor = self.collection.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    /// One page of features in insertion order.
    pub async fn find_page(&self, skip: u64, limit: i64) -> Result<Vec<Feature>> {
        let cursor = self
            .collection
            .find(doc! {})
            .skip(skip)
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Features ordered by the requested mode. Vote/comment counts are
    /// derived in the pipeline with `$size`, not stored.
    pub async fn find_sorted(&self, mode: SortMode) -> Result<Vec<Feature>> {
        let pipeline = vec![
            doc! { "$addFields": {
                "voteCount": { "$size": "$votes" },
                "commentCount": { "$size": "$comments" },
            } },
            doc! { "$sort": mode.sort_doc() },
        ];

        let mut cursor = self.collection.aggregate(pipeline).await?;
        let mut features = Vec::new();
        while let Some(document) = cursor.try_next().await? {
            features.push(bson::from_document(document)?);
        }
        Ok(features)
    }

    /// Case-insensitive substring match against title or description.
    pub async fn search(&self, query: &str) -> Result<Vec<Feature>> {
        let cursor = self.collection.find(search_filter(query)).await?;
        Ok(cursor.try_collect().await?)
    }

    /// Partial update of title/description; only supplied fields are
    /// overwritten. Returns the post-update document.
    pub async fn update_fields(
        &self,
        id: &str,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<Feature>> {
        let mut set = doc! { "updatedAt": bson::DateTime::now() };
        if let Some(title) = title {
            set.insert("title", title);
        }
        if let Some(description) = description {
            set.insert("description", description);
        }

        Ok(self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?)
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = self.collection.delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    /// Atomically flip vote membership for `user_id` on one feature.
    ///
    /// Two conditional updates, each keyed on the current membership
    /// state: `$pull` matches only when the vote exists, `$push` is
    /// guarded by `votes.user $ne` so a duplicate can never be inserted.
    /// Returns the freshly reloaded document so the caller sees
    /// persisted state, or `None` when the feature does not exist.
    pub async fn toggle_vote(&self, feature_id: &str, user_id: &str) -> Result<Option<Feature>> {
        let stamp = doc! { "updatedAt": bson::DateTime::now() };

        let removed = self
            .collection
            .update_one(
                doc! { "_id": feature_id, "votes.user": user_id },
                doc! {
                    "$pull": { "votes": { "user": user_id } },
                    "$set": stamp.clone(),
                },
            )
            .await?;

        if removed.matched_count == 0 {
            let added = self
                .collection
                .update_one(
                    doc! { "_id": feature_id, "votes.user": { "$ne": user_id } },
                    doc! {
                        "$push": { "votes": { "user": user_id } },
                        "$set": stamp,
                    },
                )
                .await?;

            if added.matched_count == 0 {
                // Either the feature is gone, or a concurrent toggle for
                // the same user landed between the two updates. The
                // reload below distinguishes the cases; the membership
                // invariant holds either way.
                return self.find_by_id(feature_id).await;
            }
        }

        self.find_by_id(feature_id).await
    }

    /// Atomic comment append; no read-modify-write of the parent.
    pub async fn push_comment(&self, feature_id: &str, comment: &Comment) -> Result<bool> {
        let comment = bson::ser::to_bson(comment)?;
        let result = self
            .collection
            .update_one(
                doc! { "_id": feature_id },
                doc! {
                    "$push": { "comments": comment },
                    "$set": { "updatedAt": bson::DateTime::now() },
                },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    /// Rewrite one comment's text in place, located by embedded comment
    /// id across the whole collection. A single `find_one_and_update`
    /// with the positional operator keeps the edit atomic.
    pub async fn update_comment_text(
        &self,
        comment_id: &str,
        text: &str,
    ) -> Result<Option<Comment>> {
        let updated = self
            .collection
            .find_one_and_update(
                doc! { "comments._id": comment_id },
                doc! { "$set": {
                    "comments.$.text": text,
                    "updatedAt": bson::DateTime::now(),
                } },
            )
            .return_document(ReturnDocument::After)
            .await?;

        Ok(updated.and_then(|f| f.comment(comment_id).cloned()))
    }

    /// Total votes across all features: per-document `$size`, then a
    /// cross-document `$sum`. Never loads feature documents into memory.
    pub async fn count_all_votes(&self) -> Result<u64> {
        self.sum_array_sizes("$votes").await
    }

    /// Total comments across all features, same two-stage reduction.
    pub async fn count_all_comments(&self) -> Result<u64> {
        self.sum_array_sizes("$comments").await
    }

    async fn sum_array_sizes(&self, field: &str) -> Result<u64> {
        let pipeline = vec![
            doc! { "$project": { "count": { "$size": field } } },
            doc! { "$group": { "_id": null, "total": { "$sum": "$count" } } },
        ];

        let mut cursor = self.collection.aggregate(pipeline).await?;
        match cursor.try_next().await? {
            Some(document) => Ok(extract_total(&document)),
            // No documents at all: the group stage emits nothing.
            None => Ok(0),
        }
    }
}

/// Filter for the feature search: the query is treated as a literal
/// substring (metacharacters escaped), matched case-insensitively
/// against title OR description.
fn search_filter(query: &str) -> Document {
    let pattern = regex::escape(query);
    doc! { "$or": [
        { "title": { "$regex": &pattern, "$options": "i" } },
        { "description": { "$regex": &pattern, "$options": "i" } },
    ] }
}

fn extract_total(document: &Document) -> u64 {
    match document.get("total") {
        Some(bson::Bson::Int32(n)) => (*n).max(0) as u64,
        Some(bson::Bson::Int64(n)) => (*n).max(0) as u64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_modes_parse() {
        assert_eq!(SortMode::parse("votes"), Some(SortMode::Votes));
        assert_eq!(SortMode::parse("comments"), Some(SortMode::Comments));
        assert_eq!(SortMode::parse("new"), Some(SortMode::New));
        assert_eq!(SortMode::parse("top"), Some(SortMode::Top));
        assert_eq!(SortMode::parse("oldest"), None);
        assert_eq!(SortMode::parse(""), None);
    }

    #[test]
    fn top_breaks_vote_ties_with_comments() {
        let sort = SortMode::Top.sort_doc();
        let keys: Vec<&str> = sort.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["voteCount", "commentCount"]);
    }

    fn compiled_pattern(filter: &Document, field: &str) -> regex::Regex {
        let pattern = filter
            .get_array("$or")
            .unwrap()
            .iter()
            .filter_map(|clause| clause.as_document())
            .find_map(|clause| clause.get_document(field).ok())
            .unwrap()
            .get_str("$regex")
            .unwrap();
        regex::RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .unwrap()
    }

    #[test]
    fn search_covers_title_and_description_case_insensitively() {
        let filter = search_filter("Dark");

        for field in ["title", "description"] {
            let clause = filter
                .get_array("$or")
                .unwrap()
                .iter()
                .filter_map(|c| c.as_document())
                .find_map(|c| c.get_document(field).ok())
                .unwrap();
            assert_eq!(clause.get_str("$options").unwrap(), "i");

            let re = compiled_pattern(&filter, field);
            assert!(re.is_match("dark mode"));
            assert!(re.is_match("THE DARKEST THEME"));
            assert!(!re.is_match("light mode"));
        }
    }

    #[test]
    fn search_treats_the_query_as_a_literal() {
        let filter = search_filter("c++ (fast)");
        let re = compiled_pattern(&filter, "title");

        assert!(re.is_match("we want C++ (fast) builds"));
        // Unescaped, "c++" and "(fast)" would match much more than this
        assert!(!re.is_match("ccc fast"));
    }

    #[test]
    fn aggregate_total_handles_both_int_widths() {
        assert_eq!(extract_total(&doc! { "total": 7_i32 }), 7);
        assert_eq!(extract_total(&doc! { "total": 7_i64 }), 7);
        assert_eq!(extract_total(&doc! {}), 0);
    }
}
