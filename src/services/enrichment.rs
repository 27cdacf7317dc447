//! Page enrichment: attach authors, viewer like state and comment previews
//!
//! One batched read per concern for the whole page, fanned out concurrently.
//! All three must succeed; a partially enriched page is never returned.
//! The one tolerated gap is a post whose author summary cannot be resolved
//! (author deleted between retrieval and enrichment): that post is dropped
//! from the page rather than failing the request.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Comment, CommentPreview, FeedItem, UserSummary};
use crate::services::scoring::RankedCandidate;
use crate::stores::{EngagementStore, UserStore};

/// Top-level comments attached per feed item.
pub const COMMENT_PREVIEW_LIMIT: i64 = 3;

pub struct Enricher {
    users: Arc<dyn UserStore>,
    engagement: Arc<dyn EngagementStore>,
}

impl Enricher {
    pub fn new(users: Arc<dyn UserStore>, engagement: Arc<dyn EngagementStore>) -> Self {
        Self { users, engagement }
    }

    /// Enrich one page of ranked candidates into wire-ready feed items.
    pub async fn enrich_page(
        &self,
        viewer_id: Option<Uuid>,
        page: &[RankedCandidate],
    ) -> Result<Vec<FeedItem>> {
        if page.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<Uuid> = page.iter().map(|c| c.post.id).collect();
        let author_ids: Vec<Uuid> = {
            let mut seen = HashSet::new();
            page.iter()
                .map(|c| c.post.author_id)
                .filter(|id| seen.insert(*id))
                .collect()
        };

        let (authors, liked, comments) = tokio::join!(
            self.users.user_summaries(&author_ids),
            self.liked_set(viewer_id, &post_ids),
            self.engagement
                .top_comments_for_posts(&post_ids, COMMENT_PREVIEW_LIMIT),
        );
        let authors = authors?;
        let liked = liked?;
        let comments = comments?;

        let mut summaries: HashMap<Uuid, UserSummary> =
            authors.into_iter().map(|s| (s.id, s)).collect();

        // Commenters outside the page's author set need one more batch
        let missing_commenters: Vec<Uuid> = {
            let mut seen = HashSet::new();
            comments
                .iter()
                .map(|c| c.author_id)
                .filter(|id| !summaries.contains_key(id) && seen.insert(*id))
                .collect()
        };
        if !missing_commenters.is_empty() {
            for summary in self.users.user_summaries(&missing_commenters).await? {
                summaries.insert(summary.id, summary);
            }
        }

        let mut previews = group_comment_previews(comments, &summaries);

        let mut items = Vec::with_capacity(page.len());
        for candidate in page {
            let post = &candidate.post;
            let Some(author) = summaries.get(&post.author_id) else {
                warn!("Dropping post {} with unresolved author {}", post.id, post.author_id);
                continue;
            };

            items.push(FeedItem {
                id: post.id,
                author: author.clone(),
                post_type: post.post_type,
                content_type: post.content_type,
                caption: post.caption.clone(),
                media_url: post.media_url.clone(),
                like_count: post.like_count,
                comment_count: post.comment_count,
                share_count: post.share_count,
                view_count: post.view_count,
                created_at: post.created_at,
                ranking_score: candidate.score,
                is_liked_by: liked.contains(&post.id),
                comments: previews.remove(&post.id).unwrap_or_default(),
            });
        }

        Ok(items)
    }

    async fn liked_set(&self, viewer_id: Option<Uuid>, post_ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        match viewer_id {
            Some(viewer) => self.engagement.liked_post_ids(viewer, post_ids).await,
            None => Ok(HashSet::new()),
        }
    }
}

/// Group flat comment rows into per-post previews. Replies are loaded on
/// demand elsewhere, so every preview carries an empty reply list.
fn group_comment_previews(
    comments: Vec<Comment>,
    summaries: &HashMap<Uuid, UserSummary>,
) -> HashMap<Uuid, Vec<CommentPreview>> {
    let mut grouped: HashMap<Uuid, Vec<CommentPreview>> = HashMap::new();

    for comment in comments {
        let Some(author) = summaries.get(&comment.author_id) else {
            continue;
        };
        grouped.entry(comment.post_id).or_default().push(CommentPreview {
            id: comment.id,
            author: author.clone(),
            content: comment.content,
            created_at: comment.created_at,
            replies: Vec::new(),
        });
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Post, PostContentType, PostType};
    use crate::services::scoring::SourceCategory;
    use crate::stores::{MockEngagementStore, MockUserStore};
    use chrono::Utc;

    fn candidate(author_id: Uuid) -> RankedCandidate {
        RankedCandidate {
            post: Post {
                id: Uuid::new_v4(),
                author_id,
                post_type: PostType::Photo,
                content_type: PostContentType::Normal,
                caption: Some("caption".to_string()),
                media_url: None,
                like_count: 3,
                comment_count: 1,
                share_count: 0,
                view_count: 10,
                visibility: None,
                latitude: None,
                longitude: None,
                created_at: Utc::now(),
            },
            source: SourceCategory::General,
            score: 42.0,
        }
    }

    fn summary(id: Uuid, username: &str) -> UserSummary {
        UserSummary {
            id,
            username: username.to_string(),
            display_name: None,
            avatar_url: None,
        }
    }

    #[tokio::test]
    async fn test_missing_author_drops_post_but_not_page() {
        let known_author = Uuid::new_v4();
        let ghost_author = Uuid::new_v4();
        let page = vec![candidate(known_author), candidate(ghost_author)];
        let viewer = Uuid::new_v4();

        let mut users = MockUserStore::new();
        let known = summary(known_author, "known");
        users
            .expect_user_summaries()
            .returning(move |_| Ok(vec![known.clone()]));

        let mut engagement = MockEngagementStore::new();
        engagement
            .expect_liked_post_ids()
            .returning(|_, _| Ok(HashSet::new()));
        engagement
            .expect_top_comments_for_posts()
            .returning(|_, _| Ok(vec![]));

        let enricher = Enricher::new(Arc::new(users), Arc::new(engagement));
        let items = enricher.enrich_page(Some(viewer), &page).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].author.id, known_author);
    }

    #[tokio::test]
    async fn test_liked_posts_reflected_on_items() {
        let author = Uuid::new_v4();
        let page = vec![candidate(author), candidate(author)];
        let liked_id = page[0].post.id;
        let viewer = Uuid::new_v4();

        let mut users = MockUserStore::new();
        let author_summary = summary(author, "author");
        users
            .expect_user_summaries()
            .returning(move |_| Ok(vec![author_summary.clone()]));

        let mut engagement = MockEngagementStore::new();
        engagement
            .expect_liked_post_ids()
            .returning(move |_, _| Ok([liked_id].into_iter().collect()));
        engagement
            .expect_top_comments_for_posts()
            .returning(|_, _| Ok(vec![]));

        let enricher = Enricher::new(Arc::new(users), Arc::new(engagement));
        let items = enricher.enrich_page(Some(viewer), &page).await.unwrap();

        assert!(items.iter().find(|i| i.id == liked_id).unwrap().is_liked_by);
        assert!(!items.iter().find(|i| i.id != liked_id).unwrap().is_liked_by);
    }

    #[tokio::test]
    async fn test_anonymous_viewer_never_queries_likes() {
        let author = Uuid::new_v4();
        let page = vec![candidate(author)];

        let mut users = MockUserStore::new();
        let author_summary = summary(author, "author");
        users
            .expect_user_summaries()
            .returning(move |_| Ok(vec![author_summary.clone()]));

        let mut engagement = MockEngagementStore::new();
        engagement.expect_liked_post_ids().times(0);
        engagement
            .expect_top_comments_for_posts()
            .returning(|_, _| Ok(vec![]));

        let enricher = Enricher::new(Arc::new(users), Arc::new(engagement));
        let items = enricher.enrich_page(None, &page).await.unwrap();

        assert!(!items[0].is_liked_by);
    }

    #[tokio::test]
    async fn test_comment_previews_fetch_commenter_summaries() {
        let author = Uuid::new_v4();
        let commenter = Uuid::new_v4();
        let page = vec![candidate(author)];
        let post_id = page[0].post.id;

        let mut users = MockUserStore::new();
        let author_summary = summary(author, "author");
        users
            .expect_user_summaries()
            .withf(move |ids| ids == [author])
            .times(1)
            .returning(move |_| Ok(vec![author_summary.clone()]));
        let commenter_summary = summary(commenter, "commenter");
        users
            .expect_user_summaries()
            .withf(move |ids| ids == [commenter])
            .times(1)
            .returning(move |_| Ok(vec![commenter_summary.clone()]));

        let mut engagement = MockEngagementStore::new();
        engagement
            .expect_liked_post_ids()
            .returning(|_, _| Ok(HashSet::new()));
        engagement
            .expect_top_comments_for_posts()
            .returning(move |_, _| {
                Ok(vec![Comment {
                    id: Uuid::new_v4(),
                    post_id,
                    author_id: commenter,
                    content: "nice".to_string(),
                    parent_comment_id: None,
                    created_at: Utc::now(),
                    soft_delete: None,
                }])
            });

        let enricher = Enricher::new(Arc::new(users), Arc::new(engagement));
        let items = enricher
            .enrich_page(Some(Uuid::new_v4()), &page)
            .await
            .unwrap();

        assert_eq!(items[0].comments.len(), 1);
        assert_eq!(items[0].comments[0].author.username, "commenter");
        assert!(items[0].comments[0].replies.is_empty());
    }
}
