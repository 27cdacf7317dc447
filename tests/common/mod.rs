#![allow(dead_code)]
/// In-memory store fakes and a world builder for integration tests.
///
/// The fakes mirror the filtering the Postgres stores perform in SQL
/// (deleted authors dropped, feed-eligible content types only, ordering and
/// limits), so the full pipeline runs without infrastructure.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use homefeed_service::cache::MemoryCache;
use homefeed_service::config::{AppConfig, CacheConfig, DatabaseConfig, FeedConfig, ScoringConfig};
use homefeed_service::error::Result;
use homefeed_service::models::{
    AccountPrivacy, Comment, GeoPoint, InteractionKind, Post, PostContentType, PostInteraction,
    PostType, UserSummary,
};
use homefeed_service::stores::{
    BusinessStore, EngagementStore, InteractionStore, PostStore, UserStore,
};
use homefeed_service::{Config, FeedRequest, HomeFeedService};

/// Fixed ranking seed so orderings are reproducible across runs.
pub const RNG_SEED: u64 = 7;

pub fn test_config() -> Config {
    Config {
        app: AppConfig {
            env: "test".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 1,
        },
        cache: CacheConfig::default(),
        feed: FeedConfig::default(),
        scoring: ScoringConfig::default(),
    }
}

pub fn page_request(viewer_id: Option<Uuid>, page: i64, limit: i64) -> FeedRequest {
    FeedRequest {
        viewer_id,
        page,
        limit,
        location: None,
    }
}

pub fn located_request(viewer_id: Option<Uuid>, latitude: f64, longitude: f64) -> FeedRequest {
    FeedRequest {
        viewer_id,
        page: 1,
        limit: 20,
        location: Some(GeoPoint::new(latitude, longitude).unwrap()),
    }
}

struct TestUser {
    username: String,
    privacy: AccountPrivacy,
    deleted: bool,
}

struct TestBusiness {
    owner_id: Uuid,
    live_location: bool,
    subscription_active: bool,
    latitude: f64,
    longitude: f64,
}

/// Mutable fixture data; build it up, then hand it to `build_service`.
#[derive(Default)]
pub struct TestWorld {
    users: HashMap<Uuid, TestUser>,
    follows: Vec<(Uuid, Uuid)>,
    blocks: Vec<(Uuid, Uuid)>,
    posts: Vec<Post>,
    likes: HashSet<(Uuid, Uuid)>,
    comments: Vec<Comment>,
    interactions: Vec<(Uuid, PostInteraction)>,
    businesses: Vec<TestBusiness>,
}

impl TestWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&mut self, username: &str) -> Uuid {
        self.insert_user(username, AccountPrivacy::Public, false)
    }

    pub fn private_user(&mut self, username: &str) -> Uuid {
        self.insert_user(username, AccountPrivacy::Private, false)
    }

    pub fn deleted_user(&mut self, username: &str) -> Uuid {
        self.insert_user(username, AccountPrivacy::Public, true)
    }

    pub fn delete_user(&mut self, user_id: Uuid) {
        if let Some(user) = self.users.get_mut(&user_id) {
            user.deleted = true;
        }
    }

    fn insert_user(&mut self, username: &str, privacy: AccountPrivacy, deleted: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.users.insert(
            id,
            TestUser {
                username: username.to_string(),
                privacy,
                deleted,
            },
        );
        id
    }

    pub fn follow(&mut self, follower: Uuid, followed: Uuid) {
        self.follows.push((follower, followed));
    }

    pub fn block(&mut self, blocker: Uuid, blocked: Uuid) {
        self.blocks.push((blocker, blocked));
    }

    pub fn add_post(&mut self, builder: PostBuilder) -> Uuid {
        let post = builder.post;
        let id = post.id;
        self.posts.push(post);
        id
    }

    /// Records the like edge only; set counters through the post builder.
    pub fn like(&mut self, user_id: Uuid, post_id: Uuid) {
        self.likes.insert((user_id, post_id));
    }

    pub fn comment(&mut self, post_id: Uuid, author_id: Uuid, content: &str, minutes_ago: i64) -> Uuid {
        let id = Uuid::new_v4();
        self.comments.push(Comment {
            id,
            post_id,
            author_id,
            content: content.to_string(),
            parent_comment_id: None,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
            soft_delete: None,
        });
        id
    }

    pub fn reply(&mut self, post_id: Uuid, parent_id: Uuid, author_id: Uuid, content: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.comments.push(Comment {
            id,
            post_id,
            author_id,
            content: content.to_string(),
            parent_comment_id: Some(parent_id),
            created_at: Utc::now(),
            soft_delete: None,
        });
        id
    }

    pub fn delete_comment(&mut self, comment_id: Uuid) {
        if let Some(comment) = self.comments.iter_mut().find(|c| c.id == comment_id) {
            comment.soft_delete = Some(Utc::now());
        }
    }

    pub fn view(&mut self, user_id: Uuid, post_id: Uuid, hours_ago: i64) {
        self.interact(user_id, post_id, InteractionKind::View, 1, hours_ago);
    }

    pub fn interact(
        &mut self,
        user_id: Uuid,
        post_id: Uuid,
        kind: InteractionKind,
        count: i64,
        hours_ago: i64,
    ) {
        self.interactions.push((
            user_id,
            PostInteraction {
                post_id,
                kind,
                interaction_count: count,
                last_interacted_at: Utc::now() - Duration::hours(hours_ago),
                is_hidden: false,
            },
        ));
    }

    pub fn hide(&mut self, user_id: Uuid, post_id: Uuid) {
        self.interactions.push((
            user_id,
            PostInteraction {
                post_id,
                kind: InteractionKind::Hide,
                interaction_count: 1,
                last_interacted_at: Utc::now(),
                is_hidden: true,
            },
        ));
    }

    pub fn live_business(&mut self, owner_id: Uuid, latitude: f64, longitude: f64) {
        self.businesses.push(TestBusiness {
            owner_id,
            live_location: true,
            subscription_active: true,
            latitude,
            longitude,
        });
    }

    /// Business with a lapsed subscription; must never surface.
    pub fn dormant_business(&mut self, owner_id: Uuid, latitude: f64, longitude: f64) {
        self.businesses.push(TestBusiness {
            owner_id,
            live_location: true,
            subscription_active: false,
            latitude,
            longitude,
        });
    }
}

pub struct PostBuilder {
    post: Post,
}

pub fn post(author_id: Uuid) -> PostBuilder {
    PostBuilder {
        post: Post {
            id: Uuid::new_v4(),
            author_id,
            post_type: PostType::Photo,
            content_type: PostContentType::Normal,
            caption: Some("caption".to_string()),
            media_url: None,
            like_count: 0,
            comment_count: 0,
            share_count: 0,
            view_count: 0,
            visibility: None,
            latitude: None,
            longitude: None,
            created_at: Utc::now(),
        },
    }
}

impl PostBuilder {
    pub fn content_type(mut self, content_type: PostContentType) -> Self {
        self.post.content_type = content_type;
        self
    }

    pub fn age_hours(mut self, hours: i64) -> Self {
        self.post.created_at = Utc::now() - Duration::hours(hours);
        self
    }

    pub fn engagement(mut self, likes: i64, comments: i64, shares: i64, views: i64) -> Self {
        self.post.like_count = likes;
        self.post.comment_count = comments;
        self.post.share_count = shares;
        self.post.view_count = views;
        self
    }

    pub fn located(mut self, latitude: f64, longitude: f64) -> Self {
        self.post.latitude = Some(latitude);
        self.post.longitude = Some(longitude);
        self
    }
}

/// One fake backing all five read ports.
#[derive(Clone)]
pub struct InMemoryStores {
    world: Arc<TestWorld>,
}

impl InMemoryStores {
    pub fn new(world: TestWorld) -> Self {
        Self {
            world: Arc::new(world),
        }
    }

    fn author_live(&self, user_id: Uuid) -> bool {
        self.world
            .users
            .get(&user_id)
            .map(|u| !u.deleted)
            .unwrap_or(false)
    }
}

fn engagement_composite(post: &Post) -> f64 {
    post.like_count as f64
        + 2.0 * post.comment_count as f64
        + 3.0 * post.share_count as f64
        + 0.1 * post.view_count as f64
}

#[async_trait]
impl UserStore for InMemoryStores {
    async fn following_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self
            .world
            .follows
            .iter()
            .filter(|(follower, followed)| *follower == user_id && self.author_live(*followed))
            .map(|(_, followed)| *followed)
            .collect())
    }

    async fn follower_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        Ok(self
            .world
            .follows
            .iter()
            .filter(|(follower, followed)| *followed == user_id && self.author_live(*follower))
            .map(|(follower, _)| *follower)
            .collect())
    }

    async fn blocked_user_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let mut blocked = HashSet::new();
        for (blocker, target) in &self.world.blocks {
            if *blocker == user_id {
                blocked.insert(*target);
            }
            if *target == user_id {
                blocked.insert(*blocker);
            }
        }
        Ok(blocked.into_iter().collect())
    }

    async fn public_author_ids(&self) -> Result<Vec<Uuid>> {
        Ok(self
            .world
            .users
            .iter()
            .filter(|(_, user)| !user.deleted && user.privacy == AccountPrivacy::Public)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn account_privacy(&self, user_id: Uuid) -> Result<Option<AccountPrivacy>> {
        Ok(self
            .world
            .users
            .get(&user_id)
            .filter(|user| !user.deleted)
            .map(|user| user.privacy))
    }

    async fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        Ok(self
            .world
            .follows
            .iter()
            .any(|edge| *edge == (follower_id, followee_id)))
    }

    async fn is_blocked_either_way(&self, user_a: Uuid, user_b: Uuid) -> Result<bool> {
        Ok(self
            .world
            .blocks
            .iter()
            .any(|edge| *edge == (user_a, user_b) || *edge == (user_b, user_a)))
    }

    async fn user_summaries(&self, user_ids: &[Uuid]) -> Result<Vec<UserSummary>> {
        Ok(user_ids
            .iter()
            .filter_map(|id| {
                self.world
                    .users
                    .get(id)
                    .filter(|user| !user.deleted)
                    .map(|user| UserSummary {
                        id: *id,
                        username: user.username.clone(),
                        display_name: Some(user.username.clone()),
                        avatar_url: None,
                    })
            })
            .collect())
    }
}

#[async_trait]
impl PostStore for InMemoryStores {
    async fn recent_by_authors(&self, author_ids: &[Uuid], limit: i64) -> Result<Vec<Post>> {
        let authors: HashSet<&Uuid> = author_ids.iter().collect();
        let mut posts: Vec<Post> = self
            .world
            .posts
            .iter()
            .filter(|p| {
                authors.contains(&p.author_id)
                    && self.author_live(p.author_id)
                    && p.content_type.feed_eligible()
            })
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit as usize);
        Ok(posts)
    }

    async fn trending_by_authors(
        &self,
        author_ids: &[Uuid],
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let authors: HashSet<&Uuid> = author_ids.iter().collect();
        let mut posts: Vec<Post> = self
            .world
            .posts
            .iter()
            .filter(|p| {
                authors.contains(&p.author_id)
                    && self.author_live(p.author_id)
                    && p.content_type.feed_eligible()
                    && p.created_at >= since
            })
            .cloned()
            .collect();
        posts.sort_by(|a, b| {
            engagement_composite(b)
                .partial_cmp(&engagement_composite(a))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        posts.truncate(limit as usize);
        Ok(posts)
    }

    async fn located_near(
        &self,
        author_ids: &[Uuid],
        center: GeoPoint,
        radius_km: f64,
        limit: i64,
    ) -> Result<Vec<Post>> {
        let authors: HashSet<&Uuid> = author_ids.iter().collect();
        let mut posts: Vec<Post> = self
            .world
            .posts
            .iter()
            .filter(|p| {
                authors.contains(&p.author_id)
                    && self.author_live(p.author_id)
                    && p.content_type.feed_eligible()
                    && p.location()
                        .map(|loc| loc.distance_km(&center) <= radius_km)
                        .unwrap_or(false)
            })
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit as usize);
        Ok(posts)
    }
}

#[async_trait]
impl EngagementStore for InMemoryStores {
    async fn liked_post_ids(&self, viewer_id: Uuid, post_ids: &[Uuid]) -> Result<HashSet<Uuid>> {
        Ok(post_ids
            .iter()
            .filter(|post_id| self.world.likes.contains(&(viewer_id, **post_id)))
            .copied()
            .collect())
    }

    async fn top_comments_for_posts(
        &self,
        post_ids: &[Uuid],
        per_post: i64,
    ) -> Result<Vec<Comment>> {
        let ids: HashSet<&Uuid> = post_ids.iter().collect();
        let mut eligible: Vec<Comment> = self
            .world
            .comments
            .iter()
            .filter(|c| {
                ids.contains(&c.post_id)
                    && c.parent_comment_id.is_none()
                    && c.soft_delete.is_none()
                    && self.author_live(c.author_id)
            })
            .cloned()
            .collect();
        eligible.sort_by(|a, b| {
            a.post_id
                .cmp(&b.post_id)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let mut taken: HashMap<Uuid, i64> = HashMap::new();
        let mut out = Vec::new();
        for comment in eligible {
            let count = taken.entry(comment.post_id).or_insert(0);
            if *count < per_post {
                *count += 1;
                out.push(comment);
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl InteractionStore for InMemoryStores {
    async fn interactions_for_viewer(
        &self,
        viewer_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Vec<PostInteraction>> {
        Ok(self
            .world
            .interactions
            .iter()
            .filter(|(user, row)| *user == viewer_id && row.last_interacted_at >= since)
            .map(|(_, row)| row.clone())
            .collect())
    }
}

#[async_trait]
impl BusinessStore for InMemoryStores {
    async fn live_owner_ids_near(&self, center: GeoPoint, radius_km: f64) -> Result<Vec<Uuid>> {
        Ok(self
            .world
            .businesses
            .iter()
            .filter(|b| b.live_location && b.subscription_active && self.author_live(b.owner_id))
            .filter(|b| {
                GeoPoint::new(b.latitude, b.longitude)
                    .map(|loc| loc.distance_km(&center) <= radius_km)
                    .unwrap_or(false)
            })
            .map(|b| b.owner_id)
            .collect())
    }
}

pub fn build_service(world: TestWorld) -> HomeFeedService {
    build_service_with_cache(world).0
}

pub fn build_service_with_cache(world: TestWorld) -> (HomeFeedService, Arc<MemoryCache>) {
    let stores = Arc::new(InMemoryStores::new(world));
    let cache = Arc::new(MemoryCache::new());
    let service = HomeFeedService::new(
        stores.clone(),
        stores.clone(),
        stores.clone(),
        stores.clone(),
        stores.clone(),
        cache.clone(),
        &test_config(),
    )
    .with_rng_seed(RNG_SEED);
    (service, cache)
}
