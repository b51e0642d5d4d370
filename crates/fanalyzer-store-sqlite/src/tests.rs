//! Integration tests for `SqliteStore` against an in-memory database.

use fanalyzer_core::{
  engagement::{EngagementCounters, NewEngagement},
  post::{ArticleFilter, NewAdvertisement, NewArticle, NewTopic, PostKind, PostRef},
  social::{NewComment, NewShare, ReactionChange, ReactionInput},
  store::StatsStore,
  user::{NewUser, UserPatch, UserProfile},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_user(id: &str, location: Option<&str>) -> NewUser {
  NewUser { user_id: id.into(), location: location.map(Into::into) }
}

fn counters(c: u64, k: u64, m: u64, s: u64, t: u64) -> EngagementCounters {
  EngagementCounters {
    clicks:          c,
    keypresses:      k,
    mouse_movements: m,
    scrolls:         s,
    total_time:      t,
  }
}

/// One user `alice` (US) owning topic `t1`, article `a1` under it and ad `ad1`.
async fn seeded() -> SqliteStore {
  let s = store().await;
  s.add_user(new_user("alice", Some("US"))).await.unwrap();
  s.add_topic(NewTopic {
    topic_id:   "t1".into(),
    user_id:    "alice".into(),
    title:      "Topic".into(),
    content:    "...".into(),
    categories: vec!["music".into(), "film".into()],
  })
  .await
  .unwrap();
  s.add_article(NewArticle {
    article_id: "a1".into(),
    user_id:    "alice".into(),
    topic_id:   "t1".into(),
    title:      "Article".into(),
    content:    "...".into(),
  })
  .await
  .unwrap();
  s.add_advertisement(NewAdvertisement {
    ad_id:    "ad1".into(),
    user_id:  "alice".into(),
    title:    "Ad".into(),
    content:  "...".into(),
    budget:   Some(120.5),
    duration: Some("7d".into()),
  })
  .await
  .unwrap();
  s
}

fn engagement(user: &str, post: PostRef, c: EngagementCounters) -> NewEngagement {
  NewEngagement { user_id: user.into(), post, counters: c }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_user_is_first_writer_wins() {
  let s = store().await;

  let first = s.add_user(new_user("u1", Some("US"))).await.unwrap();
  assert!(first.is_some());

  let second = s.add_user(new_user("u1", Some("CA"))).await.unwrap();
  assert!(second.is_none());

  let stored = s.get_user("u1").await.unwrap().unwrap();
  assert_eq!(stored.location.as_deref(), Some("US"));
}

#[tokio::test]
async fn add_users_skips_taken_ids() {
  let s = store().await;
  s.add_user(new_user("u1", None)).await.unwrap();

  let created = s
    .add_users(vec![new_user("u1", None), new_user("u2", None), new_user("u3", Some("CA"))])
    .await
    .unwrap();
  assert_eq!(created, 2);
  assert_eq!(s.list_users().await.unwrap().len(), 3);
}

#[tokio::test]
async fn update_user_keeps_unpatched_fields() {
  let s = store().await;
  s.add_user(new_user("u1", Some("US"))).await.unwrap();

  let patch = UserPatch {
    location: None,
    profile:  UserProfile { name: Some("Ada".into()), ..Default::default() },
  };
  let updated = s.update_user("u1", patch).await.unwrap().unwrap();
  assert_eq!(updated.profile.name.as_deref(), Some("Ada"));
  assert_eq!(updated.location.as_deref(), Some("US"));

  let missing = s.update_user("nobody", UserPatch::default()).await.unwrap();
  assert!(missing.is_none());
}

#[tokio::test]
async fn count_users_by_location_skips_null() {
  let s = store().await;
  s.add_users(vec![
    new_user("u1", Some("US")),
    new_user("u2", Some("US")),
    new_user("u3", Some("CA")),
    new_user("u4", None),
  ])
  .await
  .unwrap();

  let counts = s.count_users_by_location().await.unwrap();
  let pairs: Vec<_> = counts.iter().map(|c| (c.location.as_str(), c.users)).collect();
  assert_eq!(pairs, vec![("CA", 1), ("US", 2)]);
}

#[tokio::test]
async fn delete_user_cascades_to_owned_posts_and_their_rows() {
  let s = seeded().await;
  s.add_user(new_user("bob", Some("CA"))).await.unwrap();
  s.add_user(new_user("carol", Some("FR"))).await.unwrap();

  // bob's article under alice's topic goes with the topic
  s.add_article(NewArticle {
    article_id: "a2".into(),
    user_id:    "bob".into(),
    topic_id:   "t1".into(),
    title:      "Reply".into(),
    content:    "...".into(),
  })
  .await
  .unwrap();
  s.record_engagement(engagement("carol", PostRef::article("a2"), counters(1, 0, 0, 0, 0)))
    .await
    .unwrap();
  s.add_comment(NewComment {
    user_id: "bob".into(),
    post:    PostRef::new(PostKind::Advertisement, "ad1"),
    content: "nice".into(),
  })
  .await
  .unwrap();

  let mut removed = s.delete_user("alice").await.unwrap().expect("alice existed");
  removed.sort_by(|a, b| a.id.cmp(&b.id));
  assert_eq!(
    removed,
    vec![
      PostRef::article("a1"),
      PostRef::article("a2"),
      PostRef::new(PostKind::Advertisement, "ad1"),
      PostRef::new(PostKind::Topic, "t1"),
    ]
  );

  assert!(s.get_user("alice").await.unwrap().is_none());
  assert!(s.get_topic("t1").await.unwrap().is_none());
  assert!(s.get_article("a2").await.unwrap().is_none());
  assert!(s.list_stats().await.unwrap().is_empty());
  assert!(s.comment_locations(&PostRef::new(PostKind::Advertisement, "ad1")).await.unwrap().is_empty());
  assert!(s.get_user("bob").await.unwrap().is_some());

  assert!(s.delete_user("alice").await.unwrap().is_none());
}

#[tokio::test]
async fn clear_empties_every_table() {
  let s = seeded().await;
  s.record_engagement(engagement("alice", PostRef::new(PostKind::Topic, "t1"), counters(1, 1, 1, 1, 1)))
    .await
    .unwrap();

  s.clear().await.unwrap();

  assert!(s.list_users().await.unwrap().is_empty());
  assert!(s.list_topics(None).await.unwrap().is_empty());
  assert!(s.list_stats().await.unwrap().is_empty());
}

// ─── Posts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn post_exists_is_kind_specific() {
  let s = seeded().await;

  assert!(s.post_exists(&PostRef::article("a1")).await.unwrap());
  assert!(!s.post_exists(&PostRef::new(PostKind::Topic, "a1")).await.unwrap());
  assert!(!s.post_exists(&PostRef::new(PostKind::Advertisement, "a1")).await.unwrap());
  assert!(s.post_exists(&PostRef::new(PostKind::Advertisement, "ad1")).await.unwrap());
}

#[tokio::test]
async fn topic_round_trips_categories() {
  let s = seeded().await;
  let topic = s.get_topic("t1").await.unwrap().unwrap();
  assert_eq!(topic.categories, vec!["music".to_string(), "film".to_string()]);

  let ad = s.get_advertisement("ad1").await.unwrap().unwrap();
  assert_eq!(ad.budget, Some(120.5));
}

#[tokio::test]
async fn list_articles_filters() {
  let s = seeded().await;
  s.add_topic(NewTopic {
    topic_id:   "t2".into(),
    user_id:    "alice".into(),
    title:      "Other".into(),
    content:    "...".into(),
    categories: vec![],
  })
  .await
  .unwrap();
  s.add_article(NewArticle {
    article_id: "a3".into(),
    user_id:    "alice".into(),
    topic_id:   "t2".into(),
    title:      "Other article".into(),
    content:    "...".into(),
  })
  .await
  .unwrap();

  let all = s.list_articles(&ArticleFilter::default()).await.unwrap();
  assert_eq!(all.len(), 2);

  let filter = ArticleFilter { topic_id: Some("t2".into()), user_id: None };
  let under_t2 = s.list_articles(&filter).await.unwrap();
  assert_eq!(under_t2.len(), 1);
  assert_eq!(under_t2[0].article_id, "a3");
}

#[tokio::test]
async fn delete_article_removes_its_rows() {
  let s = seeded().await;
  s.record_engagement(engagement("alice", PostRef::article("a1"), counters(3, 0, 0, 0, 0)))
    .await
    .unwrap();
  s.record_engagement(engagement("alice", PostRef::new(PostKind::Topic, "t1"), counters(1, 0, 0, 0, 0)))
    .await
    .unwrap();

  assert!(s.delete_article("a1").await.unwrap());
  assert!(!s.delete_article("a1").await.unwrap());

  let stats = s.list_stats().await.unwrap();
  assert_eq!(stats.len(), 1);
  assert_eq!(stats[0].post, PostRef::new(PostKind::Topic, "t1"));
}

// ─── Engagement ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_engagement_increments_existing_row() {
  let s = seeded().await;
  let post = PostRef::article("a1");

  let first = s
    .record_engagement(engagement("alice", post.clone(), counters(1, 2, 3, 4, 5)))
    .await
    .unwrap();
  assert!(first.created);

  let second = s
    .record_engagement(engagement("alice", post.clone(), counters(10, 0, 0, 0, 5)))
    .await
    .unwrap();
  assert!(!second.created);
  assert_eq!(second.stat_id, first.stat_id);

  let rows = s.stats_for_post(&post).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].counters, counters(11, 2, 3, 4, 10));
}

#[tokio::test]
async fn concurrent_increments_are_not_lost() {
  let s = seeded().await;
  let post = PostRef::new(PostKind::Topic, "t1");

  let tasks: Vec<_> = (0..20)
    .map(|_| {
      let s = s.clone();
      let post = post.clone();
      tokio::spawn(async move {
        s.record_engagement(engagement("alice", post, counters(1, 0, 0, 0, 0)))
          .await
          .unwrap()
      })
    })
    .collect();
  for task in tasks {
    task.await.unwrap();
  }

  let rows = s.stats_for_post(&post).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].counters.clicks, 20);
}

#[tokio::test]
async fn stat_rows_carry_topic_rollup_id() {
  let s = seeded().await;
  s.record_engagement(engagement("alice", PostRef::article("a1"), counters(1, 0, 0, 0, 0)))
    .await
    .unwrap();
  s.record_engagement(engagement("alice", PostRef::new(PostKind::Topic, "t1"), counters(1, 0, 0, 0, 0)))
    .await
    .unwrap();
  s.record_engagement(engagement("alice", PostRef::new(PostKind::Advertisement, "ad1"), counters(1, 0, 0, 0, 0)))
    .await
    .unwrap();

  assert_eq!(rollup_id(&s, PostRef::article("a1")).await.as_deref(), Some("t1"));
  assert_eq!(rollup_id(&s, PostRef::new(PostKind::Topic, "t1")).await.as_deref(), Some("t1"));
  assert_eq!(rollup_id(&s, PostRef::new(PostKind::Advertisement, "ad1")).await, None);
}

async fn rollup_id(s: &SqliteStore, post: PostRef) -> Option<String> {
  let rows = s.stats_for_post(&post).await.unwrap();
  rows.into_iter().next().and_then(|r| r.topic_id)
}

#[tokio::test]
async fn topic_rows_exclude_article_rows() {
  let s = seeded().await;
  s.record_engagement(engagement("alice", PostRef::article("a1"), counters(5, 0, 0, 0, 0)))
    .await
    .unwrap();

  assert!(s.stats_for_post(&PostRef::new(PostKind::Topic, "t1")).await.unwrap().is_empty());
}

#[tokio::test]
async fn max_counters_is_field_wise() {
  let s = seeded().await;
  assert_eq!(s.max_counters().await.unwrap(), EngagementCounters::default());

  s.add_user(new_user("bob", None)).await.unwrap();
  s.record_engagement(engagement("alice", PostRef::article("a1"), counters(9, 1, 0, 0, 0)))
    .await
    .unwrap();
  s.record_engagement(engagement("bob", PostRef::new(PostKind::Topic, "t1"), counters(2, 7, 0, 3, 0)))
    .await
    .unwrap();

  assert_eq!(s.max_counters().await.unwrap(), counters(9, 7, 0, 3, 0));
}

#[tokio::test]
async fn post_totals_include_posts_without_rows() {
  let s = seeded().await;
  s.add_user(new_user("bob", None)).await.unwrap();
  s.add_topic(NewTopic {
    topic_id:   "t2".into(),
    user_id:    "bob".into(),
    title:      "Quiet".into(),
    content:    "...".into(),
    categories: vec![],
  })
  .await
  .unwrap();
  s.record_engagement(engagement("alice", PostRef::new(PostKind::Topic, "t1"), counters(1, 1, 0, 0, 0)))
    .await
    .unwrap();
  s.record_engagement(engagement("bob", PostRef::new(PostKind::Topic, "t1"), counters(2, 0, 0, 0, 4)))
    .await
    .unwrap();

  let totals = s.post_totals(PostKind::Topic).await.unwrap();
  assert_eq!(totals.len(), 2);
  assert_eq!(totals[0].post, PostRef::new(PostKind::Topic, "t1"));
  assert_eq!(totals[0].totals, counters(3, 1, 0, 0, 4));
  assert_eq!(totals[0].rows, 2);
  assert_eq!(totals[1].post, PostRef::new(PostKind::Topic, "t2"));
  assert_eq!(totals[1].rows, 0);
  assert_eq!(totals[1].totals, EngagementCounters::default());

  let owned = s.owned_post_totals("bob").await.unwrap();
  assert_eq!(owned.len(), 1);
  assert_eq!(owned[0].post, PostRef::new(PostKind::Topic, "t2"));

  let alice = s.owned_post_totals("alice").await.unwrap();
  assert_eq!(alice.len(), 3);
}

// ─── Social ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reaction_tri_state() {
  let s = seeded().await;
  let post = PostRef::article("a1");
  let input = |is_like| ReactionInput { user_id: "alice".into(), post: post.clone(), is_like };

  assert_eq!(s.set_reaction(input(None)).await.unwrap(), ReactionChange::NothingToRemove);
  assert_eq!(s.set_reaction(input(Some(true))).await.unwrap(), ReactionChange::Added);
  assert_eq!(s.count_reactions(&post, true).await.unwrap(), 1);

  assert_eq!(s.set_reaction(input(Some(false))).await.unwrap(), ReactionChange::Updated);
  assert_eq!(s.count_reactions(&post, true).await.unwrap(), 0);
  assert_eq!(s.count_reactions(&post, false).await.unwrap(), 1);

  assert_eq!(s.set_reaction(input(None)).await.unwrap(), ReactionChange::Removed);
  assert_eq!(s.count_reactions(&post, false).await.unwrap(), 0);
}

#[tokio::test]
async fn social_rows_join_actor_location() {
  let s = seeded().await;
  s.add_user(new_user("bob", Some("CA"))).await.unwrap();
  s.add_user(new_user("nomad", None)).await.unwrap();
  let post = PostRef::new(PostKind::Topic, "t1");

  for user in ["alice", "nomad"] {
    s.add_comment(NewComment { user_id: user.into(), post: post.clone(), content: "hi".into() })
      .await
      .unwrap();
  }
  s.set_reaction(ReactionInput { user_id: "bob".into(), post: post.clone(), is_like: Some(true) })
    .await
    .unwrap();
  let share = s
    .add_share(NewShare {
      user_id:      "bob".into(),
      post:         post.clone(),
      social_media: Some("twitter".into()),
    })
    .await
    .unwrap();
  assert_eq!(share.social_media.as_deref(), Some("twitter"));

  let mut comments = s.comment_locations(&post).await.unwrap();
  comments.sort();
  assert_eq!(comments, vec![None, Some("US".to_string())]);

  let reactions = s.reaction_locations(&post).await.unwrap();
  assert_eq!(reactions.len(), 1);
  assert_eq!(reactions[0].location.as_deref(), Some("CA"));
  assert!(reactions[0].is_like);

  assert_eq!(s.share_locations(&post).await.unwrap(), vec![Some("CA".to_string())]);

  // article rows never leak into their topic
  assert!(s.comment_locations(&PostRef::article("a1")).await.unwrap().is_empty());
}

#[tokio::test]
async fn comment_carries_parent_topic() {
  let s = seeded().await;
  let comment = s
    .add_comment(NewComment {
      user_id: "alice".into(),
      post:    PostRef::article("a1"),
      content: "first".into(),
    })
    .await
    .unwrap();
  assert_eq!(comment.topic_id.as_deref(), Some("t1"));
}
