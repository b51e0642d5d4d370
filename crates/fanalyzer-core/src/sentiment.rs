//! One-word sentiment summary of a post's comments, produced by an external
//! text-completion service and cached per post.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
  Error, Result,
  cache::{CacheAside, JsonCache, SENTIMENT_TTL, comment_analysis_key},
};

/// Fixed instruction sent alongside every prompt.
pub const INSTRUCTION: &str = "You will receive a numbered list of comments left on one post. \
Classify their overall sentiment. Answer with exactly one of these words and nothing else: \
Positive, Negative, Neutral, Unknown.";

/// A text-completion backend: a fixed instruction plus a user prompt in, a
/// short text reply out.
#[async_trait]
pub trait TextCompletion: Send + Sync {
  async fn complete(&self, instruction: &str, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
  Positive,
  Negative,
  Neutral,
  Unknown,
}

impl Sentiment {
  /// Interpret a completion reply. Only the first word counts, case and
  /// trailing punctuation are ignored, and anything else is `Unknown`.
  pub fn from_reply(reply: &str) -> Self {
    let word = reply
      .split_whitespace()
      .next()
      .unwrap_or_default()
      .trim_matches(|c: char| !c.is_alphabetic())
      .to_ascii_lowercase();
    match word.as_str() {
      "positive" => Self::Positive,
      "negative" => Self::Negative,
      "neutral" => Self::Neutral,
      _ => Self::Unknown,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentSummary {
  pub sentiment: Sentiment,
}

/// One line per comment, numbered from 1.
pub fn build_prompt(comments: &[String]) -> String {
  let mut prompt = String::new();
  for (i, comment) in comments.iter().enumerate() {
    prompt.push_str(&format!("{}. {}\n", i + 1, comment.trim()));
  }
  prompt
}

/// Summarise `comments` on post `id`. A cached summary for `id` is returned
/// without calling `completion`.
pub async fn analyze_comments(
  cache: &dyn JsonCache,
  completion: &dyn TextCompletion,
  id: &str,
  comments: &[String],
) -> Result<SentimentSummary> {
  if id.trim().is_empty() {
    return Err(Error::Validation("id is required".into()));
  }
  if comments.is_empty() {
    return Err(Error::Validation("comments are required".into()));
  }

  let prompt = build_prompt(comments);
  CacheAside::new(cache, comment_analysis_key(id), SENTIMENT_TTL)
    .get_or_compute(move || async move {
      let reply = completion.complete(INSTRUCTION, &prompt).await?;
      let sentiment = Sentiment::from_reply(&reply);
      info!(id, ?sentiment, "comment sentiment computed");
      Ok(SentimentSummary { sentiment })
    })
    .await
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;
  use crate::cache::testing::MapCache;

  struct Scripted {
    reply: &'static str,
    calls: AtomicUsize,
  }

  #[async_trait]
  impl TextCompletion for Scripted {
    async fn complete(&self, instruction: &str, prompt: &str) -> Result<String> {
      assert_eq!(instruction, INSTRUCTION);
      assert!(prompt.starts_with("1. "));
      self.calls.fetch_add(1, Ordering::SeqCst);
      Ok(self.reply.to_owned())
    }
  }

  struct Down;

  #[async_trait]
  impl TextCompletion for Down {
    async fn complete(&self, _: &str, _: &str) -> Result<String> {
      Err(Error::Completion("503 Service Unavailable".into()))
    }
  }

  fn comments() -> Vec<String> { vec!["love it".into(), "great read".into()] }

  #[test]
  fn prompt_numbers_each_comment() {
    assert_eq!(build_prompt(&comments()), "1. love it\n2. great read\n");
  }

  #[test]
  fn replies_are_normalised() {
    assert_eq!(Sentiment::from_reply("Positive"), Sentiment::Positive);
    assert_eq!(Sentiment::from_reply("  negative."), Sentiment::Negative);
    assert_eq!(Sentiment::from_reply("NEUTRAL\n"), Sentiment::Neutral);
    assert_eq!(Sentiment::from_reply("Unknown"), Sentiment::Unknown);
    assert_eq!(Sentiment::from_reply("mostly happy"), Sentiment::Unknown);
    assert_eq!(Sentiment::from_reply(""), Sentiment::Unknown);
  }

  #[tokio::test]
  async fn second_request_is_served_from_cache() {
    let cache = MapCache::default();
    let llm = Scripted { reply: "Positive", calls: AtomicUsize::new(0) };

    let first = analyze_comments(&cache, &llm, "a1", &comments()).await.unwrap();
    let second = analyze_comments(&cache, &llm, "a1", &comments()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.sentiment, Sentiment::Positive);
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn missing_inputs_are_validation_errors() {
    let cache = MapCache::default();
    let llm = Scripted { reply: "Positive", calls: AtomicUsize::new(0) };

    let no_id = analyze_comments(&cache, &llm, "", &comments()).await;
    assert!(matches!(no_id, Err(Error::Validation(_))));

    let no_comments = analyze_comments(&cache, &llm, "a1", &[]).await;
    assert!(matches!(no_comments, Err(Error::Validation(_))));

    assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn completion_failure_surfaces_and_is_not_cached() {
    let cache = MapCache::default();
    let res = analyze_comments(&cache, &Down, "a1", &comments()).await;
    assert!(matches!(res, Err(Error::Completion(_))));
    assert!(cache.entries.lock().unwrap().is_empty());
  }
}
