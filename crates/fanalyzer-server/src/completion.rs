//! [`TextCompletion`] over an OpenAI-compatible `/chat/completions` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use fanalyzer_core::{Error, Result, sentiment::TextCompletion};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CompletionConfig;

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ChatCompletionClient {
  client:   Client,
  endpoint: String,
  api_key:  Option<String>,
  model:    String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
  model:       &'a str,
  messages:    [Message<'a>; 2],
  temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
  role:    &'a str,
  content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
  #[serde(default)]
  content: Option<String>,
}

impl ChatCompletionClient {
  pub fn new(config: &CompletionConfig) -> anyhow::Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self {
      client,
      endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
      api_key: config.api_key.clone(),
      model: config.model.clone(),
    })
  }
}

/// The first choice's text, or an error if the reply carried none.
fn first_reply(response: ChatResponse) -> Result<String> {
  response
    .choices
    .into_iter()
    .next()
    .and_then(|c| c.message.content)
    .ok_or_else(|| Error::Completion("reply contained no choices".into()))
}

#[async_trait]
impl TextCompletion for ChatCompletionClient {
  async fn complete(&self, instruction: &str, prompt: &str) -> Result<String> {
    let body = ChatRequest {
      model:       &self.model,
      messages:    [
        Message { role: "system", content: instruction },
        Message { role: "user", content: prompt },
      ],
      temperature: 0.0,
    };

    let mut req = self.client.post(&self.endpoint).json(&body);
    if let Some(key) = &self.api_key {
      req = req.bearer_auth(key);
    }

    let resp = req
      .send()
      .await
      .map_err(|e| Error::Completion(e.to_string()))?;
    if !resp.status().is_success() {
      return Err(Error::Completion(format!("POST {} -> {}", self.endpoint, resp.status())));
    }

    let parsed: ChatResponse = resp
      .json()
      .await
      .map_err(|e| Error::Completion(format!("deserialising reply: {e}")))?;
    let reply = first_reply(parsed)?;
    debug!(model = %self.model, %reply, "completion reply");
    Ok(reply)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn endpoint_joins_without_double_slash() {
    let client = ChatCompletionClient::new(&CompletionConfig {
      base_url: "http://localhost:8000/v1/".into(),
      ..Default::default()
    })
    .unwrap();
    assert_eq!(client.endpoint, "http://localhost:8000/v1/chat/completions");
  }

  #[test]
  fn takes_the_first_choice() {
    let response: ChatResponse = serde_json::from_str(
      r#"{"choices":[{"message":{"role":"assistant","content":"Neutral"}},
                     {"message":{"role":"assistant","content":"Positive"}}]}"#,
    )
    .unwrap();
    assert_eq!(first_reply(response).unwrap(), "Neutral");
  }

  #[test]
  fn empty_choices_are_an_error() {
    let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
    assert!(matches!(first_reply(response), Err(Error::Completion(_))));
  }
}
