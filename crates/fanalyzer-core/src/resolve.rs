//! Entity-kind resolution.
//!
//! Identifiers are unique across the article, topic and advertisement tables,
//! so probing them in [`PostKind::PROBE_ORDER`] yields at most one match. The
//! result is resolved once per request and passed on as a [`PostRef`].

use tracing::debug;

use crate::{
  Error, Result,
  post::{PostKind, PostRef},
  store::StatsStore,
};

/// Resolve `id` to the post it denotes, or fail with [`Error::NotFound`].
pub async fn resolve_post<S: StatsStore>(store: &S, id: &str) -> Result<PostRef> {
  if id.trim().is_empty() {
    return Err(Error::Validation("id is required".into()));
  }

  for kind in PostKind::PROBE_ORDER {
    let candidate = PostRef::new(kind, id);
    if store.post_exists(&candidate).await.map_err(Error::store)? {
      debug!(%candidate, "resolved post identifier");
      return Ok(candidate);
    }
  }

  Err(Error::NotFound(format!("ID {id} does not exist")))
}

/// Fail with [`Error::Conflict`] if `id` is already taken by a post of a
/// kind other than `kind`. Returns whether it is taken by `kind` itself.
pub async fn check_identifier<S: StatsStore>(
  store: &S,
  kind: PostKind,
  id: &str,
) -> Result<bool> {
  match resolve_post(store, id).await {
    Ok(existing) if existing.kind == kind => Ok(true),
    Ok(existing) => Err(Error::Conflict(format!(
      "ID {id} is already taken by a post of kind {}",
      existing.kind
    ))),
    Err(Error::NotFound(_)) => Ok(false),
    Err(e) => Err(e),
  }
}
