//! Request extractors whose rejections are reported as [`ApiError`]s.

use axum::{
  body::Bytes,
  extract::{FromRequest, FromRequestParts, Query, Request},
  http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Request input read from the JSON body or, when the body is empty, from the
/// query string.
///
/// Several read endpoints take their arguments as a body on `GET`; this lets
/// the same handlers accept `?id=...` as well. The content type is not
/// checked.
#[derive(Debug)]
pub struct Input<T>(pub T);

impl<T, St> FromRequest<St> for Input<T>
where
  T: DeserializeOwned + Send,
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &St) -> Result<Self, Self::Rejection> {
    let uri = req.uri().clone();
    let body = Bytes::from_request(req, state).await?;

    if body.iter().all(u8::is_ascii_whitespace) {
      let Query(value) = Query::<T>::try_from_uri(&uri)?;
      return Ok(Self(value));
    }

    serde_json::from_slice(&body)
      .map(Self)
      .map_err(|e| ApiError::Validation(format!("invalid JSON body: {e}")))
  }
}

/// Query-string parameters.
#[derive(Debug)]
pub struct Params<T>(pub T);

impl<T, St> FromRequestParts<St> for Params<T>
where
  T: DeserializeOwned + Send,
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
    let Query(value) = Query::<T>::try_from_uri(&parts.uri)?;
    Ok(Self(value))
  }
}
