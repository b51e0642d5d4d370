//! `GET /trace`: the caller's address and the country it maps to.

use std::net::{IpAddr, SocketAddr};

use axum::{
  Json,
  extract::{ConnectInfo, State},
  http::{Extensions, HeaderMap},
};
use fanalyzer_core::store::StatsStore;
use serde::Serialize;

use crate::AppState;

/// Placeholder for an unknown address or country.
const UNKNOWN: &str = "-";

#[derive(Debug, Serialize)]
pub struct TraceResponse {
  pub ip:      String,
  pub country: String,
}

/// The first `X-Forwarded-For` entry, falling back to the peer address.
pub fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<IpAddr> {
  let forwarded = headers
    .get("x-forwarded-for")
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.split(',').next())
    .and_then(|v| v.trim().parse::<IpAddr>().ok());

  forwarded.or_else(|| {
    extensions
      .get::<ConnectInfo<SocketAddr>>()
      .map(|ConnectInfo(addr)| addr.ip())
  })
}

/// `GET /trace`
pub async fn handler<S: StatsStore>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  extensions: Extensions,
) -> Json<TraceResponse> {
  let ip = client_ip(&headers, &extensions);
  let country = match (ip, &state.geo) {
    (Some(ip), Some(geo)) => geo.country(ip),
    _ => None,
  };

  Json(TraceResponse {
    ip:      ip.map_or_else(|| UNKNOWN.to_owned(), |ip| ip.to_string()),
    country: country.unwrap_or_else(|| UNKNOWN.to_owned()),
  })
}
