//! Client device details from request headers.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::{ACCEPT_ENCODING, ACCEPT_LANGUAGE, USER_AGENT};
use axum::http::request::Parts;

use parkhub_auth::DeviceInfo;

/// User agent, accept headers and client IP of the request.
///
/// The IP is the first `X-Forwarded-For` hop when present, otherwise the
/// socket peer address.
#[derive(Debug, Clone)]
pub struct ClientDevice(pub DeviceInfo);

fn header(parts: &Parts, name: impl axum::http::header::AsHeaderName) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn client_ip(parts: &Parts) -> Option<String> {
    let forwarded = header(parts, "x-forwarded-for").and_then(|v| {
        v.split(',')
            .next()
            .map(|hop| hop.trim().to_string())
            .filter(|hop| !hop.is_empty())
    });

    forwarded.or_else(|| {
        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    })
}

impl<S: Send + Sync> FromRequestParts<S> for ClientDevice {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientDevice(DeviceInfo {
            user_agent: header(parts, USER_AGENT),
            accept_language: header(parts, ACCEPT_LANGUAGE),
            accept_encoding: header(parts, ACCEPT_ENCODING),
            ip_address: client_ip(parts),
        }))
    }
}
