//! One-shot notices carried across a redirect in a cookie.
//!
//! A redirect stashes its notices as base64(JSON) in an `HttpOnly` cookie;
//! the next rendered page decodes them via [`IncomingNotices`] and clears
//! the cookie with its response.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use base64ct::{Base64, Encoding};
use serde::{Deserialize, Serialize};

pub const NOTICE_COOKIE: &str = "notices";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

/// Pull one cookie's value out of a `Cookie` header.
pub(crate) fn cookie_value(header_value: &str, name: &str) -> Option<String> {
    header_value
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

fn encode(notices: &[Notice]) -> String {
    let json = serde_json::to_vec(notices).unwrap_or_default();
    Base64::encode_string(&json)
}

fn decode(raw: &str) -> Vec<Notice> {
    Base64::decode_vec(raw)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

pub(crate) fn set_cookie(notices: &[Notice]) -> String {
    format!(
        "{NOTICE_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
        encode(notices)
    )
}

pub(crate) fn clear_cookie() -> String {
    format!("{NOTICE_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

/// Notices left by a previous redirect, ready to show on this render.
///
/// `cookie_present` tracks whether the request carried a notices cookie at
/// all, so a render can clear it even when the value failed to decode.
#[derive(Debug, Default)]
pub struct IncomingNotices {
    pub notices: Vec<Notice>,
    pub cookie_present: bool,
}

#[async_trait]
impl<S> FromRequestParts<S> for IncomingNotices
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(header::COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| cookie_value(h, NOTICE_COOKIE));
        Ok(match raw {
            Some(raw) => Self {
                notices: decode(&raw),
                cookie_present: true,
            },
            None => Self::default(),
        })
    }
}

/// See-other redirect that stashes notices for the next render.
#[derive(Debug)]
pub struct FlashRedirect {
    to: &'static str,
    notices: Vec<Notice>,
}

impl FlashRedirect {
    pub fn to(to: &'static str) -> Self {
        Self {
            to,
            notices: Vec::new(),
        }
    }

    pub fn notice(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }
}

impl IntoResponse for FlashRedirect {
    fn into_response(self) -> Response {
        let mut res = Redirect::to(self.to).into_response();
        if !self.notices.is_empty() {
            if let Ok(value) = header::HeaderValue::from_str(&set_cookie(&self.notices)) {
                res.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        res
    }
}
