//! Boundary to the template-rendering collaborator.
//!
//! Handlers produce a named template plus a JSON context; expanding the
//! template into markup happens outside this service, so the response body
//! carries `{template, context, notices}` as-is.

use axum::{
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

use crate::flash::{self, IncomingNotices, Notice};

#[derive(Debug)]
pub struct Page {
    template: &'static str,
    context: Map<String, Value>,
    notices: Vec<Notice>,
    clear_notice_cookie: bool,
}

impl Page {
    pub fn new(template: &'static str) -> Self {
        Self {
            template,
            context: Map::new(),
            notices: Vec::new(),
            clear_notice_cookie: false,
        }
    }

    pub fn context(mut self, key: &str, value: Value) -> Self {
        self.context.insert(key.to_string(), value);
        self
    }

    /// Show notices left by a previous redirect and clear them from the
    /// cookie with this response. The cookie is cleared whenever the
    /// request carried one, even if its value did not decode.
    pub fn notices(mut self, incoming: IncomingNotices) -> Self {
        self.clear_notice_cookie = incoming.cookie_present;
        self.notices.extend(incoming.notices);
        self
    }

    /// Notice produced by this render itself, e.g. a validation failure.
    pub fn notice(mut self, notice: Notice) -> Self {
        self.notices.push(notice);
        self
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        let body = json!({
            "template": self.template,
            "context": Value::Object(self.context),
            "notices": self.notices,
        });
        let mut res = Json(body).into_response();
        if self.clear_notice_cookie {
            if let Ok(value) = header::HeaderValue::from_str(&flash::clear_cookie()) {
                res.headers_mut().append(header::SET_COOKIE, value);
            }
        }
        res
    }
}
