//! Cookie/session fallback authentication.
//!
//! When cookie authentication is allowed and a request already carries a
//! session, the engine asks a [`SessionAuthenticator`] whether that session
//! belongs to an authenticated user instead of verifying a MAC.

use dashmap::DashMap;

use crate::verifier::RequestContext;

/// Host-supplied view of the session layer.
pub trait SessionAuthenticator: Send + Sync {
    /// Whether the request carries a session at all.
    fn has_session(&self, ctx: &RequestContext<'_>) -> bool;

    /// The authenticated user owning the request's session, if any.
    fn authenticated_user(&self, ctx: &RequestContext<'_>) -> Option<String>;
}

/// Sessions keyed by the value of one cookie.
///
/// A request has a session when it sends the cookie; the session is
/// authenticated when the cookie's value has been bound to a user through
/// [`CookieSessions::login`].
#[derive(Debug)]
pub struct CookieSessions {
    cookie_name: String,
    users: DashMap<String, String>,
}

impl CookieSessions {
    /// Track sessions carried in the cookie named `cookie_name`.
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            users: DashMap::new(),
        }
    }

    /// Bind `session_id` to `user`.
    pub fn login(&self, session_id: impl Into<String>, user: impl Into<String>) {
        self.users.insert(session_id.into(), user.into());
    }

    /// Unbind `session_id`. The cookie still counts as a session afterwards.
    pub fn logout(&self, session_id: &str) {
        self.users.remove(session_id);
    }

    fn session_id<'a>(&self, ctx: &RequestContext<'a>) -> Option<&'a str> {
        ctx.headers
            .get_all(http::header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }
}

impl SessionAuthenticator for CookieSessions {
    fn has_session(&self, ctx: &RequestContext<'_>) -> bool {
        self.session_id(ctx).is_some()
    }

    fn authenticated_user(&self, ctx: &RequestContext<'_>) -> Option<String> {
        let id = self.session_id(ctx)?;
        self.users.get(id).map(|user| user.value().clone())
    }
}
