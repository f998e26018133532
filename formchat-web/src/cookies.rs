//! Cookie-backed linking tokens and visitor identity.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use formchat_core::linking::LinkingTokens;

/// Cookie identifying a visitor's sessions.
pub const VISITOR_COOKIE: &str = "formchat_visitor";

/// Linking tokens read from an explicit `?key=` query value, falling back to
/// request cookies. Tokens set during a turn become response cookies.
#[derive(Debug, Clone, Default)]
pub struct CookieTokens {
    jar: CookieJar,
    query_key: Option<String>,
}

impl CookieTokens {
    pub fn new(jar: CookieJar, query_key: Option<String>) -> Self {
        let query_key = query_key.filter(|k| !k.trim().is_empty());
        Self { jar, query_key }
    }

    /// The jar to send back, including any cookies set on it.
    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

impl LinkingTokens for CookieTokens {
    fn get(&self, name: &str) -> Option<String> {
        self.query_key.clone().or_else(|| {
            self.jar
                .get(name)
                .map(|cookie| cookie.value().to_string())
                .filter(|value| !value.is_empty())
        })
    }

    fn set(&mut self, name: &str, value: &str) {
        let cookie = Cookie::build((name.to_string(), value.to_string()))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true);
        self.jar = std::mem::take(&mut self.jar).add(cookie);
    }
}

/// Returns the visitor id, issuing a new visitor cookie when absent.
pub fn visitor_id(jar: CookieJar) -> (CookieJar, String) {
    if let Some(existing) = jar
        .get(VISITOR_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
    {
        return (jar, existing);
    }

    let visitor = uuid::Uuid::new_v4().to_string();
    let cookie = Cookie::build((VISITOR_COOKIE, visitor.clone()))
        .path("/")
        .same_site(SameSite::Lax)
        .http_only(true);
    (jar.add(cookie), visitor)
}
