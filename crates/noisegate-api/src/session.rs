use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, Key, SameSite};
use axum_extra::extract::SignedCookieJar;
use serde::{Deserialize, Serialize};

use noisegate_db::UserInfo;

pub const SESSION_COOKIE: &str = "session";

/// Identity carried in the signed session cookie. A request without a
/// valid, untampered cookie is unauthenticated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub role: String,
}

impl From<UserInfo> for SessionUser {
    fn from(user: UserInfo) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
        }
    }
}

/// Session guard: extracting a `SessionUser` in a handler makes the
/// route protected. Rejection redirects to the login form with the
/// original path carried in `next`.
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = match SignedCookieJar::<Key>::from_request_parts(parts, state).await {
            Ok(jar) => jar,
            Err(never) => match never {},
        };

        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        current(&jar).ok_or_else(|| login_redirect(target))
    }
}

pub fn login_redirect(target: &str) -> Redirect {
    Redirect::to(&format!("/login?next={}", urlencoding::encode(target)))
}

/// Reads the session cookie; tampered or undecodable payloads count
/// as no session at all.
pub fn current(jar: &SignedCookieJar) -> Option<SessionUser> {
    let cookie = jar.get(SESSION_COOKIE)?;
    serde_json::from_str(cookie.value()).ok()
}

pub fn establish(
    jar: SignedCookieJar,
    user: UserInfo,
) -> Result<SignedCookieJar, serde_json::Error> {
    let payload = serde_json::to_string(&SessionUser::from(user))?;
    let cookie = Cookie::build((SESSION_COOKIE, payload))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    Ok(jar.add(cookie))
}

/// Removal also instructs the client to drop the cookie.
pub fn clear(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build())
}

/// Restrict a post-login redirect target to same-origin relative
/// paths. Absolute URLs and protocol-relative `//` paths resolve to
/// `/` so the login form cannot be used as an open redirect.
pub fn safe_next(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return "/".to_string();
    };
    let Ok(decoded) = urlencoding::decode(raw) else {
        return "/".to_string();
    };
    let decoded = decoded.into_owned();
    if decoded.starts_with('/') && !decoded.starts_with("//") {
        decoded
    } else {
        "/".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::safe_next;

    #[test]
    fn relative_paths_pass_through() {
        assert_eq!(safe_next(Some("/denoise")), "/denoise");
        assert_eq!(safe_next(Some("/denoise?strength=2")), "/denoise?strength=2");
        assert_eq!(safe_next(Some("%2Fdenoise%2F")), "/denoise/");
    }

    #[test]
    fn offsite_targets_resolve_to_root() {
        assert_eq!(safe_next(Some("http://evil.com")), "/");
        assert_eq!(safe_next(Some("//evil.com")), "/");
        assert_eq!(safe_next(Some("https%3A%2F%2Fevil.com")), "/");
    }

    #[test]
    fn missing_or_empty_resolves_to_root() {
        assert_eq!(safe_next(None), "/");
        assert_eq!(safe_next(Some("")), "/");
    }
}
