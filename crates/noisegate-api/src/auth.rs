use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::SignedCookieJar;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::{pages, session, AppState};

/// Shown verbatim on any failed login; never says which factor was wrong.
const LOGIN_ERROR: &str = "Wrong username or password.";

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
    #[serde(default)]
    next: Option<String>,
}

pub async fn login_page(jar: SignedCookieJar, Query(query): Query<NextQuery>) -> Response {
    let next = query.next.as_deref().unwrap_or("/");
    if session::current(&jar).is_some() {
        return Redirect::to(&session::safe_next(Some(next))).into_response();
    }
    pages::login(None, next).into_response()
}

pub async fn login_submit(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let next = form.next.as_deref().unwrap_or("/");

    match state.db.verify_user(&form.username, &form.password)? {
        Some(user) => {
            info!("Login succeeded for '{}'", user.username);
            let target = session::safe_next(Some(next));
            let jar = session::establish(jar, user).map_err(anyhow::Error::from)?;
            Ok((jar, Redirect::to(&target)).into_response())
        }
        None => {
            warn!("Login failed for '{}'", form.username);
            Ok(pages::login(Some(LOGIN_ERROR), next).into_response())
        }
    }
}

pub async fn logout(jar: SignedCookieJar, headers: HeaderMap) -> (SignedCookieJar, Redirect) {
    let next = referer_path(&headers);
    let jar = session::clear(jar);
    (jar, session::login_redirect(&next))
}

/// Path + query of the Referer header, or `/` when absent or unparseable.
fn referer_path(headers: &HeaderMap) -> String {
    headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Uri>().ok())
        .and_then(|uri| uri.path_and_query().map(|pq| pq.as_str().to_string()))
        .unwrap_or_else(|| "/".to_string())
}
