use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use models::Session;
use service::auth::{domain::Credentials, AuthError, IdentityStore, TokenRevocations, TokenService, VerifiedToken};
use service::listings::ListingStore;

use crate::errors::JsonApiError;
use crate::extract::JsonBody;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerState {
    pub identity: Arc<IdentityStore>,
    pub listings: Arc<ListingStore>,
    pub revocations: Arc<TokenRevocations>,
    pub tokens: TokenService,
}

#[derive(Serialize)]
pub struct AuthOutput {
    pub id: Uuid,
    pub name: String,
    pub token: String,
}

/// Session of the caller, resolved from the bearer token by [`resolve_session`].
#[derive(Debug, Clone)]
pub struct Caller(pub Option<Session>);

impl Caller {
    pub fn session(&self) -> Option<&Session> {
        self.0.as_ref()
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(parts.extensions.get::<Session>().cloned()))
    }
}

fn session_cookie(token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::from(AUTH_COOKIE);
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

fn issue(state: &ServerState, jar: CookieJar, session: Session) -> Result<(CookieJar, Json<AuthOutput>), JsonApiError> {
    let token = state.tokens.issue(&session)?;
    let jar = jar.add(session_cookie(token.clone()));
    Ok((jar, Json(AuthOutput { id: session.id, name: session.name, token })))
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::CredentialsDoc, responses((status = 201, description = "Registered", body = crate::openapi::AuthOutputDoc), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(
    State(state): State<ServerState>,
    jar: CookieJar,
    JsonBody(input): JsonBody<Credentials>,
) -> Result<(StatusCode, CookieJar, Json<AuthOutput>), JsonApiError> {
    let session = state.identity.register(&input.name, &input.password).await?;
    let (jar, out) = issue(&state, jar, session)?;
    Ok((StatusCode::CREATED, jar, out))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::CredentialsDoc, responses((status = 200, description = "Logged In", body = crate::openapi::AuthOutputDoc), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    JsonBody(input): JsonBody<Credentials>,
) -> Result<(CookieJar, Json<AuthOutput>), JsonApiError> {
    let session = state.identity.login(&input.name, &input.password).await?;
    issue(&state, jar, session)
}

/// End the session: revoke the presented token, clear the store's session and the cookie.
#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Logged Out")))]
pub async fn logout(
    State(state): State<ServerState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), JsonApiError> {
    if let Some(presented) = presented_token(&headers).ok().flatten() {
        match state.tokens.verify_token(presented.token()) {
            Ok(verified) => state.revocations.revoke(&verified).await?,
            Err(e) => debug!(err = %e, "logout with an unverifiable token"),
        }
    }
    state.identity.logout().await?;
    Ok((jar.add(removal_cookie()), StatusCode::NO_CONTENT))
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current session", body = crate::openapi::SessionDoc), (status = 401, description = "Unauthorized")))]
pub async fn me(caller: Caller) -> Result<Json<Session>, JsonApiError> {
    caller.0.map(Json).ok_or_else(JsonApiError::unauthenticated)
}

/// Where the caller's token came from.
enum Presented {
    Header(String),
    Cookie(String),
}

impl Presented {
    fn token(&self) -> &str {
        match self {
            Presented::Header(t) | Presented::Cookie(t) => t,
        }
    }
}

/// Token from `Authorization: Bearer <token>`, falling back to the `auth_token` cookie.
fn presented_token(headers: &HeaderMap) -> Result<Option<Presented>, JsonApiError> {
    if let Some(h) = headers.get(header::AUTHORIZATION) {
        let value = h.to_str().unwrap_or("");
        return match value.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => Ok(Some(Presented::Header(t.trim().to_string()))),
            _ => Err(JsonApiError::new(StatusCode::UNAUTHORIZED, "Unauthorized", Some("expected Bearer token".into()))),
        };
    }
    let jar = CookieJar::from_headers(headers);
    Ok(jar
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .map(Presented::Cookie))
}

async fn authenticate(state: &ServerState, token: &str) -> Result<VerifiedToken, JsonApiError> {
    let verified = state.tokens.verify_token(token)?;
    if state.revocations.is_revoked(verified.jti).await {
        return Err(AuthError::TokenError("token has been revoked".into()).into());
    }
    Ok(verified)
}

/// Global middleware: attach the caller's [`Session`] when a token is present.
///
/// No token means an anonymous caller. A bad `Authorization` header is 401;
/// a bad cookie is dropped and the request continues anonymously.
/// Health, docs and the register/login/logout routes skip resolution.
pub async fn resolve_session(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Response {
    // a stale token must not block logging in again or logging out
    let path = req.uri().path();
    if path == "/health"
        || path == "/auth/login"
        || path == "/auth/register"
        || path == "/auth/logout"
        || path.starts_with("/api-docs")
    {
        return next.run(req).await;
    }

    let presented = match presented_token(req.headers()) {
        Ok(Some(p)) => p,
        Ok(None) => return next.run(req).await,
        Err(e) => {
            warn!(path = %req.uri().path(), "invalid Authorization format (expect Bearer)");
            return e.into_response();
        }
    };

    let outcome = authenticate(&state, presented.token()).await;
    match outcome {
        Ok(verified) => {
            req.extensions_mut().insert(verified.session);
            next.run(req).await
        }
        Err(e) => match presented {
            Presented::Header(_) => {
                warn!(path = %req.uri().path(), "bearer token rejected");
                e.into_response()
            }
            Presented::Cookie(_) => {
                debug!(path = %req.uri().path(), "stale session cookie dropped");
                let resp = next.run(req).await;
                (CookieJar::new().add(removal_cookie()), resp).into_response()
            }
        },
    }
}
