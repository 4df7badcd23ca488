use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::{error::AuthError, models::auth::AuthSession, AppState};

/// Returns the credential of an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively. Any other scheme, a missing
/// header or an empty credential yields `None`.
pub fn bearer_credential(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, credential) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let credential = credential.trim();
    (!credential.is_empty()).then_some(credential)
}

async fn authenticate(headers: &HeaderMap, state: &AppState) -> Result<AuthSession, AuthError> {
    let token = bearer_credential(headers).ok_or(AuthError::Unauthenticated)?;
    state.sessions.session(token).await
}

/// Guard for protected routes: rejects with 403 before the handler runs and
/// leaves the verified [`AuthSession`] in the request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let session = authenticate(request.headers(), &state).await?;
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<AuthSession>() {
            return Ok(session.clone());
        }
        let session = authenticate(&parts.headers, state).await?;
        parts.extensions.insert(session.clone());
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_credential_extracts_token() {
        assert_eq!(bearer_credential(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_credential(&headers("bearer abc")), Some("abc"));
    }

    #[test]
    fn test_bearer_credential_rejects_other_shapes() {
        assert_eq!(bearer_credential(&HeaderMap::new()), None);
        assert_eq!(bearer_credential(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_credential(&headers("Bearer")), None);
        assert_eq!(bearer_credential(&headers("Bearer    ")), None);
        assert_eq!(bearer_credential(&headers("abc.def.ghi")), None);
    }
}
