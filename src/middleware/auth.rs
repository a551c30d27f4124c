use axum::{extract::Request, http::HeaderMap, middleware::Next, response::Response};

use crate::auth;
use crate::error::ApiError;

/// JWT middleware guarding protected routes: validates the bearer token and
/// injects the acting `Principal` as a request extension.
pub async fn protect(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Not authorized to access this route"))?;
    let claims = auth::verify_token(token)?;
    request.extensions_mut().insert(claims.principal());
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?;
    let token = raw.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: Option<&str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(v) = value {
            map.insert(
                axum::http::header::AUTHORIZATION,
                HeaderValue::from_str(v).unwrap(),
            );
        }
        map
    }

    #[test]
    fn bearer_tokens_are_extracted() {
        assert_eq!(bearer_token(&headers(Some("Bearer abc.def.ghi"))), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers(Some("Bearer   "))), None);
        assert_eq!(bearer_token(&headers(Some("Basic dXNlcg=="))), None);
        assert_eq!(bearer_token(&headers(None)), None);
    }
}
