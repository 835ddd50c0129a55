//! Session middleware — resolves a signed cookie into a `SessionId`.
//!
//! Requests without a valid session cookie get a freshly minted id, and the
//! response carries the matching `Set-Cookie`. Handlers read the resolved id
//! from request extensions; they never touch cookies directly.

use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::response::Response;
use secrecy::SecretString;
use tower::{Layer, Service};
use tracing::debug;

use super::id::SessionId;
use crate::config::ServerConfig;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "job_board_session";

/// Cookie attributes and signing material for the session layer.
#[derive(Clone)]
struct SessionCookieConfig {
    secret: SecretString,
    secure: bool,
    max_age_secs: u64,
}

/// Tower layer installing cookie-backed session resolution.
#[derive(Clone)]
pub struct SessionLayer {
    config: SessionCookieConfig,
}

impl SessionLayer {
    /// Build the layer from server configuration.
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            config: SessionCookieConfig {
                secret: config.session_secret.clone(),
                secure: config.cookie_secure,
                max_age_secs: config.session_ttl_secs,
            },
        }
    }
}

impl<S> Layer<S> for SessionLayer {
    type Service = SessionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SessionMiddleware {
            inner,
            config: self.config.clone(),
        }
    }
}

/// The middleware service produced by [`SessionLayer`].
#[derive(Clone)]
pub struct SessionMiddleware<S> {
    inner: S,
    config: SessionCookieConfig,
}

impl<S> Service<Request> for SessionMiddleware<S>
where
    S: Service<Request, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let config = self.config.clone();
        // Take the service that was polled ready; leave the clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let existing = cookie_value(&req, SESSION_COOKIE_NAME)
                .and_then(|raw| SessionId::verify(&raw, &config.secret));

            let (session_id, is_new) = match existing {
                Some(id) => (id, false),
                None => {
                    let id = SessionId::generate();
                    debug!(session = %id, "Minted new session");
                    (id, true)
                }
            };

            req.extensions_mut().insert(session_id.clone());

            let mut response = inner.call(req).await?;

            if is_new {
                let cookie = build_cookie(&session_id, &config);
                if let Ok(value) = cookie.parse() {
                    response.headers_mut().append(SET_COOKIE, value);
                }
            }

            Ok(response)
        })
    }
}

/// Extract a cookie's value from the request's `Cookie` headers.
fn cookie_value(req: &Request, name: &str) -> Option<String> {
    let header = req.headers().get(COOKIE)?.to_str().ok()?;
    for pair in header.split(';') {
        if let Some((key, value)) = pair.trim().split_once('=') {
            if key.trim() == name {
                return Some(value.trim().to_string());
            }
        }
    }
    None
}

fn build_cookie(session_id: &SessionId, config: &SessionCookieConfig) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Lax; HttpOnly",
        SESSION_COOKIE_NAME,
        session_id.sign(&config.secret),
        config.max_age_secs,
    );
    if config.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(secure: bool) -> SessionCookieConfig {
        SessionCookieConfig {
            secret: SecretString::from("test-secret"),
            secure,
            max_age_secs: 86400,
        }
    }

    #[test]
    fn cookie_value_finds_named_cookie() {
        let req = Request::builder()
            .header(COOKIE, "other=1; job_board_session=abc.def; last=x")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            cookie_value(&req, SESSION_COOKIE_NAME),
            Some("abc.def".to_string())
        );
        assert_eq!(cookie_value(&req, "missing"), None);
    }

    #[test]
    fn cookie_value_handles_absent_header() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(cookie_value(&req, SESSION_COOKIE_NAME), None);
    }

    #[test]
    fn build_cookie_sets_expected_attributes() {
        let id = SessionId::generate();
        let cookie = build_cookie(&id, &test_config(false));
        assert!(cookie.starts_with("job_board_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(!cookie.contains("Secure"));

        let secure = build_cookie(&id, &test_config(true));
        assert!(secure.ends_with("; Secure"));
    }

    #[test]
    fn built_cookie_value_verifies() {
        let config = test_config(false);
        let id = SessionId::generate();
        let cookie = build_cookie(&id, &config);
        let value = cookie
            .split_once('=')
            .and_then(|(_, rest)| rest.split(';').next())
            .unwrap();
        assert_eq!(SessionId::verify(value, &config.secret), Some(id));
    }
}
