//! Authentication capability attached to outbound requests.
//!
//! How tokens are obtained or refreshed is not this crate's concern: an
//! [`Authenticator`] only knows how to stamp a request with credentials.
//! All implementations redact secrets in Debug output.

use crate::request::RequestBuilder;

/// Something that can attach provider credentials to a request.
pub trait Authenticator: Send + Sync + std::fmt::Debug {
    /// Attach credentials to the request.
    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder;
}

impl<T: Authenticator + ?Sized> Authenticator for std::sync::Arc<T> {
    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        (**self).authenticate(request)
    }
}

/// OAuth2 / API-key style bearer token.
#[derive(Clone)]
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Authenticator for BearerToken {
    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.token)
    }
}

/// HTTP basic authentication.
#[derive(Clone)]
pub struct BasicAuth {
    user: String,
    pass: String,
}

impl BasicAuth {
    pub fn new(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
        }
    }
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("user", &self.user)
            .field("pass", &"[REDACTED]")
            .finish()
    }
}

impl Authenticator for BasicAuth {
    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.user, Some(self.pass.clone()))
    }
}

/// Sends requests without credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl Authenticator for NoAuth {
    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestMethod;

    #[test]
    fn test_bearer_token_debug_redacted() {
        let auth = BearerToken::new("00Dxx0000001gEF!secret");
        let debug = format!("{:?}", auth);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_basic_auth_debug_redacted() {
        let auth = BasicAuth::new("admin", "p@ss");
        let debug = format!("{:?}", auth);
        assert!(debug.contains("admin"));
        assert!(!debug.contains("p@ss"));
    }

    #[test]
    fn test_no_auth_leaves_request_untouched() {
        let req = NoAuth.authenticate(RequestBuilder::new(RequestMethod::Get, "https://x.test"));
        assert!(req.auth.is_none());
    }
}
