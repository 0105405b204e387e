use std::sync::RwLock;

/// Errors reported when storing a token.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token to store is the empty string.
    #[error("authentication token is empty")]
    EmptyToken,
}

/// Storage for the user's authentication token.
///
/// The request pipeline only reads it, for requests built with
/// [`DataRequest::use_user_token`](crate::DataRequest::use_user_token). Apps that keep the token
/// in platform secure storage implement this trait on top of it.
pub trait AuthenticationTokenProvider {
    /// Current token, `None` when the user is logged out.
    fn token(&self) -> Option<String>;

    /// Store `token`, replacing the previous one. Empty tokens are rejected.
    fn save_token(&self, token: &str) -> Result<(), TokenError>;

    /// Forget the token.
    fn delete_token(&self);
}

/// In-process [`AuthenticationTokenProvider`].
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthenticationTokenProvider for MemoryTokenStore {
    fn token(&self) -> Option<String> {
        // Err() only happens if a writer panicked while holding the lock. Treat it as "no token"
        // rather than crashing the app.
        self.token.read().ok()?.clone()
    }

    fn save_token(&self, token: &str) -> Result<(), TokenError> {
        if token.is_empty() {
            return Err(TokenError::EmptyToken);
        }
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token.to_owned());
        }
        Ok(())
    }

    fn delete_token(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn save_read_delete() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.token(), None);

        store.save_token("abc").unwrap();
        assert_eq!(store.token().as_deref(), Some("abc"));

        store.delete_token();
        assert_eq!(store.token(), None);
    }

    #[test]
    fn empty_token_is_rejected_and_keeps_previous() {
        let store = MemoryTokenStore::new();
        store.save_token("abc").unwrap();
        assert_eq!(store.save_token(""), Err(TokenError::EmptyToken));
        assert_eq!(store.token().as_deref(), Some("abc"));
    }

    #[test]
    fn can_save_token_from_another_thread() {
        let store = Arc::new(MemoryTokenStore::new());

        {
            let store = store.clone();
            let _ = std::thread::spawn(move || store.save_token("from-thread")).join();
        }

        assert_eq!(store.token().as_deref(), Some("from-thread"));
    }
}
