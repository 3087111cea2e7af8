use tokio::sync::watch;
use tracing::debug;

/// Shared holder of the current access token.
///
/// The REST client writes it (login, refresh, logout) and the socket client
/// watches it: a new token lets an idle socket connect, a cleared token tears
/// the socket down. Cloning is cheap; all clones see the same value.
#[derive(Debug, Clone)]
pub struct TokenStore {
    tx: watch::Sender<Option<String>>,
}

impl TokenStore {
    pub fn new(initial: Option<String>) -> Self {
        let initial = initial.filter(|t| !t.trim().is_empty());
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn get(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    pub fn is_present(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Replace the token. Blank strings count as "no token".
    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        if token.trim().is_empty() {
            self.clear();
            return;
        }
        debug!("access token updated");
        self.tx.send_replace(Some(token));
    }

    pub fn clear(&self) {
        debug!("access token cleared");
        self.tx.send_replace(None);
    }

    /// Receiver that fires on every change.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(None)
    }
}
