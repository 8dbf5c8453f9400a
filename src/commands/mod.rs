//! CLI subcommands. Results go to stdout; toasts are printed by the binary.

pub mod auth_cmd;
pub mod invoice_cmd;
pub mod transaction_cmd;

use crate::{api::InvoiceApi, cache::InvoiceCache, notify::Notifier, session::AuthSession};

/// Everything a subcommand needs, built once per process after the session
/// has been restored.
#[derive(Debug, Clone)]
pub struct Context {
    pub session: AuthSession,
    pub notifier: Notifier,
}

impl Context {
    pub fn new(session: AuthSession) -> Self {
        let notifier = session.notifier().clone();
        Self { session, notifier }
    }

    pub fn api(&self) -> InvoiceApi {
        InvoiceApi::new(self.session.clone())
    }

    pub fn cache(&self) -> InvoiceCache {
        InvoiceCache::new(self.api())
    }

    pub async fn username(&self) -> Option<String> {
        self.session.user().await.map(|u| u.username)
    }
}
