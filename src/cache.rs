//! Client-side cache for the `"invoices"` list query.
//!
//! Filled by list fetches, patched in place by mutation results and
//! invalidated after writes. Fetches are sequenced so a response that started
//! before a newer write or a newer fetch is dropped instead of rolling the
//! cached list back.

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{api::InvoiceApi, error::AppResult, models::Invoice};

pub const INVOICES_QUERY_KEY: &str = "invoices";

#[derive(Debug, Default)]
struct CacheEntry {
    data: Option<Vec<Invoice>>,
    stale: bool,
    /// Monotonic counter handed out to fetches and writes.
    seq: u64,
    /// Sequence number of whatever produced the current `data`.
    applied: u64,
    fetches: u64,
}

#[derive(Debug, Clone)]
pub struct InvoiceCache {
    api: InvoiceApi,
    entry: Arc<RwLock<CacheEntry>>,
    version: Arc<watch::Sender<u64>>,
}

impl InvoiceCache {
    pub fn new(api: InvoiceApi) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            api,
            entry: Arc::new(RwLock::new(CacheEntry::default())),
            version: Arc::new(version),
        }
    }

    pub fn key(&self) -> &'static str {
        INVOICES_QUERY_KEY
    }

    pub fn api(&self) -> &InvoiceApi {
        &self.api
    }

    /// Receiver bumped on every change. Holding one marks the query observed,
    /// which makes invalidations refetch immediately.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn is_observed(&self) -> bool {
        self.version.receiver_count() > 0
    }

    /// Cached list if fresh, otherwise a network fetch.
    pub async fn fetch(&self) -> AppResult<Vec<Invoice>> {
        {
            let entry = self.entry.read().await;
            if let (Some(data), false) = (&entry.data, entry.stale) {
                return Ok(data.clone());
            }
        }
        self.refetch().await
    }

    /// Always hits the network. The result is stored only if nothing newer
    /// landed while the request was in flight; the caller gets the freshest
    /// list either way.
    pub async fn refetch(&self) -> AppResult<Vec<Invoice>> {
        let ticket = {
            let mut entry = self.entry.write().await;
            entry.seq += 1;
            entry.fetches += 1;
            entry.seq
        };

        let fetched = self.api.list_invoices().await?;

        let mut entry = self.entry.write().await;
        if ticket > entry.applied {
            entry.data = Some(fetched.clone());
            entry.applied = ticket;
            entry.stale = false;
            drop(entry);
            self.bump();
            Ok(fetched)
        } else {
            tracing::debug!(ticket, applied = entry.applied, "discarding superseded invoice fetch");
            Ok(entry.data.clone().unwrap_or(fetched))
        }
    }

    /// Replaces the cached list with whatever `update` returns, like
    /// `setQueryData`. `None` in, `None` out when nothing was ever fetched.
    pub async fn set_query_data<F>(&self, update: F)
    where
        F: FnOnce(Option<Vec<Invoice>>) -> Option<Vec<Invoice>>,
    {
        let mut entry = self.entry.write().await;
        let current = entry.data.take();
        entry.data = update(current);
        entry.seq += 1;
        entry.applied = entry.seq;
        drop(entry);
        self.bump();
    }

    /// Swaps in `updated` wherever the cached list has the same id. Never
    /// inserts: an invoice the list no longer holds stays absent.
    pub async fn patch_invoice(&self, updated: &Invoice) {
        self.set_query_data(|data| {
            data.map(|list| {
                list.into_iter()
                    .map(|inv| if inv.id == updated.id { updated.clone() } else { inv })
                    .collect()
            })
        })
        .await;
    }

    /// Marks the list stale and, when a view is observing it, refetches now.
    /// A failed refetch keeps the previous data and is only logged.
    pub async fn invalidate(&self) {
        self.entry.write().await.stale = true;
        self.bump();

        if self.is_observed() {
            if let Err(err) = self.refetch().await {
                tracing::warn!(key = INVOICES_QUERY_KEY, error = %err, "refetch after invalidation failed");
            }
        }
    }

    pub async fn snapshot(&self) -> Option<Vec<Invoice>> {
        self.entry.read().await.data.clone()
    }

    pub async fn get(&self, id: i64) -> Option<Invoice> {
        self.entry
            .read()
            .await
            .data
            .as_ref()
            .and_then(|list| list.iter().find(|inv| inv.id == id).cloned())
    }

    pub async fn is_stale(&self) -> bool {
        self.entry.read().await.stale
    }

    /// Number of network fetches issued so far.
    pub async fn fetch_count(&self) -> u64 {
        self.entry.read().await.fetches
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}
