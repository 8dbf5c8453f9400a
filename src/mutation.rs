use std::future::Future;

use crate::{error::AppResult, notify::Notifier};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error(String),
}

/// Status of one kind of write issued from a view.
///
/// Views keep one per action and check [`Mutation::is_pending`] to disable the
/// matching controls. Errors are toasted here so every write reports failures
/// the same way.
#[derive(Debug, Clone, Default)]
pub struct Mutation {
    status: MutationStatus,
}

impl Mutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &MutationStatus {
        &self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            MutationStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.status = MutationStatus::Idle;
    }

    /// Runs `call`, recording its outcome and toasting the error message on
    /// failure. Success handling (cache sync, success toast) stays with the
    /// caller.
    pub async fn run<T, Fut>(&mut self, notifier: &Notifier, call: Fut) -> AppResult<T>
    where
        Fut: Future<Output = AppResult<T>>,
    {
        self.status = MutationStatus::Pending;
        match call.await {
            Ok(value) => {
                self.status = MutationStatus::Success;
                Ok(value)
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(error = %message, "mutation failed");
                notifier.error(message.clone());
                self.status = MutationStatus::Error(message);
                Err(err)
            }
        }
    }
}
