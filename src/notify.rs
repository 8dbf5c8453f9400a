//! User-facing notification channel.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
}

impl Toast {
    pub fn is_error(&self) -> bool {
        self.variant == ToastVariant::Destructive
    }
}

/// Sending half, cloned into every component that reports to the user.
/// Sends never fail: once the receiver is gone toasts are dropped.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: UnboundedSender<Toast>,
}

pub struct Toasts {
    rx: UnboundedReceiver<Toast>,
}

pub fn channel() -> (Notifier, Toasts) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier { tx }, Toasts { rx })
}

impl Notifier {
    /// Notifier whose toasts go nowhere.
    pub fn discard() -> Self {
        channel().0
    }

    pub fn success(&self, title: impl Into<String>, description: impl Into<String>) {
        self.push(Toast {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Default,
        });
    }

    pub fn error(&self, description: impl Into<String>) {
        self.push(Toast {
            title: "Error".into(),
            description: description.into(),
            variant: ToastVariant::Destructive,
        });
    }

    pub fn validation(&self, description: impl Into<String>) {
        self.push(Toast {
            title: "Validation Error".into(),
            description: description.into(),
            variant: ToastVariant::Destructive,
        });
    }

    fn push(&self, toast: Toast) {
        tracing::debug!(title = %toast.title, description = %toast.description, "toast");
        let _ = self.tx.send(toast);
    }
}

impl Toasts {
    /// Everything queued so far, without waiting.
    pub fn drain(&mut self) -> Vec<Toast> {
        let mut out = Vec::new();
        while let Ok(toast) = self.rx.try_recv() {
            out.push(toast);
        }
        out
    }

    pub async fn next(&mut self) -> Option<Toast> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_toasts_in_order() {
        let (notifier, mut toasts) = channel();
        notifier.success("Invoice created", "The invoice has been created successfully.");
        notifier.error("Failed to create invoice");
        let drained = toasts.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].title, "Invoice created");
        assert!(!drained[0].is_error());
        assert_eq!(drained[1].title, "Error");
        assert!(drained[1].is_error());
        assert!(toasts.drain().is_empty());
    }

    #[test]
    fn discard_never_panics() {
        Notifier::discard().error("nobody is listening");
    }
}
