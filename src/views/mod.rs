//! Screen-level state: forms, dialogs and the invoice list. Nothing here
//! renders; the CLI (or any other front end) drives these types.

pub mod auth;
pub mod create;
pub mod delete;
pub mod detail;
pub mod edit;
pub mod form;
pub mod format;
pub mod list;

pub use auth::{LoginForm, SignupForm};
pub use create::CreateInvoiceForm;
pub use delete::DeleteInvoiceDialog;
pub use detail::{HistoryEntry, InvoiceDetail};
pub use edit::EditInvoiceForm;
pub use form::{InvoiceFields, ItemField, ItemInput, LineItems};
pub use list::{InvoiceList, InvoiceRow};

/// Result of a delete request from any dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(i64),
    Cancelled,
}
