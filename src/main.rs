use std::{io, path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use invoice_desk::{
    client::ApiClient,
    commands::{
        Context, auth_cmd::AuthAction, invoice_cmd::InvoiceAction,
        transaction_cmd::TransactionAction,
    },
    config::AppConfig,
    notify::{self, Toasts},
    session::AuthSession,
    store::{FileStore, TokenStore},
};

#[derive(Parser, Debug)]
#[command(name = "invoice-desk")]
#[command(version, about = "Invoice management client", long_about = None)]
struct Cli {
    /// Backend base URL.
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding the stored session.
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(flatten)]
    Auth(AuthAction),
    /// Manage invoices.
    Invoices {
        #[command(subcommand)]
        action: InvoiceAction,
    },
    /// Inspect the transaction ledger.
    Transactions {
        #[command(subcommand)]
        action: TransactionAction,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,invoice_desk=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(dir) = cli.store_dir {
        config.store_dir = dir;
    }

    let client = ApiClient::new(&config)?;
    let store = TokenStore::new(Arc::new(FileStore::in_dir(&config.store_dir)));
    let (notifier, mut toasts) = notify::channel();
    let session = AuthSession::new(client, store, notifier)
        .with_retry_on_unauthorized(config.retry_on_unauthorized);

    let status = session.restore().await;
    tracing::debug!(%status, api_url = %config.api_url, "session ready");

    let ctx = Context::new(session);
    let result = match cli.command {
        Command::Auth(action) => invoice_desk::commands::auth_cmd::run(action, &ctx).await,
        Command::Invoices { action } => {
            invoice_desk::commands::invoice_cmd::run(action, &ctx).await
        }
        Command::Transactions { action } => {
            invoice_desk::commands::transaction_cmd::run(action, &ctx).await
        }
    };

    let reported = print_toasts(&mut toasts);
    match result {
        Ok(()) => Ok(()),
        // The failure already reached the user as a toast.
        Err(_) if reported => std::process::exit(1),
        Err(err) => Err(err),
    }
}

/// Prints queued toasts to stderr; true if any of them was an error.
fn print_toasts(toasts: &mut Toasts) -> bool {
    let mut had_error = false;
    for toast in toasts.drain() {
        had_error |= toast.is_error();
        eprintln!("{}: {}", toast.title, toast.description);
    }
    had_error
}
