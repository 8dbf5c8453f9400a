//! Transaction ledger subcommands.

use std::io::{self, Write};

use crate::{
    commands::Context,
    models::Transaction,
    views::format::{format_currency, format_datetime},
};

#[derive(clap::Subcommand, Debug)]
pub enum TransactionAction {
    /// List every transaction the backend recorded.
    List,
    /// Show one transaction.
    Show { id: i64 },
}

pub async fn run(action: TransactionAction, ctx: &Context) -> anyhow::Result<()> {
    let api = ctx.api();
    let mut out = io::stdout();
    match action {
        TransactionAction::List => {
            let transactions = api.list_transactions().await?;
            if transactions.is_empty() {
                writeln!(out, "No transactions")?;
            }
            for tx in &transactions {
                writeln!(out, "{}", line(tx))?;
            }
        }
        TransactionAction::Show { id } => {
            let tx = api.get_transaction(id).await?;
            writeln!(out, "{}", line(&tx))?;
        }
    }
    Ok(())
}

fn line(tx: &Transaction) -> String {
    let invoice = tx
        .invoice
        .map(|id| format!("invoice {id}"))
        .unwrap_or_else(|| "-".into());
    format!(
        "{:>5}  {:<8} {:>14}  {:<10} {:<24} {}",
        tx.id,
        tx.transaction_type.label(),
        format_currency(tx.amount),
        tx.status,
        format_datetime(&tx.transaction_date),
        invoice
    )
}
