//! Invoice subcommands.

use std::io::{self, Write};

use crate::{
    commands::Context,
    models::Invoice,
    views::{
        DeleteInvoiceDialog, DeleteOutcome, InvoiceDetail, InvoiceList, ItemInput, LineItems,
        format::{format_currency, format_date, format_datetime},
    },
};

#[derive(clap::Subcommand, Debug)]
pub enum InvoiceAction {
    /// List all invoices.
    List,
    /// Show one invoice with its line items.
    Show { id: i64 },
    /// Show the sale/payment history of an invoice.
    History { id: i64 },
    /// Create an invoice. The reference gets the "{username}INV-" prefix.
    Create {
        #[arg(short, long)]
        reference: String,
        #[arg(short, long)]
        customer: String,
        #[arg(short, long)]
        email: String,
        /// Line item as DESCRIPTION:QUANTITY:UNIT_PRICE; repeatable.
        #[arg(short, long = "item", value_parser = parse_item, required = true)]
        items: Vec<ItemInput>,
    },
    /// Replace fields of an invoice; omitted fields keep their value.
    Edit {
        id: i64,
        /// Number part of the reference, without the user prefix.
        #[arg(short, long)]
        reference: Option<String>,
        #[arg(short, long)]
        customer: Option<String>,
        #[arg(short, long)]
        email: Option<String>,
        /// Replaces all line items when given.
        #[arg(short, long = "item", value_parser = parse_item)]
        items: Vec<ItemInput>,
    },
    /// Delete an invoice.
    Delete {
        id: i64,
        /// Confirm the deletion.
        #[arg(short, long)]
        yes: bool,
    },
    /// Mark a pending invoice as paid.
    Pay { id: i64 },
    /// Move a paid invoice back to pending.
    Pending { id: i64 },
}

/// `DESCRIPTION:QUANTITY:UNIT_PRICE`; the description may itself contain `:`.
/// Quantity and price are kept as typed and validated by the form.
pub fn parse_item(raw: &str) -> Result<ItemInput, String> {
    let mut parts = raw.rsplitn(3, ':');
    let (Some(price), Some(quantity), Some(description)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(format!(
            "expected DESCRIPTION:QUANTITY:UNIT_PRICE, got {raw:?}"
        ));
    };
    Ok(ItemInput::new(description, quantity, price))
}

pub async fn run(action: InvoiceAction, ctx: &Context) -> anyhow::Result<()> {
    match action {
        InvoiceAction::List => list(ctx).await,
        InvoiceAction::Show { id } => show(ctx, id).await,
        InvoiceAction::History { id } => history(ctx, id).await,
        InvoiceAction::Create {
            reference,
            customer,
            email,
            items,
        } => create(ctx, reference, customer, email, items).await,
        InvoiceAction::Edit {
            id,
            reference,
            customer,
            email,
            items,
        } => edit(ctx, id, reference, customer, email, items).await,
        InvoiceAction::Delete { id, yes } => delete(ctx, id, yes).await,
        InvoiceAction::Pay { id } => set_status(ctx, id, true).await,
        InvoiceAction::Pending { id } => set_status(ctx, id, false).await,
    }
}

async fn load_list(ctx: &Context) -> anyhow::Result<InvoiceList> {
    let mut list = InvoiceList::new(ctx.cache(), ctx.notifier.clone(), ctx.username().await);
    list.load().await?;
    Ok(list)
}

async fn list(ctx: &Context) -> anyhow::Result<()> {
    let list = load_list(ctx).await?;
    let mut out = io::stdout();
    let rows = list.rows();
    if rows.is_empty() {
        writeln!(out, "No invoices")?;
        return Ok(());
    }
    writeln!(
        out,
        "{:>5}  {:<24} {:<24} {:>14}  {:<10} {:<13} {:>5}",
        "ID", "REFERENCE", "CUSTOMER", "TOTAL", "STATUS", "CREATED", "ITEMS"
    )?;
    for row in rows {
        writeln!(
            out,
            "{:>5}  {:<24} {:<24} {:>14}  {:<10} {:<13} {:>5}",
            row.id,
            row.reference_number,
            row.customer_name,
            row.total,
            row.status,
            row.created,
            row.item_count
        )?;
    }
    Ok(())
}

async fn show(ctx: &Context, id: i64) -> anyhow::Result<()> {
    let invoice = ctx.api().get_invoice(id).await?;
    print_invoice(&invoice)
}

async fn history(ctx: &Context, id: i64) -> anyhow::Result<()> {
    let invoice = ctx.api().get_invoice(id).await?;
    let detail = InvoiceDetail::new(
        ctx.cache(),
        ctx.notifier.clone(),
        invoice,
        ctx.username().await,
    );
    let mut out = io::stdout();
    for entry in detail.transaction_history() {
        writeln!(
            out,
            "{:<8} {:>14}  {:<10} {:<24} {}",
            entry.transaction_type.label(),
            format_currency(entry.amount),
            entry.status,
            format_datetime(&entry.transaction_date),
            entry.description
        )?;
    }
    Ok(())
}

async fn create(
    ctx: &Context,
    reference: String,
    customer: String,
    email: String,
    items: Vec<ItemInput>,
) -> anyhow::Result<()> {
    let mut list = InvoiceList::new(ctx.cache(), ctx.notifier.clone(), ctx.username().await);
    let form = list.open_create();
    form.fields.reference_number = reference;
    form.fields.customer_name = customer;
    form.fields.customer_email = email;
    form.items = LineItems::from_inputs(items);
    tracing::debug!(subtotal = %form.subtotal_display(), "submitting invoice");

    let created = form.submit().await?;
    let mut out = io::stdout();
    writeln!(
        out,
        "Created invoice {} ({}) for {}",
        created.reference_number,
        created.id,
        format_currency(created.total_amount)
    )?;
    Ok(())
}

async fn edit(
    ctx: &Context,
    id: i64,
    reference: Option<String>,
    customer: Option<String>,
    email: Option<String>,
    items: Vec<ItemInput>,
) -> anyhow::Result<()> {
    let invoice = ctx.api().get_invoice(id).await?;
    let detail = InvoiceDetail::new(
        ctx.cache(),
        ctx.notifier.clone(),
        invoice,
        ctx.username().await,
    );
    let mut form = detail.open_edit();
    if let Some(reference) = reference {
        form.fields.reference_number = reference;
    }
    if let Some(customer) = customer {
        form.fields.customer_name = customer;
    }
    if let Some(email) = email {
        form.fields.customer_email = email;
    }
    if !items.is_empty() {
        form.items = LineItems::from_inputs(items);
    }

    let updated = form.submit().await?;
    let mut out = io::stdout();
    writeln!(
        out,
        "Updated invoice {} ({}), total {}",
        updated.reference_number,
        updated.id,
        format_currency(updated.total_amount)
    )?;
    Ok(())
}

async fn delete(ctx: &Context, id: i64, confirmed: bool) -> anyhow::Result<()> {
    let mut out = io::stdout();
    if !confirmed {
        writeln!(out, "Pass --yes to delete invoice {id}")?;
        return Ok(());
    }

    let mut list = load_list(ctx).await?;
    let invoice = list.invoices().iter().find(|inv| inv.id == id).cloned();
    if invoice.is_none() {
        anyhow::bail!("Invoice {id} not found");
    }
    let mut dialog = DeleteInvoiceDialog::new(list.cache().clone(), ctx.notifier.clone(), invoice);
    match dialog.delete().await? {
        DeleteOutcome::Deleted(id) => {
            list.on_deleted(id);
            list.sync().await;
            writeln!(out, "Deleted invoice {id}")?;
        }
        DeleteOutcome::Cancelled => writeln!(out, "Nothing deleted")?,
    }
    Ok(())
}

async fn set_status(ctx: &Context, id: i64, paid: bool) -> anyhow::Result<()> {
    let mut list = load_list(ctx).await?;
    let Some(detail) = list.open_detail(id) else {
        anyhow::bail!("Invoice {id} not found");
    };
    let updated = if paid {
        detail.mark_paid().await?
    } else {
        detail.mark_pending().await?
    };
    list.sync().await;

    let mut out = io::stdout();
    writeln!(
        out,
        "Invoice {} is now {}",
        updated.reference_number,
        updated.status.label()
    )?;
    Ok(())
}

fn print_invoice(invoice: &Invoice) -> anyhow::Result<()> {
    let mut out = io::stdout();
    writeln!(out, "Invoice {} ({})", invoice.reference_number, invoice.id)?;
    writeln!(
        out,
        "Customer: {} <{}>",
        invoice.customer_name, invoice.customer_email
    )?;
    writeln!(out, "Status:   {}", invoice.status.label())?;
    writeln!(out, "Created:  {}", format_date(&invoice.created_at))?;
    writeln!(out, "Updated:  {}", format_datetime(&invoice.updated_at))?;
    writeln!(out)?;
    for item in &invoice.items {
        writeln!(
            out,
            "  {:<32} {:>5} x {:>12} = {:>14}",
            item.description,
            item.quantity,
            format_currency(item.unit_price),
            format_currency(item.total_price)
        )?;
    }
    writeln!(out, "Total:    {}", format_currency(invoice.total_amount))?;
    Ok(())
}
