//! Form state shared by the create and edit invoice views.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::{
    dto::invoices::{CreateInvoiceRequest, InvoiceItemRequest},
    error::{AppError, AppResult, FieldErrors},
    models::InvoiceItem,
};

/// Used for the reference prefix when no user is known.
pub const FALLBACK_USERNAME: &str = "USER";

pub const REQUIRED_FIELDS_MESSAGE: &str = "Please fill in all required fields.";
pub const ITEM_DESCRIPTIONS_MESSAGE: &str = "Please fill in all item descriptions.";

/// `"{username}INV-"`
pub fn reference_prefix(username: Option<&str>) -> String {
    format!("{}INV-", username.unwrap_or(FALLBACK_USERNAME))
}

/// Number part of a reference, or the whole reference if it lacks the prefix.
pub fn strip_reference_prefix<'a>(reference: &'a str, username: Option<&str>) -> &'a str {
    reference
        .strip_prefix(reference_prefix(username).as_str())
        .unwrap_or(reference)
}

pub fn apply_reference_prefix(number: &str, username: Option<&str>) -> String {
    format!("{}{}", reference_prefix(username), number)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemField {
    Description,
    Quantity,
    UnitPrice,
}

/// One editable line; quantity and price stay as typed until submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemInput {
    pub id: Option<i64>,
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
}

impl ItemInput {
    pub fn blank() -> Self {
        Self {
            id: None,
            description: String::new(),
            quantity: "1".into(),
            unit_price: "0".into(),
        }
    }

    pub fn new(description: &str, quantity: &str, unit_price: &str) -> Self {
        Self {
            id: None,
            description: description.into(),
            quantity: quantity.into(),
            unit_price: unit_price.into(),
        }
    }

    pub fn from_item(item: &InvoiceItem) -> Self {
        Self {
            id: Some(item.id),
            description: item.description.clone(),
            quantity: item.quantity.to_string(),
            unit_price: item.unit_price.to_string(),
        }
    }

    /// Advisory line total; unparsable input counts as zero.
    pub fn line_total(&self) -> Decimal {
        lenient_decimal(&self.quantity) * lenient_decimal(&self.unit_price)
    }
}

fn lenient_decimal(raw: &str) -> Decimal {
    Decimal::from_str(raw.trim()).unwrap_or(Decimal::ZERO)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItems {
    items: Vec<ItemInput>,
}

impl Default for LineItems {
    fn default() -> Self {
        Self {
            items: vec![ItemInput::blank()],
        }
    }
}

impl LineItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_inputs(items: Vec<ItemInput>) -> Self {
        if items.is_empty() {
            return Self::default();
        }
        Self { items }
    }

    pub fn from_invoice_items(items: &[InvoiceItem]) -> Self {
        Self::from_inputs(items.iter().map(ItemInput::from_item).collect())
    }

    pub fn as_slice(&self) -> &[ItemInput] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn add(&mut self) {
        self.items.push(ItemInput::blank());
    }

    pub fn push(&mut self, item: ItemInput) {
        self.items.push(item);
    }

    /// Refuses to remove the last remaining line.
    pub fn remove(&mut self, index: usize) -> bool {
        if self.items.len() <= 1 || index >= self.items.len() {
            return false;
        }
        self.items.remove(index);
        true
    }

    pub fn update(&mut self, index: usize, field: ItemField, value: impl Into<String>) -> bool {
        let Some(item) = self.items.get_mut(index) else {
            return false;
        };
        let value = value.into();
        match field {
            ItemField::Description => item.description = value,
            ItemField::Quantity => item.quantity = value,
            ItemField::UnitPrice => item.unit_price = value,
        }
        true
    }

    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(ItemInput::line_total).sum()
    }

    fn to_requests(&self, errors: &mut FieldErrors) -> Vec<InvoiceItemRequest> {
        let mut out = Vec::with_capacity(self.items.len());
        for (i, item) in self.items.iter().enumerate() {
            let description = item.description.trim();
            if description.is_empty() {
                errors.add(format!("items[{i}].description"), ITEM_DESCRIPTIONS_MESSAGE);
            }

            let quantity_raw = item.quantity.trim();
            let quantity = if quantity_raw.is_empty() {
                Some(0)
            } else {
                quantity_raw.parse::<u32>().ok()
            };
            if quantity.is_none() {
                errors.add(
                    format!("items[{i}].quantity"),
                    "Quantity must be a whole number of 0 or more",
                );
            }

            let unit_price = Decimal::from_str(item.unit_price.trim()).ok();
            if unit_price.is_none() {
                errors.add(format!("items[{i}].unit_price"), "Unit price must be a number");
            }

            if let (Some(quantity), Some(unit_price)) = (quantity, unit_price) {
                out.push(InvoiceItemRequest {
                    description: description.to_string(),
                    quantity,
                    unit_price,
                });
            }
        }
        out
    }
}

/// Header fields of an invoice form, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceFields {
    pub reference_number: String,
    pub customer_name: String,
    pub customer_email: String,
}

/// Validates the form and builds the request body. `reference_number` is
/// passed in already prefixed.
pub(crate) fn build_request(
    fields: &InvoiceFields,
    reference_number: String,
    items: &LineItems,
) -> AppResult<CreateInvoiceRequest> {
    let mut errors = FieldErrors::new();
    for (name, value) in [
        ("reference_number", &fields.reference_number),
        ("customer_name", &fields.customer_name),
        ("customer_email", &fields.customer_email),
    ] {
        if value.trim().is_empty() {
            errors.add(name, REQUIRED_FIELDS_MESSAGE);
        }
    }
    let items = items.to_requests(&mut errors);
    errors.into_result()?;

    Ok(CreateInvoiceRequest {
        reference_number,
        customer_name: fields.customer_name.trim().to_string(),
        customer_email: fields.customer_email.trim().to_string(),
        items,
    })
}

/// The single line shown to the user for a failed form validation.
pub fn validation_summary(err: &AppError) -> String {
    let AppError::Validation(errors) = err else {
        return err.to_string();
    };
    let messages: Vec<&str> = errors.iter().map(|(_, message)| message).collect();
    if messages.contains(&REQUIRED_FIELDS_MESSAGE) {
        REQUIRED_FIELDS_MESSAGE.to_string()
    } else if messages.contains(&ITEM_DESCRIPTIONS_MESSAGE) {
        ITEM_DESCRIPTIONS_MESSAGE.to_string()
    } else {
        errors.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_strips_only_at_start() {
        assert_eq!(strip_reference_prefix("aliceINV-0042", Some("alice")), "0042");
        assert_eq!(
            strip_reference_prefix("bobINV-0042", Some("alice")),
            "bobINV-0042"
        );
        assert_eq!(strip_reference_prefix("USERINV-7", None), "7");
        assert_eq!(apply_reference_prefix("0042", Some("alice")), "aliceINV-0042");
    }

    #[test]
    fn prefix_with_regex_metacharacters_is_literal() {
        assert_eq!(strip_reference_prefix("a.bINV-1", Some("a.b")), "1");
        assert_eq!(strip_reference_prefix("axbINV-1", Some("a.b")), "axbINV-1");
    }

    #[test]
    fn subtotal_counts_bad_input_as_zero() {
        let items = LineItems::from_inputs(vec![
            ItemInput::new("Widget", "2", "10.00"),
            ItemInput::new("Gadget", "x", "3.50"),
            ItemInput::new("Thing", "1", ""),
        ]);
        assert_eq!(format!("{:.2}", items.subtotal()), "20.00");
    }

    #[test]
    fn last_item_cannot_be_removed() {
        let mut items = LineItems::new();
        assert!(!items.remove(0));
        items.add();
        assert_eq!(items.as_slice()[1], ItemInput::blank());
        assert!(items.remove(0));
        assert_eq!(items.len(), 1);
        assert!(!items.remove(5));
    }

    #[test]
    fn invoice_without_items_loads_one_blank_line() {
        let items = LineItems::from_invoice_items(&[]);
        assert_eq!(items.as_slice(), &[ItemInput::blank()]);
    }

    #[test]
    fn missing_header_field_reports_required_message() {
        let fields = InvoiceFields {
            reference_number: "1".into(),
            customer_name: String::new(),
            customer_email: "a@b.co".into(),
        };
        let err = build_request(&fields, "aliceINV-1".into(), &LineItems::new()).unwrap_err();
        assert_eq!(validation_summary(&err), REQUIRED_FIELDS_MESSAGE);
    }

    #[test]
    fn blank_description_reports_item_message() {
        let fields = InvoiceFields {
            reference_number: "1".into(),
            customer_name: "Acme".into(),
            customer_email: "a@b.co".into(),
        };
        let err = build_request(&fields, "aliceINV-1".into(), &LineItems::new()).unwrap_err();
        assert_eq!(validation_summary(&err), ITEM_DESCRIPTIONS_MESSAGE);
    }

    #[test]
    fn fractional_quantity_is_rejected_per_item() {
        let fields = InvoiceFields {
            reference_number: "1".into(),
            customer_name: "Acme".into(),
            customer_email: "a@b.co".into(),
        };
        let items = LineItems::from_inputs(vec![ItemInput::new("Widget", "1.5", "2")]);
        let err = build_request(&fields, "aliceINV-1".into(), &items).unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.get("items[0].quantity").is_some());
    }

    #[test]
    fn valid_form_builds_request() {
        let fields = InvoiceFields {
            reference_number: "0042".into(),
            customer_name: " Acme ".into(),
            customer_email: "billing@acme.test".into(),
        };
        let items = LineItems::from_inputs(vec![ItemInput::new("Widget", "2", "10.00")]);
        let req = build_request(&fields, "aliceINV-0042".into(), &items).unwrap();
        assert_eq!(req.reference_number, "aliceINV-0042");
        assert_eq!(req.customer_name, "Acme");
        assert_eq!(req.items[0].quantity, 2);
        assert_eq!(req.items[0].unit_price.to_string(), "10.00");
    }
}
