//! # Validation Module
//!
//! Business rules checked before anything reaches storage.
//!
//! ## Where Validation Sits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/sales                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  serde (shape: types, required keys)                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_proposal ← THIS MODULE                                        │
//! │  ├── items non-empty, at most MAX_SALE_ITEMS                            │
//! │  ├── customer id non-blank                                              │
//! │  └── each line: product id, 1 ≤ qty ≤ 999, price ≥ 0                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  compute_total + check_declared_total                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  InventoryLedger::decrement_batch (first storage touch)                 │
//! │                                                                         │
//! │  SQLite CHECK constraints still backstop quantity and price.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shelf_core::validation::{validate_proposal, validate_sku};
//! use shelf_core::{ProposedLine, SaleProposal};
//!
//! validate_sku("MILK-1L").unwrap();
//!
//! let empty = SaleProposal::new("cust-1", vec![]);
//! assert!(validate_proposal(&empty).is_err());
//!
//! let ok = SaleProposal::new("cust-1", vec![ProposedLine::new("p1", 2)]);
//! assert!(validate_proposal(&ok).is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CustomerDraft, ProductDraft, SaleLine, SaleProposal};
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS, MAX_SALE_ITEMS, MAX_STOCK_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn required(field: &str) -> ValidationError {
    ValidationError::Required {
        field: field.to_string(),
    }
}

fn too_long(field: &str, max: usize) -> ValidationError {
    ValidationError::TooLong {
        field: field.to_string(),
        max,
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU.
///
/// ## Rules
/// - Not blank, at most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ```rust
/// use shelf_core::validation::validate_sku;
///
/// assert!(validate_sku("PEN-BLUE").is_ok());
/// assert!(validate_sku("pen blue").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(required("sku"));
    }

    if sku.chars().count() > 50 {
        return Err(too_long("sku", 50));
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name: not blank, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(required("name"));
    }

    if name.chars().count() > 200 {
        return Err(too_long("name", 200));
    }

    Ok(())
}

pub fn validate_category(category: &str) -> ValidationResult<()> {
    let category = category.trim();

    if category.is_empty() {
        return Err(required("category"));
    }

    if category.chars().count() > 100 {
        return Err(too_long("category", 100));
    }

    Ok(())
}

/// Validates the customer reference on a sale.
///
/// Only presence is checked. Whether the customer exists is
/// not verified when a sale is recorded.
pub fn validate_customer_id(customer_id: &str) -> ValidationResult<()> {
    let customer_id = customer_id.trim();

    if customer_id.is_empty() {
        return Err(required("customer"));
    }

    if customer_id.chars().count() > 100 {
        return Err(too_long("customer", 100));
    }

    Ok(())
}

/// Validates an optional email address (loose `local@domain` check).
pub fn validate_email(email: Option<&str>) -> ValidationResult<()> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(());
    };

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates the quantity of one sale line.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ```rust
/// use shelf_core::validation::validate_quantity;
///
/// assert!(validate_quantity(3).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(1000).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a quantity-on-hand entered through the catalog. Zero is fine.
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_STOCK_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in minor units. Zero is allowed (free items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

// =============================================================================
// Sale Proposals
// =============================================================================

/// Validates the structure of a sale proposal.
///
/// Does not look at stock or at the catalog; that is the ledger's job.
pub fn validate_proposal(proposal: &SaleProposal) -> ValidationResult<()> {
    validate_customer_id(&proposal.customer_id)?;

    if proposal.items.is_empty() {
        return Err(required("items"));
    }

    if proposal.items.len() > MAX_SALE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_ITEMS as i64,
        });
    }

    for line in &proposal.items {
        if line.product_id.trim().is_empty() {
            return Err(required("product"));
        }
        validate_quantity(line.quantity)?;
        if let Some(price) = line.unit_price_cents {
            validate_price_cents(price)?;
        }
    }

    Ok(())
}

/// Σ quantity × unit price over priced lines, rejecting overflow.
///
/// ```rust
/// use shelf_core::validation::compute_total;
/// use shelf_core::SaleLine;
///
/// let lines = vec![
///     SaleLine { product_id: "a".into(), quantity: 2, unit_price_cents: 2500 },
///     SaleLine { product_id: "b".into(), quantity: 1, unit_price_cents: 3500 },
/// ];
/// assert_eq!(compute_total(&lines).unwrap().cents(), 8500);
/// ```
pub fn compute_total(lines: &[SaleLine]) -> ValidationResult<Money> {
    lines.iter().try_fold(Money::zero(), |acc, line| {
        line.line_total()
            .and_then(|line_total| acc.checked_add(line_total))
            .ok_or(ValidationError::TotalOverflow)
    })
}

/// A declared total, if present, must equal the computed one exactly.
pub fn check_declared_total(declared: Option<i64>, computed: Money) -> ValidationResult<()> {
    match declared {
        Some(cents) if cents != computed.cents() => Err(ValidationError::TotalMismatch {
            declared: Money::from_cents(cents),
            computed,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Catalog Drafts
// =============================================================================

pub fn validate_product_draft(draft: &ProductDraft) -> ValidationResult<()> {
    validate_product_name(&draft.name)?;
    validate_category(&draft.category)?;
    validate_sku(&draft.sku)?;
    validate_stock_quantity(draft.quantity)?;
    validate_price_cents(draft.price_cents)?;

    if draft.description.chars().count() > 2000 {
        return Err(too_long("description", 2000));
    }

    Ok(())
}

pub fn validate_customer_draft(draft: &CustomerDraft) -> ValidationResult<()> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(required("name"));
    }
    if name.chars().count() > 200 {
        return Err(too_long("name", 200));
    }

    validate_email(draft.email.as_deref())
}

/// SKUs are fixed once assigned.
pub fn ensure_sku_unchanged(current: &str, proposed: &str) -> ValidationResult<()> {
    if current.trim() != proposed.trim() {
        return Err(ValidationError::Immutable {
            field: "sku".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProposedLine;

    fn line(qty: i64, price: i64) -> SaleLine {
        SaleLine {
            product_id: "p".to_string(),
            quantity: qty,
            unit_price_cents: price,
        }
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("PEN-BLUE").is_ok());
        assert!(validate_sku("milk_1l").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_quantity_bounds() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());

        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_quantity(-3).is_err());
        assert!(matches!(
            validate_quantity(MAX_ITEM_QUANTITY + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_proposal_rejects_empty_items() {
        let proposal = SaleProposal::new("cust-1", vec![]);
        assert!(matches!(
            validate_proposal(&proposal),
            Err(ValidationError::Required { ref field }) if field == "items"
        ));
    }

    #[test]
    fn test_proposal_rejects_blank_customer() {
        let proposal = SaleProposal::new("  ", vec![ProposedLine::new("p1", 1)]);
        assert!(matches!(
            validate_proposal(&proposal),
            Err(ValidationError::Required { ref field }) if field == "customer"
        ));
    }

    #[test]
    fn test_proposal_rejects_bad_lines() {
        let zero_qty = SaleProposal::new("c", vec![ProposedLine::new("p1", 0)]);
        assert!(validate_proposal(&zero_qty).is_err());

        let negative_price = SaleProposal::new("c", vec![ProposedLine::new("p1", 1).with_price(-1)]);
        assert!(validate_proposal(&negative_price).is_err());

        let blank_product = SaleProposal::new("c", vec![ProposedLine::new("", 1)]);
        assert!(validate_proposal(&blank_product).is_err());
    }

    #[test]
    fn test_proposal_rejects_too_many_lines() {
        let items = (0..=MAX_SALE_ITEMS)
            .map(|i| ProposedLine::new(format!("p{}", i), 1))
            .collect();
        let proposal = SaleProposal::new("c", items);
        assert!(matches!(
            validate_proposal(&proposal),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_compute_total() {
        assert_eq!(compute_total(&[]).unwrap(), Money::zero());
        assert_eq!(
            compute_total(&[line(3, 2500), line(1, 3500)]).unwrap().cents(),
            11000
        );
        assert!(matches!(
            compute_total(&[line(2, i64::MAX)]),
            Err(ValidationError::TotalOverflow)
        ));
        assert!(matches!(
            compute_total(&[line(1, i64::MAX), line(1, 1)]),
            Err(ValidationError::TotalOverflow)
        ));
    }

    #[test]
    fn test_check_declared_total() {
        let computed = Money::from_cents(7500);
        assert!(check_declared_total(None, computed).is_ok());
        assert!(check_declared_total(Some(7500), computed).is_ok());
        assert!(matches!(
            check_declared_total(Some(7000), computed),
            Err(ValidationError::TotalMismatch { .. })
        ));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email(None).is_ok());
        assert!(validate_email(Some("")).is_ok());
        assert!(validate_email(Some("asha@example.com")).is_ok());
        assert!(validate_email(Some("asha")).is_err());
        assert!(validate_email(Some("@example.com")).is_err());
    }

    #[test]
    fn test_product_draft() {
        let draft = ProductDraft {
            name: "Blue Pen".to_string(),
            category: "Stationery".to_string(),
            sku: "PEN-BLUE".to_string(),
            quantity: 0,
            price_cents: 2500,
            description: String::new(),
            expiry_date: None,
        };
        assert!(validate_product_draft(&draft).is_ok());

        let negative = ProductDraft {
            quantity: -1,
            ..draft.clone()
        };
        assert!(validate_product_draft(&negative).is_err());

        let no_category = ProductDraft {
            category: " ".to_string(),
            ..draft
        };
        assert!(validate_product_draft(&no_category).is_err());
    }

    #[test]
    fn test_product_draft_bounds_keep_valuation_exact() {
        let at_bound = ProductDraft {
            name: "Bulk Soil".to_string(),
            category: "Soil & Mixes".to_string(),
            sku: "SOIL-BULK".to_string(),
            quantity: MAX_STOCK_QUANTITY,
            price_cents: MAX_PRICE_CENTS,
            description: String::new(),
            expiry_date: None,
        };
        assert!(validate_product_draft(&at_bound).is_ok());
        assert!(MAX_STOCK_QUANTITY.checked_mul(MAX_PRICE_CENTS).is_some());

        let huge_stock = ProductDraft {
            quantity: 4_000_000_000_000,
            price_cents: 5_000_000_000,
            ..at_bound.clone()
        };
        assert!(matches!(
            validate_product_draft(&huge_stock),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "quantity"
        ));

        let huge_price = ProductDraft {
            price_cents: MAX_PRICE_CENTS + 1,
            ..at_bound
        };
        assert!(matches!(
            validate_product_draft(&huge_price),
            Err(ValidationError::OutOfRange { ref field, .. }) if field == "price"
        ));
    }

    #[test]
    fn test_sku_is_immutable() {
        assert!(ensure_sku_unchanged("PEN-BLUE", "PEN-BLUE").is_ok());
        assert!(matches!(
            ensure_sku_unchanged("PEN-BLUE", "PEN-RED"),
            Err(ValidationError::Immutable { .. })
        ));
    }
}
