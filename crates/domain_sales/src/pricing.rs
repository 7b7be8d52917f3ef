//! Monetary line computation
//!
//! Turns a set of line items into per-line amounts and document totals.
//! Orders and invoices both price their lines here, so the two can never
//! disagree about how a total is derived.
//!
//! # Rounding
//!
//! Each line's net (`quantity × unit_price`) and tax (`net × tax_rate`) are
//! computed exactly. Document totals are the exact sums rounded once, half
//! away from zero, to the currency's minor unit:
//!
//! ```text
//! subtotal  = round(Σ net)
//! tax_total = round(Σ tax)
//! total     = subtotal + tax_total
//! line_total (per line) = round(net + tax)
//! ```
//!
//! `total == subtotal + tax_total` therefore holds exactly. Per-line totals are
//! informational and may differ from the document total by rounding.
//!
//! # Input precision
//!
//! Quantities and unit prices carry at most two fractional digits and tax
//! rates at most four, matching the stored column scales. More precise input
//! is rejected rather than silently rounded, as are figures too large for
//! those columns. Arithmetic is checked; an overflow is a validation error.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money, MoneyError, ProductId, TaxRate};
use domain_catalog::ProductPort;

use crate::error::SalesError;

const QUANTITY_SCALE: u32 = 2;
const PRICE_SCALE: u32 = 2;
/// Largest quantity or unit price a `NUMERIC(12,2)` column holds
const MAX_LINE_FIGURE: Decimal = dec!(9999999999.99);

/// A line item as supplied by a caller or copied from an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    pub product_id: Option<ProductId>,
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub tax_rate: TaxRate,
}

impl LineInput {
    pub fn new(
        product_id: ProductId,
        quantity: Decimal,
        unit_price: Decimal,
        tax_rate: TaxRate,
    ) -> Self {
        Self {
            product_id: Some(product_id),
            description: None,
            quantity,
            unit_price,
            tax_rate,
        }
    }

    /// A free-text line with no catalog product behind it
    pub fn described(
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
        tax_rate: TaxRate,
    ) -> Self {
        Self {
            product_id: None,
            description: Some(description.into()),
            quantity,
            unit_price,
            tax_rate,
        }
    }

    /// Checks quantity > 0, unit_price >= 0, tax_rate >= 0, input precision
    /// and the stored column ranges
    pub fn validate(&self) -> Result<(), SalesError> {
        if self.quantity <= Decimal::ZERO {
            return Err(SalesError::validation("quantity must be greater than zero"));
        }
        if self.unit_price < Decimal::ZERO {
            return Err(SalesError::validation("unit_price must be zero or greater"));
        }
        if self.tax_rate.is_negative() {
            return Err(SalesError::validation("tax_rate must be zero or greater"));
        }
        if self.quantity.normalize().scale() > QUANTITY_SCALE {
            return Err(SalesError::validation("quantity supports at most 2 decimal places"));
        }
        if self.unit_price.normalize().scale() > PRICE_SCALE {
            return Err(SalesError::validation("unit_price supports at most 2 decimal places"));
        }
        if self.tax_rate.exceeds_scale() {
            return Err(SalesError::validation("tax_rate supports at most 4 decimal places"));
        }
        if self.quantity > MAX_LINE_FIGURE {
            return Err(SalesError::validation(format!(
                "quantity must not exceed {MAX_LINE_FIGURE}"
            )));
        }
        if self.unit_price > MAX_LINE_FIGURE {
            return Err(SalesError::validation(format!(
                "unit_price must not exceed {MAX_LINE_FIGURE}"
            )));
        }
        if self.tax_rate.exceeds_max() {
            return Err(SalesError::validation(format!(
                "tax_rate must not exceed {}",
                TaxRate::MAX
            )));
        }
        Ok(())
    }

    /// Exact `quantity × unit_price`
    pub fn net(&self) -> Result<Decimal, SalesError> {
        Ok(self
            .quantity
            .checked_mul(self.unit_price)
            .ok_or(MoneyError::Overflow)?)
    }

    /// Exact `net × tax_rate`
    pub fn tax(&self) -> Result<Decimal, SalesError> {
        Ok(self.tax_rate.tax_on(self.net()?)?)
    }
}

/// One line after pricing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedLine {
    pub input: LineInput,
    /// Exact, unrounded
    pub net: Decimal,
    /// Exact, unrounded
    pub tax: Decimal,
    pub line_total: Money,
}

/// Document-level totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineTotals {
    pub subtotal: Money,
    pub tax_total: Money,
    pub total: Money,
}

impl LineTotals {
    pub fn zero(currency: Currency) -> Self {
        Self {
            subtotal: Money::zero(currency),
            tax_total: Money::zero(currency),
            total: Money::zero(currency),
        }
    }

    /// Replaces the computed tax with a caller-supplied figure
    ///
    /// The subtotal stays computed and `total` becomes `subtotal + tax`.
    pub fn with_tax_override(self, tax_total: Decimal) -> Result<Self, SalesError> {
        let currency = self.subtotal.currency();
        if tax_total < Decimal::ZERO {
            return Err(SalesError::validation("tax_total must be zero or greater"));
        }
        if tax_total.normalize().scale() > currency.decimal_places() {
            return Err(SalesError::validation(format!(
                "tax_total supports at most {} decimal places in {}",
                currency.decimal_places(),
                currency
            )));
        }
        let tax_total = Money::rounded(tax_total, currency);
        Ok(Self {
            subtotal: self.subtotal,
            tax_total,
            total: self.subtotal.checked_add(&tax_total)?,
        })
    }
}

/// Priced lines together with their totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedLines {
    pub lines: Vec<PricedLine>,
    pub totals: LineTotals,
}

/// Validates and prices `lines` in `currency`
///
/// Every line is validated before anything is computed; the first invalid
/// line fails the whole batch. An empty batch prices to zero totals.
pub fn compute(lines: Vec<LineInput>, currency: Currency) -> Result<PricedLines, SalesError> {
    validate_all(&lines)?;

    let mut net_sum = Decimal::ZERO;
    let mut tax_sum = Decimal::ZERO;
    let mut priced = Vec::with_capacity(lines.len());

    for input in lines {
        let net = input.net()?;
        let tax = input.tax()?;
        net_sum = checked_sum(net_sum, net)?;
        tax_sum = checked_sum(tax_sum, tax)?;
        priced.push(PricedLine {
            line_total: Money::rounded(checked_sum(net, tax)?, currency),
            net,
            tax,
            input,
        });
    }

    let subtotal = Money::rounded(net_sum, currency);
    let tax_total = Money::rounded(tax_sum, currency);
    let total = subtotal.checked_add(&tax_total)?;

    Ok(PricedLines {
        lines: priced,
        totals: LineTotals {
            subtotal,
            tax_total,
            total,
        },
    })
}

fn checked_sum(a: Decimal, b: Decimal) -> Result<Decimal, SalesError> {
    Ok(a.checked_add(b).ok_or(MoneyError::Overflow)?)
}

/// Checks that every referenced product exists
///
/// All references are checked; a single unknown id fails the batch.
pub async fn resolve_products(
    lines: &[LineInput],
    products: &dyn ProductPort,
) -> Result<(), SalesError> {
    for (index, line) in lines.iter().enumerate() {
        let Some(product_id) = line.product_id else {
            continue;
        };
        match products.get_product(product_id).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                return Err(SalesError::InvalidReference(format!(
                    "line {}: product {} does not exist",
                    index + 1,
                    product_id
                )));
            }
            Err(e) => return Err(SalesError::Port(e)),
        }
    }
    Ok(())
}

/// Validates, resolves product references, then computes
pub async fn price_lines(
    lines: Vec<LineInput>,
    currency: Currency,
    products: &dyn ProductPort,
) -> Result<PricedLines, SalesError> {
    validate_all(&lines)?;
    resolve_products(&lines, products).await?;
    compute(lines, currency)
}

/// Validates every line, reporting the first failure with its 1-based position
pub fn validate_all(lines: &[LineInput]) -> Result<(), SalesError> {
    for (index, line) in lines.iter().enumerate() {
        line.validate()
            .map_err(|e| SalesError::validation(format!("line {}: {}", index + 1, strip(e))))?;
    }
    Ok(())
}

fn strip(error: SalesError) -> String {
    match error {
        SalesError::Validation(message) => message,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::ErrorKind;

    fn line(quantity: Decimal, unit_price: Decimal, tax_rate: Decimal) -> LineInput {
        LineInput::new(ProductId::new(), quantity, unit_price, TaxRate::new(tax_rate))
    }

    #[test]
    fn test_worked_example() {
        let priced = compute(
            vec![
                line(dec!(2), dec!(10.00), dec!(0.10)),
                line(dec!(1), dec!(50.00), dec!(0)),
            ],
            Currency::USD,
        )
        .unwrap();

        assert_eq!(priced.totals.subtotal.amount(), dec!(70.00));
        assert_eq!(priced.totals.tax_total.amount(), dec!(2.00));
        assert_eq!(priced.totals.total.amount(), dec!(72.00));
        assert_eq!(priced.lines[0].line_total.amount(), dec!(22.00));
        assert_eq!(priced.lines[1].line_total.amount(), dec!(50.00));
    }

    #[test]
    fn test_empty_lines_price_to_zero() {
        let priced = compute(vec![], Currency::EUR).unwrap();
        assert_eq!(priced.totals, LineTotals::zero(Currency::EUR));
        assert!(priced.lines.is_empty());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let err = compute(vec![line(dec!(0), dec!(1), dec!(0))], Currency::USD).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_negative_price_and_rate_rejected() {
        assert!(compute(vec![line(dec!(1), dec!(-1), dec!(0))], Currency::USD).is_err());
        assert!(compute(vec![line(dec!(1), dec!(1), dec!(-0.01))], Currency::USD).is_err());
    }

    #[test]
    fn test_second_line_reported() {
        let err = compute(
            vec![line(dec!(1), dec!(1), dec!(0)), line(dec!(-3), dec!(1), dec!(0))],
            Currency::USD,
        )
        .unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_zero_price_allowed() {
        let priced = compute(vec![line(dec!(3), dec!(0), dec!(0.2))], Currency::USD).unwrap();
        assert!(priced.totals.total.is_zero());
    }

    #[test]
    fn test_over_precise_input_rejected() {
        assert!(compute(vec![line(dec!(1.005), dec!(1), dec!(0))], Currency::USD).is_err());
        assert!(compute(vec![line(dec!(1), dec!(1.005), dec!(0))], Currency::USD).is_err());
        assert!(compute(vec![line(dec!(1), dec!(1), dec!(0.00001))], Currency::USD).is_err());
    }

    #[test]
    fn test_figures_beyond_column_range_rejected() {
        let huge = dec!(100000000000000000000);
        let err = compute(vec![line(huge, huge, dec!(0))], Currency::USD).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("quantity must not exceed"));

        assert!(compute(vec![line(dec!(1), dec!(10000000000), dec!(0))], Currency::USD).is_err());
        assert!(compute(vec![line(dec!(1), dec!(1), dec!(100000))], Currency::USD).is_err());
        let widest = line(dec!(9999999999.99), dec!(9999999999.99), dec!(0));
        assert!(compute(vec![widest], Currency::USD).is_ok());
    }

    #[test]
    fn test_arithmetic_overflow_is_validation_error() {
        let unchecked = line(Decimal::MAX, dec!(2), dec!(0));
        assert_eq!(unchecked.net().unwrap_err().kind(), ErrorKind::Validation);

        // each line is in range; the document sum is not
        let widest = line(dec!(9999999999.99), dec!(9999999999.99), dec!(99999.9999));
        let err = compute(vec![widest; 9000], Currency::USD).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_totals_round_once_not_per_line() {
        // three lines of 0.333.. tax each: per-line rounding would give 0.99
        let lines = vec![
            line(dec!(1), dec!(3.33), dec!(0.1001)),
            line(dec!(1), dec!(3.33), dec!(0.1001)),
            line(dec!(1), dec!(3.33), dec!(0.1001)),
        ];
        let priced = compute(lines, Currency::USD).unwrap();
        // Σ tax = 3 × 0.333333 = 0.999999
        assert_eq!(priced.totals.tax_total.amount(), dec!(1.00));
        assert_eq!(priced.totals.subtotal.amount(), dec!(9.99));
        assert_eq!(priced.totals.total.amount(), dec!(10.99));
    }

    #[test]
    fn test_tax_override() {
        let priced = compute(vec![line(dec!(2), dec!(10.00), dec!(0.10))], Currency::USD).unwrap();
        let totals = priced.totals.with_tax_override(dec!(5.00)).unwrap();
        assert_eq!(totals.subtotal.amount(), dec!(20.00));
        assert_eq!(totals.tax_total.amount(), dec!(5.00));
        assert_eq!(totals.total.amount(), dec!(25.00));

        assert!(priced.totals.with_tax_override(dec!(-1)).is_err());
        assert!(priced.totals.with_tax_override(dec!(0.001)).is_err());
    }
}
