//! Money and quantity arithmetic using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to `f64`
//! for storage/serialization. Money is rounded to 2 decimal places, stock
//! quantities to 3, both half away from zero.

use crate::core::{EngineError, EngineResult};
use crate::utils::validation::{MAX_PRICE, require_finite};
use rust_decimal::prelude::*;
use shared::ErrorCode;
use shared::models::OrderTotals;

/// Rounding for monetary values (2 decimal places, half-up)
const MONEY_DECIMAL_PLACES: u32 = 2;

/// Rounding for stock quantities (grams / millilitres / pieces to 0.001)
const QUANTITY_DECIMAL_PLACES: u32 = 3;

const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(
            value = ?value,
            "Non-finite f64 in monetary calculation, defaulting to zero"
        );
        Decimal::ZERO
    })
}

/// Round a Decimal to money precision
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DECIMAL_PLACES, ROUNDING)
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    round_money(value).to_f64().unwrap_or_default()
}

/// Stored quantity (f64) as an exact 3dp Decimal
#[inline]
pub fn to_quantity(value: f64) -> Decimal {
    round_quantity(to_decimal(value))
}

#[inline]
pub fn round_quantity(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(QUANTITY_DECIMAL_PLACES, ROUNDING)
}

/// Convert a quantity back to f64 for storage, rounded to 3 decimal places
#[inline]
pub fn quantity_to_f64(value: Decimal) -> f64 {
    round_quantity(value).to_f64().unwrap_or_default()
}

/// Service charge and tax rates
///
/// Rates are fractions (`0.10` = 10%). Tax is charged on subtotal plus
/// service charge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateConfig {
    service_charge_rate: Decimal,
    tax_rate: Decimal,
}

impl RateConfig {
    pub fn new(service_charge_rate: Decimal, tax_rate: Decimal) -> EngineResult<Self> {
        for (name, rate) in [("service charge", service_charge_rate), ("tax", tax_rate)] {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(EngineError::Config(format!(
                    "{name} rate must be within 0..=1, got {rate}"
                )));
            }
        }
        Ok(Self {
            service_charge_rate,
            tax_rate,
        })
    }

    pub fn service_charge_rate(&self) -> Decimal {
        self.service_charge_rate
    }

    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }
}

impl Default for RateConfig {
    /// 10% service charge, 12% VAT
    fn default() -> Self {
        Self {
            service_charge_rate: Decimal::new(10, 2),
            tax_rate: Decimal::new(12, 2),
        }
    }
}

/// Exact order financials, before conversion to storage floats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinancialBreakdown {
    pub items_subtotal: Decimal,
    pub service_charge: Decimal,
    pub tax: Decimal,
    pub grand_total: Decimal,
}

impl FinancialBreakdown {
    pub fn to_totals(&self) -> OrderTotals {
        OrderTotals {
            items_subtotal: to_f64(self.items_subtotal),
            service_charge: to_f64(self.service_charge),
            tax: to_f64(self.tax),
            grand_total: to_f64(self.grand_total),
        }
    }
}

/// Pure, deterministic order financials
#[derive(Debug, Clone, Copy, Default)]
pub struct FinancialCalculator {
    rates: RateConfig,
}

impl FinancialCalculator {
    pub fn new(rates: RateConfig) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &RateConfig {
        &self.rates
    }

    /// `unit_price × quantity`, rounded to money precision
    pub fn line_subtotal(&self, unit_price: f64, quantity: i32) -> EngineResult<Decimal> {
        require_finite(unit_price, "price", ErrorCode::ProductInvalidPrice)?;
        if unit_price < 0.0 || unit_price > MAX_PRICE {
            return Err(EngineError::validation(
                ErrorCode::ProductInvalidPrice,
                format!("price must be within 0..={MAX_PRICE}, got {unit_price}"),
            ));
        }
        Ok(round_money(to_decimal(unit_price) * Decimal::from(quantity)))
    }

    /// Service charge, tax and grand total from the items subtotal.
    ///
    /// `service_charge = round2(subtotal × service_rate)`,
    /// `tax = round2((subtotal + service_charge) × tax_rate)`, and the grand
    /// total is their exact sum.
    pub fn compute(&self, items_subtotal: Decimal) -> FinancialBreakdown {
        let items_subtotal = round_money(items_subtotal);
        let service_charge = round_money(items_subtotal * self.rates.service_charge_rate);
        let tax = round_money((items_subtotal + service_charge) * self.rates.tax_rate);
        FinancialBreakdown {
            items_subtotal,
            service_charge,
            tax,
            grand_total: items_subtotal + service_charge + tax,
        }
    }

    /// [`compute`](Self::compute) over a sequence of line subtotals
    pub fn compute_for_lines<I>(&self, line_subtotals: I) -> FinancialBreakdown
    where
        I: IntoIterator<Item = Decimal>,
    {
        self.compute(line_subtotals.into_iter().sum())
    }
}
