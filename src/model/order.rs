use crate::error::LinkError;
use crate::model::LineId;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format of the `OrderDate` tag when the date comes from a timestamp.
pub const ORDER_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Whole number of units to produce.
///
/// Controllers hold the quantity as an Int32, so the value must fit in
/// `0..=i32::MAX`. Fractional input is truncated toward zero, never rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quantity(i32);

impl Quantity {
    pub fn new(units: i32) -> Result<Self, LinkError> {
        if units < 0 {
            return Err(LinkError::InvalidQuantity(units.to_string()));
        }
        Ok(Self(units))
    }

    /// Builds a quantity from a possibly fractional amount (`7.9` gives `7`).
    pub fn from_f64(amount: f64) -> Result<Self, LinkError> {
        if !amount.is_finite() || amount < 0.0 || amount.trunc() > f64::from(i32::MAX) {
            return Err(LinkError::InvalidQuantity(amount.to_string()));
        }
        // Truncation is exact here: the value is finite and within i32.
        Ok(Self(amount.trunc() as i32))
    }

    pub fn units(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content of the `OrderDate` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDate {
    /// Formatted with [`ORDER_DATE_FORMAT`] at write time.
    Timestamp(NaiveDateTime),
    /// Written verbatim, as typed by the operator.
    Text(String),
}

impl OrderDate {
    pub fn now() -> Self {
        OrderDate::Timestamp(Local::now().naive_local())
    }

    pub fn render(&self) -> String {
        match self {
            OrderDate::Timestamp(ts) => ts.format(ORDER_DATE_FORMAT).to_string(),
            OrderDate::Text(text) => text.clone(),
        }
    }
}

/// Everything written to a controller to start a manufacturing order.
///
/// Built fresh for each dispatch attempt and consumed by it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderStartRequest {
    pub line: LineId,
    pub order_number: String,
    pub article_code: String,
    pub quantity: Quantity,
    pub date: OrderDate,
}

impl OrderStartRequest {
    /// Creates a request stamped with the current local time.
    pub fn new(
        line: LineId,
        order_number: impl Into<String>,
        article_code: impl Into<String>,
        quantity: Quantity,
    ) -> Self {
        Self {
            line,
            order_number: order_number.into(),
            article_code: article_code.into(),
            quantity,
            date: OrderDate::now(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.date = OrderDate::Timestamp(timestamp);
        self
    }

    pub fn with_date_text(mut self, text: impl Into<String>) -> Self {
        self.date = OrderDate::Text(text.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_fractional_quantity_truncates() {
        assert_eq!(Quantity::from_f64(7.9).unwrap().units(), 7);
        assert_eq!(Quantity::from_f64(0.99).unwrap().units(), 0);
        assert_eq!(Quantity::from_f64(12.0).unwrap().units(), 12);
    }

    #[test]
    fn test_invalid_quantities_are_rejected() {
        assert!(Quantity::from_f64(-1.0).is_err());
        assert!(Quantity::from_f64(f64::NAN).is_err());
        assert!(Quantity::from_f64(f64::INFINITY).is_err());
        assert!(Quantity::from_f64(3.0e10).is_err());
        assert!(Quantity::new(-3).is_err());
    }

    #[test]
    fn test_timestamp_rendering() {
        let ts = NaiveDate::from_ymd_opt(2025, 4, 29)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        let request = OrderStartRequest::new(LineId::Lgn02, "WH/MO/00012", "Code", Quantity::new(1).unwrap())
            .with_timestamp(ts);
        assert_eq!(request.date.render(), "2025-04-29T13:00:00");
    }

    #[test]
    fn test_date_text_is_verbatim() {
        let request = OrderStartRequest::new(LineId::Lgn01, "MO-1", "A", Quantity::new(1).unwrap())
            .with_date_text("29/04/2025");
        assert_eq!(request.date.render(), "29/04/2025");
    }
}
