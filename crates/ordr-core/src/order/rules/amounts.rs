//! Quantity and price normalization.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{CURRENCY_MARKER, NUMBER_TOKEN, PER_UNIT, UNIT_WORDS};
use crate::models::Currency;

/// Decimal and thousands separator convention of a vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericLocale {
    /// `1,234.56`
    Us,
    /// `1.234,56`
    Eu,
}

/// What a raw amount string represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountKind {
    Quantity,
    /// Price of one unit; `per N` pack pricing is divided out.
    UnitPrice,
    TotalPrice,
}

/// Parsed amount plus the currency marker found next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedAmount {
    pub value: Decimal,
    pub currency: Option<Currency>,
}

impl NormalizedAmount {
    /// Price field as stored by the vendor systems, e.g. `€12.50`.
    pub fn formatted(&self) -> String {
        match self.currency {
            Some(currency) => format!("{}{}", currency.symbol(), self.value.normalize()),
            None => self.value.normalize().to_string(),
        }
    }
}

/// Parses amount strings under one vendor's locale.
#[derive(Debug, Clone, Copy)]
pub struct NumericNormalizer {
    locale: NumericLocale,
}

impl NumericNormalizer {
    pub fn new(locale: NumericLocale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> NumericLocale {
        self.locale
    }

    /// Parse `raw`; unparsable input yields `None`.
    ///
    /// ```
    /// use ordr_core::order::rules::{AmountKind, NumericLocale, NumericNormalizer};
    /// use rust_decimal::Decimal;
    ///
    /// let eu = NumericNormalizer::new(NumericLocale::Eu);
    /// let price = eu.normalize("1.234,56 EUR", AmountKind::TotalPrice).unwrap();
    /// assert_eq!(price.value, Decimal::new(123456, 2));
    /// ```
    pub fn normalize(&self, raw: &str, kind: AmountKind) -> Option<NormalizedAmount> {
        let currency = CURRENCY_MARKER
            .find(raw)
            .and_then(|m| Currency::from_marker(m.as_str()));
        let mut cleaned = CURRENCY_MARKER.replace_all(raw, " ").into_owned();

        let mut divisor = None;
        if kind == AmountKind::UnitPrice {
            if let Some(caps) = PER_UNIT.captures(&cleaned) {
                divisor = Some(parse_locale_number(&caps[1], self.locale)?);
            }
        }
        cleaned = PER_UNIT.replace_all(&cleaned, " ").into_owned();
        cleaned = UNIT_WORDS.replace_all(&cleaned, " ").into_owned();

        let token = NUMBER_TOKEN.find(&cleaned)?;
        let mut value = parse_locale_number(token.as_str(), self.locale)?;

        if let Some(divisor) = divisor {
            if divisor.is_zero() {
                return None;
            }
            value = value.checked_div(divisor)?;
        }

        Some(NormalizedAmount { value, currency })
    }

    /// Value only.
    pub fn value(&self, raw: &str, kind: AmountKind) -> Option<Decimal> {
        self.normalize(raw, kind).map(|a| a.value)
    }
}

/// Parse one numeric token under a locale (no currency, no units).
pub fn parse_locale_number(token: &str, locale: NumericLocale) -> Option<Decimal> {
    let token = token.trim().trim_end_matches(['.', ',']);
    if token.is_empty() {
        return None;
    }
    let normalized = match locale {
        NumericLocale::Us => token.replace(',', ""),
        NumericLocale::Eu => token.replace('.', "").replace(',', "."),
    };
    Decimal::from_str(&normalized).ok()
}
