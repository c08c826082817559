// src/common/money.rs
//
// Todo valor monetário armazenado ou comparado é `i64` em centavos.
// A conversão de reais (decimal) para centavos acontece uma única vez, na borda da API.

use std::str::FromStr;

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::common::error::AppError;

/// Converte um valor em reais para centavos, arredondando meio-centavo para longe do zero.
pub fn to_minor_units(amount_major: Decimal) -> Result<i64, AppError> {
    amount_major
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| AppError::invalid("amount", "out_of_range"))
}

/// Lê texto digitado pelo usuário: "150,50", "1.234,56", "R$ 10,00" ou "150.50".
pub fn parse_currency_text(text: &str) -> Result<Decimal, AppError> {
    let cleaned: String = text
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err(AppError::invalid("amount", "required"));
    }

    let normalized = match cleaned.matches(',').count() {
        // Formato brasileiro: ponto é milhar, vírgula é decimal
        1 => cleaned.replace('.', "").replace(',', "."),
        0 if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        0 => cleaned,
        _ => return Err(AppError::invalid("amount", "invalid_amount")),
    };

    Decimal::from_str(&normalized).map_err(|_| AppError::invalid("amount", "invalid_amount"))
}

/// "R$ 1.234,56"
pub fn format_brl(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let reais = (abs / 100).to_string();
    let centavos = abs % 100;

    let mut grouped = String::with_capacity(reais.len() + reais.len() / 3);
    for (i, ch) in reais.chars().enumerate() {
        if i > 0 && (reais.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    format!("{}R$ {},{:02}", sign, grouped, centavos)
}

// Valor monetário vindo do JSON: número (150.5) ou texto ("150,50"), sempre em reais.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum MoneyInput {
    Number(f64),
    Text(String),
}

impl MoneyInput {
    pub fn to_cents(&self) -> Result<i64, AppError> {
        let decimal = match self {
            // O Display de f64 nunca usa notação científica, então o parse é exato no texto.
            MoneyInput::Number(value) => Decimal::from_str(&value.to_string())
                .map_err(|_| AppError::invalid("amount", "invalid_amount"))?,
            MoneyInput::Text(text) => parse_currency_text(text)?,
        };
        to_minor_units(decimal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn converts_to_cents() {
        assert_eq!(to_minor_units(dec("150.50")).unwrap(), 15050);
        assert_eq!(to_minor_units(dec("0.1")).unwrap(), 10);
        assert_eq!(to_minor_units(dec("10")).unwrap(), 1000);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(to_minor_units(dec("0.005")).unwrap(), 1);
        assert_eq!(to_minor_units(dec("0.004")).unwrap(), 0);
        assert_eq!(to_minor_units(dec("-0.005")).unwrap(), -1);
        assert_eq!(to_minor_units(dec("2.675")).unwrap(), 268);
    }

    #[test]
    fn parses_brazilian_input() {
        assert_eq!(parse_currency_text("150,50").unwrap(), dec("150.50"));
        assert_eq!(parse_currency_text("1.234,56").unwrap(), dec("1234.56"));
        assert_eq!(parse_currency_text("R$ 10,00").unwrap(), dec("10.00"));
        assert_eq!(parse_currency_text("1.234.567").unwrap(), dec("1234567"));
    }

    #[test]
    fn parses_dot_decimal_input() {
        assert_eq!(parse_currency_text("150.50").unwrap(), dec("150.50"));
        assert_eq!(parse_currency_text(" 99 ").unwrap(), dec("99"));
    }

    #[test]
    fn rejects_garbage_and_empty_input() {
        assert!(parse_currency_text("").is_err());
        assert!(parse_currency_text("   ").is_err());
        assert!(parse_currency_text("1,2,3").is_err());
        assert!(parse_currency_text("abc").is_err());
    }

    #[test]
    fn formats_brl() {
        assert_eq!(format_brl(123456), "R$ 1.234,56");
        assert_eq!(format_brl(500), "R$ 5,00");
        assert_eq!(format_brl(7), "R$ 0,07");
        assert_eq!(format_brl(100000000), "R$ 1.000.000,00");
        assert_eq!(format_brl(-150), "-R$ 1,50");
    }

    #[test]
    fn money_input_accepts_number_and_text() {
        assert_eq!(MoneyInput::Number(150.5).to_cents().unwrap(), 15050);
        assert_eq!(MoneyInput::Number(0.1).to_cents().unwrap(), 10);
        assert_eq!(MoneyInput::Text("33,33".to_string()).to_cents().unwrap(), 3333);
    }

    #[test]
    fn money_input_deserializes_untagged() {
        let n: MoneyInput = serde_json::from_str("12.34").unwrap();
        let t: MoneyInput = serde_json::from_str("\"12,34\"").unwrap();
        assert_eq!(n.to_cents().unwrap(), 1234);
        assert_eq!(t.to_cents().unwrap(), 1234);
    }
}
