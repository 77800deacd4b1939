//! locale-aware currency display; output is never parsed back into amounts

use serde::{Deserialize, Serialize};

use crate::decimal::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolPosition {
    Prefix,
    Suffix,
}

/// currency display convention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub symbol_position: SymbolPosition,
    pub thousands_separator: String,
    pub decimal_separator: String,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::en_us()
    }
}

impl CurrencyFormat {
    /// $1,234.50
    pub fn en_us() -> Self {
        Self {
            symbol: "$".to_string(),
            symbol_position: SymbolPosition::Prefix,
            thousands_separator: ",".to_string(),
            decimal_separator: ".".to_string(),
        }
    }

    /// 1.234,50 €
    pub fn de_de() -> Self {
        Self {
            symbol: "€".to_string(),
            symbol_position: SymbolPosition::Suffix,
            thousands_separator: ".".to_string(),
            decimal_separator: ",".to_string(),
        }
    }

    /// 1 234,50 € (narrow no-break space grouping)
    pub fn fr_fr() -> Self {
        Self {
            symbol: "€".to_string(),
            symbol_position: SymbolPosition::Suffix,
            thousands_separator: "\u{202f}".to_string(),
            decimal_separator: ",".to_string(),
        }
    }

    pub fn format(&self, amount: Money) -> String {
        // cent precision is guaranteed by Money, so the fixed-point text is exact
        let fixed = format!("{:.2}", amount.abs().as_decimal());
        let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push_str(&self.thousands_separator);
            }
            grouped.push(digit);
        }

        let number = format!("{}{}{}", grouped, self.decimal_separator, fraction);
        let sign = if amount.is_negative() { "-" } else { "" };
        match self.symbol_position {
            SymbolPosition::Prefix => format!("{}{}{}", sign, self.symbol, number),
            SymbolPosition::Suffix => format!("{}{} {}", sign, number, self.symbol),
        }
    }
}
