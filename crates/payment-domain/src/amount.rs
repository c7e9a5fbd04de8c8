//! Fixed-precision Taler-style amounts: `value` whole units (0..2^52),
//! `frac` in units of 10^-8 (0..10^8), and a 1-11 uppercase-letter
//! currency code. Text form is `CUR:V[.FFFFFFFF]` with trailing zeros in
//! the fraction trimmed.

use crate::error::DomainError;
use std::fmt;
use std::str::FromStr;

const MAX_VALUE: u64 = 1u64 << 52;
const FRACTION_BASE: u64 = 100_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TalerAmount {
    value: u64,
    frac: u32,
    currency: [u8; 11],
    currency_len: u8,
}

impl TalerAmount {
    pub fn new(value: u64, frac: u32, currency: &str) -> Result<TalerAmount, DomainError> {
        if value > MAX_VALUE {
            return Err(DomainError::ValueOutOfRange(value));
        }
        if frac as u64 >= FRACTION_BASE {
            return Err(DomainError::FractionOutOfRange(frac));
        }
        if currency.is_empty()
            || currency.len() > 11
            || !currency.bytes().all(|b| b.is_ascii_uppercase())
        {
            return Err(DomainError::InvalidCurrency(currency.to_string()));
        }
        let mut bytes = [0u8; 11];
        bytes[..currency.len()].copy_from_slice(currency.as_bytes());
        Ok(TalerAmount {
            value,
            frac,
            currency: bytes,
            currency_len: currency.len() as u8,
        })
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn frac(&self) -> u32 {
        self.frac
    }

    pub fn currency(&self) -> &str {
        std::str::from_utf8(&self.currency[..self.currency_len as usize]).unwrap()
    }
}

impl fmt::Display for TalerAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.frac == 0 {
            write!(f, "{}:{}", self.currency(), self.value)
        } else {
            let mut frac_str = format!("{:08}", self.frac);
            while frac_str.ends_with('0') {
                frac_str.pop();
            }
            write!(f, "{}:{}.{}", self.currency(), self.value, frac_str)
        }
    }
}

impl FromStr for TalerAmount {
    type Err = DomainError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (currency, rest) = text
            .split_once(':')
            .ok_or_else(|| DomainError::MalformedAmount(text.to_string()))?;
        let (value_str, frac_str) = match rest.split_once('.') {
            Some((v, f)) => (v, f),
            None => (rest, ""),
        };
        let value: u64 = value_str
            .parse()
            .map_err(|_| DomainError::MalformedAmount(text.to_string()))?;
        if frac_str.len() > 8 || !frac_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::MalformedAmount(text.to_string()));
        }
        let mut padded = frac_str.to_string();
        while padded.len() < 8 {
            padded.push('0');
        }
        let frac: u32 = if padded.is_empty() {
            0
        } else {
            padded
                .parse()
                .map_err(|_| DomainError::MalformedAmount(text.to_string()))?
        };
        TalerAmount::new(value, frac, currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_trailing_zeros_trimmed() {
        let amount = TalerAmount::new(5, 50_000_000, "EUR").unwrap();
        assert_eq!(amount.to_string(), "EUR:5.5");
    }

    #[test]
    fn whole_amount_has_no_fraction_part() {
        let amount = TalerAmount::new(10, 0, "EUR").unwrap();
        assert_eq!(amount.to_string(), "EUR:10");
    }

    #[test]
    fn parses_its_own_text_form() {
        let amount = TalerAmount::new(3, 140_000, "KUDOS").unwrap();
        let parsed: TalerAmount = amount.to_string().parse().unwrap();
        assert_eq!(amount, parsed);
    }

    #[test]
    fn rejects_fraction_at_or_above_base() {
        assert!(TalerAmount::new(0, 100_000_000, "EUR").is_err());
    }

    #[test]
    fn accepts_value_at_2_52() {
        assert!(TalerAmount::new(1u64 << 52, 0, "EUR").is_ok());
    }

    #[test]
    fn rejects_value_above_2_52() {
        assert!(TalerAmount::new((1u64 << 52) + 1, 0, "EUR").is_err());
    }

    #[test]
    fn rejects_lowercase_currency() {
        assert!(TalerAmount::new(1, 0, "eur").is_err());
    }
}
