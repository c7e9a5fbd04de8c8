//! IBAN normalisation and the mod-97 check (ISO 7064 MOD 97-10).

use crate::error::DomainError;
use rand::Rng;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Iban(String);

impl Iban {
    /// Uppercases and strips separators, then validates the mod-97 check.
    pub fn parse(text: &str) -> Result<Iban, DomainError> {
        let normalized: String = text
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if !mod97_check(&normalized) {
            return Err(DomainError::InvalidIban(text.to_string()));
        }
        Ok(Iban(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generates a syntactically valid random IBAN for test fixtures and
    /// the admin/simulation endpoints, using a fixed fictitious country
    /// code.
    pub fn rand() -> Iban {
        let mut rng = rand::thread_rng();
        let bban: String = (0..18).map(|_| rng.gen_range(0..10).to_string()).collect();
        let country = "XT";
        let check = compute_check_digits(country, &bban);
        Iban(format!("{country}{check:02}{bban}"))
    }
}

/// Digit-expands the rearranged (country+check moved to the end) IBAN and
/// checks the mod-97 remainder equals 1.
fn mod97_check(normalized: &str) -> bool {
    if normalized.len() < 4 {
        return false;
    }
    let rearranged = format!("{}{}", &normalized[4..], &normalized[..4]);
    mod97_of(&rearranged) == 1
}

fn compute_check_digits(country: &str, bban: &str) -> u32 {
    let rearranged = format!("{bban}{country}00");
    let remainder = mod97_of(&rearranged);
    98 - remainder
}

/// Computes the mod-97 remainder of a string, expanding each letter A-Z to
/// its two-digit value (A=10 .. Z=35) as ISO 7064 requires.
fn mod97_of(s: &str) -> u32 {
    let mut remainder: u64 = 0;
    for c in s.chars() {
        let digit_value = if c.is_ascii_digit() {
            c.to_digit(10).unwrap() as u64
        } else {
            (c.to_ascii_uppercase() as u64) - ('A' as u64) + 10
        };
        remainder = if digit_value >= 10 {
            (remainder * 100 + digit_value) % 97
        } else {
            (remainder * 10 + digit_value) % 97
        };
    }
    remainder as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_known_valid_iban() {
        let iban = Iban::parse("DE89 3704 0044 0532 0130 00").unwrap();
        assert_eq!(iban.as_str(), "DE89370400440532013000");
    }

    #[test]
    fn rejects_a_mutated_check_digit() {
        assert!(Iban::parse("DE88370400440532013000").is_err());
    }

    #[test]
    fn rand_produces_a_valid_iban() {
        for _ in 0..20 {
            let iban = Iban::rand();
            assert!(Iban::parse(iban.as_str()).is_ok());
        }
    }
}
