//! `payto://` URI parsing, per the two variants this gateway cares about:
//! `payto://iban/[BIC/]IBAN` and `payto://x-taler-bank/HOSTNAME/USERNAME`.

use crate::error::DomainError;
use crate::iban::Iban;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payto {
    Iban {
        bic: Option<String>,
        iban: Iban,
    },
    XTalerBank {
        hostname: String,
        username: String,
    },
}

impl Payto {
    /// Parses a `payto://` URI, returning the tagged address plus any
    /// query parameters (`amount`, `message`, `receiver-name`).
    pub fn parse(text: &str) -> Result<(Payto, BTreeMap<String, String>), DomainError> {
        let url = url::Url::parse(text).map_err(|_| DomainError::MalformedPayto(text.to_string()))?;
        if url.scheme() != "payto" {
            return Err(DomainError::MalformedPayto(text.to_string()));
        }
        let authority = url
            .host_str()
            .ok_or_else(|| DomainError::MalformedPayto(text.to_string()))?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        let params: BTreeMap<String, String> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let address = match authority {
            "iban" => match segments.as_slice() {
                [iban] => Payto::Iban {
                    bic: None,
                    iban: Iban::parse(iban)?,
                },
                [bic, iban] => Payto::Iban {
                    bic: Some(bic.to_string()),
                    iban: Iban::parse(iban)?,
                },
                _ => return Err(DomainError::MalformedPayto(text.to_string())),
            },
            "x-taler-bank" => match segments.as_slice() {
                [hostname, username] => Payto::XTalerBank {
                    hostname: hostname.to_string(),
                    username: username.to_string(),
                },
                _ => return Err(DomainError::MalformedPayto(text.to_string())),
            },
            other => {
                return Err(DomainError::MalformedPayto(format!(
                    "unsupported payto authority {other:?} in {text}"
                )))
            }
        };

        Ok((address, params))
    }

    /// The canonical form, without query parameters.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Payto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payto::Iban { bic: Some(bic), iban } => {
                write!(f, "payto://iban/{bic}/{}", iban.as_str())
            }
            Payto::Iban { bic: None, iban } => write!(f, "payto://iban/{}", iban.as_str()),
            Payto::XTalerBank { hostname, username } => {
                write!(f, "payto://x-taler-bank/{hostname}/{username}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iban_without_bic() {
        let (payto, params) = Payto::parse("payto://iban/DE89370400440532013000").unwrap();
        assert!(matches!(payto, Payto::Iban { bic: None, .. }));
        assert!(params.is_empty());
    }

    #[test]
    fn parses_iban_with_bic_and_params() {
        let (payto, params) =
            Payto::parse("payto://iban/BICXDEFF/DE89370400440532013000?amount=EUR:1&message=hi")
                .unwrap();
        assert!(matches!(payto, Payto::Iban { bic: Some(_), .. }));
        assert_eq!(params.get("message").unwrap(), "hi");
    }

    #[test]
    fn parses_x_taler_bank() {
        let (payto, _) = Payto::parse("payto://x-taler-bank/bank.example.com/alice").unwrap();
        assert_eq!(
            payto,
            Payto::XTalerBank {
                hostname: "bank.example.com".to_string(),
                username: "alice".to_string(),
            }
        );
    }

    #[test]
    fn canonical_form_drops_query_parameters() {
        let (payto, _) =
            Payto::parse("payto://iban/DE89370400440532013000?amount=EUR:1").unwrap();
        assert_eq!(payto.canonical(), "payto://iban/DE89370400440532013000");
    }

    #[test]
    fn rejects_invalid_iban_segment() {
        assert!(Payto::parse("payto://iban/DE00000000000000000000").is_err());
    }
}
