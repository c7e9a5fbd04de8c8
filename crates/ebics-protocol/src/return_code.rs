//! EBICS return codes. The wire format is a 6-digit decimal string; we keep
//! the well-known ones as variants and fall back to `Unknown` for anything
//! else rather than failing the parse outright (a code we don't recognise
//! yet is still useful information to the caller).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EbicsReturnCode {
    Ok,
    DownloadPostprocessDone,
    DownloadPostprocessSkipped,
    TxSegmentNumberUnderrun,
    AuthenticationFailed,
    NoDownloadDataAvailable,
    TxRecoverySync,
    ProcessingError,
    InvalidUserOrUserState,
    TxMessageReplay,
    AmountCheckFailed,
    Unknown(String),
}

impl EbicsReturnCode {
    pub fn is_ok(self) -> bool {
        matches!(
            self,
            EbicsReturnCode::Ok
                | EbicsReturnCode::DownloadPostprocessDone
                | EbicsReturnCode::DownloadPostprocessSkipped
        )
    }

    /// Whether the engine should retry the current segment rather than
    /// abort the transaction.
    pub fn is_retriable(self) -> bool {
        matches!(
            self,
            EbicsReturnCode::TxRecoverySync | EbicsReturnCode::TxMessageReplay
        )
    }

    pub fn code(&self) -> &str {
        match self {
            EbicsReturnCode::Ok => "000000",
            EbicsReturnCode::DownloadPostprocessDone => "011000",
            EbicsReturnCode::DownloadPostprocessSkipped => "011001",
            EbicsReturnCode::TxSegmentNumberUnderrun => "091116",
            EbicsReturnCode::AuthenticationFailed => "091201",
            EbicsReturnCode::NoDownloadDataAvailable => "090005",
            EbicsReturnCode::TxRecoverySync => "061002",
            EbicsReturnCode::ProcessingError => "061099",
            EbicsReturnCode::InvalidUserOrUserState => "091002",
            EbicsReturnCode::TxMessageReplay => "091103",
            EbicsReturnCode::AmountCheckFailed => "091126",
            EbicsReturnCode::Unknown(code) => code,
        }
    }

    pub fn parse(code: &str) -> EbicsReturnCode {
        match code {
            "000000" => EbicsReturnCode::Ok,
            "011000" => EbicsReturnCode::DownloadPostprocessDone,
            "011001" => EbicsReturnCode::DownloadPostprocessSkipped,
            "061002" => EbicsReturnCode::TxRecoverySync,
            "090005" => EbicsReturnCode::NoDownloadDataAvailable,
            "091002" => EbicsReturnCode::InvalidUserOrUserState,
            "091103" => EbicsReturnCode::TxMessageReplay,
            "091116" => EbicsReturnCode::TxSegmentNumberUnderrun,
            "061099" => EbicsReturnCode::ProcessingError,
            "091126" => EbicsReturnCode::AmountCheckFailed,
            "091201" => EbicsReturnCode::AuthenticationFailed,
            other => EbicsReturnCode::Unknown(other.to_string()),
        }
    }
}

impl Default for EbicsReturnCode {
    fn default() -> Self {
        EbicsReturnCode::Ok
    }
}

impl fmt::Display for EbicsReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_codes() {
        for code in [
            EbicsReturnCode::Ok,
            EbicsReturnCode::TxRecoverySync,
            EbicsReturnCode::NoDownloadDataAvailable,
            EbicsReturnCode::TxSegmentNumberUnderrun,
            EbicsReturnCode::ProcessingError,
        ] {
            assert_eq!(EbicsReturnCode::parse(code.code()), code);
        }
    }

    #[test]
    fn segment_underrun_and_processing_error_are_distinct_on_the_wire() {
        assert_ne!(
            EbicsReturnCode::TxSegmentNumberUnderrun.code(),
            EbicsReturnCode::ProcessingError.code()
        );
        assert_eq!(
            EbicsReturnCode::parse(EbicsReturnCode::ProcessingError.code()),
            EbicsReturnCode::ProcessingError
        );
    }

    #[test]
    fn unknown_code_does_not_fail_the_parse() {
        let parsed = EbicsReturnCode::parse("099999");
        assert_eq!(parsed, EbicsReturnCode::Unknown("099999".to_string()));
        assert!(!parsed.is_ok());
    }
}
