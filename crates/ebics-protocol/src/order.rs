//! The order types this gateway ever submits or fetches, and the three
//! key-management order types (INI/HIA/HPB).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOrderType {
    /// Intraday report.
    C52,
    /// Daily statement.
    C53,
    /// Debit notification.
    C54,
}

impl DownloadOrderType {
    pub fn code(self) -> &'static str {
        match self {
            DownloadOrderType::C52 => "C52",
            DownloadOrderType::C53 => "C53",
            DownloadOrderType::C54 => "C54",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyManagementOrderType {
    Ini,
    Hia,
    Hpb,
}

impl KeyManagementOrderType {
    pub fn code(self) -> &'static str {
        match self {
            KeyManagementOrderType::Ini => "INI",
            KeyManagementOrderType::Hia => "HIA",
            KeyManagementOrderType::Hpb => "HPB",
        }
    }
}

/// The upload order type used for submitting a pain.001 credit-transfer
/// batch. Dialects vary on the exact code (`CCT` vs a `BTU`-style generic
/// upload in EBICS 3.0); the engine is parameterised by dialect so the
/// caller never has to choose directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadOrderType;

impl UploadOrderType {
    pub fn code(self) -> &'static str {
        "CCT"
    }
}
