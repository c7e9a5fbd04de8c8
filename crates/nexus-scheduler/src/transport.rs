//! The bank-facing HTTP client. Every EBICS request is one `POST` with an
//! XML body; the transaction engine decides what to send next from the
//! response, so this layer stays a thin, timeout-bounded wire.

use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const READ_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Clone)]
pub struct BankClient {
    http: reqwest::Client,
}

impl BankClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(READ_TIMEOUT)
            .build()
            .expect("building the bank HTTP client with static config cannot fail");
        Self { http }
    }

    pub async fn post_xml(&self, url: &str, body: Vec<u8>) -> Result<Vec<u8>, reqwest::Error> {
        let response = self
            .http
            .post(url)
            .header("Content-Type", "text/xml; charset=UTF-8")
            .body(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

impl Default for BankClient {
    fn default() -> Self {
        Self::new()
    }
}
