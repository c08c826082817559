use std::time::Duration;

use anyhow::Context;

// Twilio e provedor OAuth: um endpoint travado não pode prender a requisição
pub const EXTERNAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Cliente HTTP para serviços externos, com timeout.
pub fn external_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(EXTERNAL_TIMEOUT)
        .build()
        .context("Falha ao criar o cliente HTTP")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_calls_have_a_bounded_timeout() {
        assert!(external_client().is_ok());
        assert!(EXTERNAL_TIMEOUT <= Duration::from_secs(30));
    }
}
