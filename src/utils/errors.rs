// src/utils/errors.rs

/// Failures while pulling candles from the exchange.
///
/// `Http` and `Status` are data-source failures (network, non-2xx);
/// `MalformedData` means the response arrived but did not have the
/// expected shape. Either one aborts the current cycle.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("data source unreachable: {0}")]
    Http(#[from] reqwest::Error),
    #[error("data source answered HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed candle data: {0}")]
    MalformedData(String),
}

impl FetchError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, FetchError::MalformedData(_))
    }
}

/// Failures while pushing an alert to the messaging channel.
/// Reported, never fatal to a cycle.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    /// Transport error; the request URL has already been stripped
    /// because it carries the bot token.
    #[error("messaging channel unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    #[error("messaging channel rejected message (HTTP {status}): {description}")]
    Rejected { status: u16, description: String },
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        DeliveryError::Unreachable(err.without_url())
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} missing from env")]
    Missing(&'static str),
    #[error("{key} has invalid value '{value}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
