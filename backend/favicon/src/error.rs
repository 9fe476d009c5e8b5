use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IconError {
    #[error("Invalid target url: {0}")]
    InvalidTarget(String),

    #[error("{provider} needs a domain name, got {host}")]
    NotADomain {
        provider: &'static str,
        host: String,
    },
}
