//! Core of an assistants terminal chat client: a typed client for the remote
//! assistant/thread/message/run/file resources, an asynchronous run-completion
//! protocol (polling and streaming), and local JSON bookkeeping for
//! credentials and thread history.
//!
//! The menu/rendering shell is a separate concern: it drives [`Session`] and
//! the stores, renders their results, and decides navigation from the
//! returned [`Error`]s.

pub mod assistants;
pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod session;

pub use client::AssistantClient;
pub use error::{ApiError, Error};
pub use session::Session;

pub const BASE_URL: &str = "https://api.openai.com/v1/";

/// Model used for assistants created without an explicit model id.
pub const DEFAULT_MODEL: &str = "gpt-4-vision-preview";

/// Holds the API key and base URL for a client.
///
/// ## Examples
///
/// Use the `OPENAI_KEY` environment variable defined in a `.env` file:
///
/// ```no_run
/// use assistant_gpt::Credentials;
///
/// let credentials = Credentials::from_env();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    base_url: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url = parse_base_url(base_url.into());
        Self {
            api_key: api_key.into(),
            base_url,
        }
    }

    /// Fetches the credentials from the `OPENAI_KEY` and (optionally)
    /// `OPENAI_BASE_URL` environment variables, loading a `.env` file first
    /// if one exists.
    ///
    /// # Panics
    ///
    /// Panics if `OPENAI_KEY` is not set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("OPENAI_KEY")
            .expect("environment variable `OPENAI_KEY` should be defined");
        let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| BASE_URL.to_string());
        Self::new(api_key, base_url)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn parse_base_url(mut url: String) -> String {
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_trailing_slash() {
        let credentials = Credentials::new("sk-test", "https://api.openai.com/v1");
        assert_eq!(credentials.base_url(), "https://api.openai.com/v1/");

        let credentials = Credentials::new("sk-test", BASE_URL);
        assert_eq!(credentials.base_url(), BASE_URL);
    }
}
