use std::env;

use anyhow::Context;
use reqwest::{
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
    Client,
};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{stats::EventKind, Result};

const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
}

#[derive(Deserialize)]
struct PullInfo {
    user: User,
}

/// State of a submitted review. Anything GitHub adds later (or `PENDING`)
/// lands in `Other` and is ignored by the tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Approved,
    Commented,
    ChangesRequested,
    Dismissed,
    #[serde(other)]
    Other,
}

impl ReviewState {
    pub fn event_kind(self) -> Option<EventKind> {
        match self {
            ReviewState::Approved => Some(EventKind::Approved),
            ReviewState::Commented => Some(EventKind::Commented),
            ReviewState::ChangesRequested => Some(EventKind::ChangesRequested),
            ReviewState::Dismissed => Some(EventKind::Dismissed),
            ReviewState::Other => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    pub state: ReviewState,
    // null when the reviewer's account has been deleted, but never absent
    #[serde(deserialize_with = "Option::deserialize")]
    pub user: Option<User>,
}

#[cfg(test)]
impl Review {
    pub(crate) fn new(state: ReviewState, login: &str) -> Self {
        Review { state, user: Some(User { login: login.to_string() }) }
    }
}

/// Where pull requests and their reviews come from.
pub(crate) trait PullSource {
    async fn pull_author(&self, number: i64) -> Result<String>;
    async fn reviews(&self, number: i64) -> Result<Vec<Review>>;
}

fn make_client(token: &str) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    let value = HeaderValue::from_str(&format!("Bearer {}", token))
        .context("access token is not a valid header value")?;
    headers.insert(AUTHORIZATION, value);
    let client = Client::builder().user_agent("review-stats").default_headers(headers).build()?;
    Ok(client)
}

pub struct GitHub {
    client: Client,
    base_url: String,
    repo: String,
}

impl GitHub {
    /// Client for `repo` ("owner/name"). `GITHUB_API_URL` overrides the API host.
    pub fn new(repo: &str, token: &str) -> Result<Self> {
        let base_url = env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        Self::with_base_url(&base_url, repo, token)
    }

    pub fn with_base_url(base_url: &str, repo: &str, token: &str) -> Result<Self> {
        Ok(GitHub {
            client: make_client(token)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            repo: repo.to_string(),
        })
    }

    fn pull_url(&self, number: i64) -> String {
        format!("{}/repos/{}/pulls/{}", self.base_url, self.repo, number)
    }

    fn reviews_url(&self, number: i64) -> String {
        format!("{}/reviews", self.pull_url(number))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        log::debug!("GET {url}");
        let value = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(value)
    }
}

impl PullSource for GitHub {
    async fn pull_author(&self, number: i64) -> Result<String> {
        let pull: PullInfo = self
            .get_json(&self.pull_url(number))
            .await
            .with_context(|| format!("fetching pull request #{number} of {}", self.repo))?;
        Ok(pull.user.login)
    }

    async fn reviews(&self, number: i64) -> Result<Vec<Review>> {
        self.get_json(&self.reviews_url(number))
            .await
            .with_context(|| format!("fetching reviews of pull request #{number} of {}", self.repo))
    }
}
