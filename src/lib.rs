use std::io;

use anyhow::Context;

use github::{GitHub, PullSource, Review};
use stats::Activity;

pub mod github;
pub mod report;
pub mod stats;

type Result<T> = anyhow::Result<T>;

#[derive(Debug, thiserror::Error)]
#[error("Usage: {program} <repo> <token> <PRfrom> <PRto>")]
pub struct UsageError {
    program: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Args {
    pub repo: String,
    pub token: String,
    pub pr_from: i64,
    pub pr_to: i64,
}

impl Args {
    /// Parse `<program> <repo> <token> <PRfrom> <PRto>`. The range is not
    /// checked: `pr_from > pr_to` just means nothing gets fetched.
    pub fn parse(args: impl IntoIterator<Item = String>) -> std::result::Result<Self, UsageError> {
        let mut args = args.into_iter();
        let program = args.next().unwrap_or_else(|| "review-stats".to_string());
        let usage = || UsageError { program: program.clone() };
        let rest: Vec<String> = args.collect();
        let [repo, token, from, to]: [String; 4] = rest.try_into().map_err(|_| usage())?;
        let pr_from = from.parse().map_err(|_| usage())?;
        let pr_to = to.parse().map_err(|_| usage())?;
        Ok(Args { repo, token, pr_from, pr_to })
    }
}

/// What was tallied before the loop ended, and the fault that ended it early, if any.
pub struct Collected {
    pub activity: Activity,
    pub error: Option<anyhow::Error>,
}

async fn fetch_pull<S: PullSource>(source: &S, number: i64) -> Result<(String, Vec<Review>)> {
    let author = source.pull_author(number).await?;
    let reviews = source.reviews(number).await?;
    Ok((author, reviews))
}

// A pull request is only recorded once both of its requests succeeded.
async fn collect<S: PullSource>(source: &S, pr_from: i64, pr_to: i64) -> Collected {
    let mut activity = Activity::new();
    for number in pr_from..=pr_to {
        match fetch_pull(source, number).await {
            Ok((author, reviews)) => {
                log::info!("#{number} by {author}: {} reviews", reviews.len());
                activity.record_pull(&author, &reviews);
            }
            Err(error) => {
                log::error!("stopping at #{number}, reporting pull requests before it only");
                return Collected { activity, error: Some(error) };
            }
        }
    }
    Collected { activity, error: None }
}

/// Fetch every pull request in the range, print both tables, and return the
/// fault that cut the run short (after printing what was gathered).
pub async fn run(args: &Args) -> Result<()> {
    let github = GitHub::new(&args.repo, &args.token)?;
    log::info!("collecting reviews for {} #{}..=#{}", args.repo, args.pr_from, args.pr_to);
    let collected = collect(&github, args.pr_from, args.pr_to).await;
    report::write_report(&mut io::stdout().lock(), &collected.activity)
        .context("writing report")?;
    match collected.error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::HashMap};

    use anyhow::bail;

    use super::*;
    use crate::github::{
        tests::{http_response, serve},
        ReviewState,
    };

    fn args(list: &[&str]) -> std::result::Result<Args, UsageError> {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_four_positionals() {
        let parsed = args(&["prog", "acme/widgets", "t0k", "3", "7"]).unwrap();
        assert_eq!(
            parsed,
            Args { repo: "acme/widgets".into(), token: "t0k".into(), pr_from: 3, pr_to: 7 }
        );
    }

    #[test]
    fn wrong_count_is_usage_error() {
        let err = args(&["prog", "acme/widgets", "t0k", "3"]).unwrap_err();
        assert_eq!(err.to_string(), "Usage: prog <repo> <token> <PRfrom> <PRto>");
        assert!(args(&["prog", "acme/widgets", "t0k", "3", "4", "5"]).is_err());
        assert!(args(&[]).is_err());
    }

    #[test]
    fn non_integer_bound_is_usage_error() {
        assert!(args(&["prog", "acme/widgets", "t0k", "three", "7"]).is_err());
        assert!(args(&["prog", "acme/widgets", "t0k", "3", "7.5"]).is_err());
    }

    #[test]
    fn reversed_range_is_accepted() {
        let parsed = args(&["prog", "acme/widgets", "t0k", "9", "2"]).unwrap();
        assert_eq!((parsed.pr_from, parsed.pr_to), (9, 2));
    }

    #[derive(Default)]
    struct FakeSource {
        pulls: HashMap<i64, (String, Vec<Review>)>,
        requested: RefCell<Vec<i64>>,
    }

    impl FakeSource {
        fn with(mut self, number: i64, author: &str, reviews: Vec<Review>) -> Self {
            self.pulls.insert(number, (author.to_string(), reviews));
            self
        }
    }

    impl PullSource for FakeSource {
        async fn pull_author(&self, number: i64) -> Result<String> {
            self.requested.borrow_mut().push(number);
            match self.pulls.get(&number) {
                Some((author, _)) => Ok(author.clone()),
                None => bail!("404 Not Found for pull request #{number}"),
            }
        }

        async fn reviews(&self, number: i64) -> Result<Vec<Review>> {
            match self.pulls.get(&number) {
                Some((_, reviews)) => Ok(reviews.clone()),
                None => bail!("404 Not Found for reviews of #{number}"),
            }
        }
    }

    #[tokio::test]
    async fn single_pull_range() {
        let source = FakeSource::default()
            .with(10, "alice", vec![
                Review::new(ReviewState::Approved, "bob"),
                Review::new(ReviewState::ChangesRequested, "carol"),
            ])
            .with(11, "bob", vec![]);
        let collected = collect(&source, 10, 10).await;
        assert!(collected.error.is_none());
        assert_eq!(*source.requested.borrow(), [10]);
        assert_eq!(collected.activity.user("alice").unwrap().authored, 1);
        assert_eq!(collected.activity.user("bob").unwrap().approved, 1);
        assert_eq!(collected.activity.user("bob").unwrap().authored, 0);
        assert_eq!(collected.activity.blocked_count("alice", "carol"), Some(1));
    }

    #[tokio::test]
    async fn reversed_range_fetches_nothing() {
        let source = FakeSource::default().with(5, "alice", vec![]);
        let collected = collect(&source, 6, 5).await;
        assert!(collected.error.is_none());
        assert!(source.requested.borrow().is_empty());
        assert_eq!(collected.activity.users().count(), 0);
    }

    #[tokio::test]
    async fn fetches_in_increasing_order() {
        let source = FakeSource::default()
            .with(1, "alice", vec![])
            .with(2, "bob", vec![])
            .with(3, "alice", vec![Review::new(ReviewState::Commented, "bob")]);
        let collected = collect(&source, 1, 3).await;
        assert!(collected.error.is_none());
        assert_eq!(*source.requested.borrow(), [1, 2, 3]);
        assert_eq!(collected.activity.user("alice").unwrap().authored, 2);
        assert_eq!(collected.activity.user("bob").unwrap().commented, 1);
    }

    #[tokio::test]
    async fn fault_keeps_earlier_pulls() {
        let source = FakeSource::default()
            .with(1, "alice", vec![Review::new(ReviewState::Dismissed, "dave")])
            .with(3, "bob", vec![]);
        let collected = collect(&source, 1, 3).await;
        let error = collected.error.expect("missing #2 should stop the run");
        assert!(error.to_string().contains("#2"));
        assert_eq!(*source.requested.borrow(), [1, 2]);
        assert_eq!(collected.activity.user("dave").unwrap().dismissed, 1);
        assert!(collected.activity.user("bob").is_none());
    }

    #[tokio::test]
    async fn http_error_status_stops_collection() {
        let (base_url, server) = serve(vec![
            http_response("200 OK", r#"{"user": {"login": "alice"}}"#),
            http_response("200 OK", r#"[{"state": "COMMENTED", "user": {"login": "bob"}}]"#),
            http_response("404 Not Found", r#"{"message": "Not Found"}"#),
        ])
        .await;
        let github = GitHub::with_base_url(&base_url, "acme/widgets", "t0k").unwrap();
        let collected = collect(&github, 4, 6).await;
        let error = collected.error.expect("404 should stop the run");
        assert!(format!("{error:#}").contains("#5"), "{error:#}");
        assert_eq!(collected.activity.user("alice").unwrap().authored, 1);
        assert_eq!(collected.activity.user("bob").unwrap().commented, 1);
        let requests = server.await.unwrap();
        assert!(requests[2].starts_with("GET /repos/acme/widgets/pulls/5 HTTP/1.1"));
    }
}
