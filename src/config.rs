// src/config.rs
use crate::api::ScrapePolicy;
use crate::constants::{
    DEFAULT_SOURCE_BASE_URL, DEFAULT_STORE_BASE_URL, NOTEBOOK_MAX_PAGES, NOTEBOOK_MAX_RETRIES,
    NOTEBOOK_REQUEST_TIMEOUT,
};
use crate::error::AppError;
use crate::model::TitleFilter;
use crate::types::{ApiKey, SessionCookie, StoreSecret, ValidatedUrl, ValidationError};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Accepted per-request timeout window, in seconds.
const MIN_TIMEOUT_SECS: u64 = 9;
const MAX_TIMEOUT_SECS: u64 = 11;

/// Largest accepted retry budget per page.
const MAX_RETRIES_LIMIT: u64 = 20;

/// Largest accepted notebook page ceiling.
const MAX_PAGES_LIMIT: u64 = 10_000;

/// Parsed and validated command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Only sync if no sync has happened today
    #[arg(long, default_value_t = false)]
    pub daily: bool,

    /// Write the synced highlights to a CSV file
    #[arg(long, value_name = "PATH")]
    pub csv: Option<String>,

    /// Pipe mode - print the CSV to stdout instead of the summary
    #[arg(short = 'p', long, default_value_t = false)]
    pub pipe: bool,

    /// Scrape only; do not upload anything to the store
    #[arg(long, default_value_t = false)]
    pub no_upload: bool,

    /// Ignore and do not update the on-disk state
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,

    /// Only sync books with this title (repeatable)
    #[arg(long = "allow", value_name = "TITLE")]
    pub allow: Vec<String>,

    /// Never sync books with this title (repeatable, wins over --allow)
    #[arg(long = "deny", value_name = "TITLE")]
    pub deny: Vec<String>,

    /// Base URL of the reading service
    #[arg(long, default_value = DEFAULT_SOURCE_BASE_URL)]
    pub source_url: String,

    /// Base URL of the highlight store
    #[arg(long, default_value = DEFAULT_STORE_BASE_URL)]
    pub store_url: String,

    /// Retries per notebook page before a book is given up
    #[arg(long, default_value_t = NOTEBOOK_MAX_RETRIES)]
    pub max_retries: u32,

    /// Per-request timeout in seconds (9 to 11)
    #[arg(long, default_value_t = NOTEBOOK_REQUEST_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Maximum notebook pages read per book
    #[arg(long, default_value_t = NOTEBOOK_MAX_PAGES)]
    pub max_pages: u32,

    /// Store API key
    #[arg(long, env = "UNEARTHED_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Store secret from an earlier connect handshake
    #[arg(long, env = "UNEARTHED_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// `Cookie` header of a signed-in reading-service session
    #[arg(long, env = "KINDLE_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,
}

/// Credentials and location of the highlight store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub api_key: ApiKey,
    pub secret: Option<StoreSecret>,
    pub base_url: ValidatedUrl,
}

/// Resolved sync configuration, validated and ready to drive a run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub cookie: SessionCookie,
    pub source_url: ValidatedUrl,
    /// `None` in scrape-only mode.
    pub store: Option<StoreConfig>,
    pub filter: TitleFilter,
    pub scrape_policy: ScrapePolicy,
    pub csv_path: Option<PathBuf>,
    pub pipe: bool,
    pub daily: bool,
    pub no_cache: bool,
    #[allow(dead_code)] // Used by bin crate
    pub verbose: bool,
}

impl SyncConfig {
    /// Resolves a complete configuration from CLI input and environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let cookie = cli.cookie.ok_or_else(|| {
            AppError::MissingConfiguration("KINDLE_COOKIE environment variable not set".to_string())
        })?;
        let cookie = SessionCookie::new(cookie)?;
        let source_url = ValidatedUrl::parse(&cli.source_url)?;

        let store = if cli.no_upload {
            None
        } else {
            let api_key = cli.api_key.ok_or_else(|| {
                AppError::MissingConfiguration(
                    "UNEARTHED_API_KEY environment variable not set (or pass --no-upload)"
                        .to_string(),
                )
            })?;
            Some(StoreConfig {
                api_key: ApiKey::new(api_key)?,
                secret: cli
                    .secret
                    .filter(|s| !s.trim().is_empty())
                    .map(StoreSecret::new)
                    .transpose()?,
                base_url: ValidatedUrl::parse(&cli.store_url)?,
            })
        };

        let scrape_policy = ScrapePolicy {
            max_retries: bounded(cli.max_retries as u64, 0, MAX_RETRIES_LIMIT)? as u32,
            request_timeout: Duration::from_secs(bounded(
                cli.timeout_secs,
                MIN_TIMEOUT_SECS,
                MAX_TIMEOUT_SECS,
            )?),
            max_pages: bounded(cli.max_pages as u64, 1, MAX_PAGES_LIMIT)? as u32,
            ..ScrapePolicy::default()
        };

        let mut filter = TitleFilter::all().with_denied(cli.deny);
        if !cli.allow.is_empty() {
            filter = filter.with_allowed(cli.allow);
        }

        Ok(SyncConfig {
            cookie,
            source_url,
            store,
            filter,
            scrape_policy,
            csv_path: cli.csv.map(PathBuf::from),
            pipe: cli.pipe,
            daily: cli.daily,
            no_cache: cli.no_cache,
            verbose: cli.verbose,
        })
    }
}

fn bounded(value: u64, min: u64, max: u64) -> Result<u64, ValidationError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::OutOfBounds { value, min, max })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Parses flags without consulting the process environment for
    /// credentials: every test passes them explicitly or not at all.
    fn cli(args: &[&str]) -> CommandLineInput {
        let mut cli = CommandLineInput::try_parse_from(
            std::iter::once("unearthed-sync").chain(args.iter().copied()),
        )
        .unwrap();
        for (flag, field) in [
            ("--api-key", &mut cli.api_key),
            ("--secret", &mut cli.secret),
            ("--cookie", &mut cli.cookie),
        ] {
            if !args.contains(&flag) {
                *field = None;
            }
        }
        cli
    }

    #[test]
    fn resolves_defaults() {
        let config = SyncConfig::resolve(cli(&[
            "--cookie",
            "session-id=1",
            "--api-key",
            "key_123",
        ]))
        .unwrap();

        assert!(config.store.is_some());
        assert_eq!(config.scrape_policy, ScrapePolicy::default());
        assert_eq!(config.source_url.as_str(), "https://read.amazon.com/");
        let store = config.store.unwrap();
        assert_eq!(store.api_key.as_str(), "key_123");
        assert_eq!(store.secret, None);
        assert_eq!(store.base_url.as_str(), "https://unearthed.app/");
        assert!(!config.daily);
        assert_eq!(config.csv_path, None);
    }

    #[test]
    fn cookie_is_required() {
        let err = SyncConfig::resolve(cli(&["--api-key", "key_123"])).unwrap_err();
        assert!(matches!(err, AppError::MissingConfiguration(_)));
    }

    #[test]
    fn api_key_is_only_required_when_uploading() {
        let err = SyncConfig::resolve(cli(&["--cookie", "a=b"])).unwrap_err();
        assert!(err.to_string().contains("UNEARTHED_API_KEY"));

        let config = SyncConfig::resolve(cli(&["--cookie", "a=b", "--no-upload"])).unwrap();
        assert!(config.store.is_none());
    }

    #[test]
    fn blank_secret_counts_as_absent() {
        let config = SyncConfig::resolve(cli(&[
            "--cookie", "a=b", "--api-key", "k", "--secret", " ",
        ]))
        .unwrap();
        assert_eq!(config.store.unwrap().secret, None);
    }

    #[test]
    fn tunables_are_bounded() {
        let err = SyncConfig::resolve(cli(&["--cookie", "a=b", "--no-upload", "--max-pages", "0"]))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Value out of bounds: 0, expected 1..=10000"
        );

        let config = SyncConfig::resolve(cli(&[
            "--cookie",
            "a=b",
            "--no-upload",
            "--max-retries",
            "2",
        ]))
        .unwrap();
        assert_eq!(config.scrape_policy.max_retries, 2);
    }

    #[test]
    fn timeout_stays_within_nine_to_eleven_seconds() {
        let with_timeout = |secs: &str| {
            SyncConfig::resolve(cli(&[
                "--cookie",
                "a=b",
                "--no-upload",
                "--timeout-secs",
                secs,
            ]))
        };

        for secs in ["30", "8", "12", "1"] {
            let err = with_timeout(secs).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Value out of bounds: {}, expected 9..=11", secs)
            );
        }
        for secs in [9, 11] {
            let config = with_timeout(&secs.to_string()).unwrap();
            assert_eq!(
                config.scrape_policy.request_timeout,
                Duration::from_secs(secs)
            );
        }
    }

    #[test]
    fn title_lists_become_a_filter() {
        let config = SyncConfig::resolve(cli(&[
            "--cookie", "a=b", "--no-upload", "--allow", "Dune", "--allow", "Emma", "--deny",
            "Emma",
        ]))
        .unwrap();

        let book = |title: &str| {
            crate::model::CatalogItem::from_listing(
                crate::types::ExternalId::parse("B1").unwrap(),
                Some(title),
                None,
                None,
            )
        };
        assert!(config.filter.permits(&book("Dune")));
        assert!(!config.filter.permits(&book("Emma")));
        assert!(!config.filter.permits(&book("1984")));
    }
}
