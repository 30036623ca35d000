use anyhow::{Context, Result};
use chrono::{Duration, Local};
use tracing::warn;

/// Scan configuration
#[derive(Clone, Debug)]
pub struct ScanConfig {
    /// Keyword to search for inside attachment content.
    pub keyword: String,
    /// Lower-bound window for the list query, in days before now.
    pub days_to_search: i64,
    /// Seconds between continuous-mode scans.
    pub check_interval: u64,
    /// Page-size cap for the list query.
    pub page_size: u32,
}

impl ScanConfig {
    pub fn new(keyword: String, days_to_search: i64, check_interval: u64) -> Self {
        Self {
            keyword,
            days_to_search,
            check_interval,
            page_size: 100,
        }
    }

    /// Load configuration from the environment / .env file.
    pub fn from_env() -> Result<Self> {
        Self::resolve(None, None, None)
    }

    /// Environment values with explicit overrides (CLI flags) on top.
    pub fn resolve(
        keyword: Option<String>,
        days: Option<i64>,
        interval: Option<u64>,
    ) -> Result<Self> {
        dotenv::dotenv().ok();

        let config = Self {
            keyword: match keyword {
                Some(keyword) => keyword,
                None => Self::env_required("SCAN_KEYWORD")?,
            },
            days_to_search: match days {
                Some(days) => days,
                None => Self::env_parse("SCAN_DAYS", 1)?,
            },
            check_interval: match interval {
                Some(interval) => interval,
                None => Self::env_parse("SCAN_INTERVAL", 300)?,
            },
            page_size: Self::env_parse("SCAN_PAGE_SIZE", 100)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.keyword.trim().is_empty() {
            anyhow::bail!("Search keyword cannot be empty");
        }
        if self.days_to_search < 1 {
            anyhow::bail!("Invalid search window: {} days", self.days_to_search);
        }
        if self.check_interval == 0 {
            anyhow::bail!("Check interval must be greater than 0");
        }
        if self.check_interval > 3600 {
            warn!(
                "Check interval {} is very long (>1 hour), is this intended?",
                self.check_interval
            );
        }
        if self.page_size == 0 {
            anyhow::bail!("Page size must be greater than 0");
        }
        Ok(())
    }

    /// Provider query string: attachment presence plus a lower-bound date.
    pub fn query(&self) -> String {
        let after = Local::now() - Duration::days(self.days_to_search);
        format!("has:attachment after:{}", after.format("%Y/%m/%d"))
    }

    fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        match std::env::var(key) {
            Ok(val) => val
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid {}: {}", key, e)),
            Err(_) => Ok(default),
        }
    }

    fn env_required(key: &str) -> Result<String> {
        std::env::var(key).context(format!("{} not set in environment", key))
    }
}
