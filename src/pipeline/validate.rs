// src/pipeline/validate.rs

use std::path::Path;

use crate::error::Result;
use crate::models::Config;

/// Load the configuration at `path` and check it, logging the effective
/// settings.
pub fn run_validate(path: &Path) -> Result<Config> {
    log::info!("Validating configuration at {}", path.display());

    let config = Config::load(path).and_then(|config| {
        config.validate()?;
        Ok(config)
    });

    match config {
        Ok(config) => {
            let workers = config.crawl.workers;
            log::info!("Configuration is valid");
            log::info!("  user agent: {}", config.crawler.user_agent);
            log::info!(
                "  timeout: {} ms, {} retries, backoff x{}",
                config.crawler.request_timeout_ms,
                config.crawler.max_retries,
                config.crawler.backoff_factor
            );
            log::info!(
                "  frontier: {} priority buckets, {} host slots, politeness x{}",
                config.frontier.front_queues,
                config.frontier.effective_back_queues(workers),
                config.frontier.politeness_factor
            );
            log::info!(
                "  crawl: {} workers, {} pages ({} each), prioritizer {}",
                workers,
                config.crawl.max_pages,
                config.crawl.pages_per_worker(),
                config.crawl.prioritizer
            );
            Ok(config)
        }
        Err(e) => {
            log::error!("Configuration invalid: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_validate_accepts_good_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[crawl]\nworkers = 2\nseeds = [\"https://a.com/\", \"https://b.com/\"]"
        )
        .unwrap();
        let config = run_validate(file.path()).unwrap();
        assert_eq!(config.crawl.workers, 2);
    }

    #[test]
    fn test_validate_rejects_seed_mismatch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[crawl]\nworkers = 3").unwrap();
        assert!(run_validate(file.path()).is_err());
    }

    #[test]
    fn test_validate_missing_file() {
        assert!(run_validate(Path::new("/nonexistent/crawler.toml")).is_err());
    }
}
