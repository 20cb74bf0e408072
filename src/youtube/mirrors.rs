use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::CooldownCache;
use crate::config::MIRROR_ATTEMPT_TIMEOUT_SECONDS;
use crate::providers::ProviderError;

pub const MAX_STICKY_FAILURES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mirror {
    pub name: String,
    pub url: String,
    pub priority: u32,
}

impl Mirror {
    pub fn from_url(url: &str, priority: u32) -> Self {
        let url = url.trim_end_matches('/').to_string();
        let name = url
            .replace("https://", "")
            .replace("http://", "")
            .split('/')
            .next()
            .unwrap_or("unknown")
            .to_string();
        Self {
            name,
            url,
            priority,
        }
    }
}

#[derive(Debug, Clone)]
struct StickyMirror {
    mirror: Mirror,
    failure_count: u32,
}

/// Interchangeable upstream mirrors tried in order.
///
/// The last mirror that answered is tried first until it fails
/// `MAX_STICKY_FAILURES` times. Rate-limited mirrors go into the cooldown
/// cache, keyed by URL, and are skipped until the entry expires.
pub struct MirrorPool {
    mirrors: Vec<Mirror>,
    sticky: RwLock<Option<StickyMirror>>,
    cooldown: Arc<dyn CooldownCache>,
    cooldown_ttl: Duration,
    attempt_timeout: Duration,
}

impl MirrorPool {
    pub fn new(urls: &[String], cooldown: Arc<dyn CooldownCache>, cooldown_ttl: Duration) -> Self {
        let mut mirrors: Vec<Mirror> = urls
            .iter()
            .enumerate()
            .map(|(idx, url)| Mirror::from_url(url, idx as u32 + 1))
            .collect();
        mirrors.sort_by_key(|m| (m.priority, m.name.clone()));
        Self {
            mirrors,
            sticky: RwLock::new(None),
            cooldown,
            cooldown_ttl,
            attempt_timeout: Duration::from_secs(MIRROR_ATTEMPT_TIMEOUT_SECONDS),
        }
    }

    /// Upper bound for one call against one mirror. A mirror that does not
    /// answer in time counts as failed and the next one is tried.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn get_all_mirrors(&self) -> &[Mirror] {
        &self.mirrors
    }

    /// Mirrors to try for the next call, sticky first, cooled-down ones left out.
    pub fn candidates(&self) -> Vec<Mirror> {
        let sticky = self
            .sticky
            .read()
            .as_ref()
            .filter(|s| s.failure_count < MAX_STICKY_FAILURES)
            .map(|s| s.mirror.clone());

        let mut ordered = Vec::with_capacity(self.mirrors.len());
        if let Some(sticky) = sticky {
            ordered.push(sticky);
        }
        for mirror in &self.mirrors {
            if !ordered.iter().any(|m| m.url == mirror.url) {
                ordered.push(mirror.clone());
            }
        }
        ordered.retain(|m| !self.cooldown.has(&m.url));
        ordered
    }

    pub fn record_success(&self, mirror: &Mirror) {
        let mut sticky = self.sticky.write();
        let changed = sticky.as_ref().is_none_or(|s| s.mirror.url != mirror.url);
        *sticky = Some(StickyMirror {
            mirror: mirror.clone(),
            failure_count: 0,
        });
        if changed {
            log::info!("Sticky mirror set to: {}", mirror.name);
        }
    }

    pub fn record_failure(&self, mirror: &Mirror) {
        let mut guard = self.sticky.write();
        if let Some(sticky) = guard.as_mut() {
            if sticky.mirror.url == mirror.url {
                sticky.failure_count += 1;
                if sticky.failure_count >= MAX_STICKY_FAILURES {
                    log::warn!(
                        "Resetting sticky mirror {} after {} failures",
                        mirror.name,
                        sticky.failure_count
                    );
                    *guard = None;
                }
            }
        }
    }

    pub fn mark_rate_limited(&self, mirror: &Mirror) {
        log::warn!(
            "Mirror {} is rate limiting, cooling down for {}s",
            mirror.name,
            self.cooldown_ttl.as_secs()
        );
        self.cooldown.set(&mirror.url, self.cooldown_ttl);
    }

    /// Runs `call` against each candidate mirror until one succeeds.
    ///
    /// Terminal errors (the resource genuinely does not exist) stop the loop
    /// at once; anything else moves on to the next mirror.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, ProviderError>
    where
        F: FnMut(Mirror) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let candidates = self.candidates();
        if candidates.is_empty() {
            log::error!(
                "No mirror available for {} ({} configured, all cooling down)",
                operation,
                self.mirrors.len()
            );
            return Err(ProviderError::AllMirrorsFailed);
        }

        for (idx, mirror) in candidates.iter().enumerate() {
            log::debug!(
                "[{}/{}] Trying {} for {}",
                idx + 1,
                candidates.len(),
                mirror.name,
                operation
            );

            let outcome = tokio::time::timeout(self.attempt_timeout, call(mirror.clone()))
                .await
                .unwrap_or_else(|_| Err(ProviderError::Timeout(self.attempt_timeout)));

            match outcome {
                Ok(value) => {
                    self.record_success(mirror);
                    return Ok(value);
                }
                Err(e) if e.is_terminal() => {
                    log::info!("{} answered {} with: {}", mirror.name, operation, e);
                    return Err(e);
                }
                Err(ProviderError::RateLimited) => {
                    self.record_failure(mirror);
                    self.mark_rate_limited(mirror);
                }
                Err(e) => {
                    self.record_failure(mirror);
                    log::warn!(
                        "[{}/{}] {} failed: {}",
                        idx + 1,
                        candidates.len(),
                        mirror.name,
                        e
                    );
                }
            }
        }

        log::error!("All {} mirrors failed for {}", candidates.len(), operation);
        Err(ProviderError::AllMirrorsFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCooldownCache;
    use crate::clock::ManualClock;
    use parking_lot::Mutex;

    const TTL: Duration = Duration::from_secs(600);

    fn pool(clock: Arc<ManualClock>) -> MirrorPool {
        let urls: Vec<String> = ["https://a.example/", "https://b.example", "https://c.example"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        MirrorPool::new(&urls, Arc::new(MemoryCooldownCache::new(clock)), TTL)
    }

    /// Runs one pooled call where each mirror answers from `outcome`.
    async fn run_once(
        pool: &MirrorPool,
        outcome: impl Fn(&str) -> Result<u32, ProviderError>,
    ) -> (Result<u32, ProviderError>, Vec<String>) {
        let attempts = Mutex::new(Vec::new());
        let result = pool
            .run("test", |mirror| {
                attempts.lock().push(mirror.url.clone());
                let answer = outcome(&mirror.url);
                async move { answer }
            })
            .await;
        (result, attempts.into_inner())
    }

    #[test]
    fn mirror_names_come_from_hosts() {
        let mirror = Mirror::from_url("https://pipedapi.kavin.rocks/", 1);
        assert_eq!(mirror.name, "pipedapi.kavin.rocks");
        assert_eq!(mirror.url, "https://pipedapi.kavin.rocks");
    }

    #[tokio::test]
    async fn fails_over_to_next_mirror() {
        let pool = pool(Arc::new(ManualClock::default()));
        let (result, attempts) = run_once(&pool, |url| match url {
            "https://a.example" => Err(ProviderError::Failed("502".into())),
            _ => Ok(7),
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts, vec!["https://a.example", "https://b.example"]);

        // b is now sticky and tried first.
        let (_, attempts) = run_once(&pool, |_| Ok(1)).await;
        assert_eq!(attempts, vec!["https://b.example"]);
    }

    #[tokio::test]
    async fn service_unavailable_page_moves_to_next_mirror() {
        let pool = pool(Arc::new(ManualClock::default()));
        let (result, attempts) = run_once(&pool, |url| match url {
            "https://a.example" => Err(ProviderError::from_status(
                503,
                "<html><body>503 Service Unavailable</body></html>",
            )),
            _ => Ok(3),
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts, vec!["https://a.example", "https://b.example"]);
    }

    #[tokio::test]
    async fn slow_mirror_times_out_and_fails_over() {
        let pool = pool(Arc::new(ManualClock::default())).with_attempt_timeout(Duration::from_millis(100));
        let attempts = Mutex::new(Vec::new());

        let result = pool
            .run("test", |mirror| {
                attempts.lock().push(mirror.url.clone());
                async move {
                    if mirror.url == "https://a.example" {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                    Ok::<_, ProviderError>(5)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 5);
        assert_eq!(attempts.into_inner(), vec!["https://a.example", "https://b.example"]);
        assert_eq!(pool.candidates()[0].url, "https://b.example");
    }

    #[tokio::test]
    async fn rate_limited_mirrors_are_skipped_until_cooldown_expires() {
        let clock = Arc::new(ManualClock::default());
        let pool = pool(clock.clone());

        let (result, attempts) = run_once(&pool, |_| Err(ProviderError::RateLimited)).await;
        assert!(matches!(result, Err(ProviderError::AllMirrorsFailed)));
        assert_eq!(attempts.len(), 3);

        let (result, attempts) = run_once(&pool, |_| Ok(1)).await;
        assert!(matches!(result, Err(ProviderError::AllMirrorsFailed)));
        assert!(attempts.is_empty());

        clock.advance(TTL);
        let (result, attempts) = run_once(&pool, |_| Ok(1)).await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(attempts, vec!["https://a.example"]);
    }

    #[tokio::test]
    async fn cooled_down_mirror_is_left_out_of_candidates() {
        let pool = pool(Arc::new(ManualClock::default()));
        let (result, _) = run_once(&pool, |url| match url {
            "https://a.example" => Err(ProviderError::RateLimited),
            _ => Ok(2),
        })
        .await;
        assert_eq!(result.unwrap(), 2);

        let urls: Vec<String> = pool.candidates().into_iter().map(|m| m.url).collect();
        assert_eq!(urls, vec!["https://b.example", "https://c.example"]);
    }

    #[tokio::test]
    async fn not_found_is_terminal() {
        let pool = pool(Arc::new(ManualClock::default()));
        let (result, attempts) = run_once(&pool, |_| {
            Err(ProviderError::NotFound("Mix does not exist".into()))
        })
        .await;

        assert!(matches!(result, Err(ProviderError::NotFound(_))));
        assert_eq!(attempts, vec!["https://a.example"]);
    }

    #[tokio::test]
    async fn sticky_mirror_resets_after_repeated_failures() {
        let pool = pool(Arc::new(ManualClock::default()));
        let (_, _) = run_once(&pool, |url| match url {
            "https://a.example" => Err(ProviderError::Failed("down".into())),
            _ => Ok(1),
        })
        .await;
        assert_eq!(pool.candidates()[0].url, "https://b.example");

        for _ in 0..MAX_STICKY_FAILURES {
            let b = pool.candidates().remove(0);
            pool.record_failure(&b);
        }
        assert_eq!(pool.candidates()[0].url, "https://a.example");
    }
}
