//! Per-client request limiting.
//!
//! Each client IP gets a token bucket sized by a rate expression such as
//! `10/m` (ten requests per minute) or `100/5m`. A request that finds its
//! bucket empty is rejected immediately; nothing is queued.

use crate::{Error, Result};
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    str::FromStr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Buckets are pruned once the map grows past this many clients.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateSpec {
    pub count: u32,
    pub period: Duration,
}

impl FromStr for RateSpec {
    type Err = Error;

    /// Parses `<count>/[<multiplier>]<unit>` where unit is one of `s`, `m`,
    /// `h`, `d`. A missing unit means seconds.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::config(format!("Invalid rate limit '{s}', expected e.g. '10/m'"));

        let (count, rest) = s.trim().split_once('/').ok_or_else(invalid)?;
        let count: u32 = count.parse().map_err(|_| invalid())?;
        if count == 0 {
            return Err(invalid());
        }

        let digits = rest.chars().take_while(char::is_ascii_digit).count();
        let (multiplier, unit) = rest.split_at(digits);
        let multiplier: u64 = if multiplier.is_empty() {
            1
        } else {
            multiplier.parse().map_err(|_| invalid())?
        };
        if multiplier == 0 {
            return Err(invalid());
        }

        let unit_secs = match unit.to_ascii_lowercase().as_str() {
            "" | "s" => 1,
            "m" => 60,
            "h" => 3_600,
            "d" => 86_400,
            _ => return Err(invalid()),
        };

        Ok(Self {
            count,
            period: Duration::from_secs(unit_secs * multiplier),
        })
    }
}

struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_rate: f64, // tokens per second
    last_update: Instant,
}

impl TokenBucket {
    fn new(spec: RateSpec, now: Instant) -> Self {
        let capacity = spec.count as f64;
        Self {
            capacity,
            tokens: capacity,
            refill_rate: capacity / spec.period.as_secs_f64(),
            last_update: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_update = now;
    }

    fn try_consume(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn is_full(&self) -> bool {
        self.tokens >= self.capacity
    }
}

pub struct RateLimiter {
    spec: RateSpec,
    buckets: Mutex<HashMap<Option<IpAddr>, TokenBucket>>,
}

impl RateLimiter {
    pub fn new(spec: RateSpec) -> Self {
        Self {
            spec,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Takes one token for `client`. Returns false when the client is over
    /// its limit. Clients without a known address share one bucket.
    pub async fn check(&self, client: Option<IpAddr>) -> bool {
        self.check_at(client, Instant::now()).await
    }

    async fn check_at(&self, client: Option<IpAddr>, now: Instant) -> bool {
        let mut buckets = self.buckets.lock().await;

        if buckets.len() >= PRUNE_THRESHOLD {
            buckets.retain(|_, bucket| {
                bucket.refill(now);
                !bucket.is_full()
            });
            debug!("Pruned rate limit buckets, {} remain", buckets.len());
        }

        buckets
            .entry(client)
            .or_insert_with(|| TokenBucket::new(self.spec, now))
            .try_consume(now)
    }
}

/// axum middleware keyed by the peer address from `ConnectInfo`.
pub async fn limit_by_ip(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if limiter.check(client).await {
        next.run(request).await
    } else {
        warn!("Rate limit exceeded for client {:?}", client);
        Error::RateLimited.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("10/m", 10, 60)]
    #[case("5/s", 5, 1)]
    #[case("100/5m", 100, 300)]
    #[case("1000/h", 1000, 3_600)]
    #[case("3/d", 3, 86_400)]
    #[case("7/", 7, 1)]
    #[case("2/M", 2, 60)]
    fn test_parse_rate_spec(#[case] raw: &str, #[case] count: u32, #[case] secs: u64) {
        assert_eq!(
            raw.parse::<RateSpec>().unwrap(),
            RateSpec {
                count,
                period: Duration::from_secs(secs)
            }
        );
    }

    #[rstest]
    #[case("")]
    #[case("5")]
    #[case("0/m")]
    #[case("ten/m")]
    #[case("10/w")]
    #[case("10/0m")]
    #[case("10/minute")]
    fn test_parse_rate_spec_rejects(#[case] raw: &str) {
        assert!(matches!(raw.parse::<RateSpec>(), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_limiter_blocks_after_capacity() {
        let limiter = RateLimiter::new("3/m".parse().unwrap());
        let client = Some("10.0.0.1".parse().unwrap());
        let now = Instant::now();

        for _ in 0..3 {
            assert!(limiter.check_at(client, now).await);
        }
        assert!(!limiter.check_at(client, now).await);
    }

    #[tokio::test]
    async fn test_limiter_refills_over_time() {
        let limiter = RateLimiter::new("2/m".parse().unwrap());
        let client = Some("10.0.0.1".parse().unwrap());
        let now = Instant::now();

        assert!(limiter.check_at(client, now).await);
        assert!(limiter.check_at(client, now).await);
        assert!(!limiter.check_at(client, now).await);

        // One token every 30 seconds.
        let later = now + Duration::from_secs(31);
        assert!(limiter.check_at(client, later).await);
        assert!(!limiter.check_at(client, later).await);
    }

    #[tokio::test]
    async fn test_limiter_keys_are_independent() {
        let limiter = RateLimiter::new("1/m".parse().unwrap());
        let now = Instant::now();
        let a = Some("10.0.0.1".parse().unwrap());
        let b = Some("10.0.0.2".parse().unwrap());

        assert!(limiter.check_at(a, now).await);
        assert!(!limiter.check_at(a, now).await);
        assert!(limiter.check_at(b, now).await);
        assert!(limiter.check_at(None, now).await);
        assert!(!limiter.check_at(None, now).await);
    }
}
