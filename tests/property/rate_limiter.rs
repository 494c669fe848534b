//! Property tests for the token bucket.
//!
//! Invariants tested:
//! - Admissions never exceed the burst plus what the elapsed time refilled
//! - Available tokens stay within `[0, capacity]`
//! - A denial reports the time needed to earn one token
//! - Waiting the reported time is enough to be admitted again

use super::paused_runtime;
use proptest::collection::vec;
use proptest::prelude::*;
use reqflow_ratelimiter::{RateLimiter, RateLimiterError};
use std::time::Duration;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: admitted requests are bounded by burst + rate × elapsed
    #[test]
    fn admissions_bounded_by_refill(
        rps in 0.5f64..50.0,
        burst in 1u32..30,
        steps in vec((0u64..500, 1usize..10), 1..20),
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let limiter = RateLimiter::builder()
                .max_requests_per_second(rps)
                .burst_capacity(f64::from(burst))
                .build();

            let mut admitted = 0usize;
            let mut elapsed_ms = 0u64;

            for (advance_ms, attempts) in steps {
                tokio::time::advance(Duration::from_millis(advance_ms)).await;
                elapsed_ms += advance_ms;

                for _ in 0..attempts {
                    if limiter.consume().is_ok() {
                        admitted += 1;
                    }
                }

                let bound = f64::from(burst) + rps * elapsed_ms as f64 / 1000.0;
                prop_assert!(
                    admitted as f64 <= bound + 1e-9,
                    "admitted {} but bound was {}",
                    admitted,
                    bound
                );

                let available = limiter.available_tokens();
                prop_assert!(available >= 0.0);
                prop_assert!(available <= f64::from(burst));
            }

            Ok(())
        })?;
    }

    /// Property: a full bucket admits exactly its whole-token capacity at once
    #[test]
    fn full_bucket_admits_burst(
        rps in 0.1f64..100.0,
        burst in 1u32..100,
    ) {
        let rt = paused_runtime();
        rt.block_on(async {
            let limiter = RateLimiter::builder()
                .max_requests_per_second(rps)
                .burst_capacity(f64::from(burst))
                .build();

            let admitted = (0..burst * 2).filter(|_| limiter.consume().is_ok()).count();
            prop_assert_eq!(admitted, burst as usize);

            Ok(())
        })?;
    }

    /// Property: retry_after is the time to accumulate one token
    #[test]
    fn denial_reports_time_per_token(rps in 0.1f64..1000.0) {
        let rt = paused_runtime();
        rt.block_on(async {
            let limiter = RateLimiter::builder()
                .max_requests_per_second(rps)
                .burst_capacity(1.0)
                .build();

            prop_assert!(limiter.consume().is_ok());
            let err = limiter.consume().unwrap_err();
            let denied = matches!(err, RateLimiterError::RateLimitExceeded { .. });
            prop_assert!(denied);
            let retry_after = err.retry_after().unwrap().as_secs_f64();
            prop_assert!((retry_after - 1.0 / rps).abs() < 1e-6);

            Ok(())
        })?;
    }

    /// Property: honouring retry_after always earns the next admission
    #[test]
    fn waiting_retry_after_admits(rps in 0.1f64..1000.0) {
        let rt = paused_runtime();
        rt.block_on(async {
            let limiter = RateLimiter::builder()
                .max_requests_per_second(rps)
                .burst_capacity(1.0)
                .build();

            prop_assert!(limiter.consume().is_ok());
            let retry_after = limiter.consume().unwrap_err().retry_after().unwrap();

            tokio::time::advance(retry_after).await;
            prop_assert!(
                limiter.consume().is_ok(),
                "denied after waiting {:?} at {} rps",
                retry_after,
                rps
            );
            prop_assert!(limiter.consume().is_err());

            Ok(())
        })?;
    }
}
