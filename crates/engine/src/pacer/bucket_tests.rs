// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test(start_paused = true)]
async fn burst_tokens_are_available_immediately() {
    let bucket = TokenBucket::new(1.0, 3);
    let start = Instant::now();
    bucket.acquire().await;
    bucket.acquire().await;
    bucket.acquire().await;
    assert_eq!(Instant::now(), start, "burst should not wait");
}

#[tokio::test(start_paused = true)]
async fn exhausted_bucket_waits_for_refill() {
    let bucket = TokenBucket::new(2.0, 1);
    let start = Instant::now();
    bucket.acquire().await; // the banked token
    bucket.acquire().await; // must wait ~0.5s at 2/s
    let elapsed = Instant::now() - start;
    assert!(
        elapsed >= Duration::from_millis(490) && elapsed <= Duration::from_millis(600),
        "elapsed {elapsed:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn sustained_rate_is_honored() {
    let bucket = TokenBucket::new(10.0, 1);
    let start = Instant::now();
    for _ in 0..11 {
        bucket.acquire().await;
    }
    // 1 banked + 10 refilled over ~1s.
    let elapsed = Instant::now() - start;
    assert!(elapsed >= Duration::from_millis(950), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn zero_rate_disables_the_bucket() {
    let bucket = TokenBucket::new(0.0, 1);
    let start = Instant::now();
    for _ in 0..100 {
        bucket.acquire().await;
    }
    assert_eq!(Instant::now(), start);
}
