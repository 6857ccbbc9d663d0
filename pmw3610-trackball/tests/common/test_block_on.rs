//! `block_on` which drives the embassy-time mock clock
use core::future::Future;
use core::pin::pin;
use core::task::{Context, Poll, Waker};

use embassy_time::{Duration, Instant, MockDriver};

/// Mock time step between two polls
const TICK: Duration = Duration::from_micros(10);
/// A future still pending after this much mock time is stuck
const STALL_LIMIT: Duration = Duration::from_secs(30);

/// Poll `fut` to completion, advancing the mock clock whenever it's pending
pub fn test_block_on<F: Future>(fut: F) -> F::Output {
    let mut fut = pin!(fut);
    let mut cx = Context::from_waker(Waker::noop());
    let driver = MockDriver::get();
    let start = Instant::now();
    loop {
        if let Poll::Ready(output) = fut.as_mut().poll(&mut cx) {
            return output;
        }
        assert!(start.elapsed() < STALL_LIMIT, "Test future stalled");
        driver.advance(TICK);
    }
}
