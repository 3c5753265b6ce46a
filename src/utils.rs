//!
//! Small helpers of the adapters
//!
use std::time::Instant;

///
/// measure time in milli-seconds (ms) of closure.
///
pub fn timer<F, T>(f: F) -> (T, u128)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let ret = f();
    let duration = start.elapsed();
    (ret, duration.as_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_returns_value() {
        let (x, ms) = timer(|| (0..1000u64).sum::<u64>());
        assert_eq!(x, 499500);
        assert!(ms < 10_000);
    }
}
