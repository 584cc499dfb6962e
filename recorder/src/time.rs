//! Monotonic tick sources used to stamp events
use std::sync::atomic::{AtomicU32, Ordering};

/// Provides the timestamp of events. Must be callable from any context.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> u32;
}

/// Hardware tick counter truncated to 32 bits, wraps like a free running timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TickCounter;

impl TimeSource for TickCounter {
    fn now(&self) -> u32 {
        now() as u32
    }
}

/// Deterministic clock, every read returns the next tick.
#[derive(Debug, Default)]
pub struct ManualClock {
    ticks: AtomicU32,
}

impl ManualClock {
    pub fn new(start: u32) -> Self {
        Self {
            ticks: AtomicU32::new(start),
        }
    }

    /// value the next read will return
    pub fn peek(&self) -> u32 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn advance(&self, ticks: u32) {
        self.ticks.fetch_add(ticks, Ordering::Relaxed);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> u32 {
        self.ticks.fetch_add(1, Ordering::Relaxed)
    }
}

impl<F> TimeSource for F
where
    F: Fn() -> u32 + Send + Sync,
{
    fn now(&self) -> u32 {
        self()
    }
}

#[cfg(windows)]
pub fn now_windows() -> i64 {
    unsafe {
        let mut tick_count = std::mem::zeroed();
        winapi::um::profileapi::QueryPerformanceCounter(&mut tick_count);
        *tick_count.QuadPart() as i64
    }
}

#[cfg(windows)]
pub fn freq_windows() -> i64 {
    unsafe {
        let mut tick_count = std::mem::zeroed();
        winapi::um::profileapi::QueryPerformanceFrequency(&mut tick_count);
        *tick_count.QuadPart() as i64
    }
}

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        pub fn now() -> i64 {
            now_windows()
        }
    } else if #[cfg(target_arch = "x86_64")] {
        #[allow(clippy::cast_possible_wrap)]
        pub fn now() -> i64 {
            //_rdtsc does not wait for previous instructions to be retired
            use core::arch::x86_64::_rdtsc;
            unsafe { _rdtsc() as i64 }
        }
    } else if #[cfg(target_arch = "aarch64")] {
        #[allow(clippy::cast_possible_wrap)]
        pub fn now() -> i64 {
            let tick_counter: i64;
            unsafe {
                core::arch::asm!(
                    "mrs x0, cntvct_el0",
                    out("x0") tick_counter
                );
            }
            tick_counter
        }
    } else {
        pub fn now() -> i64 {
            lazy_static! {
                static ref START: std::time::Instant = std::time::Instant::now();
            }
            START.elapsed().as_nanos() as i64
        }
    }
}

/// Ticks per second of [`now`], 0 when the hardware does not report it.
/// Stored next to captures so that timestamps can be converted to time.
#[allow(unreachable_code)]
pub fn frequency() -> i64 {
    #[cfg(windows)]
    return freq_windows();

    #[cfg(target_arch = "x86_64")]
    {
        let cpuid = raw_cpuid::CpuId::new();
        return cpuid
            .get_tsc_info()
            .map(|tsc_info| tsc_info.tsc_frequency().unwrap_or(0))
            .unwrap_or(0) as i64;
    }
    #[cfg(target_arch = "aarch64")]
    {
        let counter_frequency: i64;
        unsafe {
            core::arch::asm!(
                "mrs x0, cntfrq_el0",
                out("x0") counter_frequency
            );
        }
        return counter_frequency;
    }
    #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
    return 1_000_000_000;
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(10);
        assert_eq!(clock.now(), 10);
        assert_eq!(clock.now(), 11);
        clock.advance(5);
        assert_eq!(clock.peek(), 17);
    }

    #[test]
    fn test_closure_source() {
        let source = || 42_u32;
        assert_eq!(TimeSource::now(&source), 42);
    }

    #[test]
    fn test_tick_counter_moves_forward() {
        let first = TickCounter.now();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let second = TickCounter.now();
        let elapsed = second.wrapping_sub(first);
        assert!(elapsed > 0);
        assert!(elapsed < u32::MAX / 2);
    }

    #[test]
    #[cfg(target_arch = "aarch64")]
    fn test_counter_frequency() {
        assert!(frequency() > 0);
    }

    #[test]
    #[cfg(not(any(windows, target_arch = "x86_64", target_arch = "aarch64")))]
    fn test_fallback_frequency() {
        assert_eq!(frequency(), 1_000_000_000);
    }
}
