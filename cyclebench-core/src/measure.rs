//! Cycle-Accurate Timestamps
//!
//! Serialized reads of the CPU cycle counter. The start of a timed window
//! always serializes (CPUID) before reading the counter; the end of the
//! window comes in two flavours:
//!
//! - **Fast**: RDTSCP, which waits for every earlier instruction to retire
//!   before reading the counter, followed by CPUID so later instructions
//!   cannot start early.
//! - **Fallback**: CPUID, RDTSC, CPUID. Used when RDTSCP is missing or when
//!   forced from the command line. Strictly more expensive.
//!
//! AArch64 reads `CNTVCT_EL0` behind `isb` barriers. Other targets fall back
//! to a nanosecond counter derived from `std::time::Instant`.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Whether this platform provides a hardware cycle counter.
/// When `false`, "cycles" are nanoseconds since the first timestamp read.
pub const HAS_CYCLE_COUNTER: bool = cfg!(target_arch = "x86_64") || cfg!(target_arch = "aarch64");

// ─── Strategy ────────────────────────────────────────────────────────────────

/// How the end of a timed window is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampStrategy {
    /// Single serializing read (RDTSCP + CPUID on x86_64)
    Fast,
    /// Explicit serialization on both sides of a plain read (CPUID + RDTSC + CPUID)
    Fallback,
}

impl TimestampStrategy {
    /// Pick the cheapest strategy the hardware supports.
    pub fn detect() -> Self {
        if supports_fast_path() {
            TimestampStrategy::Fast
        } else {
            TimestampStrategy::Fallback
        }
    }

    /// Strategy to use, honouring a request to force the fallback path.
    pub fn resolve(force_fallback: bool) -> Self {
        if force_fallback {
            TimestampStrategy::Fallback
        } else {
            Self::detect()
        }
    }

    /// `self`, downgraded to `Fallback` when the CPU lacks the fast read.
    pub fn supported(self) -> Self {
        match self {
            TimestampStrategy::Fast if !supports_fast_path() => TimestampStrategy::Fallback,
            other => other,
        }
    }

    /// Short label for diagnostics
    pub fn name(self) -> &'static str {
        match self {
            TimestampStrategy::Fast => "rdtscp",
            TimestampStrategy::Fallback => "rdtsc",
        }
    }
}

impl Default for TimestampStrategy {
    fn default() -> Self {
        Self::detect()
    }
}

/// Compile-time selection of the end-of-window read.
///
/// The runner's timed loop is generic over this trait so that the hot path
/// carries no branch on the strategy. Only reachable inside the crate; the
/// runner picks `FastEnd` from a strategy that went through
/// [`TimestampStrategy::supported`].
pub(crate) trait EndRead {
    /// Read the counter at the end of a timed window
    fn read_end() -> u64;
}

/// Marker for [`TimestampStrategy::Fast`]
#[derive(Debug, Clone, Copy)]
pub(crate) struct FastEnd;

/// Marker for [`TimestampStrategy::Fallback`]
#[derive(Debug, Clone, Copy)]
pub(crate) struct FallbackEnd;

impl EndRead for FastEnd {
    #[inline(always)]
    fn read_end() -> u64 {
        arch::read_end_fast()
    }
}

impl EndRead for FallbackEnd {
    #[inline(always)]
    fn read_end() -> u64 {
        arch::read_end_fallback()
    }
}

// ─── Public reads ────────────────────────────────────────────────────────────

/// Read the counter at the start of a timed window (serialize, then read).
#[inline(always)]
pub fn read_start() -> u64 {
    arch::read_start()
}

/// Read the counter at the end of a timed window.
///
/// A `Fast` request on a CPU without the fast read uses the fallback.
#[inline(always)]
pub fn read_end(strategy: TimestampStrategy) -> u64 {
    match strategy.supported() {
        TimestampStrategy::Fast => FastEnd::read_end(),
        TimestampStrategy::Fallback => FallbackEnd::read_end(),
    }
}

/// Whether the fast end-of-window read is available on this CPU.
pub fn supports_fast_path() -> bool {
    static FAST: OnceLock<bool> = OnceLock::new();
    *FAST.get_or_init(arch::supports_fast_path)
}

#[cfg(target_arch = "x86_64")]
mod arch {
    // Some of these intrinsics are safe on newer toolchains
    #![allow(unused_unsafe)]

    use std::arch::x86_64::{__cpuid, __rdtscp, _rdtsc};

    /// CPUID.80000001H:EDX bit 27
    const RDTSCP_BIT: u32 = 1 << 27;
    const EXTENDED_FEATURES_LEAF: u32 = 0x8000_0001;

    #[inline(always)]
    fn serialize() {
        // SAFETY: CPUID is available on every x86_64 CPU; leaf 0 is always valid.
        unsafe {
            __cpuid(0);
        }
    }

    #[inline(always)]
    pub fn read_start() -> u64 {
        serialize();
        // SAFETY: RDTSC is available on every x86_64 CPU.
        unsafe {
            _rdtsc()
        }
    }

    #[inline(always)]
    pub fn read_end_fast() -> u64 {
        let mut aux: u32 = 0;
        // SAFETY: `FastEnd` is only chosen from `TimestampStrategy::supported`,
        // which checked the RDTSCP feature bit.
        let tsc = unsafe { __rdtscp(&mut aux) };
        serialize();
        tsc
    }

    #[inline(always)]
    pub fn read_end_fallback() -> u64 {
        serialize();
        // SAFETY: RDTSC is available on every x86_64 CPU.
        let tsc = unsafe { _rdtsc() };
        serialize();
        tsc
    }

    pub fn supports_fast_path() -> bool {
        // SAFETY: CPUID is available on every x86_64 CPU; extended leaves are
        // only queried after checking the maximum supported one.
        unsafe {
            let max_extended = __cpuid(0x8000_0000).eax;
            if max_extended < EXTENDED_FEATURES_LEAF {
                return false;
            }
            __cpuid(EXTENDED_FEATURES_LEAF).edx & RDTSCP_BIT != 0
        }
    }
}

#[cfg(target_arch = "aarch64")]
mod arch {
    #[inline(always)]
    fn isb() {
        // SAFETY: ISB is an unprivileged barrier.
        unsafe {
            std::arch::asm!("isb", options(nostack, preserves_flags));
        }
    }

    #[inline(always)]
    fn cntvct() -> u64 {
        let cnt: u64;
        // SAFETY: CNTVCT_EL0 is readable from EL0 on all AArch64 implementations.
        unsafe {
            std::arch::asm!("mrs {}, cntvct_el0", out(reg) cnt, options(nostack));
        }
        cnt
    }

    #[inline(always)]
    pub fn read_start() -> u64 {
        isb();
        cntvct()
    }

    #[inline(always)]
    pub fn read_end_fast() -> u64 {
        isb();
        cntvct()
    }

    #[inline(always)]
    pub fn read_end_fallback() -> u64 {
        isb();
        let cnt = cntvct();
        isb();
        cnt
    }

    pub fn supports_fast_path() -> bool {
        true
    }
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
mod arch {
    use std::sync::OnceLock;
    use std::time::Instant;

    fn nanos() -> u64 {
        static ORIGIN: OnceLock<Instant> = OnceLock::new();
        ORIGIN.get_or_init(Instant::now).elapsed().as_nanos() as u64
    }

    #[inline(always)]
    pub fn read_start() -> u64 {
        nanos()
    }

    #[inline(always)]
    pub fn read_end_fast() -> u64 {
        nanos()
    }

    #[inline(always)]
    pub fn read_end_fallback() -> u64 {
        nanos()
    }

    pub fn supports_fast_path() -> bool {
        false
    }
}

// ─── Calibration ─────────────────────────────────────────────────────────────

/// Wall-clock window used for calibration
const CALIBRATION_WINDOW: Duration = Duration::from_micros(1000);

/// Counter ticks per microsecond of wall time.
///
/// The first call spins for about a millisecond; the result is cached for
/// the rest of the process. Only used to render cycles as microseconds.
pub fn cycles_per_microsecond() -> u64 {
    static CLOCKS: OnceLock<u64> = OnceLock::new();
    *CLOCKS.get_or_init(calibrate)
}

fn calibrate() -> u64 {
    let strategy = TimestampStrategy::detect();

    // Align to a clock tick so the window starts on a boundary
    let origin = Instant::now();
    let mut tick = Instant::now();
    while tick == origin {
        tick = Instant::now();
    }

    let start = read_start();
    let deadline = tick + CALIBRATION_WINDOW;
    while Instant::now() < deadline {
        std::hint::spin_loop();
    }
    let end = read_end(strategy);

    let clocks = end.wrapping_sub(start) / CALIBRATION_WINDOW.as_micros() as u64;
    tracing::debug!(clocks, strategy = strategy.name(), "calibrated cycle counter");
    clocks.max(1)
}

// ─── CPU affinity ────────────────────────────────────────────────────────────

/// Highest core id (exclusive) that can be expressed in an affinity mask.
#[cfg(target_os = "linux")]
pub fn max_pinnable_cpus() -> usize {
    libc::CPU_SETSIZE as usize
}

/// Highest core id (exclusive) that can be expressed in an affinity mask.
#[cfg(not(target_os = "linux"))]
pub fn max_pinnable_cpus() -> usize {
    usize::MAX
}

/// Pin the current process to a single core.
///
/// Callers must check `cpu < max_pinnable_cpus()` first.
#[cfg(target_os = "linux")]
pub fn pin_to_cpu(cpu: usize) -> Result<(), std::io::Error> {
    use std::mem::MaybeUninit;

    if cpu >= max_pinnable_cpus() {
        return Err(std::io::Error::from_raw_os_error(libc::EINVAL));
    }

    unsafe {
        let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
        let set_ref = set.assume_init_mut();

        libc::CPU_ZERO(set_ref);
        libc::CPU_SET(cpu, set_ref);

        let result = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref);

        if result == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

#[cfg(not(target_os = "linux"))]
pub fn pin_to_cpu(_cpu: usize) -> Result<(), std::io::Error> {
    // CPU pinning not supported on this platform
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_is_monotonic() {
        for strategy in [TimestampStrategy::Fast, TimestampStrategy::Fallback] {
            let a = read_start();
            let b = read_end(strategy);
            assert!(b >= a, "counter went backwards with {:?}", strategy);
        }
    }

    #[test]
    fn test_resolve_forced_fallback() {
        assert_eq!(TimestampStrategy::resolve(true), TimestampStrategy::Fallback);
        assert_eq!(TimestampStrategy::resolve(false), TimestampStrategy::detect());
    }

    #[test]
    fn test_detect_matches_probe() {
        let expected = if supports_fast_path() {
            TimestampStrategy::Fast
        } else {
            TimestampStrategy::Fallback
        };
        assert_eq!(TimestampStrategy::detect(), expected);
    }

    #[test]
    fn test_fast_request_follows_hardware() {
        assert_eq!(TimestampStrategy::Fast.supported(), TimestampStrategy::detect());
        assert_eq!(
            TimestampStrategy::Fallback.supported(),
            TimestampStrategy::Fallback
        );
    }

    #[test]
    fn test_calibration_is_cached() {
        let first = cycles_per_microsecond();
        let second = cycles_per_microsecond();
        assert!(first >= 1);
        assert_eq!(first, second);
    }

    #[test]
    fn test_spin_is_measurable() {
        let start = read_start();
        let deadline = Instant::now() + Duration::from_micros(200);
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
        let end = read_end(TimestampStrategy::Fallback);
        assert!(end > start);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_pin_rejects_out_of_range_core() {
        assert!(pin_to_cpu(max_pinnable_cpus()).is_err());
    }
}
