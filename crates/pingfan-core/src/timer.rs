use crate::error::{IoError, IoOperation, IoResult};
use nix::errno::Errno;
use nix::sys::time::TimeSpec;
use nix::sys::timerfd::{ClockId, Expiration, TimerFd, TimerFlags, TimerSetTimeFlags};
use std::os::fd::{AsFd, AsRawFd, RawFd};
use std::time::Duration;
use tracing::instrument;

/// A countdown timer backed by a `timerfd`.
///
/// The timer may be armed as periodic or one-shot and the descriptor becomes
/// readable when the timer expires.  Expirations accumulate while unread and
/// so a slow reader observes every missed period as an expiration count
/// rather than losing them.  Reading never blocks.
#[derive(Debug)]
pub struct CountdownTimer {
    inner: TimerFd,
}

impl CountdownTimer {
    #[instrument(level = "trace")]
    pub fn new() -> IoResult<Self> {
        let inner = TimerFd::new(
            ClockId::CLOCK_MONOTONIC,
            TimerFlags::TFD_NONBLOCK | TimerFlags::TFD_CLOEXEC,
        )
        .map_err(|err| IoError::Other(std::io::Error::from(err), IoOperation::NewTimer))?;
        Ok(Self { inner })
    }

    /// Arm the timer to expire every `period`, the first time immediately.
    ///
    /// A zero period is clamped to the shortest period the timer supports.
    #[instrument(skip(self), level = "trace")]
    pub fn arm_periodic(&self, period: Duration) -> IoResult<()> {
        let period = period.max(Duration::from_nanos(1));
        self.inner
            .set(
                Expiration::IntervalDelayed(
                    TimeSpec::from_duration(Duration::from_nanos(1)),
                    TimeSpec::from_duration(period),
                ),
                TimerSetTimeFlags::empty(),
            )
            .map_err(|err| IoError::Other(std::io::Error::from(err), IoOperation::SetTimer))
    }

    /// Arm the timer to expire once after `timeout`, replacing any previous
    /// setting and discarding unread expirations.
    ///
    /// A zero timeout is clamped to the shortest timeout the timer supports.
    #[instrument(skip(self), level = "trace")]
    pub fn arm_oneshot(&self, timeout: Duration) -> IoResult<()> {
        let timeout = timeout.max(Duration::from_nanos(1));
        self.inner
            .set(
                Expiration::OneShot(TimeSpec::from_duration(timeout)),
                TimerSetTimeFlags::empty(),
            )
            .map_err(|err| IoError::Other(std::io::Error::from(err), IoOperation::SetTimer))
    }

    /// Disarm the timer, discarding unread expirations.
    #[instrument(skip(self), level = "trace")]
    pub fn disarm(&self) -> IoResult<()> {
        self.inner
            .unset()
            .map_err(|err| IoError::Other(std::io::Error::from(err), IoOperation::SetTimer))
    }

    /// The number of expirations since the last read, without blocking.
    pub fn ticks(&self) -> IoResult<u64> {
        let mut buf = [0_u8; 8];
        match nix::unistd::read(self.inner.as_fd().as_raw_fd(), &mut buf) {
            Ok(8) => Ok(u64::from_ne_bytes(buf)),
            Ok(_) | Err(Errno::EAGAIN | Errno::EINTR) => Ok(0),
            Err(err) => Err(IoError::Other(
                std::io::Error::from(err),
                IoOperation::ReadTimer,
            )),
        }
    }
}

impl AsRawFd for CountdownTimer {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_fd().as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_unarmed_timer_has_no_ticks() {
        let timer = CountdownTimer::new().unwrap();
        assert_eq!(0, timer.ticks().unwrap());
    }

    #[test]
    fn test_periodic_timer_ticks() {
        let timer = CountdownTimer::new().unwrap();
        timer.arm_periodic(Duration::from_millis(1)).unwrap();
        sleep(Duration::from_millis(20));
        assert!(timer.ticks().unwrap() >= 1);
    }

    #[test]
    fn test_periodic_timer_first_expiration_is_immediate() {
        let timer = CountdownTimer::new().unwrap();
        timer.arm_periodic(Duration::from_secs(3600)).unwrap();
        sleep(Duration::from_millis(20));
        assert_eq!(1, timer.ticks().unwrap());
    }

    #[test]
    fn test_periodic_timer_accumulates_missed_periods() {
        let timer = CountdownTimer::new().unwrap();
        timer.arm_periodic(Duration::from_millis(1)).unwrap();
        sleep(Duration::from_millis(50));
        assert!(timer.ticks().unwrap() > 1);
    }

    #[test]
    fn test_zero_period_is_clamped() {
        let timer = CountdownTimer::new().unwrap();
        timer.arm_periodic(Duration::ZERO).unwrap();
        sleep(Duration::from_millis(10));
        assert!(timer.ticks().unwrap() >= 1);
    }

    #[test]
    fn test_oneshot_timer_ticks_once() {
        let timer = CountdownTimer::new().unwrap();
        timer.arm_oneshot(Duration::from_millis(1)).unwrap();
        sleep(Duration::from_millis(20));
        assert_eq!(1, timer.ticks().unwrap());
        sleep(Duration::from_millis(20));
        assert_eq!(0, timer.ticks().unwrap());
    }

    #[test]
    fn test_rearm_replaces_pending_expirations() {
        let timer = CountdownTimer::new().unwrap();
        timer.arm_periodic(Duration::from_millis(1)).unwrap();
        sleep(Duration::from_millis(20));
        timer.arm_oneshot(Duration::from_secs(3600)).unwrap();
        assert_eq!(0, timer.ticks().unwrap());
    }

    #[test]
    fn test_disarmed_timer_stops_ticking() {
        let timer = CountdownTimer::new().unwrap();
        timer.arm_periodic(Duration::from_millis(1)).unwrap();
        timer.disarm().unwrap();
        let _ = timer.ticks().unwrap();
        sleep(Duration::from_millis(20));
        assert_eq!(0, timer.ticks().unwrap());
    }
}
