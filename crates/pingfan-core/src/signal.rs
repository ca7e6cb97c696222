use crate::error::{IoError, IoOperation, IoResult};
use nix::sys::signal::{SigSet, Signal};
use nix::sys::signalfd::{SfdFlags, SignalFd};
use std::os::fd::{AsFd, AsRawFd, RawFd};
use tracing::instrument;

/// The signals which cancel a run.
fn interrupt_mask() -> SigSet {
    let mut mask = SigSet::empty();
    mask.add(Signal::SIGINT);
    mask.add(Signal::SIGTERM);
    mask
}

/// Block the interrupt signals for the calling thread.
///
/// Must be called before any threads are spawned so that every thread
/// inherits the mask and interrupts are only ever delivered via an
/// `InterruptSource`.
pub fn block_signals() -> IoResult<()> {
    interrupt_mask()
        .thread_block()
        .map_err(|err| IoError::Other(std::io::Error::from(err), IoOperation::SetSignalMask))
}

/// A source of interrupt notifications backed by a `signalfd`.
///
/// `SIGINT` and `SIGTERM` are blocked for the calling thread and delivered
/// through the descriptor instead, which becomes readable when an interrupt
/// arrives.  Reading never blocks.
#[derive(Debug)]
pub struct InterruptSource {
    inner: SignalFd,
}

impl InterruptSource {
    #[instrument(level = "trace")]
    pub fn new() -> IoResult<Self> {
        block_signals()?;
        let inner = SignalFd::with_flags(
            &interrupt_mask(),
            SfdFlags::SFD_NONBLOCK | SfdFlags::SFD_CLOEXEC,
        )
        .map_err(|err| IoError::Other(std::io::Error::from(err), IoOperation::NewSignal))?;
        Ok(Self { inner })
    }

    /// Whether an interrupt has arrived, without blocking.
    pub fn take(&mut self) -> IoResult<bool> {
        match self.inner.read_signal() {
            Ok(Some(_)) => Ok(true),
            Ok(None) => Ok(false),
            Err(err) => Err(IoError::Other(
                std::io::Error::from(err),
                IoOperation::ReadSignal,
            )),
        }
    }
}

impl AsRawFd for InterruptSource {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_fd().as_raw_fd()
    }
}
