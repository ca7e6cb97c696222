use crate::error::{IoError, IoOperation, IoResult};
use nix::sys::select::{select, FdSet};
use nix::sys::time::TimeVal;
use nix::Error;
use std::os::fd::{BorrowedFd, RawFd};

/// A set of descriptors to wait on for readability.
///
/// Each descriptor carries a caller supplied token which identifies the
/// ready event source.  The set is rebuilt before every wait so that event
/// sources can come and go between waits.
#[derive(Debug, Default)]
pub struct WaitSet<T> {
    entries: Vec<(RawFd, T)>,
}

impl<T: Copy> WaitSet<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn insert(&mut self, fd: RawFd, token: T) {
        self.entries.push((fd, token));
    }

    /// Block until at least one descriptor is readable and return the tokens
    /// of all which are.
    ///
    /// An interrupted wait returns no tokens.
    pub fn wait(&self) -> IoResult<Vec<T>> {
        #![allow(unsafe_code)]
        let mut readfds = FdSet::new();
        for (fd, _) in &self.entries {
            // Safety: the caller guarantees each descriptor in the set
            // remains open for the duration of the wait.
            readfds.insert(unsafe { BorrowedFd::borrow_raw(*fd) });
        }
        match select(None, Some(&mut readfds), None, None, None::<&mut TimeVal>) {
            Ok(_) => Ok(self
                .entries
                .iter()
                .filter(|(fd, _)| readfds.contains(unsafe { BorrowedFd::borrow_raw(*fd) }))
                .map(|&(_, token)| token)
                .collect()),
            Err(Error::EINTR) => Ok(Vec::new()),
            Err(err) => Err(IoError::Other(
                std::io::Error::from(err),
                IoOperation::Select,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::fcntl::OFlag;
    use nix::unistd::{pipe2, write};
    use std::os::fd::AsRawFd;

    #[derive(Debug, Copy, Clone, Eq, PartialEq)]
    enum Token {
        First,
        Second,
    }

    #[test]
    fn test_wait_returns_ready_token() {
        let (rd, wr) = pipe2(OFlag::O_NONBLOCK | OFlag::O_CLOEXEC).unwrap();
        let mut wait = WaitSet::new();
        wait.insert(rd.as_raw_fd(), Token::First);
        write(&wr, &[1]).unwrap();
        assert_eq!(vec![Token::First], wait.wait().unwrap());
    }

    #[test]
    fn test_wait_returns_only_ready_tokens() {
        let (rd_a, _wr_a) = pipe2(OFlag::O_NONBLOCK | OFlag::O_CLOEXEC).unwrap();
        let (rd_b, wr_b) = pipe2(OFlag::O_NONBLOCK | OFlag::O_CLOEXEC).unwrap();
        let mut wait = WaitSet::new();
        wait.insert(rd_a.as_raw_fd(), Token::First);
        wait.insert(rd_b.as_raw_fd(), Token::Second);
        write(&wr_b, &[1]).unwrap();
        assert_eq!(vec![Token::Second], wait.wait().unwrap());
    }

    #[test]
    fn test_wait_returns_all_ready_tokens() {
        let (rd_a, wr_a) = pipe2(OFlag::O_NONBLOCK | OFlag::O_CLOEXEC).unwrap();
        let (rd_b, wr_b) = pipe2(OFlag::O_NONBLOCK | OFlag::O_CLOEXEC).unwrap();
        let mut wait = WaitSet::new();
        wait.insert(rd_a.as_raw_fd(), Token::First);
        wait.insert(rd_b.as_raw_fd(), Token::Second);
        write(&wr_a, &[1]).unwrap();
        write(&wr_b, &[1]).unwrap();
        assert_eq!(vec![Token::First, Token::Second], wait.wait().unwrap());
    }

    #[test]
    fn test_cleared_set_can_be_rebuilt() {
        let (rd_a, wr_a) = pipe2(OFlag::O_NONBLOCK | OFlag::O_CLOEXEC).unwrap();
        let (rd_b, wr_b) = pipe2(OFlag::O_NONBLOCK | OFlag::O_CLOEXEC).unwrap();
        let mut wait = WaitSet::new();
        wait.insert(rd_a.as_raw_fd(), Token::First);
        write(&wr_a, &[1]).unwrap();
        write(&wr_b, &[1]).unwrap();
        assert_eq!(vec![Token::First], wait.wait().unwrap());
        wait.clear();
        wait.insert(rd_b.as_raw_fd(), Token::Second);
        assert_eq!(vec![Token::Second], wait.wait().unwrap());
    }
}
