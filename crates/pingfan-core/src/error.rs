use std::fmt::{Display, Formatter};
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// A prober error result.
pub type Result<T> = std::result::Result<T, Error>;

/// A prober error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid config: {0}")]
    BadConfig(String),
    #[error("invalid packet: {0}")]
    Packet(#[from] pingfan_packet::error::Error),
    #[error("IO error: {0}")]
    IoError(#[from] IoError),
    #[error("probe failed to send: {0}")]
    ProbeFailed(IoError),
    #[error("no {0} socket for target")]
    MissingSocket(&'static str),
    #[error("failed to open a socket for any address family")]
    SocketUnavailable,
}

/// Custom IO error result.
pub type IoResult<T> = std::result::Result<T, IoError>;

/// Custom IO error.
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Sendto error for {1}: {0}")]
    SendTo(io::Error, SocketAddr),
    #[error("Failed to {0}: {1}")]
    Other(io::Error, IoOperation),
}

impl IoError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SendTo(io, _) | Self::Other(io, _) => ErrorKind::from(io),
        }
    }
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::SendTo(io, _) | Self::Other(io, _) => io.raw_os_error(),
        }
    }
}

/// IO operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOperation {
    NewSocket,
    SetNonBlocking,
    SetHeaderIncluded,
    SetTtl,
    SetUnicastHopsV6,
    SetIcmpFilter,
    Select,
    RecvFrom,
    NewTimer,
    SetTimer,
    ReadTimer,
    NewSignal,
    ReadSignal,
    SetSignalMask,
}

impl Display for IoOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NewSocket => write!(f, "create new socket"),
            Self::SetNonBlocking => write!(f, "set non-blocking"),
            Self::SetHeaderIncluded => write!(f, "set header included"),
            Self::SetTtl => write!(f, "set TTL"),
            Self::SetUnicastHopsV6 => write!(f, "set unicast hops v6"),
            Self::SetIcmpFilter => write!(f, "set ICMP filter"),
            Self::Select => write!(f, "select"),
            Self::RecvFrom => write!(f, "recv from"),
            Self::NewTimer => write!(f, "create new timer"),
            Self::SetTimer => write!(f, "set timer"),
            Self::ReadTimer => write!(f, "read timer"),
            Self::NewSignal => write!(f, "create new signal fd"),
            Self::ReadSignal => write!(f, "read signal fd"),
            Self::SetSignalMask => write!(f, "set signal mask"),
        }
    }
}

/// IO error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    HostUnreachable,
    NetUnreachable,
    Std(io::ErrorKind),
}
