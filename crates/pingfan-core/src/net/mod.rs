mod channel;
mod ipv4;
mod ipv6;
mod platform;

pub mod socket;

pub use channel::{NetworkPair, MAX_PACKET_SIZE};
pub use platform::SocketImpl;
