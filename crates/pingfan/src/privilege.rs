//! Discover and acquire the privileges needed for raw sockets.

/// Acquire raw socket privileges, if possible.
///
/// On Linux, raise `CAP_NET_RAW` to the effective set when it is held in
/// the permitted set.  On other Unix platforms this is a no-op as raw
/// sockets require an effective uid of root.
#[cfg(target_os = "linux")]
pub fn acquire_privileges() -> anyhow::Result<()> {
    if caps::has_cap(None, caps::CapSet::Permitted, caps::Capability::CAP_NET_RAW)? {
        caps::raise(None, caps::CapSet::Effective, caps::Capability::CAP_NET_RAW)?;
    }
    Ok(())
}

/// Do we have the privileges required for raw sockets?
///
/// Checks if `CAP_NET_RAW` is in the effective set.
#[cfg(target_os = "linux")]
pub fn has_privileges() -> anyhow::Result<bool> {
    Ok(caps::has_cap(
        None,
        caps::CapSet::Effective,
        caps::Capability::CAP_NET_RAW,
    )?)
}

/// Acquire raw socket privileges, if possible.
///
/// This is a no-op on non-Linux unix systems.
#[cfg(all(unix, not(target_os = "linux")))]
pub const fn acquire_privileges() -> anyhow::Result<()> {
    Ok(())
}

/// Do we have the privileges required for raw sockets?
///
/// Checks if the effective user is root.
#[cfg(all(unix, not(target_os = "linux")))]
#[expect(clippy::unnecessary_wraps)]
pub fn has_privileges() -> anyhow::Result<bool> {
    Ok(nix::unistd::Uid::effective().is_root())
}
