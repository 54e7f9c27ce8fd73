//! The register cache consumed by the transfer layer.

use crate::layout::Abi;

/// Canonical register number, the architecture-independent key a register
/// cache uses to name a register regardless of its raw storage layout.
pub type RegNum = usize;

/// An addressable collection of canonical register values, owned by the
/// debugger proper.
///
/// This crate only marshals bytes in and out of the cache; the cache decides
/// how values are stored and which ABI variant the tracee uses.
pub trait RegisterCache {
    /// Register ABI variant of the cache layout.
    fn abi(&self) -> Abi;

    /// Write raw bytes for `regnum` into the cache.
    fn supply(&mut self, regnum: RegNum, bytes: &[u8]);

    /// Read raw bytes for `regnum` out of the cache into `buf`.
    fn collect(&self, regnum: RegNum, buf: &mut [u8]);
}
