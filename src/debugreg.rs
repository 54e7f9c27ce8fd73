//! The hardware debug register file: four address registers, a status
//! register, and a control register, reached one word at a time through the
//! tracee's virtual `user` area.

use nix::unistd::Pid;
use tracing::debug;

use crate::error::{Error, Result};
use crate::inferior::Inferior;

/// Index of the first breakpoint address register, dr0.
pub const DR_FIRSTADDR: usize = 0;

/// Index of the last breakpoint address register, dr3.
pub const DR_LASTADDR: usize = 3;

/// Index of the debug status register, dr6.
pub const DR_STATUS: usize = 6;

/// Index of the debug control register, dr7.
pub const DR_CONTROL: usize = 7;

/// Accessor for one process's debug register file.
///
/// There is no in-process cache: every operation is a kernel round-trip, so
/// the file's contents are always the hardware's view. The file is shared
/// process-wide state; a write made through one handle is visible to every
/// other.
///
/// Failure policy is asymmetric on purpose. Reads degrade to `0`, because
/// callers probe the status register speculatively and a hard failure there
/// breaks remote-target sessions. Writes are fatal, because a lost write
/// means a requested breakpoint or watchpoint silently did not arm.
#[derive(Debug)]
pub struct DebugRegisterFile<'a, I> {
    inferior: &'a mut I,
    pid: Pid,
}

impl<'a, I: Inferior> DebugRegisterFile<'a, I> {
    pub(crate) fn new(inferior: &'a mut I, pid: Pid) -> Self {
        DebugRegisterFile { inferior, pid }
    }

    /// Offset of `u_debugreg[regnum]` in the virtual `user` struct.
    fn user_offset(regnum: usize) -> u64 {
        memoffset::offset_of!(libc::user, u_debugreg) as u64 + 8 * regnum as u64
    }

    fn get(&mut self, regnum: usize) -> u64 {
        self.inferior
            .peek_user(self.pid, Self::user_offset(regnum))
            .unwrap_or(0)
    }

    fn set(&mut self, regnum: usize, value: u64) -> Result<()> {
        debug!(pid = self.pid.as_raw(), regnum, value, "writing debug register");

        self.inferior
            .poke_user(self.pid, Self::user_offset(regnum), value)
            .map_err(|source| Error::WriteDebugRegister { index: regnum, pid: self.pid, source })
    }

    /// Write the debug control register, dr7.
    pub fn set_control(&mut self, control: u64) -> Result<()> {
        self.set(DR_CONTROL, control)
    }

    /// Write breakpoint address register `index` (dr0 through dr3).
    pub fn set_address(&mut self, index: usize, addr: u64) -> Result<()> {
        if index > DR_LASTADDR {
            return Err(Error::DebugRegisterIndex { index });
        }

        self.set(DR_FIRSTADDR + index, addr)
    }

    /// Clear breakpoint address register `index`.
    pub fn reset_address(&mut self, index: usize) -> Result<()> {
        self.set_address(index, 0)
    }

    /// Read the debug status register, dr6. Returns `0` if the read fails.
    pub fn status(&mut self) -> u64 {
        self.get(DR_STATUS)
    }
}
