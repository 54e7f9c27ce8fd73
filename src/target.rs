//! Dispatching register fetch/store requests and resolving segment bases for
//! one traced task.

use nix::unistd::Pid;
use tracing::debug;

use crate::cache::{RegNum, RegisterCache};
use crate::debugreg::DebugRegisterFile;
use crate::error::{Error, Result};
use crate::fpregs;
use crate::gregs;
use crate::inferior::{Inferior, Segment};
use crate::layout;

/// Kernel-visible identity of the inspected task.
///
/// GNU/Linux LWP ids are process ids, so a thread is named by its own lwp
/// when the target is threaded, and by the process id otherwise.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ThreadHandle {
    pid: Pid,
    lwp: Option<Pid>,
}

impl ThreadHandle {
    /// Handle for a non-threaded target, or for whole-process operations.
    pub fn process(pid: Pid) -> Self {
        ThreadHandle { pid, lwp: None }
    }

    /// Handle for one thread of a multi-threaded target.
    pub fn thread(pid: Pid, lwp: Pid) -> Self {
        ThreadHandle { pid, lwp: Some(lwp) }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// The id register transfers are addressed to: the lwp, falling back to
    /// the process id for non-threaded targets.
    pub fn lwp(&self) -> Pid {
        self.lwp.unwrap_or(self.pid)
    }
}

/// Register-transfer front end for a native x86-64 GNU/Linux target.
///
/// Construction runs the layout consistency check, so no transfer can be
/// attempted against misaligned offset tables.
#[derive(Debug)]
pub struct NativeTarget<I> {
    inferior: I,
}

impl<I: Inferior> NativeTarget<I> {
    pub fn new(inferior: I) -> Result<Self> {
        layout::verify_layouts()?;

        Ok(NativeTarget { inferior })
    }

    /// Fetch register `regnum` from the inspected thread into the cache, or
    /// all registers for `None`.
    ///
    /// A request for a register outside both the general-purpose and
    /// floating-point files means the caller and the cache layout disagree
    /// about the register numbering. That is a bug, not a runtime condition;
    /// the error must not be caught and retried.
    pub fn fetch_registers(
        &mut self,
        cache: &mut dyn RegisterCache,
        thread: ThreadHandle,
        regnum: Option<RegNum>,
    ) -> Result<()> {
        let tid = thread.lwp();
        let abi = cache.abi();

        debug!(tid = tid.as_raw(), ?regnum, "fetching registers");

        if regnum.map_or(true, |r| layout::gregset_supplies(abi, r)) {
            let gregset = self
                .inferior
                .read_gregset(tid)
                .map_err(|source| Error::ReadGregset { tid, source })?;

            gregs::supply_gregset(cache, &gregset);

            if regnum.is_some() {
                return Ok(());
            }
        }

        if regnum.map_or(true, |r| layout::fpregset_supplies(abi, r)) {
            let fpregset = self
                .inferior
                .read_fpregset(tid)
                .map_err(|source| Error::ReadFpregset { tid, source })?;

            fpregs::supply_fpregset(cache, &fpregset);

            return Ok(());
        }

        match regnum {
            Some(regnum) => Err(Error::UnsupportedRegister { regnum }),
            // Unreachable: a full fetch always takes the fpregset arm above.
            None => Ok(()),
        }
    }

    /// Store register `regnum` from the cache back into the inspected
    /// thread, or all registers for `None`.
    ///
    /// The kernel transfers whole blobs, so a store is a read-modify-write:
    /// the current blob is read back, the requested registers are collected
    /// over it, and the result is written wholesale. The read-modify-write
    /// sequence is not atomic against a concurrent store on the same thread.
    pub fn store_registers(
        &mut self,
        cache: &dyn RegisterCache,
        thread: ThreadHandle,
        regnum: Option<RegNum>,
    ) -> Result<()> {
        let tid = thread.lwp();
        let abi = cache.abi();

        debug!(tid = tid.as_raw(), ?regnum, "storing registers");

        if regnum.map_or(true, |r| layout::gregset_supplies(abi, r)) {
            let mut gregset = self
                .inferior
                .read_gregset(tid)
                .map_err(|source| Error::ReadGregset { tid, source })?;

            gregs::collect_gregset(cache, &mut gregset, regnum);

            self.inferior
                .write_gregset(tid, &gregset)
                .map_err(|source| Error::WriteGregset { tid, source })?;

            if regnum.is_some() {
                return Ok(());
            }
        }

        if regnum.map_or(true, |r| layout::fpregset_supplies(abi, r)) {
            let mut fpregset = self
                .inferior
                .read_fpregset(tid)
                .map_err(|source| Error::ReadFpregset { tid, source })?;

            fpregs::collect_fpregset(cache, &mut fpregset, regnum);

            self.inferior
                .write_fpregset(tid, &fpregset)
                .map_err(|source| Error::WriteFpregset { tid, source })?;

            return Ok(());
        }

        match regnum {
            Some(regnum) => Err(Error::UnsupportedRegister { regnum }),
            // Unreachable: a full store always takes the fpregset arm above.
            None => Ok(()),
        }
    }

    /// Hardware debug register file of the inspected process.
    ///
    /// All debug register operations address the process id, never an
    /// individual lwp: multi-threaded targets are treated as having one
    /// shared debug register file. Inherited limitation, kept as-is rather
    /// than silently changed under callers that rely on it.
    pub fn debug_registers(&mut self, thread: ThreadHandle) -> DebugRegisterFile<'_, I> {
        DebugRegisterFile::new(&mut self.inferior, thread.pid())
    }

    /// Base address of a thread's FS or GS segment, for thread-local-storage
    /// resolution.
    ///
    /// `index` is the `sys/reg.h` slot number of the segment register, as
    /// used by thread-debug support libraries. Anything but FS or GS is an
    /// invalid argument, reported without touching the kernel. An underlying
    /// failure is recoverable: the kernel may simply not support the
    /// request, and callers then treat thread-local storage as unavailable.
    pub fn resolve_segment_base(&mut self, thread: ThreadHandle, index: usize) -> Result<u64> {
        let segment = match index {
            layout::FS => Segment::Fs,
            layout::GS => Segment::Gs,
            _ => return Err(Error::InvalidSegment { index }),
        };

        let tid = thread.lwp();

        self.inferior
            .segment_base(tid, segment)
            .map_err(|source| Error::SegmentBase { segment, tid, source })
    }

    /// The underlying register-transfer primitive.
    pub fn inferior_mut(&mut self) -> &mut I {
        &mut self.inferior
    }
}
