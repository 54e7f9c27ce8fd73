//! The OS-level register-transfer primitive, and its ptrace(2)
//! implementation.

use std::mem::MaybeUninit;

use nix::errno::Errno;
use nix::sys::ptrace;
use nix::unistd::Pid;

use crate::fpregs::Fpregset;
use crate::gregs::Gregset;

/// Result of a raw kernel round-trip, before any policy is applied.
pub type OsResult<T> = std::result::Result<T, Errno>;

/// Segment register with a kernel-resolvable base address.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Segment {
    Fs,
    Gs,
}

/// Register-transfer operations on a traced task.
///
/// These are the whole-blob and word-granular primitives the kernel offers:
/// register state always moves as a complete gregset or fpregset, while the
/// virtual `user` area is peeked and poked one word at a time. Everything
/// above this trait is marshalling and failure policy.
pub trait Inferior {
    fn read_gregset(&mut self, tid: Pid) -> OsResult<Gregset>;

    fn write_gregset(&mut self, tid: Pid, gregset: &Gregset) -> OsResult<()>;

    fn read_fpregset(&mut self, tid: Pid) -> OsResult<Fpregset>;

    fn write_fpregset(&mut self, tid: Pid, fpregset: &Fpregset) -> OsResult<()>;

    /// Read one word from the tracee's virtual `user` area.
    fn peek_user(&mut self, tid: Pid, offset: u64) -> OsResult<u64>;

    /// Write one word into the tracee's virtual `user` area.
    fn poke_user(&mut self, tid: Pid, offset: u64, data: u64) -> OsResult<()>;

    /// Base address of `segment` for the given task.
    fn segment_base(&mut self, tid: Pid, segment: Segment) -> OsResult<u64>;
}

/// Not exposed by the `ptrace` crates; from `asm/prctl.h` and the kernel's
/// ptrace ABI. Some older kernels lack the request entirely, which surfaces
/// as `EIO` from `segment_base`.
const PTRACE_ARCH_PRCTL: libc::c_uint = 30;
const ARCH_GET_FS: libc::c_ulong = 0x1003;
const ARCH_GET_GS: libc::c_ulong = 0x1004;

/// [`Inferior`] implementation over ptrace(2) for a live, ptrace-stopped
/// tracee.
#[derive(Clone, Copy, Debug, Default)]
pub struct PtraceInferior;

impl PtraceInferior {
    pub fn new() -> Self {
        PtraceInferior
    }
}

impl Inferior for PtraceInferior {
    fn read_gregset(&mut self, tid: Pid) -> OsResult<Gregset> {
        let mut data = MaybeUninit::<Gregset>::uninit();

        let res = unsafe {
            libc::ptrace(libc::PTRACE_GETREGS, tid.as_raw(), 0, data.as_mut_ptr())
        };

        Errno::result(res)?;

        // The kernel filled all `GREGSET_SIZE` bytes.
        Ok(unsafe { data.assume_init() })
    }

    fn write_gregset(&mut self, tid: Pid, gregset: &Gregset) -> OsResult<()> {
        let res = unsafe {
            libc::ptrace(libc::PTRACE_SETREGS, tid.as_raw(), 0, gregset.0.as_ptr())
        };

        Errno::result(res)?;

        Ok(())
    }

    fn read_fpregset(&mut self, tid: Pid) -> OsResult<Fpregset> {
        let mut data = MaybeUninit::<Fpregset>::uninit();

        let res = unsafe {
            libc::ptrace(libc::PTRACE_GETFPREGS, tid.as_raw(), 0, data.as_mut_ptr())
        };

        Errno::result(res)?;

        Ok(unsafe { data.assume_init() })
    }

    fn write_fpregset(&mut self, tid: Pid, fpregset: &Fpregset) -> OsResult<()> {
        let res = unsafe {
            libc::ptrace(libc::PTRACE_SETFPREGS, tid.as_raw(), 0, fpregset.0.as_ptr())
        };

        Errno::result(res)?;

        Ok(())
    }

    fn peek_user(&mut self, tid: Pid, offset: u64) -> OsResult<u64> {
        // `offset` is not validated here, because it is not actually used as
        // a pointer offset by the kernel.
        //
        // See: https://github.com/torvalds/linux/blob/v4.9/arch/x86/kernel/ptrace.c#L774-L791
        let data = ptrace::read_user(tid, offset as ptrace::AddressType)?;

        Ok(data as u64)
    }

    fn poke_user(&mut self, tid: Pid, offset: u64, data: u64) -> OsResult<()> {
        // SAFETY: `offset` does not require validation, because it is not
        // actually used as a pointer offset by the kernel.
        //
        // See: https://github.com/torvalds/linux/blob/v4.9/arch/x86/kernel/ptrace.c#L774-L791
        unsafe {
            ptrace::write_user(tid, offset as ptrace::AddressType, data as *mut libc::c_void)?;
        }

        Ok(())
    }

    fn segment_base(&mut self, tid: Pid, segment: Segment) -> OsResult<u64> {
        let op = match segment {
            Segment::Fs => ARCH_GET_FS,
            Segment::Gs => ARCH_GET_GS,
        };

        let mut base: u64 = 0;

        let res = unsafe {
            libc::ptrace(PTRACE_ARCH_PRCTL, tid.as_raw(), &mut base as *mut u64, op)
        };

        Errno::result(res)?;

        Ok(base)
    }
}
