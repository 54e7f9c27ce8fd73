//! Mappings between the kernel's `struct user` register layout and the
//! canonical register numbering used by a debugger's register cache.
//!
//! Two ABI variants are described: the native 64-bit layout, and the 32-bit
//! compatibility layout used when the tracee is an i386 program running under
//! an x86-64 kernel. In both cases the kernel-side blob is the same
//! `user_regs_struct`, so compatibility-mode offsets still point into
//! eight-byte slots.

use crate::cache::RegNum;
use crate::error::{Error, Result};

/// User-area slot indices, from `sys/reg.h` on x86-64 GNU/Linux.
pub const R15: usize = 0;
pub const R14: usize = 1;
pub const R13: usize = 2;
pub const R12: usize = 3;
pub const RBP: usize = 4;
pub const RBX: usize = 5;
pub const R11: usize = 6;
pub const R10: usize = 7;
pub const R9: usize = 8;
pub const R8: usize = 9;
pub const RAX: usize = 10;
pub const RCX: usize = 11;
pub const RDX: usize = 12;
pub const RSI: usize = 13;
pub const RDI: usize = 14;
pub const ORIG_RAX: usize = 15;
pub const RIP: usize = 16;
pub const CS: usize = 17;
pub const EFLAGS: usize = 18;
pub const RSP: usize = 19;
pub const SS: usize = 20;
pub const FS_BASE: usize = 21;
pub const GS_BASE: usize = 22;
pub const DS: usize = 23;
pub const ES: usize = 24;
pub const FS: usize = 25;
pub const GS: usize = 26;

/// Register ABI variant of a traced program.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Abi {
    /// Native 64-bit register file.
    Amd64,
    /// 32-bit compatibility register file.
    I386,
}

/// Number of general registers in the `Amd64` canonical layout (rax through
/// gs_base), and the required cardinality of its offset table.
pub const AMD64_NUM_GREGS: usize = 26;

/// Total `Amd64` canonical register count (general + x87 + SSE).
pub const AMD64_NUM_REGS: usize = 59;

/// Total `I386` canonical register count, including the trailing `orig_eax`.
pub const I386_NUM_REGS: usize = 42;

const AMD64_FP0: usize = 26;
const AMD64_MXCSR: usize = 58;
const I386_FP0: usize = 16;
const I386_MXCSR: usize = 40;

/// Byte offset of each `Amd64` canonical register within the raw
/// general-purpose blob.
///
/// Canonical order: rax, rbx, rcx, rdx, rsi, rdi, rbp, rsp, r8..r15, rip,
/// eflags, cs, ss, ds, es, fs, gs, fs_base, gs_base.
pub static GREGSET64_REG_OFFSET: &[Option<usize>] = &[
    Some(RAX * 8),
    Some(RBX * 8),
    Some(RCX * 8),
    Some(RDX * 8),
    Some(RSI * 8),
    Some(RDI * 8),
    Some(RBP * 8),
    Some(RSP * 8),
    Some(R8 * 8),
    Some(R9 * 8),
    Some(R10 * 8),
    Some(R11 * 8),
    Some(R12 * 8),
    Some(R13 * 8),
    Some(R14 * 8),
    Some(R15 * 8),
    Some(RIP * 8),
    Some(EFLAGS * 8),
    Some(CS * 8),
    Some(SS * 8),
    Some(DS * 8),
    Some(ES * 8),
    Some(FS * 8),
    Some(GS * 8),
    Some(FS_BASE * 8),
    Some(GS_BASE * 8),
];

/// Byte offset of each `I386` canonical register within the raw
/// general-purpose blob.
///
/// Most x86-64 slots are 64-bit while the i386 registers are all 32-bit, but
/// on a little-endian host a 32-bit register is just the low half of its
/// slot, so the same blob serves both tables. `None` marks registers with no
/// slot in this mode; `orig_eax` is a kernel syscall-restart register with no
/// counterpart in the native table.
pub static GREGSET32_REG_OFFSET: &[Option<usize>] = &[
    Some(RAX * 8),
    Some(RCX * 8),
    Some(RDX * 8),
    Some(RBX * 8),
    Some(RSP * 8),
    Some(RBP * 8),
    Some(RSI * 8),
    Some(RDI * 8),
    Some(RIP * 8),
    Some(EFLAGS * 8),
    Some(CS * 8),
    Some(SS * 8),
    Some(DS * 8),
    Some(ES * 8),
    Some(FS * 8),
    Some(GS * 8),
    // st0..st7
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    // fctrl, fstat, ftag, fiseg, fioff, foseg, fooff, fop
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    // xmm0..xmm7
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    // mxcsr
    None,
    Some(ORIG_RAX * 8),
];

impl Abi {
    /// Total canonical register count for this variant.
    pub fn num_regs(self) -> usize {
        match self {
            Abi::Amd64 => AMD64_NUM_REGS,
            Abi::I386 => I386_NUM_REGS,
        }
    }

    /// Canonical number of the first floating-point register, st0.
    pub fn fp0(self) -> RegNum {
        match self {
            Abi::Amd64 => AMD64_FP0,
            Abi::I386 => I386_FP0,
        }
    }

    /// Canonical number of mxcsr, the last floating-point register.
    pub fn mxcsr(self) -> RegNum {
        match self {
            Abi::Amd64 => AMD64_MXCSR,
            Abi::I386 => I386_MXCSR,
        }
    }

    /// Number of xmm registers visible to this variant.
    pub fn num_xmm(self) -> usize {
        match self {
            Abi::Amd64 => 16,
            Abi::I386 => 8,
        }
    }

    fn gregset_offsets(self) -> &'static [Option<usize>] {
        match self {
            Abi::Amd64 => GREGSET64_REG_OFFSET,
            Abi::I386 => GREGSET32_REG_OFFSET,
        }
    }
}

/// Byte offset of `regnum` within the general-purpose blob, if it has one.
pub fn greg_offset(abi: Abi, regnum: RegNum) -> Option<usize> {
    abi.gregset_offsets().get(regnum).copied().flatten()
}

/// Cache width in bytes of general register `regnum`.
///
/// All i386 registers are 32-bit. On amd64, eflags and the segment registers
/// are 32-bit; everything else in the general file is 64-bit.
pub fn greg_size(abi: Abi, regnum: RegNum) -> usize {
    match abi {
        Abi::I386 => 4,
        Abi::Amd64 => match regnum {
            17..=23 => 4,
            _ => 8,
        },
    }
}

/// Does a general-purpose blob transfer carry `regnum`?
pub fn gregset_supplies(abi: Abi, regnum: RegNum) -> bool {
    greg_offset(abi, regnum).is_some()
}

/// Does a floating-point blob transfer carry `regnum`?
pub fn fpregset_supplies(abi: Abi, regnum: RegNum) -> bool {
    abi.fp0() <= regnum && regnum <= abi.mxcsr()
}

/// Validate the offset tables against the register-file cardinalities the
/// canonical layouts expect.
///
/// A mismatch is a build-configuration defect: transfers done with a
/// misaligned table would silently marshal the wrong bytes, so callers must
/// treat failure as fatal and refuse to bring up the target.
pub fn verify_layouts() -> Result<()> {
    check_cardinality(Abi::Amd64, GREGSET64_REG_OFFSET.len(), AMD64_NUM_GREGS)?;
    check_cardinality(Abi::I386, GREGSET32_REG_OFFSET.len(), I386_NUM_REGS)?;

    Ok(())
}

fn check_cardinality(abi: Abi, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(Error::LayoutMismatch { abi, actual, expected });
    }

    Ok(())
}
