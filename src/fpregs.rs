//! Transferring the floating-point and SSE registers between the kernel's
//! fxsave-format blob and the register cache.

use std::mem;

use crate::cache::{RegNum, RegisterCache};
use crate::layout::Abi;

/// Size in bytes of the kernel's floating-point register blob (the fxsave
/// area, `user_fpregs_struct`).
pub const FPREGSET_SIZE: usize = mem::size_of::<libc::user_fpregs_struct>();

/// Raw floating-point/SSE register blob, in fxsave layout.
///
/// Same lifetime rule as [`Gregset`](crate::gregs::Gregset): stack-allocated
/// per transfer call, never persisted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub struct Fpregset(pub [u8; FPREGSET_SIZE]);

impl Fpregset {
    pub fn zeroed() -> Self {
        Fpregset([0; FPREGSET_SIZE])
    }
}

/// Byte offset and width of floating-point register `regnum` within the
/// fxsave area, or `None` if `regnum` is outside the fp sub-range.
///
/// The fxsave field order is fixed by hardware: 16-bit control words first,
/// instruction/operand pointers at 8 and 16, mxcsr at 24, the x87 stack in
/// sixteen-byte bins from 32, and the xmm file from 160.
fn fxsave_offset(abi: Abi, regnum: RegNum) -> Option<(usize, usize)> {
    if regnum < abi.fp0() || regnum > abi.mxcsr() {
        return None;
    }

    let r = regnum - abi.fp0();
    let num_xmm = abi.num_xmm();

    let entry = match r {
        // st0..st7, ten data bytes each.
        0..=7 => (32 + 16 * r, 10),
        // fctrl, fstat, ftag, fop.
        8 => (0, 2),
        9 => (2, 2),
        10 => (4, 2),
        15 => (6, 2),
        // fiseg, fioff, foseg, fooff.
        11 => (12, 4),
        12 => (8, 4),
        13 => (20, 4),
        14 => (16, 4),
        // xmm0..xmm{7,15}.
        _ if r < 16 + num_xmm => (160 + 16 * (r - 16), 16),
        // mxcsr; the range check above pins r == 16 + num_xmm.
        _ => (24, 4),
    };

    Some(entry)
}

/// Fill the register cache with every floating-point and SSE register value
/// in `fpregset`.
pub fn supply_fpregset(cache: &mut dyn RegisterCache, fpregset: &Fpregset) {
    let abi = cache.abi();

    for regnum in abi.fp0()..=abi.mxcsr() {
        if let Some((offset, size)) = fxsave_offset(abi, regnum) {
            cache.supply(regnum, &fpregset.0[offset..offset + size]);
        }
    }
}

/// Fill register `regnum` in `fpregset` with its value in the register
/// cache, or all floating-point registers for `None`.
///
/// Bytes outside the requested registers' fields are left untouched.
pub fn collect_fpregset(cache: &dyn RegisterCache, fpregset: &mut Fpregset, regnum: Option<RegNum>) {
    let abi = cache.abi();

    for r in abi.fp0()..=abi.mxcsr() {
        if let Some(want) = regnum {
            if want != r {
                continue;
            }
        }

        if let Some((offset, size)) = fxsave_offset(abi, r) {
            cache.collect(r, &mut fpregset.0[offset..offset + size]);
        }
    }
}
