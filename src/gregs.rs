//! Transferring the general-purpose registers between the kernel blob and
//! the register cache.

use std::mem;

use crate::cache::{RegNum, RegisterCache};
use crate::layout::{self, Abi};

/// Size in bytes of the kernel's general-purpose register blob.
pub const GREGSET_SIZE: usize = mem::size_of::<libc::user_regs_struct>();

/// Raw general-purpose register blob, in `user_regs_struct` layout.
///
/// Opaque except via the layout tables. Lives on the stack for the duration
/// of one transfer call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub struct Gregset(pub [u8; GREGSET_SIZE]);

impl Gregset {
    pub fn zeroed() -> Self {
        Gregset([0; GREGSET_SIZE])
    }
}

/// Fill the register cache with every general-purpose register value in
/// `gregset`.
///
/// Registers with no slot in the cache's ABI variant are skipped. A 32-bit
/// register is supplied from the low half of its eight-byte slot; this
/// assumes a little-endian host, which is the only kind this blob layout
/// occurs on.
pub fn supply_gregset(cache: &mut dyn RegisterCache, gregset: &Gregset) {
    let abi = cache.abi();

    for regnum in 0..abi.num_regs() {
        if let Some(offset) = layout::greg_offset(abi, regnum) {
            let size = layout::greg_size(abi, regnum);
            cache.supply(regnum, &gregset.0[offset..offset + size]);
        }
    }
}

/// Fill register `regnum` in `gregset` with its value in the register cache.
/// For `None`, do this for all general-purpose registers.
///
/// Slots for unmapped or unrequested registers are left untouched, so a blob
/// freshly read from the kernel stays valid for writing back. In
/// compatibility mode the upper half of each written slot is zeroed, since
/// the kernel expects zero-extended 32-bit values.
pub fn collect_gregset(cache: &dyn RegisterCache, gregset: &mut Gregset, regnum: Option<RegNum>) {
    let abi = cache.abi();

    for r in 0..abi.num_regs() {
        if let Some(want) = regnum {
            if want != r {
                continue;
            }
        }

        if let Some(offset) = layout::greg_offset(abi, r) {
            let size = layout::greg_size(abi, r);
            cache.collect(r, &mut gregset.0[offset..offset + size]);

            if abi == Abi::I386 {
                for byte in &mut gregset.0[offset + size..offset + 8] {
                    *byte = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::layout::{ORIG_RAX, RAX, RIP};

    // Minimal cache double: a flat value array indexed by regnum.
    struct TestCache {
        abi: Abi,
        regs: Vec<[u8; 8]>,
    }

    impl TestCache {
        fn new(abi: Abi) -> Self {
            let regs = vec![[0u8; 8]; abi.num_regs()];
            TestCache { abi, regs }
        }
    }

    impl RegisterCache for TestCache {
        fn abi(&self) -> Abi {
            self.abi
        }

        fn supply(&mut self, regnum: RegNum, bytes: &[u8]) {
            self.regs[regnum][..bytes.len()].copy_from_slice(bytes);
        }

        fn collect(&self, regnum: RegNum, buf: &mut [u8]) {
            let len = buf.len();
            buf.copy_from_slice(&self.regs[regnum][..len]);
        }
    }

    fn patterned_gregset() -> Gregset {
        let mut gregset = Gregset::zeroed();
        for (i, byte) in gregset.0.iter_mut().enumerate() {
            *byte = i as u8;
        }
        gregset
    }

    #[test]
    fn test_supply_reads_mapped_slots() {
        let mut cache = TestCache::new(Abi::Amd64);
        let gregset = patterned_gregset();

        supply_gregset(&mut cache, &gregset);

        // rax is canonical register 0, slot RAX.
        assert_eq!(cache.regs[0], gregset.0[RAX * 8..RAX * 8 + 8]);
        // rip is canonical register 16, slot RIP.
        assert_eq!(cache.regs[16], gregset.0[RIP * 8..RIP * 8 + 8]);
        // eflags is a 32-bit register; only the low half is supplied.
        assert_eq!(cache.regs[17][..4], gregset.0[layout::EFLAGS * 8..layout::EFLAGS * 8 + 4]);
        assert_eq!(cache.regs[17][4..], [0; 4]);
    }

    #[test]
    fn test_collect_one_register_is_isolated() {
        let mut cache = TestCache::new(Abi::Amd64);
        cache.regs[0] = [0xaa; 8];

        let mut gregset = patterned_gregset();
        let before = gregset;

        collect_gregset(&cache, &mut gregset, Some(0));

        assert_eq!(gregset.0[RAX * 8..RAX * 8 + 8], [0xaa; 8]);

        // Every byte outside the rax slot is untouched.
        for (i, (b, a)) in before.0.iter().zip(gregset.0.iter()).enumerate() {
            if !(RAX * 8..RAX * 8 + 8).contains(&i) {
                assert_eq!(b, a, "byte {} changed", i);
            }
        }
    }

    #[test]
    fn test_supply_collect_round_trip() {
        let mut cache = TestCache::new(Abi::Amd64);
        let original = patterned_gregset();

        supply_gregset(&mut cache, &original);

        let mut out = original;
        collect_gregset(&cache, &mut out, None);

        assert_eq!(original, out);
    }

    #[test]
    fn test_compat_collect_zero_extends() {
        let mut cache = TestCache::new(Abi::I386);
        cache.regs[0] = [0x11, 0x22, 0x33, 0x44, 0, 0, 0, 0]; // eax

        let mut gregset = patterned_gregset();
        collect_gregset(&cache, &mut gregset, Some(0));

        assert_eq!(gregset.0[RAX * 8..RAX * 8 + 8], [0x11, 0x22, 0x33, 0x44, 0, 0, 0, 0]);
    }

    #[test]
    fn test_compat_supply_skips_sentinels() {
        let mut cache = TestCache::new(Abi::I386);
        let gregset = patterned_gregset();

        supply_gregset(&mut cache, &gregset);

        // st0 (canonical 16) has no slot in the compatibility table.
        assert_eq!(cache.regs[16], [0; 8]);
        // orig_eax (canonical 41) does.
        assert_eq!(cache.regs[41][..4], gregset.0[ORIG_RAX * 8..ORIG_RAX * 8 + 4]);
    }
}
