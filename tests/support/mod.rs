#![allow(unused)]

use natreg::inferior::OsResult;
use natreg::{Abi, Fpregset, Gregset, Inferior, Pid, RegNum, RegisterCache, Segment};
use nix::errno::Errno;

/// Offset of `u_debugreg[0]` in the virtual `user` struct.
pub fn debugreg_offset(index: usize) -> u64 {
    memoffset::offset_of!(libc::user, u_debugreg) as u64 + 8 * index as u64
}

/// Scripted stand-in for a ptrace-stopped tracee.
///
/// Holds the kernel-side register state in memory, records which primitive
/// was invoked how often and for which task id, and can be told to fail any
/// primitive.
pub struct MockInferior {
    pub gregset: Gregset,
    pub fpregset: Fpregset,
    pub debugregs: [u64; 8],
    pub fs_base: u64,
    pub gs_base: u64,

    pub fail_peek: bool,
    pub fail_poke: bool,
    pub fail_segment: bool,

    pub gregset_reads: usize,
    pub gregset_writes: usize,
    pub fpregset_reads: usize,
    pub fpregset_writes: usize,
    pub segment_calls: usize,

    pub last_user_tid: Option<Pid>,
    pub last_segment_tid: Option<Pid>,
}

impl MockInferior {
    pub fn new() -> Self {
        MockInferior {
            gregset: Gregset::zeroed(),
            fpregset: Fpregset::zeroed(),
            debugregs: [0; 8],
            fs_base: 0,
            gs_base: 0,
            fail_peek: false,
            fail_poke: false,
            fail_segment: false,
            gregset_reads: 0,
            gregset_writes: 0,
            fpregset_reads: 0,
            fpregset_writes: 0,
            segment_calls: 0,
            last_user_tid: None,
            last_segment_tid: None,
        }
    }

    /// Fill both register blobs with a distinctive byte pattern.
    pub fn patterned() -> Self {
        let mut mock = Self::new();

        for (i, byte) in mock.gregset.0.iter_mut().enumerate() {
            *byte = i as u8;
        }
        for (i, byte) in mock.fpregset.0.iter_mut().enumerate() {
            *byte = (i % 251) as u8;
        }

        mock
    }

    fn debugreg_index(offset: u64) -> usize {
        ((offset - debugreg_offset(0)) / 8) as usize
    }
}

impl Inferior for MockInferior {
    fn read_gregset(&mut self, _tid: Pid) -> OsResult<Gregset> {
        self.gregset_reads += 1;
        Ok(self.gregset)
    }

    fn write_gregset(&mut self, _tid: Pid, gregset: &Gregset) -> OsResult<()> {
        self.gregset_writes += 1;
        self.gregset = *gregset;
        Ok(())
    }

    fn read_fpregset(&mut self, _tid: Pid) -> OsResult<Fpregset> {
        self.fpregset_reads += 1;
        Ok(self.fpregset)
    }

    fn write_fpregset(&mut self, _tid: Pid, fpregset: &Fpregset) -> OsResult<()> {
        self.fpregset_writes += 1;
        self.fpregset = *fpregset;
        Ok(())
    }

    fn peek_user(&mut self, tid: Pid, offset: u64) -> OsResult<u64> {
        self.last_user_tid = Some(tid);

        if self.fail_peek {
            return Err(Errno::EIO);
        }

        Ok(self.debugregs[Self::debugreg_index(offset)])
    }

    fn poke_user(&mut self, tid: Pid, offset: u64, data: u64) -> OsResult<()> {
        self.last_user_tid = Some(tid);

        if self.fail_poke {
            return Err(Errno::EIO);
        }

        self.debugregs[Self::debugreg_index(offset)] = data;
        Ok(())
    }

    fn segment_base(&mut self, tid: Pid, segment: Segment) -> OsResult<u64> {
        self.segment_calls += 1;
        self.last_segment_tid = Some(tid);

        if self.fail_segment {
            return Err(Errno::EIO);
        }

        let base = match segment {
            Segment::Fs => self.fs_base,
            Segment::Gs => self.gs_base,
        };

        Ok(base)
    }
}

/// Flat register cache keyed by canonical register number.
pub struct TestCache {
    pub abi: Abi,
    pub regs: Vec<[u8; 16]>,
}

impl TestCache {
    pub fn new(abi: Abi) -> Self {
        let regs = vec![[0u8; 16]; abi.num_regs()];
        TestCache { abi, regs }
    }

    pub fn reg_u64(&self, regnum: RegNum) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.regs[regnum][..8]);
        u64::from_le_bytes(bytes)
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
