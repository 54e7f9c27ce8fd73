use nix::errno::Errno;
use nix::unistd::Pid;

use crate::cache::RegNum;
use crate::inferior::Segment;
use crate::layout::Abi;


pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Couldn't get registers for tid = {tid}")]
    ReadGregset { tid: Pid, source: Errno },

    #[error("Couldn't write registers for tid = {tid}")]
    WriteGregset { tid: Pid, source: Errno },

    #[error("Couldn't get floating point status for tid = {tid}")]
    ReadFpregset { tid: Pid, source: Errno },

    #[error("Couldn't write floating point status for tid = {tid}")]
    WriteFpregset { tid: Pid, source: Errno },

    #[error("Got request for bad register number {regnum}")]
    UnsupportedRegister { regnum: RegNum },

    #[error("Debug address register index {index} out of range")]
    DebugRegisterIndex { index: usize },

    #[error("Couldn't write debug register dr{index} of pid = {pid}")]
    WriteDebugRegister { index: usize, pid: Pid, source: Errno },

    #[error("{abi:?} register offset table has {actual} entries, expected {expected}")]
    LayoutMismatch { abi: Abi, actual: usize, expected: usize },

    #[error("Register {index} is not a resolvable segment")]
    InvalidSegment { index: usize },

    #[error("Couldn't resolve {segment:?} base of tid = {tid}")]
    SegmentBase { segment: Segment, tid: Pid, source: Errno },
}
