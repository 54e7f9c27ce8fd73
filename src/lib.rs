//! Native register transfer for x86-64 GNU/Linux debuggers.
//!
//! This crate bridges the kernel's raw, ABI-specific register blobs and a
//! debugger's canonical register cache, for both native 64-bit tracees and
//! 32-bit compatibility-mode tracees. It also programs the hardware debug
//! registers that implement breakpoints and watchpoints, and resolves the
//! per-thread FS/GS segment bases needed for thread-local-storage
//! inspection.
//!
//! The entry point is [`NativeTarget`], built over an [`Inferior`] (the raw
//! ptrace(2) primitive, or a test double). The register cache itself is
//! consumed through the [`RegisterCache`] trait, never implemented here.

pub mod cache;
pub mod debugreg;
pub mod error;
pub mod fpregs;
pub mod gregs;
pub mod inferior;
pub mod layout;
pub mod target;

pub use cache::{RegNum, RegisterCache};
pub use debugreg::DebugRegisterFile;
pub use error::{Error, Result};
pub use fpregs::Fpregset;
pub use gregs::Gregset;
pub use inferior::{Inferior, PtraceInferior, Segment};
pub use layout::Abi;
pub use target::{NativeTarget, ThreadHandle};

pub use nix::unistd::Pid;
