//! Debugger backends for the terminal front-end.
//!
//! [`Backend`] is the process-control surface the UI drives. The shipped
//! implementation, [`DapBackend`], talks the Debug Adapter Protocol to a
//! `dlv dap` server; [`GoToolchain`] produces the binaries it runs.
mod backend;
pub mod dap;
mod dap_backend;
mod delve;
mod error;
mod toolchain;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use backend::{Backend, Breakpoint, Location};
pub use dap_backend::{DapBackend, FetchLimits, LaunchRequest, TcpDapBackend};
pub use delve::DelveServer;
pub use error::{BackendError, CodecError, ToolchainError};
pub use toolchain::{
    GoToolchain, PackageInfo, Toolchain, program_entry_breakpoints, test_entry_breakpoints,
};
