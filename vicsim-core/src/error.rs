//! Error taxonomy shared by loaders and steady-state diagnostics.
//!
//! Loaders report failures as sets so a whole pass can run and surface
//! every problem at once; aggregation is bitwise OR. The per-tick core
//! never returns these; contract violations there are logged and clamped.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Error, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum ErrorCode {
    #[error("ok")]
    Ok,
    #[error("failed")]
    Failed,
    #[error("unavailable")]
    Unavailable,
    #[error("unconfigured")]
    Unconfigured,
    #[error("unauthorized")]
    Unauthorized,
    #[error("file not found")]
    FileNotFound,
    #[error("bad file path")]
    FileBadPath,
    #[error("no file permission")]
    FileNoPermission,
    #[error("file already in use")]
    FileAlreadyInUse,
    #[error("cannot open file")]
    FileCantOpen,
    #[error("cannot write file")]
    FileCantWrite,
    #[error("cannot read file")]
    FileCantRead,
    #[error("locked")]
    Locked,
    #[error("timeout")]
    Timeout,
    #[error("cannot connect")]
    CantConnect,
    #[error("cannot resolve")]
    CantResolve,
    #[error("connection error")]
    ConnectionError,
    #[error("invalid data")]
    InvalidData,
    #[error("invalid parameter")]
    InvalidParameter,
    #[error("already exists")]
    AlreadyExists,
    #[error("does not exist")]
    DoesNotExist,
    #[error("busy")]
    Busy,
    #[error("skip")]
    Skip,
    #[error("bug")]
    Bug,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 24] = [
        ErrorCode::Ok,
        ErrorCode::Failed,
        ErrorCode::Unavailable,
        ErrorCode::Unconfigured,
        ErrorCode::Unauthorized,
        ErrorCode::FileNotFound,
        ErrorCode::FileBadPath,
        ErrorCode::FileNoPermission,
        ErrorCode::FileAlreadyInUse,
        ErrorCode::FileCantOpen,
        ErrorCode::FileCantWrite,
        ErrorCode::FileCantRead,
        ErrorCode::Locked,
        ErrorCode::Timeout,
        ErrorCode::CantConnect,
        ErrorCode::CantResolve,
        ErrorCode::ConnectionError,
        ErrorCode::InvalidData,
        ErrorCode::InvalidParameter,
        ErrorCode::AlreadyExists,
        ErrorCode::DoesNotExist,
        ErrorCode::Busy,
        ErrorCode::Skip,
        ErrorCode::Bug,
    ];

    const fn bit(self) -> u32 {
        1u32 << self as u32
    }
}

/// Bitset over [`ErrorCode`]. The empty set means OK.
///
/// `Ok` itself carries no bit: inserting it is a no-op, so a loader can
/// unconditionally fold step results into its running set.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub struct ErrorSet(u32);

impl ErrorSet {
    pub const OK: ErrorSet = ErrorSet(0);

    pub fn insert(&mut self, code: ErrorCode) {
        if code != ErrorCode::Ok {
            self.0 |= code.bit();
        }
    }

    pub fn with(mut self, code: ErrorCode) -> Self {
        self.insert(code);
        self
    }

    pub fn contains(self, code: ErrorCode) -> bool {
        self.0 & code.bit() != 0
    }

    pub fn is_ok(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = ErrorCode> {
        ErrorCode::ALL
            .into_iter()
            .filter(move |c| self.contains(*c))
    }
}

impl From<ErrorCode> for ErrorSet {
    fn from(code: ErrorCode) -> Self {
        ErrorSet::OK.with(code)
    }
}

impl std::ops::BitOr for ErrorSet {
    type Output = ErrorSet;
    fn bitor(self, rhs: ErrorSet) -> ErrorSet {
        ErrorSet(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ErrorSet {
    fn bitor_assign(&mut self, rhs: ErrorSet) {
        self.0 |= rhs.0;
    }
}

impl std::fmt::Display for ErrorSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_ok() {
            return write!(f, "ok");
        }
        let mut first = true;
        for code in self.iter() {
            if !first {
                write!(f, " | ")?;
            }
            write!(f, "{code}")?;
            first = false;
        }
        Ok(())
    }
}
