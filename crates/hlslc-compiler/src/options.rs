//! Compiler configuration.

use bitflags::bitflags;

use crate::types::Majority;

bitflags! {
    /// Compile flags, bit-compatible with the `D3DCOMPILE_*` values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CompileFlags: u32 {
        const DEBUG = 1 << 0;
        const SKIP_VALIDATION = 1 << 1;
        const SKIP_OPTIMIZATION = 1 << 2;
        const PACK_MATRIX_ROW_MAJOR = 1 << 3;
        const PACK_MATRIX_COLUMN_MAJOR = 1 << 4;
    }
}

/// Options a [`Context`](crate::Context) is created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompilerOptions {
    pub flags: CompileFlags,
    /// Packing of matrices declared without `row_major`/`column_major`.
    pub default_majority: Majority,
}

impl CompilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options derived from compile flags.
    ///
    /// Row-major packing wins when both packing flags are set.
    pub fn from_flags(flags: CompileFlags) -> Self {
        let default_majority = if flags.contains(CompileFlags::PACK_MATRIX_ROW_MAJOR) {
            Majority::Row
        } else {
            Majority::Column
        };
        Self {
            flags,
            default_majority,
        }
    }

    pub fn with_default_majority(mut self, majority: Majority) -> Self {
        self.default_majority = majority;
        self
    }
}
