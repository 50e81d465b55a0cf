//! Page table entries and mapping descriptors.

use emu_core::{Capabilities, DeviceId};
use thiserror::Error;

/// Stable handle into the bus-owned target arena.
///
/// Pages reference targets by id rather than embedding them, so a
/// bank-switch can retarget a page range without invalidating other
/// mappings of the same underlying target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetId(pub(crate) usize);

/// What occupies a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Ram,
    Rom,
    Io,
    Unmapped,
}

/// Allowed access directions for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    None,
    Read,
    Write,
    ReadWrite,
}

impl Permission {
    #[must_use]
    pub const fn allows_read(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    #[must_use]
    pub const fn allows_write(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// One page-table slot: which target answers for the page and how.
///
/// `base` is the bus address corresponding to the target's offset zero,
/// so the target-relative offset is `address - base`. The capability set
/// is snapshotted from the target when the page is mapped.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PageEntry {
    pub device: DeviceId,
    pub region: Region,
    pub permission: Permission,
    pub caps: Capabilities,
    pub target: TargetId,
    pub base: u32,
}

impl PageEntry {
    pub(crate) const UNMAPPED: Self = Self {
        device: DeviceId(0xFFFF),
        region: Region::Unmapped,
        permission: Permission::None,
        caps: Capabilities::NONE,
        target: TargetId(usize::MAX),
        base: 0,
    };
}

/// Descriptor for mapping a contiguous run of pages.
#[derive(Debug, Clone, Copy)]
pub struct MapSpec {
    /// First page of the run.
    pub start_page: usize,
    /// Number of pages to install.
    pub page_count: usize,
    /// Device that owns the mapping.
    pub device: DeviceId,
    pub region: Region,
    pub permission: Permission,
    /// Target answering for the run.
    pub target: TargetId,
    /// Bus address of the target's offset zero.
    pub base: u32,
}

/// Setup-time mapping defects.
///
/// These signal programming or configuration errors caught while the
/// machine is being assembled, never runtime conditions to recover from.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MapError {
    #[error("page run {start}..{end} exceeds table of {pages} pages")]
    OutOfRange {
        start: usize,
        end: usize,
        pages: usize,
    },
    #[error("unknown target id {0}")]
    UnknownTarget(usize),
}
