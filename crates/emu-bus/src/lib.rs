//! Paged, permissioned memory bus.
//!
//! Bus addresses translate through a fixed-size page table to
//! (target, offset) pairs. Each page carries an access permission and a
//! capability snapshot of its target; remapping a page overwrites it,
//! which is how bank-switching controllers retarget address ranges
//! between instructions.
//!
//! Two access philosophies run through the same table: real accesses
//! (CPU-driven, allowed to flip latches and strobes) and side-effect-free
//! peeks (debugger inspection), distinguished by the
//! [`emu_core::BusAccess`] context forwarded to every target.

mod bus;
mod flat;
mod io_page;
mod memory;
mod page;

pub use bus::{MainBus, PAGE_SHIFT, PAGE_SIZE};
pub use flat::FlatMemory;
pub use io_page::{IoPage, IoPageError, ReadHandler, WriteHandler};
pub use memory::{Ram, Rom};
pub use page::{MapError, MapSpec, Permission, Region, TargetId};
