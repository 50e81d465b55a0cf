//! Core traits and types for cycle-accurate emulation.
//!
//! Everything is driven by a logical cycle counter advanced by CPU
//! execution. All component timing derives from it; nothing waits on
//! wall-clock time.

mod access;
mod bus;
mod cpu;
mod cycles;
mod device;
mod scheduler;
mod trace;

pub use access::BusAccess;
pub use bus::{Bus, BusTarget, Capabilities, OPEN_BUS};
pub use cpu::Cpu;
pub use cycles::Cycles;
pub use device::{DeviceId, EventKind};
pub use scheduler::{EventCallback, ScheduledEvent, Scheduler};
pub use trace::{StepTrace, TraceSink};
