//! Device and event identities.

/// Identifies the device that owns a page mapping or a scheduled event.
///
/// Devices use their id to clear their own pending events on reset, so a
/// reinitialised device never sees a stale callback fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u16);

/// Discriminates the kinds of event a device schedules (paddle one-shot
/// timers, key-repeat pacing, motor spin-up). Opaque to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventKind(pub u16);
