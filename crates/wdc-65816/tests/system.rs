//! CPU driving the paged bus: program execution, soft switches and
//! side-effect-free disassembly over live device state.

use emu_bus::{IoPage, MainBus, MapSpec, Permission, Ram, Region};
use emu_core::{BusAccess, Cycles, DeviceId};
use std::cell::Cell;
use std::rc::Rc;
use wdc_65816::{disassemble_range, CpuType, HaltReason, Wdc65816};

const RAM_DEVICE: DeviceId = DeviceId(1);
const IO_DEVICE: DeviceId = DeviceId(2);

/// 64KB of RAM with one I/O page at $C000.
fn machine() -> (MainBus, Rc<Cell<u8>>) {
    let mut bus = MainBus::new(16);
    let ram = bus.add_target(Box::new(Ram::new(0x10000)));
    bus.map_page_range(&MapSpec {
        start_page: 0,
        page_count: 16,
        device: RAM_DEVICE,
        region: Region::Ram,
        permission: Permission::ReadWrite,
        target: ram,
        base: 0x0000,
    })
    .unwrap();

    let reads = Rc::new(Cell::new(0u8));
    let mut page = IoPage::new();
    let counter = Rc::clone(&reads);
    page.register_read(
        0x10,
        Box::new(move |_, access| {
            if !access.side_effect_free {
                counter.set(counter.get() + 1);
            }
            0x5A
        }),
    )
    .unwrap();

    let io = bus.add_target(Box::new(page));
    bus.map_page_range(&MapSpec {
        start_page: 12,
        page_count: 1,
        device: IO_DEVICE,
        region: Region::Io,
        permission: Permission::ReadWrite,
        target: io,
        base: 0xC000,
    })
    .unwrap();

    (bus, reads)
}

fn load(bus: &mut MainBus, address: u32, bytes: &[u8]) {
    let access = BusAccess::real(Cycles::ZERO);
    for (index, byte) in bytes.iter().enumerate() {
        bus.write8(address + index as u32, *byte, &access);
    }
}

#[test]
fn program_runs_against_the_paged_bus() {
    let (mut bus, _) = machine();
    // LDA #$42 / STA $2000 / STP
    load(&mut bus, 0x1000, &[0xA9, 0x42, 0x8D, 0x00, 0x20, 0xDB]);

    let mut cpu = Wdc65816::new(CpuType::Wdc65C02);
    let consumed = cpu.execute(&mut bus, 0x1000);

    assert_eq!(consumed, Cycles::new(9), "2 + 4 + 3");
    assert_eq!(cpu.halt_reason(), Some(HaltReason::Stp));
    let access = BusAccess::real(Cycles::ZERO);
    assert_eq!(bus.read8(0x2000, &access), 0x42);
}

#[test]
fn reset_takes_the_vector_from_the_bus() {
    let (mut bus, _) = machine();
    load(&mut bus, 0xFFFC, &[0x00, 0x10]);
    load(&mut bus, 0x1000, &[0xDB]);

    let mut cpu = Wdc65816::new(CpuType::Wdc65C02);
    cpu.reset(&mut bus);
    assert_eq!(cpu.regs.pc_view(), 0x1000);

    cpu.step(&mut bus);
    assert!(cpu.is_halted());
}

#[test]
fn cpu_reads_reach_io_handlers() {
    let (mut bus, reads) = machine();
    // LDA $C010 / STP
    load(&mut bus, 0x1000, &[0xAD, 0x10, 0xC0, 0xDB]);

    let mut cpu = Wdc65816::new(CpuType::Wdc65C02);
    cpu.execute(&mut bus, 0x1000);

    assert_eq!(cpu.regs.a8(), 0x5A);
    assert_eq!(reads.get(), 1, "one real read");
}

#[test]
fn disassembling_io_addresses_is_side_effect_free() {
    let (mut bus, reads) = machine();
    load(&mut bus, 0x1000, &[0xAD, 0x10, 0xC0, 0xDB]);

    let lines = disassemble_range(&mut |addr| bus.peek8(addr, Cycles::ZERO), 0x1000, 2);
    let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, ["LDA $C010", "STP"]);
    assert_eq!(reads.get(), 0, "listing the program touched no device");
}
