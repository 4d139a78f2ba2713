#![no_std]
#![no_main]

use core::ptr::{read_volatile, write_volatile};

use cortex_m_rt::entry;
use panic_halt as _;

use picoclobber_core::{AtomicScratch, ClobberWorker, Reporter, SerialSink, CLOBBER_ACTIVE};

/// Second-stage bootloader, first 256 bytes of flash.
#[link_section = ".boot2"]
#[used]
static BOOT2: [u8; 256] = rp2040_boot2::BOOT_LOADER_W25Q080;

// UART0 on GPIO0 (TX) and GPIO1 (RX). See the GPIO function select table in
// the datasheet for the other UART-capable pins.
const UART_TX_PIN: u32 = 0;
const UART_RX_PIN: u32 = 1;
const BAUD_RATE: u32 = 115_200;

// Crystal oscillator (12 MHz on the Pico board)
const XOSC_HZ: u32 = 12_000_000;
const XOSC_BASE: u32 = 0x4002_4000;
const XOSC_CTRL: *mut u32 = XOSC_BASE as *mut u32;
const XOSC_STATUS: *const u32 = (XOSC_BASE + 0x04) as *const u32;
const XOSC_STARTUP: *mut u32 = (XOSC_BASE + 0x0C) as *mut u32;
const XOSC_ENABLE_1_15MHZ: u32 = (0xFAB << 12) | 0xAA0;
const XOSC_STATUS_STABLE: u32 = 1 << 31;

// Clock tree
const CLOCKS_BASE: u32 = 0x4000_8000;
const CLK_REF_CTRL: *mut u32 = (CLOCKS_BASE + 0x30) as *mut u32;
const CLK_SYS_CTRL: *mut u32 = (CLOCKS_BASE + 0x3C) as *mut u32;
const CLK_PERI_CTRL: *mut u32 = (CLOCKS_BASE + 0x48) as *mut u32;
const CLK_REF_SRC_XOSC: u32 = 0x2;
const CLK_SYS_SRC_CLK_REF: u32 = 0x0;
const CLK_PERI_ENABLE: u32 = 1 << 11;

// Subsystem resets (atomic clear alias at +0x3000)
const RESETS_BASE: u32 = 0x4000_C000;
const RESETS_RESET_CLR: *mut u32 = (RESETS_BASE + 0x3000) as *mut u32;
const RESETS_RESET_DONE: *const u32 = (RESETS_BASE + 0x08) as *const u32;
const RESETS_IO_BANK0: u32 = 1 << 5;
const RESETS_PADS_BANK0: u32 = 1 << 8;
const RESETS_UART0: u32 = 1 << 22;

// IO function select
const IO_BANK0_BASE: u32 = 0x4001_4000;
const FUNCSEL_UART: u32 = 2;

// PL011 UART0
const UART0_BASE: u32 = 0x4003_4000;
const UART0_DR: *mut u32 = UART0_BASE as *mut u32;
const UART0_FR: *const u32 = (UART0_BASE + 0x18) as *const u32;
const UART0_IBRD: *mut u32 = (UART0_BASE + 0x24) as *mut u32;
const UART0_FBRD: *mut u32 = (UART0_BASE + 0x28) as *mut u32;
const UART0_LCR_H: *mut u32 = (UART0_BASE + 0x2C) as *mut u32;
const UART0_CR: *mut u32 = (UART0_BASE + 0x30) as *mut u32;
const UART0_FR_TXFF: u32 = 1 << 5;
const UART0_LCR_H_8N1_FIFO: u32 = (0b11 << 5) | (1 << 4);
const UART0_CR_ENABLE: u32 = (1 << 9) | (1 << 8) | 1; // RXE | TXE | UARTEN

// SIO: per-core CPUID and the inter-core mailbox FIFO
const SIO_BASE: u32 = 0xD000_0000;
const SIO_CPUID: *const u32 = SIO_BASE as *const u32;
const SIO_FIFO_ST: *const u32 = (SIO_BASE + 0x50) as *const u32;
const SIO_FIFO_WR: *mut u32 = (SIO_BASE + 0x54) as *mut u32;
const SIO_FIFO_RD: *const u32 = (SIO_BASE + 0x58) as *const u32;
const FIFO_ST_VLD: u32 = 1 << 0;
const FIFO_ST_RDY: u32 = 1 << 1;

// Power-on state machine (to reset core 1) and the core 0 VTOR
const PSM_BASE: u32 = 0x4001_0000;
const PSM_FRCE_OFF: *const u32 = (PSM_BASE + 0x04) as *const u32;
const PSM_FRCE_OFF_SET: *mut u32 = (PSM_BASE + 0x2004) as *mut u32;
const PSM_FRCE_OFF_CLR: *mut u32 = (PSM_BASE + 0x3004) as *mut u32;
const PSM_PROC1: u32 = 1 << 16;
const PPB_VTOR: *const u32 = 0xE000_ED08 as *const u32;

/// The shared corruption buffer. `memory.x` pins this section to
/// 0x2000_0000, the RAM area the datasheet reserves for a relocated vector
/// table. That gets scribbled over by core 1, which is fine since this demo
/// never uses interrupts. The section is NOLOAD, so the initial contents
/// are whatever the SRAM held at power-up.
#[link_section = ".ram_vector_table"]
#[used]
static SCRATCH: AtomicScratch = AtomicScratch::new();

const CORE1_STACK_WORDS: usize = 512;
static mut CORE1_STACK: [u32; CORE1_STACK_WORDS] = [0; CORE1_STACK_WORDS];

fn gpio_ctrl(pin: u32) -> *mut u32 {
    (IO_BANK0_BASE + pin * 8 + 4) as *mut u32
}

/// Clock and UART bring-up: the crystal drives clk_ref, clk_sys and
/// clk_peri, then UART0 comes out of reset on GPIO0/GPIO1 at 115200 8N1.
unsafe fn uart_init() {
    // Start the crystal and wait for it to stabilize.
    write_volatile(XOSC_STARTUP, (XOSC_HZ / 1000 + 128) / 256);
    write_volatile(XOSC_CTRL, XOSC_ENABLE_1_15MHZ);
    while read_volatile(XOSC_STATUS) & XOSC_STATUS_STABLE == 0 {}

    // Glitchless mux switches: clk_ref to the crystal, clk_sys follows
    // clk_ref, clk_peri runs off clk_sys.
    write_volatile(CLK_REF_CTRL, CLK_REF_SRC_XOSC);
    write_volatile(CLK_SYS_CTRL, CLK_SYS_SRC_CLK_REF);
    write_volatile(CLK_PERI_CTRL, CLK_PERI_ENABLE);

    // Bring IO, pads and UART0 out of reset.
    let mask = RESETS_IO_BANK0 | RESETS_PADS_BANK0 | RESETS_UART0;
    write_volatile(RESETS_RESET_CLR, mask);
    while read_volatile(RESETS_RESET_DONE) & mask != mask {}

    // Function select 2 routes the pins to UART0 TX/RX.
    write_volatile(gpio_ctrl(UART_TX_PIN), FUNCSEL_UART);
    write_volatile(gpio_ctrl(UART_RX_PIN), FUNCSEL_UART);

    // Integer/fractional baud divisor from the 12 MHz peripheral clock:
    // 12e6 / (16 * 115200) = 6 + 33/64.
    let div = 8 * XOSC_HZ / BAUD_RATE;
    write_volatile(UART0_IBRD, div >> 7);
    write_volatile(UART0_FBRD, ((div & 0x7F) + 1) / 2);
    write_volatile(UART0_LCR_H, UART0_LCR_H_8N1_FIFO);
    write_volatile(UART0_CR, UART0_CR_ENABLE);
}

/// Write-only sink over UART0. Busy-waits on a full TX FIFO; no error path
/// exists at this boundary.
struct Uart0;

impl SerialSink for Uart0 {
    fn write_byte(&mut self, byte: u8) {
        unsafe {
            while read_volatile(UART0_FR) & UART0_FR_TXFF != 0 {}
            write_volatile(UART0_DR, byte as u32);
        }
    }
}

/// Which core is executing this code, read fresh from SIO each call.
fn cpu_id() -> u8 {
    unsafe { read_volatile(SIO_CPUID) as u8 }
}

unsafe fn fifo_drain() {
    while read_volatile(SIO_FIFO_ST) & FIFO_ST_VLD != 0 {
        let _ = read_volatile(SIO_FIFO_RD);
    }
}

unsafe fn fifo_write_blocking(value: u32) {
    while read_volatile(SIO_FIFO_ST) & FIFO_ST_RDY == 0 {}
    write_volatile(SIO_FIFO_WR, value);
    cortex_m::asm::sev();
}

unsafe fn fifo_read_blocking() -> u32 {
    while read_volatile(SIO_FIFO_ST) & FIFO_ST_VLD == 0 {
        cortex_m::asm::wfe();
    }
    read_volatile(SIO_FIFO_RD)
}

/// Launch `entry` on core 1. Fire-and-forget: no return value, no join.
///
/// Core 1 is power-cycled through the PSM so it re-enters the bootrom wait
/// loop, then fed the documented mailbox sequence over the SIO FIFO. A bad
/// echo restarts the sequence from the top.
fn launch_core1(entry: extern "C" fn() -> !) {
    unsafe {
        write_volatile(PSM_FRCE_OFF_SET, PSM_PROC1);
        while read_volatile(PSM_FRCE_OFF) & PSM_PROC1 == 0 {}
        write_volatile(PSM_FRCE_OFF_CLR, PSM_PROC1);

        let stack_bottom = core::ptr::addr_of_mut!(CORE1_STACK) as u32;
        let stack_top = stack_bottom + (CORE1_STACK_WORDS * 4) as u32;

        let cmds: [u32; 6] = [
            0,
            0,
            1,
            read_volatile(PPB_VTOR),
            stack_top,
            entry as usize as u32,
        ];

        let mut i = 0;
        while i < cmds.len() {
            let cmd = cmds[i];
            if cmd == 0 {
                // Always drain before sending a zero, and wake the other
                // side in case it is parked in WFE.
                fifo_drain();
                cortex_m::asm::sev();
            }
            fifo_write_blocking(cmd);
            let response = fifo_read_blocking();
            i = if response == cmd { i + 1 } else { 0 };
        }
    }
}

/// Core 1: raise the corruption flag, then increment bytes of the scratch
/// region forever with a wrapping offset.
extern "C" fn clobber_memory() -> ! {
    ClobberWorker::new().run(&SCRATCH, &CLOBBER_ACTIVE, || false);
    // run() only returns when its shutdown probe fires, and this one never
    // does.
    loop {
        cortex_m::asm::nop();
    }
}

#[entry]
fn main() -> ! {
    unsafe {
        uart_init();
    }

    // Comment out this line to get things working.
    launch_core1(clobber_memory);

    // Constantly print a status line so we know the target is alive.
    let mut reporter = Reporter::new();
    reporter.run(&mut Uart0, &CLOBBER_ACTIVE, cpu_id, || false);

    loop {
        cortex_m::asm::nop();
    }
}
