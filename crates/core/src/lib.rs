#![cfg_attr(not(feature = "std"), no_std)]

pub mod flag;
pub mod hex;
pub mod region;
pub mod reporter;
#[cfg(feature = "std")]
pub mod sim;
pub mod worker;

mod tests;

pub use flag::{ClobberFlag, CLOBBER_ACTIVE};
pub use hex::print_hex;
pub use region::{AtomicScratch, ScratchRegion, REGION_LEN};
pub use reporter::{Reporter, SerialSink};
pub use worker::ClobberWorker;
