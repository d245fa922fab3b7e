#![no_std]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod leb128;
#[cfg(feature = "alloc")]
pub mod map;
#[cfg(feature = "alloc")]
pub mod message;
#[cfg(feature = "alloc")]
pub mod packed;
#[cfg(feature = "alloc")]
pub mod repeated;
#[cfg(feature = "alloc")]
pub mod scalar;
mod util;
pub mod value;
pub mod wire;
