#![doc = env!("CARGO_PKG_DESCRIPTION")]

#[doc(inline)]
pub use handeye_algebra as algebra;

#[doc(inline)]
pub use handeye_calib as calib;
