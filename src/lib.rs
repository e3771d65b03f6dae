//! A serial bridge between a host computer and an OV7670 image sensor.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod dispatch;
pub mod frame_buf;
pub mod ov7670;
pub mod protocol;
pub mod xclk;

#[cfg(feature = "board")]
pub mod board;

#[cfg(test)]
mod mock;
