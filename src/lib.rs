//! # Joyplot Library
//!
//! Drive a pen plotter with an analog joystick.
//!
//! This library turns stick deflection into a stream of HP-GL relative
//! moves sent over a serial line, with the fire button raising and lowering
//! the pen and the keyboard selecting pens and changing speed.

pub mod config;
pub mod control_loop;
pub mod controller;
pub mod error;
pub mod input;
pub mod keyboard;
pub mod plotter;
pub mod serial;
pub mod state;
