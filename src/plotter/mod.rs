//! # Plotter Protocol Module
//!
//! The HP-GL command subset used to steer the pen plotter.
//!
//! This module handles:
//! - Command values and their ASCII rendering
//! - Writing each command to the serial transport and flushing it

pub mod command;
pub mod emitter;
