//! Parameter-file codecs and command builders for the Dr. Probe
//! electron-microscopy simulation tools.

pub mod commands;
pub mod domain;
pub mod prm;
pub(crate) mod serialization;
