//! This utility converts EtherCAT Network Information (ENI) files, as
//! exported by EtherCAT configuration tools, into C source that statically
//! initializes the `ec_enit` configuration of an SOEM master application.
//!
//! The conversion is a single forward pass: the XML document is parsed into
//! a [`Configuration`](config::Configuration), which is then written out as
//! nested C initializers.

extern crate xml;

pub mod cgen;
pub mod config;
pub mod element;
pub mod error;
pub mod generate;

use std::io;

pub use crate::config::{parse_eni, CoEInitCommand, Configuration, SlaveConfig};
pub use crate::error::EniError;
pub use crate::generate::generate;

pub const DEFAULT_INCLUDE: &str = "soem/soem.h";

/// This structure contains arguments used to customize the generated C file.
#[derive(Debug, Clone)]
pub struct Args {
    /// Header named in the `#include` directive at the top of the file.
    pub include: String,
}

impl Args {
    pub fn new<S: Into<String>>(include: S) -> Args {
        Args { include: include.into() }
    }
}

impl Default for Args {
    fn default() -> Args {
        Args::new(DEFAULT_INCLUDE)
    }
}

/// Convert an ENI document to C.
///
/// The input is parsed completely before anything is written, so a schema or
/// value error never produces partial output.
pub fn process<I, O>(args: &Args, fin: I, fout: O) -> Result<(), EniError> where
    I: io::Read,
    O: io::Write,
{
    let config = parse_eni(fin)?;
    generate(args, &config, fout)?;
    Ok(())
}
