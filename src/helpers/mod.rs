//! Low-level access to the xlsx package: readers, zip parts and XML events

pub(crate) mod reader;
pub mod xml;
pub(crate) mod zip;
