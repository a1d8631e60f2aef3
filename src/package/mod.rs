//! OPC package access: locating parts inside the PPTX zip container and
//! writing the container back out.

mod reader;
mod writer;

pub(crate) use reader::{Package, strip_bom};
pub(crate) use writer::write_package;

/// Media type of a PPTX presentation, for callers serving generated output.
pub const PPTX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
