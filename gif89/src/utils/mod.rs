//! Utility functions and supporting infrastructure.
//!
//! Provides the bounds-checked byte cursor, sub-block framing, LSB-first code
//! reading and the error types shared by the decoding pipeline.

pub mod bitstream_io;
pub mod cursor;
pub mod errors;
pub mod sub_block;
