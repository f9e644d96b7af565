//! Data structures representing format components.
//!
//! Contains structured representations of the stream header, screen and
//! image descriptors, color tables and decoded frames, plus the surface and
//! palette types the compositor writes through.

pub mod color_table;
pub mod frame;
pub mod image;
pub mod screen;
pub mod surface;
