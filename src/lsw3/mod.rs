//! LSW-3 data logger protocol: request frames, TCP exchange and register decoding.

pub mod checksum;
pub mod decoder;
pub mod frame;
pub mod registers;
pub mod transport;
