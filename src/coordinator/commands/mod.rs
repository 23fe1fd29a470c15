pub mod read_block;
