#![allow(clippy::needless_range_loop)]
#![allow(clippy::len_without_is_empty)]

//! Compact bitset rows and matrices. These record saturation information
//! between dual row systems: bit `j` of row `i` is set when the scalar
//! product of row `i` of one system and row `j` of the other is nonzero.

mod bit_matrix;
mod bit_row;

pub use bit_matrix::BitMatrix;
pub use bit_row::BitRow;
