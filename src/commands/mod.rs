pub mod filter;
pub mod tree;
pub mod validate;
