pub mod debug;
pub mod enrich;
pub mod favorites;
pub mod filter;
pub mod generation;
pub mod merge;
pub mod pages;
