pub mod core;
pub mod interfaces;
pub mod pre;
