pub mod quota;
pub mod sample;
