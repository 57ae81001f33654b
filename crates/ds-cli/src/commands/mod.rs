pub mod copy;
pub mod exec;
pub mod lifecycle;
