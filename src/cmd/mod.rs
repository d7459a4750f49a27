pub mod check;
pub mod pack;
