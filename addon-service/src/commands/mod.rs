pub mod install;
pub mod serve;
