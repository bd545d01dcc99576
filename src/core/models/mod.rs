pub mod badge;
pub mod usage;
