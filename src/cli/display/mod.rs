//! Display module for formatted CLI output

pub mod health;
pub mod table;

pub use health::ReplicaHealth;
pub use table::{format_age, TableRenderer};
