pub mod action;
pub mod config;
pub mod decision_log;
pub mod evaluator;
pub mod memory;
pub mod navigator;
pub mod page;
pub mod resolution;

pub use wayfind_common::catalog;
pub use wayfind_common::formatter;
pub use wayfind_common::protocol;
pub use wayfind_common::strategy;
