pub mod config;
pub mod defaulters;
pub mod domain;
pub mod error;
pub mod report;
pub mod rules;
