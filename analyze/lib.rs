#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]
pub mod analysis;
pub mod config;
pub mod data;
pub mod encode;
pub mod indicators;
pub mod label;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod risk;
pub mod split;
pub mod svm;
pub mod weights;
