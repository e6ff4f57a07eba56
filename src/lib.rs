//! Examen - AI-assisted answer examination
//!
//! Grades free-text answers to interview questions by sending them through a
//! chain of middleware stages (logging, configuration, credit admission,
//! recording) to one of several interchangeable language-model backends,
//! then decodes the model's verdict into an ordinal grade.

pub mod agent;
pub mod cli;
pub mod config;
pub mod exam;
pub mod grading;
pub mod ledger;
pub mod logging;
pub mod pipeline;
pub mod routing;
pub mod store;
