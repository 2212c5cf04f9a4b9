// src/lib.rs

//! EBD questionnaire ingestion library
//!
//! Turns a lesson PDF into audience-segmented questions and assigns them to
//! church members in a PostgREST backend.

pub mod categorizer;
pub mod error;
pub mod extract;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod storage;
pub mod utils;
