// lib.rs
pub mod alignment_record;
pub mod cigar;
pub mod commands;
pub mod error;
pub mod mapper;
pub mod query;
pub mod registry;
pub mod report;
pub mod seqidx;
pub mod tsv;
