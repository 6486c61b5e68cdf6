// src/lib.rs

//! CRWLR: subdomain and path discovery crawler library

pub mod crawler;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
