//! kpiboard_engine - A1 references, text normalization and table location.

pub mod engine;
