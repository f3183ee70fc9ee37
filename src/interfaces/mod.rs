//! Text-based edges: CSV catalogs in, CSV reports out.

pub mod csv;
