pub mod aggregate;
pub mod align;
pub mod error;
pub mod io;
pub mod mapping;
pub mod pipeline;
pub mod report;
pub mod sequence;
pub mod structure;
pub mod transfer;
pub mod variant;
