pub mod centerline;
pub mod classify;
pub mod component;
pub mod error;
pub mod evanescent;
pub mod extract;
pub mod filter;
pub mod output;
pub mod path;
pub mod resample;
pub mod settings;
pub mod simplify;
