pub mod project;
pub mod research;
