pub mod brave;

pub use brave::{SearchClient, SearchError, SearchQuery};
