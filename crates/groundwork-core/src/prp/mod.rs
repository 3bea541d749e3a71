pub mod writer;

pub use writer::{project_name_from_topic, PrpWriter};
