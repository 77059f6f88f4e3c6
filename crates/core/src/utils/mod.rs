pub mod id_utils;
pub mod time_utils;

pub use id_utils::generate_id;
