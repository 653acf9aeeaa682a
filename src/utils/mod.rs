pub mod text;

pub use text::{first_line, replace_hotel_name, strip_unwanted_prefixes};
