pub mod phone;
pub use phone::{is_valid_phone_number, normalize_phone_number};
