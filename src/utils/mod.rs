pub mod callback_url;
pub use callback_url::{CallbackUrlError, is_private_ip, validate_callback_url};
