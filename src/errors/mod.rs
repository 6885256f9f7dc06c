pub mod watson_error;

pub use watson_error::{UNAUTHORIZED_MESSAGE, WatsonError, WatsonResult};
