mod controller_error;
mod loader_error;

pub use controller_error::{ControllerError, ControllerResult};
pub use loader_error::ClipLoaderError;
