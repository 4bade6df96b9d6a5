pub mod eel_error;
pub mod eel_function;
pub mod eel_object;
mod eel_ops;
pub mod eel_value;

pub use eel_error::{EelError, EelResult};
pub use eel_function::EelFunction;
pub use eel_object::EelObject;
pub use eel_value::{EelValue, EelValueMap, EelValueVec};
