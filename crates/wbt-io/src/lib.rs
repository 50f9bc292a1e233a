pub mod keyboard;

pub use keyboard::{ActionEmitter, EmitError, EnigoEmitter, pointer_position};
