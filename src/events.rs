mod emitter;

#[cfg(test)]
mod tests;

pub use emitter::{ConnectionId, EmitterBlocker, EventEmitter};
