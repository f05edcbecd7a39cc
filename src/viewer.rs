mod config;
mod model;
mod reconcile;
mod svg;

#[cfg(test)]
mod tests;

pub use config::ViewerConfig;
pub use model::{ResetView, ViewerEvents, ViewerModel};
