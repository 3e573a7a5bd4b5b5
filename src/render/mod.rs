mod core;

pub use core::{MarkupRenderer, RendererSettings};
