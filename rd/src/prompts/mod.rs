//! Prompt template handling
//!
//! Templates are Handlebars `.pmt` files, embedded at build time with a
//! file-override chain for customization.

mod embedded;
mod loader;

pub use embedded::get_embedded;
pub use loader::PromptLoader;
