pub mod codec;
pub mod decompile;
pub mod element;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod serialize;

pub use codec::{DecodedStep, decode, encode};
pub use decompile::{DecompileOptions, decompile, decompile_with};
pub use element::Element;
pub use error::{ComposeError, SnippetError};
pub use pipeline::{Composed, compose, compose_file};
pub use registry::{REGISTRY, StepDef};
pub use serialize::{is_snippet, read_snippet, to_snippet};
