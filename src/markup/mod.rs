pub mod tree;
pub mod walk;

pub use tree::{Attribute, Element, MarkupError, QualifiedName, PENCIL_NS, SVG_NS};
pub use walk::{descendants, itertext, walk_mut, Descendants, MarkupNode};
