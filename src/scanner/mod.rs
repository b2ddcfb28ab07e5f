pub mod page_filter;
pub mod page_locator;
pub mod progress;

pub use page_filter::PageFilter;
pub use page_locator::{PageFile, PageIter, PageLocator, Pages};
pub use progress::PageProgress;
