mod page;

pub use page::{page_plugin, PageCamera, PageLayout, SectionId};
