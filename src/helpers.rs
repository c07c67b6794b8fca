pub mod pagination;
pub mod validated_json;
pub mod validators;

pub use pagination::{ListParams, ListQuery, SortOrder};
pub use validated_json::ValidatedJson;
