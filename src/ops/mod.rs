pub mod index;
pub mod insert;
pub mod search;
pub mod tag_match;
