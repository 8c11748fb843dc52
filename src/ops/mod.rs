pub mod daily;
pub mod search;
pub mod select;
