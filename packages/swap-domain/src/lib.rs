pub mod attachment;
pub mod attributes;
pub mod conversation;
pub mod fuzzy;
pub mod geo;
pub mod item;
pub mod message;
pub mod rating;
pub mod time_serde;
pub mod user;
