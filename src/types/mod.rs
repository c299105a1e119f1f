pub mod callbacks;
pub mod property_type;
