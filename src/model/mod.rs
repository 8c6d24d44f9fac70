pub mod class;
pub mod class_file;
pub mod constant_pool;
pub mod method;
pub mod types;
pub mod value;
