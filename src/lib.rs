pub mod arena;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod fs;
pub mod heap;
pub mod parser;
pub mod rbtree;
pub mod reply;
pub mod ride;
pub mod runner;
mod serializer;
