pub mod pool;
pub mod render;
