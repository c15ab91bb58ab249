mod memory;
mod redis;

pub use memory::MemoryRepository;
pub use redis::RedisRepository;
