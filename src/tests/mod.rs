mod array;
mod shard;
