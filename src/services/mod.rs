pub mod aspect;
pub mod assets;
pub mod ingest;
pub mod media;
pub mod staging;
pub mod storage;
pub mod videos;
