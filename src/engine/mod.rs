pub mod sst;
pub mod storage;
