pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const BLOCKS_PER_BATCH: usize = 25;
pub const MAX_BLOCKS_PER_REQUEST: usize = BLOCKS_PER_BATCH * 10;
