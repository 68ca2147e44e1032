//! `.dcz` container I/O: the public compress / decompress / verify surface
//! plus the byte-exact footer format.

pub mod compress;
pub mod decompress;
pub mod file_io;
pub mod footer;
pub mod opts;
pub mod verify;

pub use compress::compress;
pub use decompress::{decompress, read_container};
pub use footer::{ChunkMeta, Footer, CHUNK_META_SIZE, DCZ_MAGIC, FORMAT_VERSION, RAW_CHUNK_FLAG};
pub use opts::{Metrics, Options, VerifyMode};
pub use verify::{read_info, verify, ContainerInfo};
