mod digest;

pub use digest::{
    compute_digest, sha256_hex, is_sha256_hex, DigestResult, HashProvider, Sha256Provider,
    EMPTY_SHA256, READ_CHUNK_SIZE,
};
