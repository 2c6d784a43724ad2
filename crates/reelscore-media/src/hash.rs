//! Content identifiers.

use std::path::Path;

use reelscore_models::ContentId;
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use crate::error::MediaResult;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Stream a file through SHA-256 and return its content identifier.
///
/// The file is read in fixed-size chunks and never held in memory whole.
pub async fn content_hash(path: impl AsRef<Path>) -> MediaResult<ContentId> {
    let mut file = tokio::fs::File::open(path.as_ref()).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(ContentId::from_digest(&hasher.finalize()))
}
