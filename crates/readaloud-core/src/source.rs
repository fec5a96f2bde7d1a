//! Source text loading

use std::path::Path;

use tokio::io::AsyncReadExt;
use tracing::debug;

/// Read a document as UTF-8 text. `-` reads standard input.
pub async fn load_text(path: &Path) -> crate::Result<String> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf
    } else {
        tokio::fs::read_to_string(path).await?
    };

    debug!(path = %path.display(), bytes = text.len(), "Loaded source text");
    Ok(text)
}
