// Copyright 2025 OStore Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::Path;

use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Overwrite `path` atomically: write a sibling `.tmp` file, fsync it, then
/// rename over the destination. Readers observe either the old file or the
/// new one, never a torn write.
pub async fn write_file_atomic(path: impl AsRef<Path>, data: &[u8]) -> std::io::Result<()> {
    let path = path.as_ref();
    let tmp = match path.file_name() {
        Some(name) => {
            let mut tmp_name = name.to_os_string();
            tmp_name.push(".tmp");
            path.with_file_name(tmp_name)
        }
        None => {
            return Err(std::io::Error::other(format!("not a file path: {}", path.display())));
        }
    };

    let mut file = fs::File::create(&tmp).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);

    if let Err(err) = fs::rename(&tmp, path).await {
        // leave no droppings next to the destination
        let _ = fs::remove_file(&tmp).await;
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn overwrite_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");

        write_file_atomic(&path, b"one").await.unwrap();
        assert_eq!(fs::read(&path).await.unwrap(), b"one");

        write_file_atomic(&path, b"two").await.unwrap();
        assert_eq!(fs::read(&path).await.unwrap(), b"two");

        // no tmp file survives a successful write
        assert!(!dir.path().join("doc.json.tmp").exists());
    }

    #[tokio::test]
    async fn rejects_bare_root() {
        assert!(write_file_atomic("/", b"x").await.is_err());
    }
}
