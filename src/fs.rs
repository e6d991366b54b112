use std::path::{Path, PathBuf};

use rand::Rng;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::warn;

use crate::errors::FsError;

pub async fn read_commands(path: impl AsRef<Path>) -> Result<String, FsError> {
    let mut file = File::open(path.as_ref()).await.map_err(|_| FsError::ReadFailed)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).await.map_err(|_| FsError::ReadFailed)?;
    Ok(contents)
}

/// Writes `data` next to `path` under a temporary name, then renames it into
/// place so readers never see a half-written file.
pub async fn save_output(path: impl AsRef<Path>, data: &[u8]) -> Result<(), FsError> {
    let path = path.as_ref();
    let tmp = tmp_path_for(path);

    let mut fp = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp)
        .await
        .map_err(|_| FsError::WriteFailed)?;

    if fp.write_all(data).await.is_err() || fp.sync_all().await.is_err() {
        discard_tmp(&tmp).await;
        return Err(FsError::WriteFailed);
    }
    drop(fp);

    if fs::rename(&tmp, path).await.is_err() {
        discard_tmp(&tmp).await;
        return Err(FsError::WriteFailed);
    }
    Ok(())
}

async fn discard_tmp(tmp: &Path) {
    if let Err(err) = fs::remove_file(tmp).await {
        warn!(path = %tmp.display(), cause = %err, "couldn't remove temporary file");
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.{}", name, generate_tmp_name()))
}

fn generate_tmp_name() -> String {
    let mut rng = rand::thread_rng();

    format!("tmp.{}", rng.gen::<u32>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_save_and_read_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("output.txt");

        save_output(&path, b"(1,10,5)\n(0,0,0)").await.unwrap();
        assert_eq!(read_commands(&path).await.unwrap(), "(1,10,5)\n(0,0,0)");

        // Overwrites and leaves no temporary files behind.
        save_output(&path, b"No active ride requests").await.unwrap();
        assert_eq!(read_commands(&path).await.unwrap(), "No active ride requests");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = tempdir().unwrap();
        let result = read_commands(dir.path().join("input.txt")).await;
        assert_eq!(result, Err(FsError::ReadFailed));
    }

    #[tokio::test]
    async fn test_failed_rename_removes_tmp_file() {
        let dir = tempdir().unwrap();
        // A non-empty directory can't be replaced by a file.
        let target = dir.path().join("output.txt");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();

        let result = save_output(&target, b"(1,10,5)").await;
        assert_eq!(result, Err(FsError::WriteFailed));

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("output.txt")]);
        assert!(target.join("keep").exists());
    }

    #[tokio::test]
    async fn test_save_into_missing_directory() {
        let dir = tempdir().unwrap();
        let result = save_output(dir.path().join("nope").join("output.txt"), b"x").await;
        assert_eq!(result, Err(FsError::WriteFailed));
    }
}
