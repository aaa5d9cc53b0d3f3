use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::models::{image::ImageLocation, result::AnalysisResult, user::User};

/// WAL operation types, one JSON object per line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WalOperation {
    /// Full snapshot of a user after creation or mutation
    PutUser { user: User },
    RemoveUser { id: u32 },
    AddImage { image: ImageLocation },
    AddResult { result: AnalysisResult },
    RemoveResult { id: u32 },
}

impl WalOperation {
    fn to_line(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to encode WAL operation")
    }

    fn from_line(line: &str) -> Result<Self> {
        serde_json::from_str(line).context("Failed to decode WAL operation")
    }
}

pub struct Wal {
    file: Arc<Mutex<File>>,
    path: PathBuf,
}

impl Wal {
    pub fn new(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open WAL file")?;

        Ok(Wal {
            file: Arc::new(Mutex::new(file)),
            path,
        })
    }

    pub fn log_operation(&self, op: &WalOperation) -> Result<()> {
        let line = op.to_line()?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("WAL lock poisoned"))?;
        writeln!(file, "{}", line).context("Failed to write to WAL")?;
        file.flush().context("Failed to flush WAL")?;
        Ok(())
    }

    pub fn replay(&self) -> Result<Vec<WalOperation>> {
        let file = File::open(&self.path).context("Failed to open WAL for replay")?;
        let reader = BufReader::new(file);
        let mut operations = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.context("Failed to read line from WAL")?;
            let line = line.trim();

            // Skip empty lines
            if line.is_empty() {
                continue;
            }

            match WalOperation::from_line(line) {
                Ok(op) => operations.push(op),
                Err(e) => {
                    tracing::warn!(
                        line_num = line_num + 1,
                        error = %e,
                        "Failed to parse WAL line, skipping"
                    );
                }
            }
        }

        Ok(operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use chrono::Utc;
    use std::fs;
    use tempfile::TempDir;

    fn sample_user() -> User {
        User::new(7, "alice@x.com".to_string(), "$argon2id$hash".to_string(), Role::User)
    }

    #[test]
    fn test_wal_operation_line_format() {
        let op = WalOperation::RemoveUser { id: 7 };
        assert_eq!(op.to_line().unwrap(), r#"{"op":"remove_user","id":7}"#);

        let op = WalOperation::PutUser { user: sample_user() };
        let line = op.to_line().unwrap();
        assert!(line.starts_with(r#"{"op":"put_user""#));
        assert_eq!(WalOperation::from_line(&line).unwrap(), op);
    }

    #[test]
    fn test_wal_log_and_replay() {
        let temp_dir = TempDir::new().unwrap();
        let wal_path = temp_dir.path().join("test.wal");

        let wal = Wal::new(wal_path.clone()).unwrap();

        let image = ImageLocation {
            id: 1,
            user_id: 7,
            latitude: 1.0,
            longitude: 2.0,
            image: vec![0xde, 0xad, 0xbe, 0xef],
            created_at: Utc::now(),
        };
        let result = AnalysisResult {
            id: 1,
            user_id: 7,
            vegetation_loss_percent: 7.5,
            poisoning_detected: true,
            created_at: Utc::now(),
        };

        wal.log_operation(&WalOperation::PutUser { user: sample_user() }).unwrap();
        wal.log_operation(&WalOperation::AddImage { image: image.clone() }).unwrap();
        wal.log_operation(&WalOperation::AddResult { result: result.clone() }).unwrap();
        wal.log_operation(&WalOperation::RemoveResult { id: 1 }).unwrap();

        let operations = wal.replay().unwrap();
        assert_eq!(operations.len(), 4);

        match &operations[1] {
            WalOperation::AddImage { image: replayed } => {
                assert_eq!(replayed, &image);
            }
            _ => panic!("Expected AddImage"),
        }

        match &operations[2] {
            WalOperation::AddResult { result: replayed } => {
                assert_eq!(replayed.vegetation_loss_percent, 7.5);
                assert!(replayed.poisoning_detected);
            }
            _ => panic!("Expected AddResult"),
        }

        assert_eq!(operations[3], WalOperation::RemoveResult { id: 1 });
    }

    #[test]
    fn test_wal_invalid_lines() {
        let temp_dir = TempDir::new().unwrap();
        let wal_path = temp_dir.path().join("test.wal");

        fs::write(
            &wal_path,
            "INVALID_OP|data\n\n{\"op\":\"remove_user\",\"id\":3}\n{\"op\":\"unknown\"}\n",
        )
        .unwrap();

        let wal = Wal::new(wal_path).unwrap();
        let operations = wal.replay().unwrap();

        // Should skip invalid lines and parse the valid one
        assert_eq!(operations, vec![WalOperation::RemoveUser { id: 3 }]);
    }
}
