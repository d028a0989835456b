//! Shared fixtures for unit tests.

use crate::models::FileRecord;

pub fn sample_file(
    id: &str,
    file_name: &str,
    file_type: &str,
    category: Option<&str>,
    description: Option<&str>,
) -> FileRecord {
    FileRecord {
        id: id.to_string(),
        file_name: file_name.to_string(),
        file_type: file_type.to_string(),
        file_size: 1024,
        category: category.map(str::to_string),
        description: description.map(str::to_string),
        novel_id: None,
        created_at: None,
    }
}
