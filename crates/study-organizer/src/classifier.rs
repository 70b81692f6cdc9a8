use std::path::Path;

use crate::types::Category;

/// Extension of a bare file name: whatever follows the last `.`.
/// Names without a dot, or whose only dot leads the name (`.bashrc`), have none.
pub fn extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => &file_name[pos + 1..],
        _ => "",
    }
}

pub fn classify(file_name: &str) -> Category {
    Category::from_extension(extension(file_name))
}

pub fn classify_path(path: &Path) -> Category {
    path.file_name()
        .map(|n| classify(&n.to_string_lossy()))
        .unwrap_or(Category::Others)
}
