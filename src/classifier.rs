// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 filekeeper contributors

//! Static extension-to-category and date-bucket classification

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of file categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Documents,
    Images,
    Videos,
    Audio,
    Archives,
    Others,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Documents,
        Category::Images,
        Category::Videos,
        Category::Audio,
        Category::Archives,
        Category::Others,
    ];

    /// Map a lowercased extension (no leading dot) to its category.
    /// Total: anything unknown is `Others`.
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_lowercase().as_str() {
            "pdf" | "doc" | "docx" | "txt" | "rtf" | "odt" | "xls" | "xlsx" | "ppt" | "pptx"
            | "csv" | "md" => Category::Documents,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "svg" | "ico" | "webp" | "tiff" | "tif" => {
                Category::Images
            }
            "mp4" | "avi" | "mkv" | "mov" | "wmv" | "flv" | "webm" | "m4v" | "mpg" | "mpeg" => {
                Category::Videos
            }
            "mp3" | "wav" | "flac" | "aac" | "ogg" | "wma" | "m4a" | "opus" => Category::Audio,
            "zip" | "rar" | "7z" | "tar" | "gz" | "bz2" | "xz" | "iso" => Category::Archives,
            _ => Category::Others,
        }
    }

    /// Folder name used when organizing by type.
    pub fn folder_name(&self) -> &'static str {
        match self {
            Category::Documents => "Documents",
            Category::Images => "Images",
            Category::Videos => "Videos",
            Category::Audio => "Audio",
            Category::Archives => "Archives",
            Category::Others => "Others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder_name())
    }
}

/// Format a file's recorded modification time as a `YYYY-MM-DD` folder
/// name. The timestamp is used as stored; no timezone conversion.
pub fn date_bucket(modified: DateTime<Local>) -> String {
    modified.format("%Y-%m-%d").to_string()
}

/// A single user-defined organization rule: files whose name contains
/// `pattern` (case-insensitive) go to `folder`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRule {
    pub pattern: String,
    pub folder: String,
}

/// Find the target folder for a filename. Rules are tried in declaration
/// order and the first match wins; no match means no project folder.
pub fn match_project_rule<'a>(rules: &'a [ProjectRule], file_name: &str) -> Option<&'a str> {
    let name_lower = file_name.to_lowercase();
    rules
        .iter()
        .find(|rule| name_lower.contains(&rule.pattern.to_lowercase()))
        .map(|rule| rule.folder.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_known_extensions() {
        assert_eq!(Category::from_extension("pdf"), Category::Documents);
        assert_eq!(Category::from_extension("md"), Category::Documents);
        assert_eq!(Category::from_extension("png"), Category::Images);
        assert_eq!(Category::from_extension("mkv"), Category::Videos);
        assert_eq!(Category::from_extension("opus"), Category::Audio);
        assert_eq!(Category::from_extension("7z"), Category::Archives);
    }

    #[test]
    fn test_classification_is_total() {
        // Unknown, empty, and oddly-cased extensions all land somewhere
        assert_eq!(Category::from_extension("unknownext"), Category::Others);
        assert_eq!(Category::from_extension(""), Category::Others);
        assert_eq!(Category::from_extension("PDF"), Category::Documents);
        assert_eq!(Category::from_extension("JpEg"), Category::Images);
    }

    #[test]
    fn test_date_bucket_is_zero_padded() {
        let moment = Local.with_ymd_and_hms(2024, 3, 7, 9, 5, 0).unwrap();
        assert_eq!(date_bucket(moment), "2024-03-07");
    }

    #[test]
    fn test_project_rules_first_match_wins() {
        let rules = vec![
            ProjectRule {
                pattern: "report".to_string(),
                folder: "Reports".to_string(),
            },
            ProjectRule {
                pattern: "rep".to_string(),
                folder: "Misc".to_string(),
            },
        ];
        assert_eq!(match_project_rule(&rules, "Annual_Report.pdf"), Some("Reports"));
        assert_eq!(match_project_rule(&rules, "repro.txt"), Some("Misc"));
        assert_eq!(match_project_rule(&rules, "photo.png"), None);
    }
}
