//! Pure views over a file snapshot.
//!
//! Each function borrows its input and returns references, so views chain
//! without copying:
//!
//! ```
//! use novel_files::classify::Accept;
//! use novel_files::query::{filter_by_category, filter_by_type, search_files};
//! # let files: Vec<novel_files::FileRecord> = Vec::new();
//! let accept = Accept::parse(["image/*"]);
//! let covers = search_files(filter_by_type(filter_by_category(&files, "cover"), &accept), "dragon");
//! # assert!(covers.is_empty());
//! ```

use crate::classify::Accept;
use crate::models::FileRecord;

/// Records whose category equals `category` exactly. An empty category
/// passes everything through.
pub fn filter_by_category<'a, I>(files: I, category: &str) -> Vec<&'a FileRecord>
where
    I: IntoIterator<Item = &'a FileRecord>,
{
    if category.is_empty() {
        return files.into_iter().collect();
    }
    files
        .into_iter()
        .filter(|f| f.in_category(category))
        .collect()
}

/// Records accepted by any matcher in `accept`.
pub fn filter_by_type<'a, I>(files: I, accept: &Accept) -> Vec<&'a FileRecord>
where
    I: IntoIterator<Item = &'a FileRecord>,
{
    files
        .into_iter()
        .filter(|f| accept.allows(&f.file_name, &f.file_type))
        .collect()
}

/// Case-insensitive substring search over file name and description.
pub fn search_files<'a, I>(files: I, keyword: &str) -> Vec<&'a FileRecord>
where
    I: IntoIterator<Item = &'a FileRecord>,
{
    if keyword.is_empty() {
        return files.into_iter().collect();
    }
    let keyword = keyword.to_lowercase();
    files
        .into_iter()
        .filter(|f| f.contains_keyword(&keyword))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::sample_file;

    fn library() -> Vec<FileRecord> {
        vec![
            sample_file("1", "cover.png", "image/png", Some("cover"), None),
            sample_file("2", "Outline.PDF", "application/pdf", Some("reference"), None),
            sample_file("3", "map.jpg", "image/jpeg", Some("reference"), Some("World map")),
            sample_file("4", "notes.txt", "text/plain", None, None),
            sample_file("5", "alt-cover.png", "image/png", Some("Cover"), None),
        ]
    }

    fn ids(files: &[&FileRecord]) -> Vec<String> {
        files.iter().map(|f| f.id.clone()).collect()
    }

    #[test]
    fn test_category_exact_match() {
        let files = library();
        assert_eq!(ids(&filter_by_category(&files, "cover")), vec!["1"]);
        assert_eq!(ids(&filter_by_category(&files, "reference")), vec!["2", "3"]);
        assert!(filter_by_category(&files, "missing").is_empty());
    }

    #[test]
    fn test_empty_category_passes_through() {
        let files = library();
        assert_eq!(filter_by_category(&files, "").len(), files.len());
    }

    #[test]
    fn test_type_filter_combines_matchers() {
        let files = library();
        let accept = Accept::parse(["image/*", ".pdf"]);
        assert_eq!(ids(&filter_by_type(&files, &accept)), vec!["1", "2", "3", "5"]);

        let exact = Accept::parse(["text/plain"]);
        assert_eq!(ids(&filter_by_type(&files, &exact)), vec!["4"]);
    }

    #[test]
    fn test_empty_accept_passes_through() {
        let files = library();
        assert_eq!(filter_by_type(&files, &Accept::any()).len(), files.len());
    }

    #[test]
    fn test_search_name_or_description() {
        let files = vec![
            sample_file("a", "Dragon.png", "image/png", None, None),
            sample_file("b", "cat.png", "image/png", None, Some("a dragon sketch")),
            sample_file("c", "dog.png", "image/png", None, None),
        ];
        assert_eq!(ids(&search_files(&files, "dragon")), vec!["a", "b"]);
        assert_eq!(ids(&search_files(&files, "DRAGON")), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_keyword_passes_through() {
        let files = library();
        assert_eq!(search_files(&files, "").len(), files.len());
    }

    #[test]
    fn test_views_preserve_order_and_chain() {
        let files = library();
        let images = filter_by_type(&files, &Accept::parse(["image/*"]));
        let refs = filter_by_category(images, "reference");
        let found = search_files(refs, "world");
        assert_eq!(ids(&found), vec!["3"]);
    }
}
