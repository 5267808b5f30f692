//! Query-string filtering over the in-memory book list.

use serde::Deserialize;

use crate::catalog::model::Book;

/// Filters accepted by `GET /books`. All present filters must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookQuery {
    pub author: Option<String>,
    pub title: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub pages_min: Option<i64>,
    pub pages_max: Option<i64>,
}

impl BookQuery {
    pub fn matches(&self, book: &Book) -> bool {
        contains(&self.author, book.author.as_deref())
            && contains(&self.title, Some(book.title.as_str()))
            && contains(&self.language, book.language.as_deref())
            && contains(&self.country, book.country.as_deref())
            && self.pages_min.map_or(true, |min| book.pages.unwrap_or(0) >= min)
            && self.pages_max.map_or(true, |max| book.pages.unwrap_or(0) <= max)
    }

    /// Keep only the books matching every filter, preserving order.
    pub fn apply(&self, books: Vec<Book>) -> Vec<Book> {
        books.into_iter().filter(|b| self.matches(b)).collect()
    }
}

// Empty needles are ignored; absent fields behave like the empty string.
fn contains(needle: &Option<String>, field: Option<&str>) -> bool {
    match needle.as_deref() {
        None | Some("") => true,
        Some(needle) => field
            .unwrap_or("")
            .to_lowercase()
            .contains(&needle.to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, author: &str, pages: Option<i64>, language: &str) -> Book {
        Book {
            author: Some(author.into()),
            pages,
            language: Some(language.into()),
            ..Book::titled(title)
        }
    }

    fn sample() -> Vec<Book> {
        vec![
            book("Things Fall Apart", "Chinua Achebe", Some(209), "English"),
            book("Fairy tales", "Hans Christian Andersen", Some(784), "Danish"),
            book("The Divine Comedy", "Dante Alighieri", Some(928), "Italian"),
            book("Untitled draft", "Anonymous", None, "English"),
        ]
    }

    #[test]
    fn test_case_insensitive_substring() {
        let query = BookQuery {
            author: Some("ACHEBE".into()),
            ..Default::default()
        };
        let result = query.apply(sample());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Things Fall Apart");
    }

    #[test]
    fn test_filters_are_anded() {
        let query = BookQuery {
            language: Some("english".into()),
            pages_min: Some(100),
            ..Default::default()
        };
        let result = query.apply(sample());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].author.as_deref(), Some("Chinua Achebe"));
    }

    #[test]
    fn test_inclusive_page_bounds() {
        let query = BookQuery {
            pages_min: Some(209),
            pages_max: Some(784),
            ..Default::default()
        };
        let titles: Vec<_> = query.apply(sample()).into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["Things Fall Apart", "Fairy tales"]);
    }

    #[test]
    fn test_missing_pages_count_as_zero() {
        let query = BookQuery {
            pages_max: Some(0),
            ..Default::default()
        };
        let result = query.apply(sample());
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Untitled draft");
    }

    #[test]
    fn test_empty_query_keeps_everything() {
        let query = BookQuery {
            title: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(query.apply(sample()).len(), 4);
    }
}
