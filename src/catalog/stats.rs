//! Aggregates over the whole catalog.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::catalog::model::Book;

/// Summary returned by `GET /books/stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStats {
    #[serde(rename = "total_libros")]
    pub total_books: usize,
    #[serde(rename = "total_paginas")]
    pub total_pages: i64,
    #[serde(rename = "promedio_paginas")]
    pub average_pages: f64,
    #[serde(rename = "año_más_antiguo")]
    pub oldest_year: String,
    #[serde(rename = "año_más_reciente")]
    pub newest_year: String,
    #[serde(rename = "autores_unicos")]
    pub unique_authors: usize,
    #[serde(rename = "paises_unicos")]
    pub unique_countries: usize,
    #[serde(rename = "idiomas_unicos")]
    pub unique_languages: usize,
}

/// Compute catalog statistics; `None` when there are no books.
///
/// Missing pages and years count as zero. Missing author, country or
/// language all collapse into one "Unknown" value for the unique counts.
pub fn compute(books: &[Book]) -> Option<CatalogStats> {
    let years = books.iter().map(|b| b.year.unwrap_or(0));
    let oldest = years.clone().min()?;
    let newest = years.max()?;

    let total_pages: i64 = books.iter().map(|b| b.pages.unwrap_or(0)).sum();

    Some(CatalogStats {
        total_books: books.len(),
        total_pages,
        average_pages: total_pages as f64 / books.len() as f64,
        oldest_year: format_year(oldest),
        newest_year: format_year(newest),
        unique_authors: count_unique(books, |b| b.author.as_deref()),
        unique_countries: count_unique(books, |b| b.country.as_deref()),
        unique_languages: count_unique(books, |b| b.language.as_deref()),
    })
}

/// Render a publication year; negative years read as "N B.C.".
pub fn format_year(year: i64) -> String {
    if year < 0 {
        format!("{} B.C.", year.unsigned_abs())
    } else {
        year.to_string()
    }
}

fn count_unique<F>(books: &[Book], field: F) -> usize
where
    F: Fn(&Book) -> Option<&str>,
{
    books
        .iter()
        .map(|b| field(b).unwrap_or("Unknown"))
        .collect::<HashSet<_>>()
        .len()
}

/// Fields that can be listed as sorted unique values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Authors,
    Languages,
    Countries,
}

impl Facet {
    /// JSON key holding the values in the listing response.
    pub fn key(self) -> &'static str {
        match self {
            Facet::Authors => "autores",
            Facet::Languages => "idiomas",
            Facet::Countries => "paises",
        }
    }

    /// Sorted, de-duplicated, non-empty values of this field.
    pub fn values(self, books: &[Book]) -> Vec<String> {
        books
            .iter()
            .filter_map(|b| match self {
                Facet::Authors => b.author.as_deref(),
                Facet::Languages => b.language.as_deref(),
                Facet::Countries => b.country.as_deref(),
            })
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(author: Option<&str>, country: &str, pages: Option<i64>, year: Option<i64>) -> Book {
        Book {
            author: author.map(String::from),
            country: Some(country.into()),
            pages,
            year,
            ..Book::titled("t")
        }
    }

    #[test]
    fn test_empty_catalog_has_no_stats() {
        assert!(compute(&[]).is_none());
    }

    #[test]
    fn test_stats() {
        let books = vec![
            book(Some("Homer"), "Greece", Some(608), Some(-700)),
            book(Some("Homer"), "Greece", Some(374), Some(-800)),
            book(None, "Spain", None, Some(1605)),
        ];
        let stats = compute(&books).unwrap();

        assert_eq!(stats.total_books, 3);
        assert_eq!(stats.total_pages, 982);
        assert!((stats.average_pages - 982.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(stats.oldest_year, "800 B.C.");
        assert_eq!(stats.newest_year, "1605");
        assert_eq!(stats.unique_authors, 2);
        assert_eq!(stats.unique_countries, 2);
        assert_eq!(stats.unique_languages, 1);
    }

    #[test]
    fn test_stats_json_keys() {
        let stats = compute(&[book(Some("A"), "B", Some(10), None)]).unwrap();
        let value = serde_json::to_value(stats).unwrap();
        assert_eq!(value["total_libros"], 1);
        assert_eq!(value["año_más_antiguo"], "0");
        assert_eq!(value["promedio_paginas"], 10.0);
    }

    #[test]
    fn test_format_year() {
        assert_eq!(format_year(-1200), "1200 B.C.");
        assert_eq!(format_year(0), "0");
        assert_eq!(format_year(1967), "1967");
    }

    #[test]
    fn test_facet_values_sorted_unique_non_empty() {
        let books = vec![
            book(Some("Tolstoy"), "Russia", None, None),
            book(Some(""), "France", None, None),
            book(Some("Austen"), "United Kingdom", None, None),
            book(Some("Tolstoy"), "Russia", None, None),
            book(None, "France", None, None),
        ];
        assert_eq!(Facet::Authors.values(&books), vec!["Austen", "Tolstoy"]);
        assert_eq!(
            Facet::Countries.values(&books),
            vec!["France", "Russia", "United Kingdom"]
        );
        assert!(Facet::Languages.values(&books).is_empty());
    }
}
