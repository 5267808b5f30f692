//! Route handlers for the book catalog.
//!
//! Handlers only run for requests the admission layer admitted. The
//! mutating ones take [`BasicAuth`] first so credentials are checked before
//! the body is parsed or the store touched.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::catalog::{parse_new_book, stats, Book, BookQuery, Facet};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::security::BasicAuth;

#[derive(Debug, Serialize)]
pub struct BookList {
    #[serde(rename = "Cantidad")]
    pub count: usize,
    #[serde(rename = "Libros")]
    pub books: Vec<Book>,
}

#[derive(Debug, Serialize)]
pub struct BookChange {
    pub message: &'static str,
    pub book: Book,
}

/// `GET /`: welcome message and endpoint overview.
pub async fn index() -> Json<Value> {
    Json(json!({
        "message": "Bienvenido a la API de Libros Clásicos",
        "endpoints": [
            "GET / - Muestra este mensaje",
            "GET /health - Estado del servicio",
            "GET /books - Buscar todos los libros",
            "GET /books?author=Name - Filtrar libros por autor",
            "GET /books?title=Title - Buscar libros por título",
            "GET /books?language=English - Filtrar por idioma",
            "GET /books?country=Spain - Filtrar por país",
            "GET /books?pages_min=200&pages_max=500 - Filtrar por rango de páginas",
            "GET /books/{id} - Buscar un libro específico por índice",
            "GET /books/stats - Estadísticas de la colección",
            "GET /books/authors - Listar todos los autores",
            "GET /books/languages - Listar todos los idiomas",
            "GET /books/countries - Listar todos los países",
            "POST /books - Agregar un libro (Basic Auth, protegido)",
            "DELETE /books/{id} - Eliminar un libro por índice (Basic Auth, protegido)",
            "Nota: POST/DELETE requieren Basic Auth; existe limitación de requests por IP (RATE_LIMIT_RPS)"
        ]
    }))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// `GET /books` with optional filters.
pub async fn list_books(
    State(state): State<AppState>,
    query: Result<Query<BookQuery>, QueryRejection>,
) -> Result<Json<BookList>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::Validation {
        location: vec!["query".into()],
        message: e.body_text(),
    })?;
    let books = query.apply(state.store.load());
    Ok(Json(BookList {
        count: books.len(),
        books,
    }))
}

/// `GET /books/{index}`.
///
/// Out-of-range indexes answer 200 with an `error` field, which existing
/// clients rely on.
pub async fn get_book(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Response, ApiError> {
    let index = parse_index(&raw)?;
    let books = state.store.load();

    let response = match usize::try_from(index).ok().and_then(|i| books.get(i)) {
        Some(book) => Json(book).into_response(),
        None => Json(json!({ "error": missing_book_message(index, books.len()) })).into_response(),
    };
    Ok(response)
}

/// `GET /books/stats`
pub async fn book_stats(State(state): State<AppState>) -> Response {
    let books = state.store.load();
    match stats::compute(&books) {
        Some(stats) => Json(stats).into_response(),
        None => Json(json!({ "error": "Ningún libro encontrado" })).into_response(),
    }
}

pub async fn list_authors(State(state): State<AppState>) -> Json<Value> {
    facet(&state, Facet::Authors)
}

pub async fn list_languages(State(state): State<AppState>) -> Json<Value> {
    facet(&state, Facet::Languages)
}

pub async fn list_countries(State(state): State<AppState>) -> Json<Value> {
    facet(&state, Facet::Countries)
}

fn facet(state: &AppState, facet: Facet) -> Json<Value> {
    let values = facet.values(&state.store.load());
    let mut body = serde_json::Map::new();
    body.insert("cantidad".into(), values.len().into());
    body.insert(facet.key().into(), values.into());
    Json(Value::Object(body))
}

/// `POST /books` (Basic auth).
pub async fn add_book(
    State(state): State<AppState>,
    BasicAuth(user): BasicAuth,
    body: axum::body::Bytes,
) -> Result<Json<BookChange>, ApiError> {
    let payload: Value = serde_json::from_slice(&body).map_err(|e| ApiError::Validation {
        location: vec!["body".into()],
        message: e.to_string(),
    })?;
    let book = parse_new_book(payload)?;

    let index = state.store.append(book.clone())?;
    tracing::info!(user = %user, index, title = %book.title, "Book added");

    Ok(Json(BookChange {
        message: "Libro agregado",
        book,
    }))
}

/// `DELETE /books/{index}` (Basic auth).
pub async fn delete_book(
    State(state): State<AppState>,
    BasicAuth(user): BasicAuth,
    Path(raw): Path<String>,
) -> Result<Json<BookChange>, ApiError> {
    let index = parse_index(&raw)?;
    let position = usize::try_from(index).map_err(|_| {
        ApiError::NotFound(missing_book_message(index, state.store.load().len()))
    })?;

    match state.store.remove(position)? {
        Ok(book) => {
            tracing::info!(user = %user, index, title = %book.title, "Book deleted");
            Ok(Json(BookChange {
                message: "Libro eliminado",
                book,
            }))
        }
        Err(len) => Err(ApiError::NotFound(missing_book_message(index, len))),
    }
}

/// Fallback for unknown paths.
pub async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not Found" })))
}

fn parse_index(raw: &str) -> Result<i64, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::invalid_param("path", "book_id", "value is not a valid integer"))
}

fn missing_book_message(index: i64, len: usize) -> String {
    if len == 0 {
        format!("El libro con ID {index} no existe. La colección está vacía.")
    } else {
        format!(
            "El libro con ID {index} no existe. Pruebe con un índice entre 0 y {}.",
            len - 1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_book_message() {
        assert_eq!(
            missing_book_message(9, 3),
            "El libro con ID 9 no existe. Pruebe con un índice entre 0 y 2."
        );
        assert!(missing_book_message(0, 0).contains("vacía"));
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("12").unwrap(), 12);
        assert_eq!(parse_index("-1").unwrap(), -1);
        assert!(matches!(parse_index("abc"), Err(ApiError::Validation { .. })));
    }
}
