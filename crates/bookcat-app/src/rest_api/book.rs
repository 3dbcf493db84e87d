//! REST endpoints for the book catalog.

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json,
};
use axum_valid::Garde;
use garde::Validate;
use http::{header, StatusCode};
use serde::{Deserialize, Serialize};
use time::Date;
use tracing::{debug, error};

use bookcat_dal::{
    book::{Book, BookRepository, CreateBook, UpdateBook},
    BookFilter, DateFilter, PriceFilter, TextField,
};
use bookcat_types::claim::{ApiClaim, Role};

use crate::{
    auth::require_role,
    error::{ApiError, ApiResult},
    state::AppState,
    validators,
};

crate::repository_from_request!(BookRepository);

// Contracts ==============================================================

/// Create request. Price and publish date arrive as strings so that all
/// malformed fields can be reported in one validation pass.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateBookRequest {
    #[garde(length(min = 1, max = 255))]
    pub author: Option<String>,
    #[garde(length(max = 5000))]
    pub description: Option<String>,
    #[garde(length(min = 1, max = 511))]
    pub title: Option<String>,
    #[garde(length(max = 255))]
    pub genre: Option<String>,
    #[garde(length(min = 1, max = 64))]
    pub price: String,
    #[garde(length(min = 1, max = 64))]
    pub publish_date: String,
}

/// Merge-patch update request: absent fields keep their stored values.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateBookRequest {
    #[garde(length(min = 1, max = 255))]
    pub author: Option<String>,
    #[garde(length(max = 5000))]
    pub description: Option<String>,
    #[garde(length(min = 1, max = 511))]
    pub title: Option<String>,
    #[garde(length(max = 255))]
    pub genre: Option<String>,
    #[garde(length(min = 1, max = 64))]
    pub price: Option<String>,
    #[garde(length(min = 1, max = 64))]
    pub publish_date: Option<String>,
}

impl validators::BookRequest for CreateBookRequest {
    fn price(&self) -> Option<&str> {
        Some(&self.price)
    }
    fn publish_date(&self) -> Option<&str> {
        Some(&self.publish_date)
    }
}

impl validators::BookRequest for UpdateBookRequest {
    fn price(&self) -> Option<&str> {
        self.price.as_deref()
    }
    fn publish_date(&self) -> Option<&str> {
        self.publish_date.as_deref()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookResponse {
    pub id: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub price: Option<f64>,
    pub publish_date: Option<Date>,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        BookResponse {
            id: book.id,
            author: book.author,
            description: book.description,
            title: book.title,
            genre: book.genre,
            price: book.price,
            publish_date: book.publish_date,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct PriceRangeQuery {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

fn to_create(payload: CreateBookRequest) -> ApiResult<CreateBook> {
    let price = validators::parse_price(&payload.price)
        .ok_or_else(|| ApiError::Validation(validators::PRICE_MESSAGE.to_string()))?;
    let publish_date = validators::parse_publish_date(&payload.publish_date)
        .ok_or_else(|| ApiError::Validation(validators::PUBLISH_DATE_MESSAGE.to_string()))?;
    Ok(CreateBook {
        author: payload.author,
        description: payload.description,
        title: payload.title,
        genre: payload.genre,
        price: Some(price),
        publish_date: Some(publish_date),
    })
}

fn to_update(payload: UpdateBookRequest) -> ApiResult<UpdateBook> {
    let price = payload
        .price
        .as_deref()
        .map(|p| {
            validators::parse_price(p)
                .ok_or_else(|| ApiError::Validation(validators::PRICE_MESSAGE.to_string()))
        })
        .transpose()?;
    let publish_date = payload
        .publish_date
        .as_deref()
        .map(|d| {
            validators::parse_publish_date(d)
                .ok_or_else(|| ApiError::Validation(validators::PUBLISH_DATE_MESSAGE.to_string()))
        })
        .transpose()?;
    Ok(UpdateBook {
        author: payload.author,
        description: payload.description,
        title: payload.title,
        genre: payload.genre,
        price,
        publish_date,
    })
}

// Handlers ===============================================================

/// Runs a filtered listing; an empty result set becomes 204 No Content.
async fn filtered_listing(repository: BookRepository, filter: BookFilter) -> ApiResult<Response> {
    let books = repository.list(filter).await?;
    if books.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let books: Vec<BookResponse> = books.into_iter().map(BookResponse::from).collect();
    Ok((StatusCode::OK, Json(books)).into_response())
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "", tag = "Books", operation_id = "listBooks",
    responses((status = StatusCode::OK, description = "All books ordered by id", body = Vec<BookResponse>))))]
pub async fn list_books(repository: BookRepository) -> ApiResult<impl IntoResponse> {
    let books = repository.list(BookFilter::All).await?;
    let books: Vec<BookResponse> = books.into_iter().map(BookResponse::from).collect();
    Ok((StatusCode::OK, Json(books)))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/id/{id}", tag = "Books", operation_id = "listBooksById",
    responses((status = StatusCode::OK, description = "Books whose id contains the value", body = Vec<BookResponse>),
              (status = StatusCode::NO_CONTENT, description = "No match"))))]
pub async fn books_by_id(
    repository: BookRepository,
    id: Option<Path<String>>,
) -> ApiResult<Response> {
    filtered_listing(repository, BookFilter::text(TextField::Id, id.map(|Path(v)| v))).await
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/author/{author}", tag = "Books", operation_id = "listBooksByAuthor",
    responses((status = StatusCode::OK, description = "Books whose author contains the value", body = Vec<BookResponse>),
              (status = StatusCode::NO_CONTENT, description = "No match"))))]
pub async fn books_by_author(
    repository: BookRepository,
    author: Option<Path<String>>,
) -> ApiResult<Response> {
    filtered_listing(
        repository,
        BookFilter::text(TextField::Author, author.map(|Path(v)| v)),
    )
    .await
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/title/{title}", tag = "Books", operation_id = "listBooksByTitle",
    responses((status = StatusCode::OK, description = "Books whose title contains the value", body = Vec<BookResponse>),
              (status = StatusCode::NO_CONTENT, description = "No match"))))]
pub async fn books_by_title(
    repository: BookRepository,
    title: Option<Path<String>>,
) -> ApiResult<Response> {
    filtered_listing(
        repository,
        BookFilter::text(TextField::Title, title.map(|Path(v)| v)),
    )
    .await
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/genre/{genre}", tag = "Books", operation_id = "listBooksByGenre",
    responses((status = StatusCode::OK, description = "Books whose genre contains the value", body = Vec<BookResponse>),
              (status = StatusCode::NO_CONTENT, description = "No match"))))]
pub async fn books_by_genre(
    repository: BookRepository,
    genre: Option<Path<String>>,
) -> ApiResult<Response> {
    filtered_listing(
        repository,
        BookFilter::text(TextField::Genre, genre.map(|Path(v)| v)),
    )
    .await
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/description/{description}", tag = "Books", operation_id = "listBooksByDescription",
    responses((status = StatusCode::OK, description = "Books whose description contains the value", body = Vec<BookResponse>),
              (status = StatusCode::NO_CONTENT, description = "No match"))))]
pub async fn books_by_description(
    repository: BookRepository,
    description: Option<Path<String>>,
) -> ApiResult<Response> {
    filtered_listing(
        repository,
        BookFilter::text(TextField::Description, description.map(|Path(v)| v)),
    )
    .await
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/price", tag = "Books", operation_id = "listBooksByPrice",
    params(PriceRangeQuery),
    responses((status = StatusCode::OK, description = "Books within the price bounds", body = Vec<BookResponse>),
              (status = StatusCode::NO_CONTENT, description = "No match"),
              (status = StatusCode::BAD_REQUEST, description = "Invalid bounds"))))]
pub async fn books_by_price(
    repository: BookRepository,
    range: Result<Query<PriceRangeQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(range) = range.map_err(|e| ApiError::InvalidQuery(e.body_text()))?;
    if let Some(message) = validators::validate_price_range(range.min_price, range.max_price) {
        return Err(ApiError::Validation(message.to_string()));
    }
    let filter = PriceFilter::from_bounds(range.min_price, range.max_price);
    filtered_listing(repository, BookFilter::Price(filter)).await
}

async fn published_listing(
    repository: BookRepository,
    year: Option<i32>,
    month: Option<u8>,
    day: Option<u8>,
) -> ApiResult<Response> {
    let filter = DateFilter::from_parts(year, month, day)
        .ok_or_else(|| ApiError::Validation(validators::PUBLISH_DATE_MESSAGE.to_string()))?;
    filtered_listing(repository, BookFilter::Published(Some(filter))).await
}

/// Publish-date routes need at least a year.
pub async fn books_by_published_missing_year() -> ApiResult<Response> {
    debug!("Publish date filter called without a year");
    Err(ApiError::Validation(
        validators::PUBLISH_DATE_MESSAGE.to_string(),
    ))
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/published/{year}", tag = "Books", operation_id = "listBooksByPublishYear",
    responses((status = StatusCode::OK, description = "Books published in the year", body = Vec<BookResponse>),
              (status = StatusCode::NO_CONTENT, description = "No match"),
              (status = StatusCode::BAD_REQUEST, description = "Invalid date"))))]
pub async fn books_by_publish_year(
    repository: BookRepository,
    Path(year): Path<i32>,
) -> ApiResult<Response> {
    published_listing(repository, Some(year), None, None).await
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/published/{year}/{month}", tag = "Books", operation_id = "listBooksByPublishMonth",
    responses((status = StatusCode::OK, description = "Books published in the month", body = Vec<BookResponse>),
              (status = StatusCode::NO_CONTENT, description = "No match"),
              (status = StatusCode::BAD_REQUEST, description = "Invalid date"))))]
pub async fn books_by_publish_month(
    repository: BookRepository,
    Path((year, month)): Path<(i32, u8)>,
) -> ApiResult<Response> {
    published_listing(repository, Some(year), Some(month), None).await
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/published/{year}/{month}/{day}", tag = "Books", operation_id = "listBooksByPublishDay",
    responses((status = StatusCode::OK, description = "Books published on the day", body = Vec<BookResponse>),
              (status = StatusCode::NO_CONTENT, description = "No match"),
              (status = StatusCode::BAD_REQUEST, description = "Invalid date"))))]
pub async fn books_by_publish_day(
    repository: BookRepository,
    Path((year, month, day)): Path<(i32, u8, u8)>,
) -> ApiResult<Response> {
    published_listing(repository, Some(year), Some(month), Some(day)).await
}

#[cfg_attr(feature = "openapi", utoipa::path(put, path = "", tag = "Books", operation_id = "createBook",
    responses((status = StatusCode::CREATED, description = "Created book", body = BookResponse),
              (status = StatusCode::BAD_REQUEST, description = "Malformed fields"))))]
pub async fn create_book(
    claim: ApiClaim,
    State(state): State<AppState>,
    repository: BookRepository,
    Garde(Json(payload)): Garde<Json<CreateBookRequest>>,
) -> ApiResult<Response> {
    require_role(&claim, Role::Editor)?;
    if let Some(message) = validators::validate_request(&payload) {
        return Err(ApiError::Validation(message));
    }

    let book = repository.create(to_create(payload)?).await?;
    let location = state
        .build_url(&format!("books/id/{}", book.id))
        .map_err(|e| {
            error!("Failed to build location URL: {e}");
            ApiError::Internal
        })?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location.to_string())],
        Json(BookResponse::from(book)),
    )
        .into_response())
}

#[cfg_attr(feature = "openapi", utoipa::path(post, path = "/{id}", tag = "Books", operation_id = "updateBook",
    responses((status = StatusCode::OK, description = "Updated book", body = BookResponse),
              (status = StatusCode::BAD_REQUEST, description = "Malformed fields"),
              (status = StatusCode::NOT_FOUND, description = "No book with the id"))))]
pub async fn update_book(
    claim: ApiClaim,
    Path(id): Path<String>,
    repository: BookRepository,
    Garde(Json(payload)): Garde<Json<UpdateBookRequest>>,
) -> ApiResult<Response> {
    require_role(&claim, Role::Editor)?;
    if let Some(message) = validators::validate_request(&payload) {
        return Err(ApiError::Validation(message));
    }

    let book = repository.update(&id, to_update(payload)?).await?;
    Ok((StatusCode::OK, Json(BookResponse::from(book))).into_response())
}

// Router =================================================================

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(list_books).put(create_book))
        .route("/id", get(books_by_id))
        .route("/id/{id}", get(books_by_id))
        .route("/author", get(books_by_author))
        .route("/author/{author}", get(books_by_author))
        .route("/title", get(books_by_title))
        .route("/title/{title}", get(books_by_title))
        .route("/genre", get(books_by_genre))
        .route("/genre/{genre}", get(books_by_genre))
        .route("/description", get(books_by_description))
        .route("/description/{description}", get(books_by_description))
        .route("/price", get(books_by_price))
        .route("/published", get(books_by_published_missing_year))
        .route("/published/{year}", get(books_by_publish_year))
        .route("/published/{year}/{month}", get(books_by_publish_month))
        .route(
            "/published/{year}/{month}/{day}",
            get(books_by_publish_day),
        )
        .route("/{id}", post(update_book))
}

#[cfg(feature = "openapi")]
#[derive(utoipa::OpenApi)]
#[openapi(paths(
    list_books,
    books_by_id,
    books_by_author,
    books_by_title,
    books_by_genre,
    books_by_description,
    books_by_price,
    books_by_publish_year,
    books_by_publish_month,
    books_by_publish_day,
    create_book,
    update_book
))]
struct ApiDocs;

#[cfg(feature = "openapi")]
pub fn api_docs() -> utoipa::openapi::OpenApi {
    use utoipa::OpenApi as _;
    ApiDocs::openapi()
}
