use serde::{Deserialize, Serialize};
use sqlx::{Acquire as _, Connection as _, Pool};
use time::Date;
use tracing::debug;

use crate::{
    error::{Error, Result},
    filter::{BookFilter, PriceFilter, DateFilter, PRICE_EPSILON},
};

/// Prefix of generated book ids (`B-1`, `B-2`, ...).
pub const ID_PREFIX: &str = "B-";

const COLUMNS: &str = "id, author, description, title, genre, price, publish_date";

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Book {
    pub id: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub price: Option<f64>,
    pub publish_date: Option<Date>,
}

/// Payload for inserts. There is no id field - ids are always assigned
/// by the repository.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CreateBook {
    pub author: Option<String>,
    pub description: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub price: Option<f64>,
    pub publish_date: Option<Date>,
}

/// Merge-patch payload: `None` fields keep their stored values.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UpdateBook {
    pub author: Option<String>,
    pub description: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub price: Option<f64>,
    pub publish_date: Option<Date>,
}

pub type BookRepository = BookRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct BookRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> BookRepositoryImpl<E>
where
    for<'a> &'a E:
        sqlx::Executor<'c, Database = crate::ChosenDB> + sqlx::Acquire<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Lists books matching the filter, ordered ascending by the
    /// filtered column (case-insensitive for text), id as tiebreak.
    pub async fn list(&self, filter: BookFilter) -> Result<Vec<Book>> {
        let order = filter.order_column();
        let books = match filter {
            BookFilter::All => {
                let sql = format!("SELECT {COLUMNS} FROM books ORDER BY id COLLATE NOCASE");
                sqlx::query_as::<_, Book>(&sql)
                    .fetch_all(&self.executor)
                    .await?
            }
            BookFilter::Text { field, needle } => match needle {
                Some(needle) => {
                    let col = field.column();
                    let sql = format!(
                        "SELECT {COLUMNS} FROM books \
                         WHERE {col} IS NOT NULL AND instr(lower({col}), lower(?)) > 0 \
                         ORDER BY {col} COLLATE NOCASE, id"
                    );
                    sqlx::query_as::<_, Book>(&sql)
                        .bind(needle)
                        .fetch_all(&self.executor)
                        .await?
                }
                None => self.list_ordered_by(order).await?,
            },
            BookFilter::Price(Some(PriceFilter::Exact(value))) => {
                let sql = format!(
                    "SELECT {COLUMNS} FROM books \
                     WHERE price IS NOT NULL AND abs(price - ?) < ? \
                     ORDER BY price, id"
                );
                sqlx::query_as::<_, Book>(&sql)
                    .bind(value)
                    .bind(PRICE_EPSILON)
                    .fetch_all(&self.executor)
                    .await?
            }
            BookFilter::Price(Some(PriceFilter::Range { min, max })) => {
                let sql = format!(
                    "SELECT {COLUMNS} FROM books \
                     WHERE price IS NOT NULL AND price >= ? AND price <= ? \
                     ORDER BY price, id"
                );
                sqlx::query_as::<_, Book>(&sql)
                    .bind(min)
                    .bind(max)
                    .fetch_all(&self.executor)
                    .await?
            }
            BookFilter::Published(Some(DateFilter::Year(year))) => {
                let sql = format!(
                    "SELECT {COLUMNS} FROM books \
                     WHERE publish_date IS NOT NULL \
                     AND CAST(strftime('%Y', publish_date) AS INTEGER) = ? \
                     ORDER BY publish_date, id"
                );
                sqlx::query_as::<_, Book>(&sql)
                    .bind(year)
                    .fetch_all(&self.executor)
                    .await?
            }
            BookFilter::Published(Some(DateFilter::Month { year, month })) => {
                let sql = format!(
                    "SELECT {COLUMNS} FROM books \
                     WHERE publish_date IS NOT NULL \
                     AND CAST(strftime('%Y', publish_date) AS INTEGER) = ? \
                     AND CAST(strftime('%m', publish_date) AS INTEGER) = ? \
                     ORDER BY publish_date, id"
                );
                sqlx::query_as::<_, Book>(&sql)
                    .bind(year)
                    .bind(month as i32)
                    .fetch_all(&self.executor)
                    .await?
            }
            BookFilter::Published(Some(DateFilter::Day(date))) => {
                let sql = format!(
                    "SELECT {COLUMNS} FROM books \
                     WHERE publish_date = ? \
                     ORDER BY publish_date, id"
                );
                sqlx::query_as::<_, Book>(&sql)
                    .bind(date)
                    .fetch_all(&self.executor)
                    .await?
            }
            BookFilter::Price(None) | BookFilter::Published(None) => {
                self.list_ordered_by(order).await?
            }
        };
        Ok(books)
    }

    async fn list_ordered_by(&self, column: &str) -> Result<Vec<Book>> {
        let sql = format!("SELECT {COLUMNS} FROM books ORDER BY {column} COLLATE NOCASE, id");
        let books = sqlx::query_as::<_, Book>(&sql)
            .fetch_all(&self.executor)
            .await?;
        Ok(books)
    }

    pub async fn get(&self, id: &str) -> Result<Book> {
        fetch_book(id, &self.executor)
            .await?
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))
    }

    /// Inserts a new book under a freshly generated id. The max-suffix
    /// scan and the insert share one immediate transaction, taking the
    /// write lock up front so concurrent creates cannot observe the
    /// same next id.
    pub async fn create(&self, payload: CreateBook) -> Result<Book> {
        let mut conn = self.executor.acquire().await?;
        let mut transaction = conn.begin_with("BEGIN IMMEDIATE").await?;

        let last_suffix: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(CAST(substr(id, ?) AS INTEGER)) FROM books WHERE id GLOB ?",
        )
        .bind(ID_PREFIX.len() as i64 + 1)
        .bind(format!("{ID_PREFIX}[0-9]*"))
        .fetch_one(&mut *transaction)
        .await?;

        let id = format!("{}{}", ID_PREFIX, last_suffix.unwrap_or(0) + 1);
        debug!("Assigned id {id} to new book");

        sqlx::query(
            "INSERT INTO books (id, author, description, title, genre, price, publish_date) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&payload.author)
        .bind(&payload.description)
        .bind(&payload.title)
        .bind(&payload.genre)
        .bind(payload.price)
        .bind(payload.publish_date)
        .execute(&mut *transaction)
        .await?;

        let book = fetch_book(&id, &mut *transaction)
            .await?
            .ok_or_else(|| Error::RecordNotFound(id.clone()))?;
        transaction.commit().await?;
        Ok(book)
    }

    /// Merge-patch update: only `Some` fields overwrite stored values.
    pub async fn update(&self, id: &str, payload: UpdateBook) -> Result<Book> {
        let mut conn = self.executor.acquire().await?;
        let mut transaction = conn.begin_with("BEGIN IMMEDIATE").await?;

        let result = sqlx::query(
            "UPDATE books SET \
             author = COALESCE(?, author), \
             description = COALESCE(?, description), \
             title = COALESCE(?, title), \
             genre = COALESCE(?, genre), \
             price = COALESCE(?, price), \
             publish_date = COALESCE(?, publish_date) \
             WHERE id = ?",
        )
        .bind(&payload.author)
        .bind(&payload.description)
        .bind(&payload.title)
        .bind(&payload.genre)
        .bind(payload.price)
        .bind(payload.publish_date)
        .bind(id)
        .execute(&mut *transaction)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::RecordNotFound(id.to_string()));
        }

        let book = fetch_book(id, &mut *transaction)
            .await?
            .ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
        transaction.commit().await?;
        Ok(book)
    }
}

async fn fetch_book<'e, X>(id: &str, executor: X) -> Result<Option<Book>>
where
    X: sqlx::Executor<'e, Database = crate::ChosenDB>,
{
    let sql = format!("SELECT {COLUMNS} FROM books WHERE id = ?");
    let book = sqlx::query_as::<_, Book>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(book)
}
