//! Books repository for database operations

use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookQuery, CreateBook},
        Page,
    },
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Load a book and lock its row until the surrounding transaction ends
    pub async fn lock_by_id(&self, conn: &mut PgConnection, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Persist the shelf counter of a locked book
    pub async fn save_available_copies(&self, conn: &mut PgConnection, book: &Book) -> AppResult<()> {
        sqlx::query("UPDATE books SET available_copies = $1 WHERE id = $2")
            .bind(book.available_copies)
            .bind(book.id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Search books with pagination
    pub async fn search(&self, query: &BookQuery, page: Page) -> AppResult<(Vec<Book>, i64)> {
        let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books WHERE TRUE");
        push_filters(&mut count_builder, query);
        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::<Postgres>::new("SELECT * FROM books WHERE TRUE");
        push_filters(&mut builder, query);
        builder
            .push(" ORDER BY title, author, id LIMIT ")
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let books = builder.build_query_as::<Book>().fetch_all(&self.pool).await?;

        Ok((books, total))
    }

    /// Create a new book with every copy on the shelf
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, total_copies, available_copies)
            VALUES ($1, $2, $3, $3)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(book.copies)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Count books and copies: (titles, total copies, copies on the shelf)
    pub async fn count_copies(&self) -> AppResult<(i64, i64, i64)> {
        let counts: (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(total_copies), 0)::bigint,
                   COALESCE(SUM(available_copies), 0)::bigint
            FROM books
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &BookQuery) {
    if let Some(ref title) = query.title {
        builder
            .push(" AND LOWER(title) LIKE ")
            .push_bind(format!("%{}%", title.to_lowercase()));
    }
    if let Some(ref author) = query.author {
        builder
            .push(" AND LOWER(author) LIKE ")
            .push_bind(format!("%{}%", author.to_lowercase()));
    }
    if query.available == Some(true) {
        builder.push(" AND available_copies > 0");
    }
}
