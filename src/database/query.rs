use std::ops::Deref;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use snafu::ResultExt;
use surrealdb::opt::QueryResult;

use super::{Database, DeserializeSnafu, QuerySnafu, Result};

/// Extension trait for executing raw SurrealQL with typed results.
/// Parameters are bound with [Bindings::bind], which takes any
/// serializable value.
///
/// ```ignore
/// let videos: Vec<Video> = database
///     .sql("SELECT * FROM videos WHERE title = $title")
///     .bind(("title", title))
///     .fetch()
///     .await?;
/// ```
pub trait Sql {
    fn sql(&self, query: &'static str) -> Bindings<'_>;
}

impl Sql for Database {
    fn sql(&self, query: &'static str) -> Bindings<'_> {
        Bindings {
            query: self.deref().query(query),
        }
    }
}

pub struct Bindings<'a> {
    query: surrealdb::method::Query<'a, surrealdb::engine::any::Any>,
}

impl Bindings<'_> {
    pub fn bind(mut self, params: impl serde::Serialize) -> Self {
        self.query = self.query.bind(params);
        self
    }

    /// Execute the query and deserialize the first statement's result.
    /// `T` may be a `Vec`, an `Option`, or [Only] for exactly-one.
    pub async fn fetch<T>(self) -> Result<T>
    where
        T: DeserializeOwned,
        usize: QueryResult<T>,
    {
        let mut response = self.query.await.context(QuerySnafu)?;
        response.take::<T>(0).context(DeserializeSnafu)
    }
}

/// Wrapper for queries that must return exactly one row.
#[derive(Debug, Deserialize)]
pub struct Only<T>(pub T);

impl<T: DeserializeOwned> QueryResult<Only<T>> for usize {
    fn query_result(self, response: &mut surrealdb::Response) -> surrealdb::Result<Only<T>> {
        let row: Option<T> = self.query_result(response)?;

        row.map(Only).ok_or_else(|| {
            surrealdb::error::Api::ParseError("expected exactly one result, but got none".into())
                .into()
        })
    }
}

impl<T> Deref for Only<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
