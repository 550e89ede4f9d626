use snafu::{Location, Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DatabaseError {
    #[snafu(display("could not connect to the database at `{url}`"))]
    Connection {
        url: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// could not execute the query
    Query {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },

    /// could not deserialize the database response
    Deserialize {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
}
