/// Couples a model type to its table name and record id.
pub trait Table {
    fn table() -> &'static str;

    fn id(&self) -> &surrealdb::sql::Thing;
}

#[macro_export]
macro_rules! define_table {
    ($table:literal : $model:ty = $id:ident) => {
        impl $crate::database::Table for $model {
            fn table() -> &'static str {
                $table
            }

            fn id(&self) -> &surrealdb::sql::Thing {
                &self.$id
            }
        }
    };
}

/// Defines record-level CRUD methods for a model implementing
/// [crate::database::Table]. Targets address a single record by the raw
/// part of its id, which is also what the admin urls carry.
#[macro_export]
macro_rules! define_model {
    ($model:ty) => {
        impl $model {
            pub async fn find(
                id: &str,
                db: &$crate::database::Database,
            ) -> $crate::database::Result<Option<Self>> {
                use snafu::ResultExt as _;

                db.select((<Self as $crate::database::Table>::table(), id))
                    .await
                    .context($crate::database::QuerySnafu)
            }

            pub async fn create(
                &self,
                db: &$crate::database::Database,
            ) -> $crate::database::Result<Option<Self>> {
                use snafu::ResultExt as _;

                let key = $crate::database::Table::id(self).id.to_string();
                db.create((<Self as $crate::database::Table>::table(), key))
                    .content(self)
                    .await
                    .context($crate::database::QuerySnafu)
            }

            pub async fn update(
                &self,
                db: &$crate::database::Database,
            ) -> $crate::database::Result<Option<Self>> {
                use snafu::ResultExt as _;

                let key = $crate::database::Table::id(self).id.to_string();
                db.update((<Self as $crate::database::Table>::table(), key))
                    .content(self)
                    .await
                    .context($crate::database::QuerySnafu)
            }

            pub async fn delete(
                &self,
                db: &$crate::database::Database,
            ) -> $crate::database::Result<Option<Self>> {
                use snafu::ResultExt as _;

                let key = $crate::database::Table::id(self).id.to_string();
                db.delete((<Self as $crate::database::Table>::table(), key))
                    .await
                    .context($crate::database::QuerySnafu)
            }
        }
    };
}

/// Defines a method that runs a SurrealQL query against the model.
///
/// # Syntax
/// ```ignore
/// define_relation! {
///     Video > search(q: String) > Vec<Video>
///         where "SELECT * FROM videos WHERE title = $q"
/// }
/// ```
/// The output type may be a `Vec`, an `Option`, or
/// [crate::database::Only] for exactly-one semantics.
#[macro_export]
macro_rules! define_relation {
    ($model:ty > $relation:ident ($($binding:ident : $binding_type:ty),* $(,)?) > $output:ty where $query:literal) => {
        impl $model {
            pub async fn $relation(
                $($binding : $binding_type,)*
                db: &$crate::database::Database,
            ) -> $crate::database::Result<$output> {
                use $crate::database::Sql as _;

                db.sql($query)
                    $(.bind((stringify!($binding), $binding)))*
                    .fetch()
                    .await
            }
        }
    };
}
