//! Crate-wide prelude: the handful of names nearly every module reaches
//! for. Glob-imported with `use crate::prelude::*;`.

pub use derive_new::new;
pub use serde::{Deserialize, Serialize};
pub use snafu::{Location, OptionExt, ResultExt, Snafu};

pub use crate::database::{Database, DatabaseError, Only};
pub use crate::model::{now, Timestamp};

pub use crate::{define_model, define_relation, define_table};
