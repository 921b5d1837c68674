mod database;
mod error_mapper;
mod repository_base;
mod result_ext;

pub mod repositories;

pub use database::Database;
pub use error_mapper::RepositoryErrorMapper;
pub use repository_base::SqliteRepositoryBase;
pub use result_ext::ResultExt;
