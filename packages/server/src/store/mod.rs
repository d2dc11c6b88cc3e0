pub mod contests;
pub mod typing;
pub mod users;

use sea_orm::sea_query::LockType;
use sea_orm::{DbBackend, EntityTrait, QuerySelect, Select};

/// Apply `SELECT ... FOR UPDATE` where the backend supports it.
///
/// SQLite has no row locks; its single-writer transaction model already
/// serializes the writes these locks protect.
pub(crate) fn lock_for_update<E: EntityTrait>(select: Select<E>, backend: DbBackend) -> Select<E> {
    if backend == DbBackend::Sqlite {
        select
    } else {
        select.lock(LockType::Update)
    }
}
