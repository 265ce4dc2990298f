use std::{fs::create_dir_all, path::Path};

use chrono::{NaiveDateTime, Utc};
use libsql::{Builder, Connection};

use crate::{CACHE_PATH, error::TlResult};

const EXPIRE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub async fn init() -> TlResult<()> {
    init_at(&CACHE_PATH).await
}

async fn connect(path: &Path) -> TlResult<Connection> {
    let db = Builder::new_local(path).build().await?;
    Ok(db.connect()?)
}

pub(crate) async fn init_at(path: &Path) -> TlResult<()> {
    if let Some(cache_dir) = path.parent() {
        create_dir_all(cache_dir)?;
    }

    let conn = connect(path).await?;
    conn.execute(
        r#"
CREATE TABLE IF NOT EXISTS "cache" (
    "key"     TEXT PRIMARY KEY,
    "data"    BLOB NOT NULL,
    "expire"  TIMESTAMP)
;"#,
        (),
    )
    .await?;

    Ok(())
}

/// Expired entries are only returned when `ignore_expire` is set.
pub(crate) async fn get_at(
    path: &Path,
    key: &str,
    ignore_expire: bool,
) -> TlResult<Option<Vec<u8>>> {
    let conn = connect(path).await?;

    let mut rows = conn
        .query(
            r#"
SELECT "data", "expire"
FROM "cache"
WHERE "key" = ?
LIMIT 1
;"#,
            [key],
        )
        .await?;
    if let Some(row) = rows.next().await? {
        let data = row.get::<Vec<u8>>(0)?;
        if ignore_expire {
            return Ok(Some(data));
        }

        let expire_str = row.get::<String>(1)?;
        let expire = NaiveDateTime::parse_from_str(&expire_str, EXPIRE_FORMAT)?;
        if expire > Utc::now().naive_utc() {
            return Ok(Some(data));
        }
    }

    Ok(None)
}

/// `expire` is a UTC timestamp.
pub(crate) async fn upsert_at(
    path: &Path,
    key: &str,
    data: &[u8],
    expire: &NaiveDateTime,
) -> TlResult<()> {
    let expire_str = expire.format(EXPIRE_FORMAT).to_string();

    let conn = connect(path).await?;
    conn.execute(
        r#"
INSERT INTO "cache"
    ("key", "data", "expire")
VALUES
    (?1, ?2, ?3)
ON CONFLICT ("key") DO UPDATE
SET "data" = excluded."data",
    "expire" = excluded."expire"
;"#,
        (key, data, expire_str),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{env, process};

    use chrono::Duration;

    use super::*;

    #[tokio::test]
    async fn test_upsert_and_expire() {
        let path = env::temp_dir()
            .join(format!("tickerlens-test-{}", process::id()))
            .join("cache.db");
        init_at(&path).await.unwrap();

        let now = Utc::now().naive_utc();
        upsert_at(&path, "listing:KRX", b"v1", &(now - Duration::hours(1)))
            .await
            .unwrap();
        assert_eq!(get_at(&path, "listing:KRX", false).await.unwrap(), None);
        assert_eq!(
            get_at(&path, "listing:KRX", true).await.unwrap(),
            Some(b"v1".to_vec())
        );

        upsert_at(&path, "listing:KRX", b"v2", &(now + Duration::hours(1)))
            .await
            .unwrap();
        assert_eq!(
            get_at(&path, "listing:KRX", false).await.unwrap(),
            Some(b"v2".to_vec())
        );
        assert_eq!(get_at(&path, "listing:KOSDAQ", true).await.unwrap(), None);
    }
}
