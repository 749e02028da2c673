use async_trait::async_trait;
use jiff::Timestamp;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;
use zipline_core::store::Result;
use zipline_core::{
    base62, NewUrl, Owner, ShortCode, StoreError, UrlId, UrlRecord, UrlStatus, UrlStore, UrlUpdate,
};

/// MySQL implementation of the store contract.
///
/// The short code column starts out NULL: the insert runs in a
/// transaction that writes the row, derives the code from the generated
/// id, and fills the column before committing. Committed rows therefore
/// always carry their canonical code.
#[derive(Debug, Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    /// Creates a store from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

fn now_unix_seconds() -> i64 {
    Timestamp::now().as_second()
}

fn parse_created_at(seconds: i64) -> Result<Timestamp> {
    Timestamp::from_second(seconds).map_err(|e| {
        StoreError::InvalidData(format!("invalid created_at timestamp '{seconds}': {e}"))
    })
}

fn parse_owner(user_id: Option<&str>) -> Result<Owner> {
    match user_id {
        None => Ok(Owner::Anonymous),
        Some(raw) => Uuid::parse_str(raw)
            .map(Owner::User)
            .map_err(|e| StoreError::InvalidData(format!("invalid owner uuid '{raw}': {e}"))),
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StoreError::InvalidData(message),
        _ => StoreError::Query(message),
    }
}

fn row_to_record(row: &MySqlRow) -> Result<UrlRecord> {
    let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
    let short_code: Option<String> = row.try_get("short_code").map_err(map_sqlx_error)?;
    let short_code = short_code
        .ok_or_else(|| StoreError::InvalidData(format!("record {id} has no short code")))?;
    let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
    let user_id: Option<String> = row.try_get("user_id").map_err(map_sqlx_error)?;
    let clicks: u64 = row.try_get("clicks").map_err(map_sqlx_error)?;
    let status_raw: String = row.try_get("status").map_err(map_sqlx_error)?;
    let created_at_raw: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;

    let status = status_raw
        .parse::<UrlStatus>()
        .map_err(|e| StoreError::InvalidData(format!("record {id}: {e}")))?;

    Ok(UrlRecord {
        id,
        short_code: ShortCode::new_unchecked(short_code),
        original_url,
        owner: parse_owner(user_id.as_deref())?,
        clicks,
        status,
        created_at: parse_created_at(created_at_raw)?,
    })
}

const SELECT_COLUMNS: &str =
    "SELECT id, short_code, original_url, user_id, clicks, status, created_at FROM urls";

#[async_trait]
impl UrlStore for MySqlStore {
    async fn find_by_id(&self, id: UrlId) -> Result<Option<UrlRecord>> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ? LIMIT 1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn find_by_short_code(
        &self,
        code: &ShortCode,
        status: Option<UrlStatus>,
    ) -> Result<Option<UrlRecord>> {
        let row = if let Some(status) = status {
            sqlx::query(&format!(
                "{SELECT_COLUMNS} WHERE short_code = ? AND status = ? LIMIT 1"
            ))
            .bind(code.as_str())
            .bind(status.as_str())
            .fetch_optional(&self.pool)
            .await
        } else {
            sqlx::query(&format!("{SELECT_COLUMNS} WHERE short_code = ? LIMIT 1"))
                .bind(code.as_str())
                .fetch_optional(&self.pool)
                .await
        }
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn find_by_owner_and_url(
        &self,
        owner: &Owner,
        original_url: &str,
    ) -> Result<Option<UrlRecord>> {
        let row = match owner {
            Owner::User(user) => {
                sqlx::query(&format!(
                    "{SELECT_COLUMNS} WHERE user_id = ? AND original_url = ? ORDER BY id LIMIT 1"
                ))
                .bind(user.to_string())
                .bind(original_url)
                .fetch_optional(&self.pool)
                .await
            }
            Owner::Anonymous => {
                sqlx::query(&format!(
                    "{SELECT_COLUMNS} WHERE user_id IS NULL AND original_url = ? ORDER BY id LIMIT 1"
                ))
                .bind(original_url)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(map_sqlx_error)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn list_by_owner(&self, user: Uuid) -> Result<Vec<UrlRecord>> {
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ? ORDER BY id"
        ))
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_record).collect()
    }

    async fn insert(&self, new_url: NewUrl) -> Result<UrlRecord> {
        let created_at_secs = now_unix_seconds();
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let result = sqlx::query(
            r#"
            INSERT INTO urls (original_url, user_id, clicks, status, created_at)
            VALUES (?, ?, 0, ?, ?)
            "#,
        )
        .bind(&new_url.original_url)
        .bind(new_url.owner.user_id().map(|user| user.to_string()))
        .bind(new_url.status.as_str())
        .bind(created_at_secs)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let id = result.last_insert_id() as UrlId;
        let short_code =
            base62::encode(id).map_err(|e| StoreError::InvalidData(e.to_string()))?;

        sqlx::query("UPDATE urls SET short_code = ? WHERE id = ?")
            .bind(short_code.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(UrlRecord {
            id,
            short_code,
            original_url: new_url.original_url,
            owner: new_url.owner,
            clicks: 0,
            status: new_url.status,
            created_at: parse_created_at(created_at_secs)?,
        })
    }

    async fn increment_clicks(&self, id: UrlId) -> Result<()> {
        sqlx::query("UPDATE urls SET clicks = clicks + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn set_status(&self, id: UrlId, status: UrlStatus) -> Result<()> {
        sqlx::query("UPDATE urls SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn update_fields(&self, id: UrlId, update: UrlUpdate) -> Result<Option<UrlRecord>> {
        sqlx::query("UPDATE urls SET original_url = ? WHERE id = ?")
            .bind(&update.original_url)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        // Re-read instead of trusting rows_affected: updating a row to
        // its current value reports zero affected rows on MySQL.
        self.find_by_id(id).await
    }

    async fn delete_by_id(&self, id: UrlId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM urls WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }
}
