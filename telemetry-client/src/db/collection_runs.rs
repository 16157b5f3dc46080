use sqlx::PgConnection;

use crate::domain::CollectionRun;

pub async fn insert(conn: &mut PgConnection, run: &CollectionRun) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO collection_logs (ts, status, message, execution_time_ms, records_processed)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(run.ts)
    .bind(run.status.as_str())
    .bind(&run.message)
    .bind(run.execution_time_ms)
    .bind(run.records_processed)
    .fetch_one(conn)
    .await
}
