use crate::entities::subscriptions;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::{last_day_of_month, parse_month_year};
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, Statement, Value,
};
use uuid::Uuid;

/// Persistence for subscription records.
///
/// Implementations check existence only; business rules are enforced by the
/// service before any call lands here.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    async fn create(&self, subscription: &NewSubscription) -> AppResult<()>;

    async fn read(&self, id: Uuid) -> AppResult<SubscriptionResponse>;

    /// Empty strings and a zero price keep the stored value.
    async fn update(&self, id: Uuid, fields: &UpdateSubscriptionRequest) -> AppResult<()>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<SubscriptionResponse>>;

    async fn sum_costs(&self, filter: &SumFilter) -> AppResult<i64>;
}

const UPDATE_SUBSCRIPTION_SQL: &str = r#"
UPDATE subscriptions
SET
    service_name = COALESCE($1, service_name),
    price = COALESCE($2, price),
    start_date = COALESCE($3, start_date),
    end_date = COALESCE($4, end_date)
WHERE id = $5
RETURNING id
"#;

pub struct PgSubscriptionRepository {
    pool: DatabaseConnection,
}

impl PgSubscriptionRepository {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    async fn user_exists(&self, user_id: &str) -> AppResult<bool> {
        #[derive(Debug, sea_orm::FromQueryResult)]
        struct CountRow {
            count: i64,
        }
        let count = subscriptions::Entity::find()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .select_only()
            .column_as(Expr::val(1).count(), "count")
            .into_model::<CountRow>()
            .one(&self.pool)
            .await?
            .map(|r| r.count)
            .unwrap_or(0);
        Ok(count > 0)
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn create(&self, subscription: &NewSubscription) -> AppResult<()> {
        let start_date = parse_month_year(&subscription.start_date)?;
        let end_date = parse_month_year(&subscription.end_date)?;

        let model = subscriptions::ActiveModel {
            id: Set(subscription.id),
            service_name: Set(subscription.service_name.clone()),
            price: Set(subscription.price),
            user_id: Set(subscription.user_id.clone()),
            start_date: Set(start_date),
            end_date: Set(end_date),
        };
        subscriptions::Entity::insert(model)
            .exec_without_returning(&self.pool)
            .await?;
        Ok(())
    }

    async fn read(&self, id: Uuid) -> AppResult<SubscriptionResponse> {
        let model = subscriptions::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(AppError::subscription_not_found)?;
        Ok(SubscriptionResponse::from(model))
    }

    async fn update(&self, id: Uuid, fields: &UpdateSubscriptionRequest) -> AppResult<()> {
        // dates are always re-parsed, so both must be well-formed
        let start_date = parse_month_year(&fields.start_date)?;
        let end_date = parse_month_year(&fields.end_date)?;

        let values: [Value; 5] = [
            non_empty(&fields.service_name).into(),
            (fields.price != 0).then_some(fields.price).into(),
            Some(start_date).into(),
            Some(end_date).into(),
            id.into(),
        ];
        let stmt = Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            UPDATE_SUBSCRIPTION_SQL,
            values,
        );

        match self.pool.query_one(stmt).await? {
            Some(_) => Ok(()),
            None => Err(AppError::subscription_not_found()),
        }
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let res = subscriptions::Entity::delete_by_id(id)
            .exec(&self.pool)
            .await?;
        if res.rows_affected == 0 {
            return Err(AppError::subscription_not_found());
        }
        Ok(())
    }

    async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<SubscriptionResponse>> {
        let models = subscriptions::Entity::find()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .order_by_asc(subscriptions::Column::StartDate)
            .order_by_asc(subscriptions::Column::Id)
            .all(&self.pool)
            .await?;
        if models.is_empty() {
            return Err(AppError::user_not_found());
        }
        Ok(models.into_iter().map(SubscriptionResponse::from).collect())
    }

    async fn sum_costs(&self, filter: &SumFilter) -> AppResult<i64> {
        let query_start = parse_month_year(&filter.start_date)?;
        // the window covers the whole end month
        let query_end = last_day_of_month(parse_month_year(&filter.end_date)?)?;

        if let Some(user_id) = &filter.user_id
            && !self.user_exists(user_id).await?
        {
            return Err(AppError::user_not_found());
        }

        let mut query = subscriptions::Entity::find()
            .select_only()
            .column_as(Expr::col(subscriptions::Column::Price).sum(), "sum")
            .filter(subscriptions::Column::StartDate.lte(query_end))
            .filter(subscriptions::Column::EndDate.gte(query_start));
        if let Some(service_name) = &filter.service_name {
            query = query.filter(subscriptions::Column::ServiceName.eq(service_name.as_str()));
        }
        if let Some(user_id) = &filter.user_id {
            query = query.filter(subscriptions::Column::UserId.eq(user_id.as_str()));
        }

        #[derive(Debug, sea_orm::FromQueryResult)]
        struct SumRow {
            sum: Option<i64>,
        }
        let sum = query
            .into_model::<SumRow>()
            .one(&self.pool)
            .await?
            .and_then(|r| r.sum)
            .unwrap_or(0);
        Ok(sum)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use sea_orm::{MockDatabase, MockExecResult, Transaction};
    use std::collections::BTreeMap;

    fn model(id: Uuid, user_id: &str, start: &str, end: &str) -> subscriptions::Model {
        subscriptions::Model {
            id,
            service_name: "Yandex Plus".into(),
            price: 400,
            user_id: user_id.into(),
            start_date: parse_month_year(start).unwrap(),
            end_date: parse_month_year(end).unwrap(),
        }
    }

    fn sql_of(log: &[Transaction]) -> Vec<String> {
        log.iter().map(|t| format!("{t:?}")).collect()
    }

    #[tokio::test]
    async fn test_create_inserts_normalized_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let repo = PgSubscriptionRepository::new(db);

        let sub = NewSubscription {
            id: Uuid::new_v4(),
            service_name: "Yandex Plus".into(),
            price: 400,
            user_id: "u1".into(),
            start_date: "07-2025".into(),
            end_date: "12-2025".into(),
        };
        repo.create(&sub).await.unwrap();

        let log = sql_of(&repo.pool.into_transaction_log());
        assert_eq!(log.len(), 1);
        assert!(log[0].contains("INSERT INTO"));
        assert!(log[0].contains("2025-07-01T00:00:00"));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_date_without_touching_db() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = PgSubscriptionRepository::new(db);

        let sub = NewSubscription {
            id: Uuid::new_v4(),
            service_name: "Yandex Plus".into(),
            price: 400,
            user_id: "u1".into(),
            start_date: "2025-07".into(),
            end_date: "12-2025".into(),
        };
        let err = repo.create(&sub).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidDateFormat(_)));
        assert!(repo.pool.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn test_read_formats_dates() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(id, "u1", "01-2024", "03-2024")]])
            .into_connection();
        let repo = PgSubscriptionRepository::new(db);

        let sub = repo.read(id).await.unwrap();
        assert_eq!(sub.id, id.to_string());
        assert_eq!(sub.start_date, "01-2024");
        assert_eq!(sub.end_date, "03-2024");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<subscriptions::Model>::new()])
            .into_connection();
        let repo = PgSubscriptionRepository::new(db);

        let err = repo.read(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Subscription id not found"));
    }

    #[tokio::test]
    async fn test_update_uses_coalesce_and_binds_null_for_empty_fields() {
        let id = Uuid::new_v4();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![BTreeMap::from([(
                "id",
                Value::Uuid(Some(Box::new(id))),
            )])]])
            .into_connection();
        let repo = PgSubscriptionRepository::new(db);

        let fields = UpdateSubscriptionRequest {
            service_name: String::new(),
            price: 0,
            start_date: "02-2024".into(),
            end_date: "05-2024".into(),
        };
        repo.update(id, &fields).await.unwrap();

        let log = repo.pool.into_transaction_log();
        assert_eq!(log.len(), 1);
        let expected = Transaction::from_sql_and_values(
            DatabaseBackend::Postgres,
            UPDATE_SUBSCRIPTION_SQL,
            [
                Value::String(None),
                Value::Int(None),
                Some(parse_month_year("02-2024").unwrap()).into(),
                Some(parse_month_year("05-2024").unwrap()).into(),
                id.into(),
            ],
        );
        assert_eq!(log[0], expected);
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
            .into_connection();
        let repo = PgSubscriptionRepository::new(db);

        let fields = UpdateSubscriptionRequest {
            service_name: "Netflix".into(),
            price: 100,
            start_date: "02-2024".into(),
            end_date: "05-2024".into(),
        };
        let err = repo.update(Uuid::new_v4(), &fields).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_requires_well_formed_dates() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = PgSubscriptionRepository::new(db);

        let fields = UpdateSubscriptionRequest {
            service_name: "Netflix".into(),
            price: 100,
            start_date: String::new(),
            end_date: "05-2024".into(),
        };
        let err = repo.update(Uuid::new_v4(), &fields).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidDateFormat(_)));
    }

    #[tokio::test]
    async fn test_delete_zero_rows_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();
        let repo = PgSubscriptionRepository::new(db);
        let id = Uuid::new_v4();

        repo.delete(id).await.unwrap();
        let err = repo.delete(id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "Subscription id not found"));
    }

    #[tokio::test]
    async fn test_list_by_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![
                    model(Uuid::new_v4(), "u1", "01-2024", "03-2024"),
                    model(Uuid::new_v4(), "u1", "05-2024", "06-2024"),
                ],
                vec![],
            ])
            .into_connection();
        let repo = PgSubscriptionRepository::new(db);

        let subs = repo.list_by_user("u1").await.unwrap();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[1].start_date, "05-2024");

        let err = repo.list_by_user("nosuchuser").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "User id not found"));
    }

    fn count_row(count: i64) -> Vec<BTreeMap<&'static str, Value>> {
        vec![BTreeMap::from([("count", Value::BigInt(Some(count)))])]
    }

    fn sum_row(sum: Option<i64>) -> Vec<BTreeMap<&'static str, Value>> {
        vec![BTreeMap::from([("sum", Value::BigInt(sum))])]
    }

    fn month(text: &str) -> chrono::DateTime<chrono::Utc> {
        parse_month_year(text).unwrap()
    }

    #[tokio::test]
    async fn test_sum_without_filters_defaults_to_zero() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([sum_row(None)])
            .into_connection();
        let repo = PgSubscriptionRepository::new(db);

        let sum = repo
            .sum_costs(&SumFilter {
                user_id: None,
                service_name: None,
                start_date: "04-2024".into(),
                end_date: "04-2024".into(),
            })
            .await
            .unwrap();
        assert_eq!(sum, 0);

        // the end month is widened to its last day
        let expected = Transaction::from_sql_and_values(
            DatabaseBackend::Postgres,
            r#"SELECT SUM("price") AS "sum" FROM "subscriptions" WHERE "subscriptions"."start_date" <= $1 AND "subscriptions"."end_date" >= $2 LIMIT $3"#,
            [
                month("04-2024").with_day(30).unwrap().into(),
                month("04-2024").into(),
                1u64.into(),
            ],
        );
        assert_eq!(repo.pool.into_transaction_log(), vec![expected]);
    }

    #[tokio::test]
    async fn test_sum_by_service_name() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([sum_row(Some(100))])
            .into_connection();
        let repo = PgSubscriptionRepository::new(db);

        let sum = repo
            .sum_costs(&SumFilter {
                user_id: None,
                service_name: Some("X".into()),
                start_date: "02-2024".into(),
                end_date: "02-2024".into(),
            })
            .await
            .unwrap();
        assert_eq!(sum, 100);

        let expected = Transaction::from_sql_and_values(
            DatabaseBackend::Postgres,
            r#"SELECT SUM("price") AS "sum" FROM "subscriptions" WHERE "subscriptions"."start_date" <= $1 AND "subscriptions"."end_date" >= $2 AND "subscriptions"."service_name" = $3 LIMIT $4"#,
            [
                month("02-2024").with_day(29).unwrap().into(),
                month("02-2024").into(),
                "X".into(),
                1u64.into(),
            ],
        );
        assert_eq!(repo.pool.into_transaction_log(), vec![expected]);
    }

    #[tokio::test]
    async fn test_sum_with_user_checks_existence_first() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count_row(1)])
            .append_query_results([sum_row(Some(100))])
            .into_connection();
        let repo = PgSubscriptionRepository::new(db);

        let sum = repo
            .sum_costs(&SumFilter {
                user_id: Some("u1".into()),
                service_name: Some("X".into()),
                start_date: "01-2024".into(),
                end_date: "03-2024".into(),
            })
            .await
            .unwrap();
        assert_eq!(sum, 100);

        let expected = vec![
            Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"SELECT COUNT($1) AS "count" FROM "subscriptions" WHERE "subscriptions"."user_id" = $2 LIMIT $3"#,
                [1i32.into(), "u1".into(), 1u64.into()],
            ),
            Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"SELECT SUM("price") AS "sum" FROM "subscriptions" WHERE "subscriptions"."start_date" <= $1 AND "subscriptions"."end_date" >= $2 AND "subscriptions"."service_name" = $3 AND "subscriptions"."user_id" = $4 LIMIT $5"#,
                [
                    month("03-2024").with_day(31).unwrap().into(),
                    month("01-2024").into(),
                    "X".into(),
                    "u1".into(),
                    1u64.into(),
                ],
            ),
        ];
        assert_eq!(repo.pool.into_transaction_log(), expected);
    }

    #[tokio::test]
    async fn test_sum_unknown_user_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([count_row(0)])
            .into_connection();
        let repo = PgSubscriptionRepository::new(db);

        let err = repo
            .sum_costs(&SumFilter {
                user_id: Some("ghost".into()),
                service_name: None,
                start_date: "01-2024".into(),
                end_date: "12-2024".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg == "User id not found"));
        // the sum itself never ran
        assert_eq!(repo.pool.into_transaction_log().len(), 1);
    }
}
