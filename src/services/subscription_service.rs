use crate::error::{AppError, AppResult};
use crate::logging::{ComponentLogger, SharedLogger};
use crate::models::*;
use crate::repositories::SubscriptionRepository;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use uuid::Uuid;

/// Months 01-12 of the years 2020-2099.
static SUPPORTED_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0[1-9]|1[0-2])-20[2-9][0-9]$").expect("static regex")
});

pub fn is_valid_month_year(date: &str) -> bool {
    SUPPORTED_MONTH_YEAR.is_match(date)
}

fn require(value: &str, field: &str) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    Ok(())
}

fn require_price(price: i32) -> AppResult<()> {
    match price {
        0 => Err(AppError::ValidationError("price is required".to_string())),
        p if p < 0 => Err(AppError::ValidationError("price must be positive".to_string())),
        _ => Ok(()),
    }
}

fn require_date(value: &str, field: &str) -> AppResult<()> {
    require(value, field)?;
    if !is_valid_month_year(value) {
        return Err(AppError::ValidationError(format!(
            "{field} must be MM-YYYY within 2020-2099"
        )));
    }
    Ok(())
}

/// An id that is not a UUID cannot name any stored subscription.
fn parse_id(id: &str) -> AppResult<Uuid> {
    require(id, "id")?;
    Uuid::parse_str(id).map_err(|_| AppError::subscription_not_found())
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct SubscriptionService {
    repository: Arc<dyn SubscriptionRepository>,
    logger: ComponentLogger,
}

impl SubscriptionService {
    pub fn new(repository: Arc<dyn SubscriptionRepository>, logger: SharedLogger) -> Self {
        Self {
            repository,
            logger: ComponentLogger::new(logger, "subscription_service"),
        }
    }

    /// Storage and internal failures reach clients as an opaque 500, so their
    /// detail is only kept here.
    fn report<T>(&self, operation: &str, result: AppResult<T>) -> AppResult<T> {
        if let Err(err) = &result
            && err.is_server_error()
        {
            self.logger.error(format_args!("{operation} failed: {err}"));
        }
        result
    }

    pub async fn create(&self, request: CreateSubscriptionRequest) -> AppResult<Uuid> {
        require(&request.service_name, "service_name")?;
        require_price(request.price)?;
        require(&request.user_id, "user_id")?;
        require_date(&request.start_date, "start_date")?;
        require_date(&request.end_date, "end_date")?;

        let subscription = NewSubscription::from_request(Uuid::new_v4(), request);
        self.logger.info(format_args!(
            "Create subscription: id={} service_name={} price={} user_id={} start_date={} end_date={}",
            subscription.id,
            subscription.service_name,
            subscription.price,
            subscription.user_id,
            subscription.start_date,
            subscription.end_date,
        ));
        let created = self.repository.create(&subscription).await;
        self.report("Create subscription", created)?;
        Ok(subscription.id)
    }

    pub async fn read(&self, id: &str) -> AppResult<SubscriptionResponse> {
        let id = parse_id(id)?;
        self.logger.info(format_args!("Read subscription: id={id}"));
        let found = self.repository.read(id).await;
        self.report("Read subscription", found)
    }

    /// Full replacement: every field must be supplied, changed or not.
    pub async fn update(&self, id: &str, request: UpdateSubscriptionRequest) -> AppResult<()> {
        require(id, "id")?;
        require(&request.service_name, "service_name")?;
        require_price(request.price)?;
        require_date(&request.start_date, "start_date")?;
        require_date(&request.end_date, "end_date")?;
        let id = parse_id(id)?;

        self.logger.info(format_args!(
            "Update subscription: id={id} service_name={} price={} start_date={} end_date={}",
            request.service_name, request.price, request.start_date, request.end_date,
        ));
        let updated = self.repository.update(id, &request).await;
        self.report("Update subscription", updated)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let id = parse_id(id)?;
        self.logger.info(format_args!("Delete subscription: id={id}"));
        let deleted = self.repository.delete(id).await;
        self.report("Delete subscription", deleted)
    }

    pub async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<SubscriptionResponse>> {
        require(user_id, "user_id")?;
        self.logger
            .info(format_args!("List subscriptions: user_id={user_id}"));
        let listed = self.repository.list_by_user(user_id).await;
        self.report("List subscriptions", listed)
    }

    pub async fn sum_costs(&self, query: SumQuery) -> AppResult<i64> {
        let start_date = query.start_date.unwrap_or_default();
        let end_date = query.end_date.unwrap_or_default();
        require_date(&start_date, "start_date")?;
        require_date(&end_date, "end_date")?;

        let filter = SumFilter {
            user_id: optional(query.user_id),
            service_name: optional(query.service_name),
            start_date,
            end_date,
        };
        self.logger.info(format_args!(
            "Sum subscription costs: user_id={} start_date={} end_date={} service_name={}",
            filter.user_id.as_deref().unwrap_or(""),
            filter.start_date,
            filter.end_date,
            filter.service_name.as_deref().unwrap_or(""),
        ));
        let sum = self.repository.sum_costs(&filter).await;
        self.report("Sum subscription costs", sum)
    }
}
