use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Subscriptions {
    Table,
    Id,
    ServiceName,
    Price,
    UserId,
    StartDate,
    EndDate,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Dates are stored as the first day of their month at UTC midnight.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subscriptions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::ServiceName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Subscriptions::Price).integer().not_null())
                    .col(
                        ColumnDef::new(Subscriptions::UserId)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::EndDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // list and sum both filter by owner
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_subscriptions_user_id")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
            .await
    }
}
