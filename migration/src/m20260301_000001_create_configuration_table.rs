use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Configuration::Table)
                    .if_not_exists()
                    .col(pk_auto(Configuration::Id))
                    .col(string_uniq(Configuration::Name))
                    .col(string(Configuration::Category))
                    .col(integer(Configuration::Status))
                    .col(text(Configuration::Data))
                    .col(string(Configuration::Owner))
                    .col(string(Configuration::Description))
                    .col(timestamp(Configuration::StartedAt))
                    .col(timestamp(Configuration::EndedAt))
                    .col(timestamp(Configuration::CreatedAt))
                    .col(timestamp(Configuration::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Refresh filters on status and the validity window
        manager
            .create_index(
                Index::create()
                    .name("idx_configuration_status_window")
                    .table(Configuration::Table)
                    .col(Configuration::Status)
                    .col(Configuration::StartedAt)
                    .col(Configuration::EndedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_configuration_status_window")
                    .table(Configuration::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Configuration::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Configuration {
    Table,
    Id,
    Name,
    Category,
    Status,
    Data,
    Owner,
    Description,
    StartedAt,
    EndedAt,
    CreatedAt,
    UpdatedAt,
}
