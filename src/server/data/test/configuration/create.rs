use super::*;

/// Tests creating a configuration row.
///
/// Verifies that every parameter is persisted and that the timestamps are set.
///
/// Expected: Ok with the stored row
#[tokio::test]
async fn creates_configuration() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = ConfigurationRepository::new(db);
    let param = create_param("block-office", "blockIP", "10.0.0.0/8");
    let created = repo.create(param).await?;

    assert!(created.id > 0);
    assert_eq!(created.name, "block-office");
    assert_eq!(created.category, "blockIP");
    assert_eq!(created.status, ConfigurationStatus::Enabled);
    assert_eq!(created.data, "10.0.0.0/8");
    assert_eq!(created.owner, "operator");
    assert!(created.started_at < created.ended_at);
    assert_eq!(created.created_at, created.updated_at);

    let count = entity::prelude::Configuration::find().count(db).await?;
    assert_eq!(count, 1);

    Ok(())
}

/// Tests that row names are unique.
///
/// Expected: Err on the second insert with the same name
#[tokio::test]
async fn rejects_duplicate_name() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = ConfigurationRepository::new(db);
    repo.create(create_param("same", "blockIP", "1.1.1.1")).await?;
    let result = repo.create(create_param("same", "blockIP", "2.2.2.2")).await;

    assert!(result.is_err());

    Ok(())
}
