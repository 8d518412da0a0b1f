use super::*;

/// Tests deleting an existing row.
///
/// Expected: Ok(true) and the row is gone
#[tokio::test]
async fn deletes_existing_row() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let row = factory::create_configuration(db, "blockIP", "1.1.1.1").await?;

    let repo = ConfigurationRepository::new(db);
    let deleted = repo.delete(row.id).await?;

    assert!(deleted);
    assert!(repo.get_by_id(row.id).await?.is_none());

    Ok(())
}

/// Tests deleting a row that does not exist.
///
/// Expected: Ok(false)
#[tokio::test]
async fn reports_missing_row() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = ConfigurationRepository::new(db);
    let deleted = repo.delete(7).await?;

    assert!(!deleted);

    Ok(())
}
