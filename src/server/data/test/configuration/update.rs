use super::*;

/// Tests updating only some fields of a row.
///
/// Verifies that `None` fields keep their values and that `updated_at` moves forward.
///
/// Expected: Ok with the updated row
#[tokio::test]
async fn updates_given_fields_only() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let original = ConfigurationFactory::new(db)
        .category("blockIP")
        .data("1.1.1.1")
        .updated_at(Utc::now() - Duration::hours(2))
        .build()
        .await?;

    let repo = ConfigurationRepository::new(db);
    let updated = repo
        .update(UpdateConfigurationParam {
            id: original.id,
            status: Some(ConfigurationStatus::Disabled),
            data: Some("2.2.2.2".to_string()),
            ..Default::default()
        })
        .await?;

    assert_eq!(updated.status, ConfigurationStatus::Disabled);
    assert_eq!(updated.data, "2.2.2.2");
    assert_eq!(updated.name, original.name);
    assert_eq!(updated.description, original.description);
    assert_eq!(updated.started_at, original.started_at);
    assert_eq!(updated.ended_at, original.ended_at);
    assert!(updated.updated_at > original.updated_at);

    Ok(())
}

/// Tests updating a row that does not exist.
///
/// Expected: Err(DbErr::RecordNotFound)
#[tokio::test]
async fn fails_for_missing_row() -> Result<(), DbErr> {
    let test = TestBuilder::new()
        .with_configuration_tables()
        .build()
        .await
        .unwrap();
    let db = test.db.as_ref().unwrap();

    let repo = ConfigurationRepository::new(db);
    let result = repo
        .update(UpdateConfigurationParam {
            id: 42,
            data: Some("x".to_string()),
            ..Default::default()
        })
        .await;

    assert!(matches!(result, Err(DbErr::RecordNotFound(_))));

    Ok(())
}
