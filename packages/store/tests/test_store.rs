use pagewright_store::{
    scaffold, AccessPolicy, AppStore, InMemoryStore, MetadataUpdate, NavItem, NewApplication,
    StoreError, VersionState,
};

fn store_with_app() -> (InMemoryStore, pagewright_store::Application) {
    let store = InMemoryStore::new();
    let app = store
        .create_application(NewApplication::new("crm", "CRM"))
        .unwrap();
    (store, app)
}

fn paths(store: &InMemoryStore, version_id: uuid::Uuid) -> Vec<String> {
    store
        .list_files(version_id)
        .unwrap()
        .into_iter()
        .map(|f| f.path)
        .collect()
}

#[test]
fn test_new_application_is_scaffolded() {
    let (store, app) = store_with_app();
    let draft = app.draft_version_id.unwrap();

    assert_eq!(app.active_version_id, None);
    assert_eq!(paths(&store, draft), vec![scaffold::LAYOUT_PATH, scaffold::HOME_PATH]);

    let version = store.get_version(draft).unwrap();
    assert_eq!(version.state, VersionState::Draft);
    assert_eq!(version.number, 0);
}

#[test]
fn test_duplicate_and_invalid_slugs() {
    let (store, _) = store_with_app();
    let err = store
        .create_application(NewApplication::new("crm", "Other"))
        .unwrap_err();
    assert_eq!(err.code(), "slug_taken");

    let err = store
        .create_application(NewApplication::new("Not A Slug", "x"))
        .unwrap_err();
    assert_eq!(err.code(), "slug_invalid");
}

#[test]
fn test_invalid_path_rejected_before_write() {
    let (store, app) = store_with_app();
    let draft = app.draft_version_id.unwrap();

    let err = store.put_file(draft, "components/[id].tsx", "x").unwrap_err();
    assert_eq!(err.code(), "path_param_outside_pages");
    let err = store.put_file(draft, "notes.txt", "x").unwrap_err();
    assert_eq!(err.code(), "path_not_source");
    assert_eq!(paths(&store, draft).len(), 2);
}

#[test]
fn test_same_module_key_collides() {
    let (store, app) = store_with_app();
    let draft = app.draft_version_id.unwrap();

    let err = store.put_file(draft, "pages/index.jsx", "x").unwrap_err();
    match err {
        StoreError::PathCollision { existing, .. } => assert_eq!(existing, "pages/index.tsx"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_put_is_last_write_wins() {
    let (store, app) = store_with_app();
    let draft = app.draft_version_id.unwrap();

    store.put_file(draft, "pages/about.tsx", "first").unwrap();
    store.put_file(draft, "pages/about.tsx", "second").unwrap();
    assert_eq!(store.get_file(draft, "pages/about.tsx").unwrap().source, "second");

    let err = store.create_file(draft, "pages/about.tsx", "third").unwrap_err();
    assert_eq!(err.code(), "file_exists");
}

#[test]
fn test_publish_snapshot_is_isolated_from_later_edits() {
    let store = InMemoryStore::new();
    let app = store
        .create_application(NewApplication::new("portal", "Portal"))
        .unwrap();
    let draft = app.draft_version_id.unwrap();
    store.delete_file(draft, scaffold::LAYOUT_PATH).unwrap();
    store.delete_file(draft, scaffold::HOME_PATH).unwrap();
    store.put_file(draft, "pages/a.tsx", "A").unwrap();
    store.put_file(draft, "pages/b.tsx", "B").unwrap();

    let published = store.publish(app.id).unwrap();
    store.put_file(draft, "pages/a.tsx", "A changed").unwrap();
    store.put_file(draft, "pages/c.tsx", "C").unwrap();

    assert_eq!(paths(&store, published.id), vec!["pages/a.tsx", "pages/b.tsx"]);
    assert_eq!(store.get_file(published.id, "pages/a.tsx").unwrap().source, "A");
    assert_eq!(paths(&store, draft).len(), 3);

    let app = store.get_application(app.id).unwrap();
    assert_eq!(app.active_version_id, Some(published.id));
    assert_eq!(app.draft_version_id, Some(draft));
}

#[test]
fn test_published_versions_are_read_only() {
    let (store, app) = store_with_app();
    let published = store.publish(app.id).unwrap();

    let err = store
        .put_file(published.id, "pages/index.tsx", "changed")
        .unwrap_err();
    assert_eq!(err, StoreError::ReadOnlyVersion(published.id));
    assert!(store.delete_file(published.id, "pages/index.tsx").is_err());
    assert!(store
        .rename_file(published.id, "pages/index.tsx", "pages/home.tsx")
        .is_err());
}

#[test]
fn test_rollback_creates_no_version() {
    let (store, app) = store_with_app();
    let v1 = store.publish(app.id).unwrap();
    let v2 = store.publish(app.id).unwrap();
    assert_eq!((v1.number, v2.number), (1, 2));

    let before = store.list_versions(app.id).unwrap().len();
    let app = store.set_active(app.id, v1.id).unwrap();
    assert_eq!(app.active_version_id, Some(v1.id));
    assert_eq!(store.list_versions(app.id).unwrap().len(), before);
}

#[test]
fn test_rollback_rejects_draft_and_foreign_versions() {
    let (store, app) = store_with_app();
    let other = store
        .create_application(NewApplication::new("other", "Other"))
        .unwrap();
    let foreign = store.publish(other.id).unwrap();

    let err = store
        .set_active(app.id, app.draft_version_id.unwrap())
        .unwrap_err();
    assert_eq!(err.code(), "version_not_published");
    let err = store.set_active(app.id, foreign.id).unwrap_err();
    assert_eq!(err.code(), "version_not_in_app");
}

#[test]
fn test_rename_file() {
    let (store, app) = store_with_app();
    let draft = app.draft_version_id.unwrap();
    store.put_file(draft, "components/Card.tsx", "card").unwrap();

    let renamed = store
        .rename_file(draft, "components/Card.tsx", "components/Panel.tsx")
        .unwrap();
    assert_eq!(renamed.source, "card");
    assert!(store.get_file(draft, "components/Card.tsx").unwrap_err().is_not_found());

    // changing only the extension is not a collision with itself
    store
        .rename_file(draft, "components/Panel.tsx", "components/Panel.jsx")
        .unwrap();

    let err = store
        .rename_file(draft, "components/Panel.jsx", "pages/index.ts")
        .unwrap_err();
    assert_eq!(err.code(), "path_collision");
}

#[test]
fn test_metadata_update_and_delete() {
    let (store, app) = store_with_app();
    let updated = store
        .update_metadata(
            app.id,
            MetadataUpdate {
                name: Some("Clients".into()),
                access: Some(AccessPolicy::Roles {
                    roles: vec!["sales".into()],
                }),
                navigation: Some(vec![NavItem {
                    label: "Clients".into(),
                    path: "/clients".into(),
                    icon: None,
                }]),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.name, "Clients");
    assert_eq!(updated.slug, "crm");
    assert_eq!(updated.navigation.len(), 1);
    assert_eq!(store.get_application_by_slug("crm").unwrap().name, "Clients");

    let draft = app.draft_version_id.unwrap();
    store.delete_application(app.id).unwrap();
    assert!(store.get_application(app.id).unwrap_err().is_not_found());
    assert!(store.get_version(draft).is_err());
    assert!(store.list_applications().is_empty());
}
