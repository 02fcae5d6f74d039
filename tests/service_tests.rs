use usergate::config::SecurityConfig;
use usergate::db::Store;
use usergate::services::password::verify_password;
use usergate::services::{AccountError, AccountService, SeaOrmAccountService};

async fn spawn_service() -> (Store, SeaOrmAccountService) {
    let store = Store::new("sqlite::memory:")
        .await
        .expect("Failed to create in-memory store");
    let service = SeaOrmAccountService::new(store.clone(), SecurityConfig::default());
    (store, service)
}

fn user_roles() -> Vec<String> {
    vec!["USER".to_string()]
}

#[tokio::test]
async fn test_register_persists_only_a_hash() {
    let (store, service) = spawn_service().await;

    let user = service
        .register("bob", "pw1", &user_roles())
        .await
        .unwrap();
    assert_eq!(user.username, "bob");
    assert_eq!(user.roles, vec!["USER"]);

    let (_, hash) = store
        .users()
        .get_by_username_with_password("bob")
        .await
        .unwrap()
        .unwrap();

    assert_ne!(hash, "pw1");
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("pw1", &hash));
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let (store, service) = spawn_service().await;

    service
        .register("bob", "first", &user_roles())
        .await
        .unwrap();

    let err = service
        .register("bob", "second", &user_roles())
        .await
        .unwrap_err();
    assert!(matches!(err, AccountError::Conflict));

    // The store retains only the first registration
    let (_, hash) = store
        .users()
        .get_by_username_with_password("bob")
        .await
        .unwrap()
        .unwrap();
    assert!(verify_password("first", &hash));
    assert!(!verify_password("second", &hash));
}

#[tokio::test]
async fn test_change_password_rehashes() {
    let (store, service) = spawn_service().await;

    service
        .register("bob", "old-pw", &user_roles())
        .await
        .unwrap();
    service.change_password("bob", "new-pw").await.unwrap();

    let (_, hash) = store
        .users()
        .get_by_username_with_password("bob")
        .await
        .unwrap()
        .unwrap();

    assert!(verify_password("new-pw", &hash));
    assert!(!verify_password("old-pw", &hash));
}

#[tokio::test]
async fn test_password_mutations_on_unknown_user() {
    let (_, service) = spawn_service().await;

    assert!(matches!(
        service.change_password("ghost", "x").await.unwrap_err(),
        AccountError::NotFound
    ));
    assert!(matches!(
        service.forget_password("ghost", "x").await.unwrap_err(),
        AccountError::NotFound
    ));
    assert!(matches!(
        service.admin_reset("ghost", "x").await.unwrap_err(),
        AccountError::NotFound
    ));
}

#[tokio::test]
async fn test_remove_verifies_before_deleting() {
    let (_, service) = spawn_service().await;

    service
        .register("bob", "right", &user_roles())
        .await
        .unwrap();

    // Wrong password: no deletion
    let err = service.remove("bob", "wrong").await.unwrap_err();
    assert!(matches!(err, AccountError::InvalidCredentials));
    assert!(
        service
            .list_all()
            .await
            .unwrap()
            .iter()
            .any(|u| u.username == "bob")
    );

    // Right password: deleted and returned
    let deleted = service.remove("bob", "right").await.unwrap();
    assert_eq!(deleted.username, "bob");
    assert!(
        !service
            .list_all()
            .await
            .unwrap()
            .iter()
            .any(|u| u.username == "bob")
    );

    // A second removal collapses to not-found
    assert!(matches!(
        service.remove("bob", "right").await.unwrap_err(),
        AccountError::NotFound
    ));
}

#[tokio::test]
async fn test_authenticate() {
    let (_, service) = spawn_service().await;

    service
        .register("bob", "pw1", &user_roles())
        .await
        .unwrap();

    let user = service.authenticate("bob", "pw1").await.unwrap();
    assert_eq!(user.username, "bob");

    assert!(matches!(
        service.authenticate("bob", "nope").await.unwrap_err(),
        AccountError::InvalidCredentials
    ));

    // Unknown user is indistinguishable from a wrong password
    assert!(matches!(
        service.authenticate("ghost", "pw1").await.unwrap_err(),
        AccountError::InvalidCredentials
    ));
}

#[tokio::test]
async fn test_register_validation() {
    let (_, service) = spawn_service().await;

    assert!(matches!(
        service.register("", "pw", &user_roles()).await.unwrap_err(),
        AccountError::Validation(_)
    ));
    assert!(matches!(
        service
            .register("bob", "", &user_roles())
            .await
            .unwrap_err(),
        AccountError::Validation(_)
    ));
}

#[tokio::test]
async fn test_seeded_admin_account() {
    let (_, service) = spawn_service().await;

    let admin = service.authenticate("admin", "admin").await.unwrap();
    assert_eq!(admin.roles, vec!["ADMIN"]);
}
