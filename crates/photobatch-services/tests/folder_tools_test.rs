//! Folder tool integration tests: countries, article folders, photo gathering.

mod helpers;

use helpers::fixtures::zip_entries;
use helpers::TestEnv;
use photobatch_core::AppError;
use photobatch_storage::MemoryStore;

async fn seed_countries(env: &TestEnv, countries: &[&str]) {
    for country in countries {
        env.store.seed_folder_path(&env.path(&[*country])).await;
    }
}

#[tokio::test]
async fn test_list_countries_sorted() {
    let env = TestEnv::new();
    seed_countries(&env, &["ITALIA", "ALEMANIA", "ESPAÑA"]).await;

    let report = env.folder_tools().list_countries().await.unwrap();

    assert!(report.success);
    assert_eq!(report.countries, vec!["ALEMANIA", "ESPAÑA", "ITALIA"]);
    assert_eq!(env.store.calls().create, 0);
}

#[tokio::test]
async fn test_list_countries_requires_root() {
    let env = TestEnv::new();
    env.store.seed_folder_path(&["LEBENGOOD"]).await;

    let err = env.folder_tools().list_countries().await.unwrap_err();

    assert!(matches!(err, AppError::FolderStructure(ref msg) if msg.contains("FOTOS")));
    assert_eq!(env.store.folder_count().await, 1);
}

#[tokio::test]
async fn test_create_article_folders_skips_missing_countries() {
    let env = TestEnv::new();
    seed_countries(&env, &["ESPAÑA", "ITALIA"]).await;

    let report = env
        .folder_tools()
        .create_article_folders(
            " b-new ",
            &["ESPAÑA".to_string(), "SUECIA".to_string(), "ITALIA".to_string()],
        )
        .await
        .unwrap();

    assert!(report.success);
    assert_eq!(report.countries_processed, 2);
    assert_eq!(report.folders_created, 2);
    assert_eq!(report.missing_countries, vec!["SUECIA"]);
    assert!(env.store.folder_at(&env.path(&["ESPAÑA", "B-NEW"])).await.is_some());
    assert!(env.store.folder_at(&env.path(&["ITALIA", "B-NEW"])).await.is_some());
    assert!(env.progress.contains("Country not found: SUECIA"));
}

#[tokio::test]
async fn test_create_article_folders_is_idempotent() {
    let env = TestEnv::new();
    seed_countries(&env, &["ESPAÑA"]).await;
    env.store.seed_folder_path(&env.path(&["ESPAÑA", "B1"])).await;
    let tools = env.folder_tools();

    let report = tools
        .create_article_folders("b1", &["ESPAÑA".to_string()])
        .await
        .unwrap();

    assert_eq!(report.countries_processed, 1);
    assert_eq!(report.folders_created, 0);
    assert_eq!(env.store.calls().create, 0);
    assert!(env.progress.contains("already exists"));
}

#[tokio::test]
async fn test_create_article_folders_validates_input() {
    let env = TestEnv::new();
    seed_countries(&env, &["ESPAÑA"]).await;
    let tools = env.folder_tools();

    let err = tools
        .create_article_folders("  ", &["ESPAÑA".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = tools.create_article_folders("B1", &[]).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(env.store.calls().total(), 0);
}

#[tokio::test]
async fn test_gather_photos_zips_nested_images() {
    let env = TestEnv::new();
    let article = env.store.seed_folder_path(&env.path(&["ESPAÑA", "B7"])).await;
    let red = env
        .store
        .seed_folder_path(&env.path(&["ESPAÑA", "B7", "RED"]))
        .await;
    let deep = env
        .store
        .seed_folder_path(&env.path(&["ESPAÑA", "B7", "BLUE", "EXTRA"]))
        .await;
    env.store.seed_file(&article, "cover.MAIN.jpg", b"c".to_vec()).await;
    env.store.seed_file(&red, "B7.PT01.jpg", b"r".to_vec()).await;
    env.store.seed_file(&red, "notes.txt", b"n".to_vec()).await;
    env.store.seed_file(&deep, "B7.PT02.png", b"d".to_vec()).await;

    let report = env.folder_tools().gather_photos("españa", "b7").await.unwrap();

    assert!(report.success);
    assert_eq!(report.photos_found, 3);
    assert_eq!(report.photos_downloaded, 3);
    assert_eq!(report.archive_name.as_deref(), Some("B7.zip"));

    let archive = env.store.file_bytes(&article, "B7.zip").await.unwrap();
    let mut entries = zip_entries(&archive);
    entries.sort();
    assert_eq!(entries, vec!["B7.PT01.jpg", "B7.PT02.png", "cover.MAIN.jpg"]);
}

#[tokio::test]
async fn test_gather_photos_downloads_duplicate_names_once() {
    let env = TestEnv::new();
    let red = env
        .store
        .seed_folder_path(&env.path(&["ESPAÑA", "B8", "RED"]))
        .await;
    let blue = env
        .store
        .seed_folder_path(&env.path(&["ESPAÑA", "B8", "BLUE"]))
        .await;
    env.store.seed_file(&red, "B8.PT01.jpg", b"red".to_vec()).await;
    env.store.seed_file(&blue, "B8.PT01.jpg", b"blue".to_vec()).await;
    env.store.seed_file(&blue, "B8.PT02.jpg", b"two".to_vec()).await;

    let report = env.folder_tools().gather_photos("ESPAÑA", "B8").await.unwrap();

    assert!(report.success);
    assert_eq!(report.photos_found, 3);
    assert_eq!(report.photos_downloaded, 2);
    assert_eq!(env.store.calls().download, 2);

    let article = env
        .store
        .folder_at(&env.path(&["ESPAÑA", "B8"]))
        .await
        .unwrap();
    let archive = env.store.file_bytes(&article, "B8.zip").await.unwrap();
    let mut entries = zip_entries(&archive);
    entries.sort();
    assert_eq!(entries, vec!["B8.PT01.jpg", "B8.PT02.jpg"]);
}

#[tokio::test]
async fn test_gather_photos_without_images() {
    let env = TestEnv::new();
    let article = env.store.seed_folder_path(&env.path(&["ITALIA", "B2"])).await;
    env.store.seed_file(&article, "readme.txt", b"x".to_vec()).await;

    let report = env.folder_tools().gather_photos("ITALIA", "B2").await.unwrap();

    assert!(!report.success);
    assert_eq!(report.photos_found, 0);
    assert!(report.archive_name.is_none());
    assert_eq!(env.store.calls().upload, 0);
}

#[tokio::test]
async fn test_gather_photos_all_downloads_failing() {
    let env = TestEnv::with_store(MemoryStore::new().with_failing_download("B3.PT01.jpg"));
    let article = env.store.seed_folder_path(&env.path(&["FRANCIA", "B3"])).await;
    env.store.seed_file(&article, "B3.PT01.jpg", b"x".to_vec()).await;

    let err = env
        .folder_tools()
        .gather_photos("FRANCIA", "B3")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Processing(_)));
    assert_eq!(env.store.calls().upload, 0);
    assert!(env.progress.contains("Could not download any photo"));
}

#[tokio::test]
async fn test_gather_photos_missing_article() {
    let env = TestEnv::new();
    seed_countries(&env, &["ESPAÑA"]).await;

    let err = env
        .folder_tools()
        .gather_photos("ESPAÑA", "B404")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::FolderStructure(ref msg) if msg.contains("B404")));
    assert_eq!(env.store.calls().create, 0);
}
