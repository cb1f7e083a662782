use crate::{
    COLLECTION_KEY, Collection, CollectionStore, CoreError, FolderId, FolderRepository,
    Recording, ResourceHandle,
    tests::fakes::{FlakyStore, spawn_repository},
};

use std::sync::Arc;

fn draft(name: &str) -> Recording {
    Recording::draft(name, ResourceHandle::new(format!("file:///{name}.wav")), 3)
}

/// WHAT: Creating a folder persists it and publishes a new snapshot
/// WHY: The library view reads snapshots, storage must match memory
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_valid_name_when_creating_folder_then_persisted_and_published() {
    // Given: A repository over an empty store
    let (repository, store) = spawn_repository().await;
    let mut snapshots = repository.subscribe();

    // When: Creating a folder
    let folder = repository.create_folder("Ideas").await.unwrap();

    // Then: Empty folder, visible in the snapshot and in storage
    assert_eq!(folder.name, "Ideas");
    assert!(folder.is_empty());
    assert!(snapshots.has_changed().unwrap());
    assert_eq!(snapshots.borrow_and_update().len(), 1);
    let stored: Collection =
        serde_json::from_slice(&store.entry(COLLECTION_KEY).unwrap()).unwrap();
    assert_eq!(stored.folder(&folder.id).unwrap().name, "Ideas");
}

/// WHAT: Blank folder names are rejected without writing
/// WHY: Validation failures must not mutate or persist anything
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_whitespace_name_when_creating_folder_then_validation_error() {
    // Given: A repository
    let (repository, store) = spawn_repository().await;
    let writes_before = store.write_count();

    // When: Creating folders with empty and blank names
    let empty = repository.create_folder("").await;
    let blank = repository.create_folder("   ").await;

    // Then: Both rejected, nothing written, collection unchanged
    assert!(matches!(empty, Err(CoreError::ValidationError { .. })));
    assert!(matches!(blank, Err(CoreError::ValidationError { .. })));
    assert_eq!(store.write_count(), writes_before);
    assert!(repository.snapshot().is_empty());
}

/// WHAT: Folder names are stored exactly as given
/// WHY: Surrounding whitespace is only used for validation
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_padded_name_when_creating_folder_then_name_kept_verbatim() {
    // Given: A repository
    let (repository, _store) = spawn_repository().await;

    // When: Creating a folder with surrounding spaces
    let folder = repository.create_folder("  Ideas ").await.unwrap();

    // Then: Stored untrimmed
    assert_eq!(folder.name, "  Ideas ");
}

/// WHAT: Adding to a missing folder fails with FolderNotFound
/// WHY: A recording must never be attached to nothing
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_unknown_folder_when_adding_recording_then_folder_not_found() {
    // Given: A repository with no folders
    let (repository, store) = spawn_repository().await;
    let writes_before = store.write_count();

    // When: Adding a recording to a made-up folder id
    let result = repository
        .add_recording(&FolderId::from("404"), draft("orphan"))
        .await;

    // Then: FolderNotFound and nothing written
    assert!(matches!(result, Err(CoreError::FolderNotFound { .. })));
    assert_eq!(store.write_count(), writes_before);
}

/// WHAT: A failed save leaves memory equal to the last durable state
/// WHY: Memory must never run ahead of storage
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_failing_store_when_adding_recording_then_error_and_memory_unchanged() {
    // Given: A folder, then a store that stops accepting writes
    let (repository, store) = spawn_repository().await;
    let folder = repository.create_folder("Ideas").await.unwrap();
    store.set_fail_writes(true);

    // When: Adding a recording
    let result = repository.add_recording(&folder.id, draft("lost")).await;

    // Then: StorageWriteError and the folder is still empty
    assert!(matches!(result, Err(CoreError::StorageWriteError { .. })));
    assert!(repository.folder(&folder.id).unwrap().is_empty());

    // And: The same add succeeds once storage recovers
    store.set_fail_writes(false);
    let updated = repository.add_recording(&folder.id, draft("kept")).await.unwrap();
    assert_eq!(updated.len(), 1);
}

/// WHAT: Concurrent adds to one folder are all kept
/// WHY: Interleaved read-modify-write would lose updates
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[allow(clippy::unwrap_used)]
async fn given_concurrent_adds_when_all_complete_then_no_update_lost() {
    // Given: A folder shared by many tasks
    let (repository, _store) = spawn_repository().await;
    let folder = repository.create_folder("Ideas").await.unwrap();

    // When: 20 tasks add a recording each
    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let repository = repository.clone();
            let folder_id = folder.id.clone();
            tokio::spawn(async move {
                repository
                    .add_recording(&folder_id, draft(&format!("take {i}")))
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    // Then: All 20 are present
    assert_eq!(repository.folder(&folder.id).unwrap().len(), 20);
}

/// WHAT: Snapshots taken earlier do not change after later mutations
/// WHY: Readers hold values, not live references
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_old_snapshot_when_mutating_then_snapshot_unchanged() {
    // Given: A snapshot of the empty collection
    let (repository, _store) = spawn_repository().await;
    let before = repository.snapshot();

    // When: Creating a folder
    repository.create_folder("Ideas").await.unwrap();

    // Then: The old snapshot is still empty, a fresh one is not
    assert!(before.is_empty());
    assert_eq!(repository.snapshot().len(), 1);
    assert!(!Arc::ptr_eq(&before, &repository.snapshot()));
}

/// WHAT: Adding a recording whose id already exists in the folder is rejected
/// WHY: Recording ids stay unique within their folder
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_duplicate_recording_id_when_adding_then_validation_error() {
    // Given: A folder holding one recording
    let (repository, _store) = spawn_repository().await;
    let folder = repository.create_folder("Ideas").await.unwrap();
    let recording = draft("once");
    repository.add_recording(&folder.id, recording.clone()).await.unwrap();

    // When: Adding the same recording again
    let result = repository.add_recording(&folder.id, recording).await;

    // Then: Rejected, still one recording
    assert!(matches!(result, Err(CoreError::ValidationError { .. })));
    assert_eq!(repository.folder(&folder.id).unwrap().len(), 1);
}

/// WHAT: Loading a stored collection advances the id generator
/// WHY: New ids must not collide with ids written in a previous run
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_stored_future_ids_when_loading_then_new_ids_are_larger() {
    // Given: A stored folder whose id is far in the future
    let future = chrono::Utc::now().timestamp_millis() + 3_600_000;
    let doc = format!(
        r#"[{{"id":"{future}","name":"Old","recordings":[],"createdAt":"2024-05-01T09:30:00Z"}}]"#
    );
    let store = FlakyStore::with_entry(COLLECTION_KEY, doc.as_bytes());

    // When: Loading and creating a folder
    let repository = FolderRepository::load(CollectionStore::new(store))
        .await
        .unwrap()
        .spawn();
    let folder = repository.create_folder("New").await.unwrap();

    // Then: The new id sorts after the stored one
    assert!(folder.id.as_str().parse::<i64>().unwrap() > future);
}

/// WHAT: Requests fail with RepositoryClosed once the task is gone
/// WHY: Callers get an error instead of hanging forever
#[test]
#[allow(clippy::unwrap_used)]
fn given_repository_runtime_shut_down_when_requesting_then_repository_closed() {
    // Given: A repository spawned on a runtime that is then shut down
    let first = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let repository = first.block_on(async {
        FolderRepository::load(CollectionStore::new(FlakyStore::new()))
            .await
            .unwrap()
            .spawn()
    });
    drop(first);

    // When: Creating a folder from another runtime
    let second = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let result = second.block_on(repository.create_folder("Ideas"));

    // Then: RepositoryClosed
    assert!(matches!(result, Err(CoreError::RepositoryClosed { .. })));
}
