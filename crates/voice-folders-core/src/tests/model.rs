use crate::{Collection, Folder, FolderId, Recording, RecordingId, ResourceHandle, model::ids};

use chrono::{TimeZone, Utc};

#[allow(clippy::unwrap_used)]
fn folder(id: &str, name: &str) -> Folder {
    Folder {
        id: FolderId::from(id),
        name: name.to_string(),
        recordings: Vec::new(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
    }
}

#[allow(clippy::unwrap_used)]
fn recording(id: &str, name: &str) -> Recording {
    Recording {
        id: RecordingId::from(id),
        name: name.to_string(),
        uri: ResourceHandle::new(format!("file:///recordings/{id}.wav")),
        duration: 12,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 31, 0).unwrap(),
    }
}

/// WHAT: Folder search ignores case and matches substrings
/// WHY: The folder list filter must find "Work Notes" when typing "notes"
#[test]
#[allow(clippy::unwrap_used)]
fn given_mixed_case_names_when_searching_then_matches_case_insensitively() {
    // Given: Three folders
    let collection = Collection::new(vec![
        folder("1", "Work Notes"),
        folder("2", "Ideas"),
        folder("3", "NOTES to self"),
    ]);

    // When: Searching with a lowercase fragment
    let hits = collection.search("notes");

    // Then: Both notes folders match, in collection order
    let names: Vec<&str> = hits.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Work Notes", "NOTES to self"]);
}

/// WHAT: An empty or blank query returns every folder
/// WHY: Clearing the search box must show the whole library again
#[test]
#[allow(clippy::unwrap_used)]
fn given_blank_query_when_searching_then_all_folders_returned() {
    // Given: Two folders
    let collection = Collection::new(vec![folder("1", "A"), folder("2", "B")]);

    // When: Searching with empty and whitespace queries
    let empty = collection.search("");
    let blank = collection.search("   ");

    // Then: Everything is returned
    assert_eq!(empty.len(), 2);
    assert_eq!(blank.len(), 2);
}

/// WHAT: Duplicate folder ids are rejected by validation
/// WHY: Lookups by id would otherwise be ambiguous
#[test]
#[allow(clippy::unwrap_used)]
fn given_duplicate_folder_ids_when_validating_then_error() {
    // Given: Two folders sharing an id
    let collection = Collection::new(vec![folder("7", "A"), folder("7", "B")]);

    // When: Validating
    let result = collection.validate();

    // Then: The duplicate is reported
    assert!(result.unwrap_err().contains("duplicate folder id 7"));
}

/// WHAT: Duplicate recording ids within one folder are rejected
/// WHY: Recording ids must be unique within their folder
#[test]
#[allow(clippy::unwrap_used)]
fn given_duplicate_recording_ids_in_folder_when_validating_then_error() {
    // Given: A folder holding the same recording id twice
    let mut f = folder("1", "Ideas");
    f.recordings.push(recording("10", "Idea 1"));
    f.recordings.push(recording("10", "Idea 2"));
    let collection = Collection::new(vec![f]);

    // When / Then: Validation fails
    assert!(collection.validate().is_err());
}

/// WHAT: The same recording id in different folders is allowed
/// WHY: Uniqueness is only required per folder
#[test]
#[allow(clippy::unwrap_used)]
fn given_same_recording_id_in_two_folders_when_validating_then_ok() {
    // Given: Two folders each holding recording "10"
    let mut a = folder("1", "A");
    a.recordings.push(recording("10", "x"));
    let mut b = folder("2", "B");
    b.recordings.push(recording("10", "y"));

    // When / Then: Validation passes
    assert!(Collection::new(vec![a, b]).validate().is_ok());
}

/// WHAT: Collection serializes as a bare array with camelCase fields
/// WHY: The stored document format must stay readable by existing installs
#[test]
#[allow(clippy::unwrap_used)]
fn given_collection_when_serializing_then_bare_array_with_camel_case_fields() {
    // Given: One folder with one recording
    let mut f = folder("1714555800000", "Ideas");
    f.recordings.push(recording("1714555860000", "Idea 1"));
    let collection = Collection::new(vec![f]);

    // When: Serializing to JSON
    let value = serde_json::to_value(&collection).unwrap();

    // Then: The top level is an array and field names match the stored format
    let folders = value.as_array().unwrap();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0]["id"], "1714555800000");
    assert_eq!(folders[0]["name"], "Ideas");
    assert_eq!(folders[0]["createdAt"], "2024-05-01T09:30:00Z");
    let rec = &folders[0]["recordings"][0];
    assert_eq!(rec["id"], "1714555860000");
    assert_eq!(rec["uri"], "file:///recordings/1714555860000.wav");
    assert_eq!(rec["duration"], 12);
    assert_eq!(rec["createdAt"], "2024-05-01T09:31:00Z");
}

/// WHAT: A document written by another install parses back into a Collection
/// WHY: Loading must accept the stored shape, including empty folders
#[test]
#[allow(clippy::unwrap_used)]
fn given_stored_document_when_parsing_then_collection_restored() {
    // Given: A stored JSON document
    let json = r#"[
        {"id":"1","name":"Empty","recordings":[],"createdAt":"2024-05-01T09:30:00.000Z"},
        {"id":"2","name":"Ideas","recordings":[
            {"id":"3","name":"Idea 1","uri":"file:///a.m4a","duration":5,"createdAt":"2024-05-01T09:31:00.000Z"}
        ],"createdAt":"2024-05-01T09:30:30.000Z"}
    ]"#;

    // When: Parsing
    let collection: Collection = serde_json::from_str(json).unwrap();

    // Then: Folders and recordings are in stored order
    assert_eq!(collection.len(), 2);
    assert!(collection.folders()[0].is_empty());
    let ideas = collection.folder(&FolderId::from("2")).unwrap();
    assert_eq!(ideas.recordings[0].name, "Idea 1");
    assert_eq!(ideas.recordings[0].duration, 5);
}

/// WHAT: Generated ids are strictly increasing decimal numbers
/// WHY: Two folders created in the same millisecond must not collide
#[test]
#[allow(clippy::unwrap_used)]
fn given_rapid_generation_when_issuing_ids_then_strictly_increasing() {
    // Given / When: Many ids generated back to back
    let issued: Vec<i64> = (0..1000)
        .map(|_| FolderId::generate().as_str().parse::<i64>().unwrap())
        .collect();

    // Then: Every id is greater than the previous one
    assert!(issued.windows(2).all(|w| w[1] > w[0]));
}

/// WHAT: Advancing past a stored id makes later ids larger
/// WHY: A clock that went backwards since the last run must not reuse ids
#[test]
#[allow(clippy::unwrap_used)]
fn given_future_stored_id_when_advancing_then_next_id_is_larger() {
    // Given: A stored id far in the future
    let future = Utc::now().timestamp_millis() + 86_400_000;

    // When: Advancing the generator past it
    ids::advance_past(&future.to_string());
    let next: i64 = RecordingId::generate().as_str().parse().unwrap();

    // Then: The next id sorts after it
    assert!(next > future);
}

/// WHAT: Default names count existing recordings from one
/// WHY: The first capture in an empty folder is "Recording 1"
#[test]
fn given_existing_count_when_naming_then_one_based() {
    assert_eq!(Recording::default_name(0), "Recording 1");
    assert_eq!(Recording::default_name(4), "Recording 5");
}
