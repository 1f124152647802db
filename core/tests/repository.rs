//! Repository operations over a recording backend: which path, method and
//! parameters each operation sends, and how the payload becomes entities.

mod support;

use restrepo_core::{
    ApiError, Creatable, Deletable, EntityError, HttpMethod, PageInfo, Paged, Parameters, Payload, Readable,
    ToDictionary, Updatable,
};
use serde_json::json;
use support::{object, outcome, Call, Document, Documents, RecordingBackend, Task, Tasks};
use time::{Date, Month};
use uuid::Uuid;

fn users(backend: &RecordingBackend) -> Documents<RecordingBackend> {
    Documents::new(backend.clone(), "users")
}

// --- read ---

#[test]
fn read_by_id_gets_the_resource_path() {
    let backend = RecordingBackend::replying(json!({"id": "1", "name": "John"}));

    let user = outcome(&users(&backend).read_by_id(&"1".to_string())).unwrap();

    assert_eq!(user, Document::new("1", "John"));
    assert_eq!(
        backend.calls(),
        vec![Call {
            path: "users/1".into(),
            method: HttpMethod::Get,
            parameters: None,
        }]
    );
}

#[test]
fn read_by_id_is_strict_about_fields() {
    let backend = RecordingBackend::replying(json!({"id": "1"}));

    let err = outcome(&users(&backend).read_by_id(&"1".to_string())).unwrap_err();

    assert!(matches!(err, ApiError::Parsing(EntityError::MissingField(ref f)) if f == "name"));
}

#[test]
fn read_by_id_surfaces_not_found() {
    let backend = RecordingBackend::failing(|| ApiError::NotFound);

    let err = outcome(&users(&backend).read_by_id(&"404".to_string())).unwrap_err();

    assert!(matches!(err, ApiError::NotFound));
}

#[test]
fn read_all_drops_elements_that_do_not_parse() {
    let backend = RecordingBackend::replying(json!([
        {"id": "1", "name": "a"},
        {"id": "2"},
        {"id": "3", "name": "c"},
    ]));

    let documents = outcome(&users(&backend).read_all()).unwrap();

    assert_eq!(documents, vec![Document::new("1", "a"), Document::new("3", "c")]);
    assert_eq!(backend.last_call().path, "users");
    assert_eq!(backend.last_call().method, HttpMethod::Get);
}

#[test]
fn read_all_with_object_body_is_bad_response() {
    let backend = RecordingBackend::replying(json!({"id": "1", "name": "a"}));

    assert!(matches!(outcome(&users(&backend).read_all()), Err(ApiError::BadResponse)));
}

#[test]
fn read_without_body_is_bad_response() {
    let backend = RecordingBackend::empty();

    assert!(matches!(outcome(&users(&backend).read_all()), Err(ApiError::BadResponse)));
    assert!(matches!(outcome(&users(&backend).read()), Err(ApiError::BadResponse)));
}

#[test]
fn singleton_read_uses_the_collection_path() {
    let backend = RecordingBackend::replying(json!({"id": "settings", "name": "default"}));
    let settings = Documents::new(backend.clone(), "settings");

    let value = outcome(&settings.read()).unwrap();

    assert_eq!(value, Document::new("settings", "default"));
    assert_eq!(backend.last_call().path, "settings");
}

#[test]
fn uuid_ids_render_into_the_path() {
    let id = Uuid::new_v4();
    let body = json!({"id": id.to_string(), "title": "ship", "done": false, "due": "2016-03-09"});
    let backend = RecordingBackend::replying(body);

    let task = outcome(&Tasks::new(backend.clone()).read_by_id(&id)).unwrap();

    assert_eq!(task.id, id);
    assert_eq!(task.due, Date::from_calendar_date(2016, Month::March, 9).unwrap());
    assert_eq!(backend.last_call().path, format!("tasks/{id}"));
}

#[test]
fn reserved_characters_in_ids_stay_inside_one_segment() {
    let backend = RecordingBackend::empty();
    let documents = users(&backend);

    for id in ["1#draft", "2?x=y", "a/b", "50%", "with space"] {
        outcome(&documents.delete_by_id(&id.to_string())).unwrap();
    }
    outcome(&documents.read_by_id(&"1#draft".to_string())).unwrap_err();
    outcome(&documents.update_by_id(&Document::new("1", "a"), &"2?x=y".to_string())).unwrap_err();

    let paths: Vec<String> = backend.calls().into_iter().map(|call| call.path).collect();
    assert_eq!(
        paths,
        [
            "users/1%23draft",
            "users/2%3Fx=y",
            "users/a%2Fb",
            "users/50%25",
            "users/with%20space",
            "users/1%23draft",
            "users/2%3Fx=y",
        ]
    );
}

// --- pagination ---

#[test]
fn read_page_passes_page_info_through() {
    let backend = RecordingBackend::new(|_| {
        Ok(Payload {
            body: Some(br#"[{"id":"6","name":"f"},{"id":"7"}]"#.to_vec()),
            page_info: Some(PageInfo::new(2, 5, 11)),
        })
    });

    let page = outcome(&Documents::new(backend.clone(), "documents").read_page(2, 5)).unwrap();

    assert_eq!(backend.last_call().path, "documents?page=2&per_page=5");
    assert_eq!(page.entities, vec![Document::new("6", "f")]);
    let info = page.page_info.unwrap();
    assert_eq!(info, PageInfo::new(2, 5, 11));
    assert!(info.has_more());
}

#[test]
fn read_page_without_headers_has_no_page_info() {
    let backend = RecordingBackend::replying(json!([]));

    let page = outcome(&Documents::new(backend, "documents").read_page(1, 20)).unwrap();

    assert!(page.entities.is_empty());
    assert_eq!(page.page_info, None);
}

#[test]
fn paged_repository_uses_its_page_size() {
    let backend = RecordingBackend::replying(json!([]));
    let documents = Documents::new(backend.clone(), "documents").with_page_size(50);

    outcome(&documents.read_page_number(3)).unwrap();

    assert_eq!(backend.last_call().path, "documents?page=3&per_page=50");
}

// --- create / update ---

#[test]
fn create_posts_the_dictionary_and_returns_the_server_copy() {
    let backend = RecordingBackend::replying(json!({"id": "1", "name": "John (saved)"}));
    let john = Document::new("1", "John");

    let saved = outcome(&users(&backend).create(&john)).unwrap();

    assert_eq!(saved, Document::new("1", "John (saved)"));
    assert_eq!(
        backend.last_call(),
        Call {
            path: "users".into(),
            method: HttpMethod::Post,
            parameters: Some(Parameters::Object(john.to_dictionary())),
        }
    );
}

#[test]
fn create_all_posts_an_array() {
    let backend = RecordingBackend::replying(json!([{"id": "1", "name": "a"}, {"id": "2", "name": "b"}]));
    let input = [Document::new("1", "a"), Document::new("2", "b")];

    let saved = outcome(&users(&backend).create_all(&input)).unwrap();

    assert_eq!(saved, input);
    let call = backend.last_call();
    assert_eq!(call.method, HttpMethod::Post);
    assert_eq!(
        call.parameters,
        Some(Parameters::Array(vec![
            object(json!({"id": "1", "name": "a"})),
            object(json!({"id": "2", "name": "b"})),
        ]))
    );
}

#[test]
fn create_failure_is_forwarded() {
    let backend = RecordingBackend::failing(|| ApiError::ServerError(503));

    let err = outcome(&users(&backend).create(&Document::new("1", "a"))).unwrap_err();

    assert!(matches!(err, ApiError::ServerError(503)));
}

#[test]
fn update_puts_to_the_entity_path() {
    let backend = RecordingBackend::replying(json!({"id": "1", "name": "Jane"}));
    let jane = Document::new("1", "Jane");

    let updated = outcome(&users(&backend).update(&jane)).unwrap();

    assert_eq!(updated, jane);
    assert_eq!(
        backend.last_call(),
        Call {
            path: "users/1".into(),
            method: HttpMethod::Put,
            parameters: Some(Parameters::Object(jane.to_dictionary())),
        }
    );
}

#[test]
fn update_by_id_uses_the_given_id() {
    let backend = RecordingBackend::replying(json!({"id": "9", "name": "Jane"}));

    outcome(&users(&backend).update_by_id(&Document::new("1", "Jane"), &"9".to_string())).unwrap();

    assert_eq!(backend.last_call().path, "users/9");
}

#[test]
fn update_all_patches_the_collection() {
    let backend = RecordingBackend::replying(json!([{"id": "1", "name": "a2"}, {"broken": true}]));

    let updated = outcome(&users(&backend).update_all(&[Document::new("1", "a2")])).unwrap();

    assert_eq!(updated, vec![Document::new("1", "a2")]);
    let call = backend.last_call();
    assert_eq!(call.path, "users");
    assert_eq!(call.method, HttpMethod::Patch);
}

// --- delete ---

#[test]
fn delete_ignores_the_body() {
    let backend = RecordingBackend::empty();

    outcome(&users(&backend).delete(&Document::new("1", "John"))).unwrap();
    outcome(&users(&backend).delete_by_id(&"2".to_string())).unwrap();

    assert_eq!(
        backend.calls(),
        vec![
            Call {
                path: "users/1".into(),
                method: HttpMethod::Delete,
                parameters: None,
            },
            Call {
                path: "users/2".into(),
                method: HttpMethod::Delete,
                parameters: None,
            },
        ]
    );
}

#[test]
fn delete_singleton_targets_the_collection_path() {
    let backend = RecordingBackend::empty();

    outcome(&Documents::new(backend.clone(), "settings").delete_singleton()).unwrap();

    assert_eq!(backend.last_call().path, "settings");
    assert_eq!(backend.last_call().method, HttpMethod::Delete);
}

#[test]
fn delete_surfaces_not_found() {
    let backend = RecordingBackend::failing(|| ApiError::NotFound);

    let err = outcome(&users(&backend).delete_by_id(&"1".to_string())).unwrap_err();

    assert!(matches!(err, ApiError::NotFound));
}

// --- laziness ---

#[test]
fn nothing_is_sent_until_start_and_every_start_resends() {
    let backend = RecordingBackend::replying(json!({"id": "1", "name": "John"}));
    let read = users(&backend).read_by_id(&"1".to_string());
    assert!(backend.calls().is_empty());

    outcome(&read).unwrap();
    outcome(&read).unwrap();

    assert_eq!(backend.calls().len(), 2);
}

#[test]
fn task_create_sends_the_wire_date() {
    let task = Task {
        id: Uuid::nil(),
        title: "file taxes".into(),
        done: true,
        due: Date::from_calendar_date(2024, Month::April, 15).unwrap(),
    };
    let backend = RecordingBackend::replying(json!(task.to_dictionary()));

    let saved = outcome(&Tasks::new(backend.clone()).create(&task)).unwrap();

    assert_eq!(saved, task);
    let Some(Parameters::Object(sent)) = backend.last_call().parameters else {
        panic!("expected an object body");
    };
    assert_eq!(sent["due"], json!("2024-04-15"));
    assert_eq!(sent["id"], json!("00000000-0000-0000-0000-000000000000"));
}
