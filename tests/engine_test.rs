// tests/engine_test.rs — Integration test: one chat turn through the engine

use aftersales::assist::{Assistant, AssistantReply, Delegation, Engine, TurnOutcome};
use aftersales::catalog::{Catalog, ManualRecord};
use aftersales::extract::Pipeline;
use aftersales::infra::config::{ExtractionConfig, SessionConfig};
use aftersales::infra::errors::AftersalesError;
use aftersales::session::{SessionDb, Sender, Sessions};
use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::{tempdir, TempDir};

/// Plays back a fixed list of replies, recording every context it saw.
struct ScriptedAssistant {
    replies: Mutex<VecDeque<AssistantReply>>,
    contexts: Mutex<Vec<String>>,
}

impl ScriptedAssistant {
    fn new(replies: Vec<AssistantReply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            contexts: Mutex::new(Vec::new()),
        })
    }

    fn contexts(&self) -> Vec<String> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Assistant for ScriptedAssistant {
    async fn respond(&self, _user_text: &str, context: &str) -> anyhow::Result<AssistantReply> {
        self.contexts.lock().unwrap().push(context.to_string());
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("assistant script exhausted"))
    }
}

fn write_pdf(path: &Path, text: &str) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![50.into(), 750.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

struct Fixture {
    _dir: TempDir,
    sessions: Arc<Sessions>,
    engine: Engine,
}

fn fixture(assistant: Arc<ScriptedAssistant>) -> Fixture {
    let dir = tempdir().unwrap();

    let manuals = dir.path().join("manuals");
    std::fs::create_dir_all(&manuals).unwrap();
    write_pdf(
        &manuals.join("so-6004-b.pdf"),
        "To start a program, close the door and press the start button.",
    );

    let catalog = Arc::new(Catalog::from_records(
        vec![
            ManualRecord {
                name: "Dishwasher 5 Programs".into(),
                model_number: "SO-6004 B".into(),
                manual_path: "so-6004-b.pdf".into(),
            },
            ManualRecord {
                name: "Smart TV 40\" FHD".into(),
                model_number: "40FA9740".into(),
                manual_path: "missing.pdf".into(),
            },
        ],
        manuals,
    ));

    let sessions = Arc::new(Sessions::with_db(
        dir.path().join("sessions"),
        SessionDb::in_memory().unwrap(),
        SessionConfig::default(),
    ));
    std::fs::create_dir_all(sessions.sessions_dir()).unwrap();

    let engine = Engine::new(
        sessions.clone(),
        catalog,
        Pipeline::new(ExtractionConfig::default()),
        assistant,
    );

    Fixture {
        _dir: dir,
        sessions,
        engine,
    }
}

#[tokio::test]
async fn test_text_reply_is_persisted() {
    let assistant = ScriptedAssistant::new(vec![AssistantReply::Text(
        "Our stores are open 9 to 6.".into(),
    )]);
    let f = fixture(assistant);

    let outcome = f
        .engine
        .handle_message(Some("s1"), "when are you open?")
        .await
        .unwrap();

    match outcome {
        TurnOutcome::Reply(text) => assert_eq!(text, "Our stores are open 9 to 6."),
        other => panic!("expected a reply, got {other:?}"),
    }

    let history = f.sessions.history("s1");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].sender, Sender::User);
    assert_eq!(history[1].sender, Sender::Assistant);
    assert_eq!(history[1].content, "Our stores are open 9 to 6.");
}

#[tokio::test]
async fn test_manual_lookup_feeds_extracted_content_back() {
    let assistant = ScriptedAssistant::new(vec![
        AssistantReply::Delegate(Delegation::ManualLookup {
            product: "SO 6004".into(),
            question: "how do I start a program".into(),
        }),
        AssistantReply::Text("Close the door and press start.".into()),
    ]);
    let f = fixture(assistant.clone());

    let outcome = f
        .engine
        .handle_message(Some("s1"), "how do I start my dishwasher?")
        .await
        .unwrap();

    match outcome {
        TurnOutcome::Reply(text) => assert_eq!(text, "Close the door and press start."),
        other => panic!("expected a reply, got {other:?}"),
    }

    // The second collaborator call saw the extracted manual.
    let contexts = assistant.contexts();
    assert_eq!(contexts.len(), 2);
    assert!(contexts[1].contains("Manual content for Dishwasher 5 Programs"));
    assert!(contexts[1].contains("--- Page 1/1 ---"));
    assert!(contexts[1].contains("close the door"));

    // The resolved product was recorded as a mention.
    let info = f.sessions.session_info("s1").unwrap().unwrap();
    assert_eq!(info.products.len(), 1);
    assert_eq!(info.products[0].name, "Dishwasher 5 Programs");
    assert_eq!(
        info.products[0].details["model_number"],
        serde_json::Value::String("SO-6004 B".into())
    );
}

#[tokio::test]
async fn test_unknown_product_renders_not_found() {
    let assistant = ScriptedAssistant::new(vec![AssistantReply::Delegate(
        Delegation::ManualLookup {
            product: "espresso maker".into(),
            question: "descaling".into(),
        },
    )]);
    let f = fixture(assistant);

    let outcome = f
        .engine
        .handle_message(Some("s1"), "how do I descale it?")
        .await
        .unwrap();

    match outcome {
        TurnOutcome::Reply(text) => {
            assert!(text.contains("could not find a manual for 'espresso maker'"));
        }
        other => panic!("expected a reply, got {other:?}"),
    }

    // Not-found is a normal answer, persisted like any other.
    assert_eq!(f.sessions.history("s1").len(), 2);
}

#[tokio::test]
async fn test_missing_manual_file_renders_not_found() {
    let assistant = ScriptedAssistant::new(vec![AssistantReply::Delegate(
        Delegation::ManualLookup {
            product: "40FA9740".into(),
            question: "wall mount".into(),
        },
    )]);
    let f = fixture(assistant);

    let outcome = f
        .engine
        .handle_message(Some("s1"), "how do I wall mount the tv?")
        .await
        .unwrap();

    match outcome {
        TurnOutcome::Reply(text) => assert!(text.contains("could not find a manual")),
        other => panic!("expected a reply, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_product_reference_is_input_error() {
    let assistant = ScriptedAssistant::new(vec![AssistantReply::Delegate(
        Delegation::ManualLookup {
            product: "".into(),
            question: "anything".into(),
        },
    )]);
    let f = fixture(assistant);

    let result = f.engine.handle_message(Some("s1"), "look it up").await;
    assert!(matches!(
        result,
        Err(AftersalesError::InvalidQuery { .. })
    ));
}

#[tokio::test]
async fn test_unserviced_delegation_returned_to_caller() {
    let assistant = ScriptedAssistant::new(vec![AssistantReply::Delegate(
        Delegation::ProductSearch {
            query: "40 inch tv".into(),
        },
    )]);
    let f = fixture(assistant);

    let outcome = f
        .engine
        .handle_message(Some("s1"), "show me 40 inch tvs")
        .await
        .unwrap();

    match outcome {
        TurnOutcome::Unserviced(Delegation::ProductSearch { query }) => {
            assert_eq!(query, "40 inch tv");
        }
        other => panic!("expected an unserviced delegation, got {other:?}"),
    }

    // Only the user message is stored until the caller completes the turn.
    assert_eq!(f.sessions.history("s1").len(), 1);
    f.engine
        .complete_turn(Some("s1"), "Here are three 40 inch TVs.")
        .unwrap();
    assert_eq!(f.sessions.history("s1").len(), 2);
}

#[tokio::test]
async fn test_double_submission_stored_once() {
    // Two identical messages in quick succession, with no assistant turn in
    // between (the delegation goes back to the caller): the second append
    // hits the duplicate guard and the session keeps a single user turn.
    let assistant = ScriptedAssistant::new(vec![
        AssistantReply::Delegate(Delegation::GeneralInfo {
            topic: "warranty".into(),
        }),
        AssistantReply::Delegate(Delegation::GeneralInfo {
            topic: "warranty".into(),
        }),
    ]);
    let f = fixture(assistant);

    f.engine
        .handle_message(Some("s1"), "what is the warranty?")
        .await
        .unwrap();
    f.engine
        .handle_message(Some("s1"), "what is the warranty?")
        .await
        .unwrap();

    let history = f.sessions.history("s1");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].sender, Sender::User);
}
