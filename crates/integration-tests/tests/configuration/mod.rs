use config::Config;
use indoc::formatdoc;
use integration_tests::{OpenAIMock, TEST_API_KEY};
use story::{ChatMessage, OpenAiStoryClient, StoryGenerator};

fn write_config(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("storygenie.toml");
    std::fs::write(&path, content).unwrap();

    path
}

#[tokio::test]
async fn client_built_from_config_file() {
    let server = OpenAIMock::new()
        .requiring_key(TEST_API_KEY)
        .with_choices(["A story from the configured endpoint."])
        .spawn()
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        &formatdoc! {r#"
            [openai]
            api_key = "{key}"
            base_url = "{url}"
            model = "gpt-4o-mini"
            timeout = "5s"
        "#, key = TEST_API_KEY, url = server.url()},
    );

    let config = Config::load(&path).unwrap();
    let client = OpenAiStoryClient::new(&config.openai).unwrap();

    let generation = client
        .generate_story(&[ChatMessage::user("a penguin on holiday")])
        .await
        .unwrap();

    assert_eq!(generation.story(), Some("A story from the configured endpoint."));
    assert_eq!(server.requests()[0].body["model"], "gpt-4o-mini");
}

#[tokio::test]
async fn unset_key_variable_loads_and_is_rejected_by_the_endpoint() {
    let server = OpenAIMock::new().requiring_key(TEST_API_KEY).spawn().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        &dir,
        &formatdoc! {r#"
            [openai]
            api_key = "{{{{ env.STORYGENIE_INTEGRATION_MISSING_KEY }}}}"
            base_url = "{url}"
        "#, url = server.url()},
    );

    let config = Config::load(&path).unwrap();
    assert!(config.openai.api_key.is_none());

    let client = OpenAiStoryClient::new(&config.openai).unwrap();
    let error = client
        .generate_story(&[ChatMessage::user("a penguin on holiday")])
        .await
        .unwrap_err();

    assert!(error.is_unauthorized(), "{error:?}");
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();

    assert!(Config::load(dir.path().join("absent.toml")).is_err());
}
