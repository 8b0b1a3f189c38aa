use std::time::Duration;

use axum::http::StatusCode;
use config::OpenAiConfig;
use integration_tests::{OpenAIMock, TEST_API_KEY, TestOpenAIServer, closed_address};
use serde_json::json;
use story::{ChatMessage, Generation, GenerationError, OpenAiStoryClient, StoryGenerator};

fn prompt() -> Vec<ChatMessage> {
    vec![ChatMessage::user("a hedgehog who bakes bread")]
}

#[tokio::test]
async fn single_choice_is_the_story() {
    let server = OpenAIMock::new()
        .with_choices(["Once upon a time, a hedgehog named Hazel baked bread."])
        .spawn()
        .await
        .unwrap();

    let generation = server.client().generate_story(&prompt()).await.unwrap();

    assert_eq!(
        generation,
        Generation::Story("Once upon a time, a hedgehog named Hazel baked bread.".to_string())
    );
}

#[tokio::test]
async fn first_of_several_choices_wins() {
    let server = OpenAIMock::new()
        .with_choices(["first", "second", "third"])
        .spawn()
        .await
        .unwrap();

    let generation = server.client().generate_story(&prompt()).await.unwrap();

    assert_eq!(generation.story(), Some("first"));
}

#[tokio::test]
async fn empty_choices_is_no_content() {
    let server = OpenAIMock::new().with_empty_choices().spawn().await.unwrap();

    let generation = server.client().generate_story(&prompt()).await.unwrap();

    assert_eq!(generation, Generation::NoContent);
}

#[tokio::test]
async fn blank_choice_is_no_content() {
    let server = OpenAIMock::new().with_choices([""]).spawn().await.unwrap();

    let generation = server.client().generate_story(&prompt()).await.unwrap();

    assert_eq!(generation, Generation::NoContent);
}

#[tokio::test]
async fn absent_choices_is_no_content() {
    let server = OpenAIMock::new().without_choices_field().spawn().await.unwrap();

    let generation = server.client().generate_story(&prompt()).await.unwrap();

    assert_eq!(generation, Generation::NoContent);
}

#[tokio::test]
async fn choices_of_the_wrong_shape_is_a_decoding_failure() {
    let server = OpenAIMock::new()
        .with_raw_body(r#"{"choices": "not-a-list"}"#)
        .spawn()
        .await
        .unwrap();

    let error = server.client().generate_story(&prompt()).await.unwrap_err();

    let GenerationError::Decoding(message) = error else {
        unreachable!("expected a decoding failure, got {error:?}");
    };

    assert!(!message.is_empty());
}

#[tokio::test]
async fn non_json_body_is_a_decoding_failure() {
    let server = OpenAIMock::new()
        .with_raw_body("<html>gateway page</html>")
        .spawn()
        .await
        .unwrap();

    let error = server.client().generate_story(&prompt()).await.unwrap_err();

    assert!(matches!(error, GenerationError::Decoding(_)), "{error:?}");
}

#[tokio::test]
async fn server_error_carries_status_and_body() {
    let server = OpenAIMock::new()
        .with_error(StatusCode::INTERNAL_SERVER_ERROR, "The server had an error")
        .spawn()
        .await
        .unwrap();

    let error = server.client().generate_story(&prompt()).await.unwrap_err();

    insta::assert_snapshot!(error, @"API error (500): The server had an error");
    assert!(!error.is_unauthorized());
}

#[tokio::test]
async fn rate_limit_is_a_server_failure() {
    let server = OpenAIMock::new()
        .with_error(StatusCode::TOO_MANY_REQUESTS, "Rate limit reached")
        .spawn()
        .await
        .unwrap();

    let error = server.client().generate_story(&prompt()).await.unwrap_err();

    assert!(matches!(error, GenerationError::Server { status: 429, .. }), "{error:?}");
    assert_eq!(server.requests().len(), 1, "failures are not retried");
}

#[tokio::test]
async fn empty_error_body_falls_back_to_reason_phrase() {
    let server = OpenAIMock::new()
        .with_error(StatusCode::SERVICE_UNAVAILABLE, "")
        .spawn()
        .await
        .unwrap();

    let error = server.client().generate_story(&prompt()).await.unwrap_err();

    insta::assert_snapshot!(error, @"API error (503): Service Unavailable");
}

#[tokio::test]
async fn missing_api_key_surfaces_as_unauthorized() {
    let server = OpenAIMock::new().requiring_key(TEST_API_KEY).spawn().await.unwrap();

    let config = OpenAiConfig {
        api_key: None,
        ..server.config()
    };

    let client = OpenAiStoryClient::new(&config).unwrap();
    let error = client.generate_story(&prompt()).await.unwrap_err();

    assert!(error.is_unauthorized(), "{error:?}");
    assert_eq!(server.requests()[0].authorization, None);
}

#[tokio::test]
async fn bearer_token_is_sent() {
    let server = OpenAIMock::new().requiring_key(TEST_API_KEY).spawn().await.unwrap();

    let generation = server.client().generate_story(&prompt()).await.unwrap();

    assert!(generation.story().is_some());
    assert_eq!(
        server.requests()[0].authorization.as_deref(),
        Some("Bearer test-key")
    );
}

#[tokio::test]
async fn connection_refused_is_a_transport_failure() {
    let config = OpenAiConfig {
        base_url: Some(format!("http://{}/v1", closed_address().await).parse().unwrap()),
        ..Default::default()
    };

    let client = OpenAiStoryClient::new(&config).unwrap();
    let error = client.generate_story(&prompt()).await.unwrap_err();

    let GenerationError::Transport(message) = error else {
        unreachable!("expected a transport failure, got {error:?}");
    };

    assert!(!message.is_empty());
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let server = OpenAIMock::new()
        .with_delay(Duration::from_secs(5))
        .spawn()
        .await
        .unwrap();

    let config = OpenAiConfig {
        timeout: Duration::from_millis(200),
        ..server.config()
    };

    let client = OpenAiStoryClient::new(&config).unwrap();
    let error = client.generate_story(&prompt()).await.unwrap_err();

    assert!(matches!(error, GenerationError::Transport(_)), "{error:?}");
}

#[tokio::test]
async fn whole_history_is_sent_in_order() {
    let server = TestOpenAIServer::start().await;

    let messages = vec![
        ChatMessage::system("You tell short stories for children."),
        ChatMessage::user("a whale who sings"),
        ChatMessage::assistant("Once upon a time, a whale named Wendel sang."),
        ChatMessage::user("now add a lighthouse"),
    ];

    server.client().generate_story(&messages).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);

    assert_eq!(
        requests[0].body,
        json!({
            "model": "gpt-3.5-turbo",
            "messages": [
                {"role": "system", "content": "You tell short stories for children."},
                {"role": "user", "content": "a whale who sings"},
                {"role": "assistant", "content": "Once upon a time, a whale named Wendel sang."},
                {"role": "user", "content": "now add a lighthouse"}
            ]
        })
    );
}

#[tokio::test]
async fn calls_are_independent() {
    let server = OpenAIMock::new()
        .with_response("owl", "A story about an owl.")
        .with_response("fox", "A story about a fox.")
        .spawn()
        .await
        .unwrap();

    let client = server.client();

    let owl = client.generate_story(&[ChatMessage::user("an owl")]).await.unwrap();
    let fox = client.generate_story(&[ChatMessage::user("a fox")]).await.unwrap();

    assert_eq!(owl.story(), Some("A story about an owl."));
    assert_eq!(fox.story(), Some("A story about a fox."));

    let requests = server.requests();
    assert_eq!(requests[1].body["messages"], json!([{"role": "user", "content": "a fox"}]));
}

#[tokio::test]
async fn configured_model_is_requested() {
    let server = TestOpenAIServer::start().await;

    let config = OpenAiConfig {
        model: "gpt-4o-mini".to_string(),
        ..server.config()
    };

    OpenAiStoryClient::new(&config)
        .unwrap()
        .generate_story(&prompt())
        .await
        .unwrap();

    assert_eq!(server.requests()[0].body["model"], "gpt-4o-mini");
}
