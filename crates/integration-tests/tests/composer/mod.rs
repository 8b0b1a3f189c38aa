use std::{sync::Arc, time::Duration};

use axum::http::StatusCode;
use integration_tests::OpenAIMock;
use story::{FavoritesStore, FileStore, Phase, StoryComposer, StoryOutcome};

#[tokio::test]
async fn generate_then_save_as_favorite() {
    let server = OpenAIMock::new()
        .with_choices(["Once upon a time, a little cloud wanted to rain lemonade."])
        .spawn()
        .await
        .unwrap();

    let composer = StoryComposer::new(Arc::new(server.client()))
        .with_prompt_prefix("Can you generate a children story about");

    composer.set_prompt("a little cloud");
    composer.generate().unwrap().await.unwrap();

    let requests = server.requests();
    assert_eq!(
        requests[0].body["messages"][0]["content"],
        "Can you generate a children story about a little cloud"
    );

    let dir = tempfile::tempdir().unwrap();
    let mut favorites = FavoritesStore::open(FileStore::new(dir.path())).unwrap();

    let favorite = composer.favorite().unwrap();
    let created_at = favorite.created_at();
    favorites.add(favorite).unwrap();

    // Simulate an app restart by opening the persisted key again.
    let reopened = FavoritesStore::open(FileStore::new(dir.path())).unwrap();
    let stored = reopened.favorites();

    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored[0].content(),
        "Once upon a time, a little cloud wanted to rain lemonade."
    );
    assert_eq!(stored[0].created_at(), created_at);
}

#[tokio::test]
async fn empty_reply_shows_no_story_message() {
    let server = OpenAIMock::new().with_empty_choices().spawn().await.unwrap();

    let composer = StoryComposer::new(Arc::new(server.client()));
    composer.set_prompt("a sleepy bear");
    composer.generate().unwrap().await.unwrap();

    assert_eq!(composer.state().phase, Phase::Finished(StoryOutcome::NoStory));
    assert!(composer.favorite().is_none());
}

#[tokio::test]
async fn blank_reply_cannot_be_saved() {
    let server = OpenAIMock::new().with_choices(["   "]).spawn().await.unwrap();

    let composer = StoryComposer::new(Arc::new(server.client()));
    composer.set_prompt("a sleepy bear");
    composer.generate().unwrap().await.unwrap();

    assert_eq!(composer.state().phase, Phase::Finished(StoryOutcome::NoStory));
    assert!(composer.favorite().is_none());
}

#[tokio::test]
async fn unauthorized_reply_shows_error_message() {
    let server = OpenAIMock::new()
        .with_error(StatusCode::UNAUTHORIZED, "Incorrect API key provided")
        .spawn()
        .await
        .unwrap();

    let composer = StoryComposer::new(Arc::new(server.client()));
    composer.set_prompt("a sleepy bear");
    composer.generate().unwrap().await.unwrap();

    let Phase::Finished(outcome) = composer.state().phase else {
        unreachable!("generation finished");
    };

    insta::assert_snapshot!(
        outcome.display_text(),
        @"Error generating story: API error (401): Incorrect API key provided"
    );
}

#[tokio::test]
async fn dismissing_during_a_slow_request_is_a_no_op() {
    let server = OpenAIMock::new()
        .with_delay(Duration::from_millis(300))
        .spawn()
        .await
        .unwrap();

    let composer = StoryComposer::new(Arc::new(server.client()));
    composer.set_prompt("a sleepy bear");

    let handle = composer.generate().unwrap();

    // Let the request reach the server before dismissing.
    tokio::time::sleep(Duration::from_millis(50)).await;
    composer.dismiss();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(composer.state().phase, Phase::Generating);
    assert_eq!(server.requests().len(), 1);
}
