//! WebSocket recognition against a mock Watson server.

mod mock_providers;

use std::time::Duration;

use futures::StreamExt;
use serde_json::json;
use tokio::time::timeout;

use mock_providers::websocket_mock::{Captured, MockBehavior, WatsonWebSocketMock};
use mock_providers::{BASIC_AUTH, mock_config};
use watson_sdk::config::ServiceConfig;
use watson_sdk::core::speech_to_text::{
    RecognitionOptions, RecognizeEvent, RecognizeStream, RecognizeStreamParams, SpeechToText,
};
use watson_sdk::{WatsonError, WatsonResult};

const CONTENT_TYPE: &str = "audio/l16;rate=16000";
const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

async fn next_event(stream: &mut RecognizeStream) -> Option<WatsonResult<RecognizeEvent>> {
    timeout(EVENT_TIMEOUT, stream.next())
        .await
        .expect("Timed out waiting for recognize event")
}

/// Poll the mock until `check` holds, for at most a second.
async fn wait_for(mock: &WatsonWebSocketMock, check: impl Fn(&Captured) -> bool) -> Captured {
    for _ in 0..100 {
        let captured = mock.captured();
        if check(&captured) {
            return captured;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    mock.captured()
}

fn transcribe(transcripts: &[&str]) -> MockBehavior {
    MockBehavior::Transcribe(transcripts.iter().map(|t| t.to_string()).collect())
}

// =============================================================================
// Happy path
// =============================================================================

#[tokio::test]
async fn test_full_recognition_session() {
    let mock = WatsonWebSocketMock::start(transcribe(&["hello world", "how are you"])).await;
    let stt = SpeechToText::new(mock_config(mock.url())).unwrap();

    let params = RecognizeStreamParams {
        options: RecognitionOptions {
            model: Some("en-US_BroadbandModel".into()),
            interim_results: Some(true),
            ..Default::default()
        },
        ..RecognizeStreamParams::new(CONTENT_TYPE)
    };
    let mut stream = stt.recognize_stream(params).await.unwrap();

    match next_event(&mut stream).await {
        Some(Ok(RecognizeEvent::Listening)) => {}
        other => panic!("Expected Listening, got {other:?}"),
    }
    assert!(stream.is_listening());

    stream.send_audio(vec![1u8; 1600]).await.unwrap();
    stream.send_audio(vec![2u8; 1600]).await.unwrap();
    stream.finish().await.unwrap();
    assert!(stream.is_finished());

    let mut events = Vec::new();
    while let Some(event) = next_event(&mut stream).await {
        events.push(event.unwrap());
    }

    let results: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            RecognizeEvent::Results(r) => Some(r),
            _ => None,
        })
        .collect();
    assert_eq!(results.len(), 3);
    assert!(!results[0].has_final());
    assert_eq!(results[0].results[0].transcript(), Some("hello"));
    assert_eq!(results[1].final_transcripts(), vec!["hello world"]);
    assert_eq!(results[2].final_transcripts(), vec!["how are you"]);

    match events.last() {
        Some(RecognizeEvent::Closed { code, .. }) => assert_eq!(*code, Some(1000)),
        other => panic!("Expected Closed, got {other:?}"),
    }

    let captured = wait_for(&mock, |c| c.closed_by_client).await;
    assert_eq!(captured.uri, "/speech-to-text/api/v1/recognize?model=en-US_BroadbandModel");
    assert_eq!(captured.authorization.as_deref(), Some(BASIC_AUTH));
    assert!(captured.user_agent.unwrap().starts_with("watson-sdk-rust/"));
    assert_eq!(
        captured.start_message,
        Some(json!({
            "action": "start",
            "content-type": CONTENT_TYPE,
            "interim_results": true
        }))
    );
    assert_eq!(captured.binary_frames, 2);
    assert_eq!(captured.audio.len(), 3200);
    assert_eq!(&captured.audio[..1600], &[1u8; 1600][..]);
    assert!(captured.stop_received);
    assert!(captured.closed_by_client);
}

#[tokio::test]
async fn test_transcripts_adapter() {
    let mock = WatsonWebSocketMock::start(transcribe(&["one two three", "four"])).await;
    let stt = SpeechToText::new(mock_config(mock.url())).unwrap();

    let mut stream = stt
        .recognize_stream(RecognizeStreamParams::new(CONTENT_TYPE))
        .await
        .unwrap();
    stream.send_audio(b"onetwothree".to_vec()).await.unwrap();
    stream.finish().await.unwrap();

    let transcripts: Vec<String> = timeout(
        EVENT_TIMEOUT,
        stream.transcripts().map(|t| t.unwrap()).collect::<Vec<_>>(),
    )
    .await
    .unwrap();
    assert_eq!(transcripts, vec!["one two three", "four"]);
}

#[tokio::test]
async fn test_upload_before_reading_does_not_stall() {
    const CHUNKS: usize = 400;

    let mock = WatsonWebSocketMock::start(MockBehavior::InterimPerFrame).await;
    let stt = SpeechToText::new(mock_config(mock.url())).unwrap();

    let mut stream = stt
        .recognize_stream(RecognizeStreamParams::new(CONTENT_TYPE))
        .await
        .unwrap();

    // Every chunk produces an event that nobody reads until the upload is done
    timeout(Duration::from_secs(10), async {
        for _ in 0..CHUNKS {
            stream.send_audio(vec![7u8; 320]).await.unwrap();
        }
        stream.finish().await.unwrap();
    })
    .await
    .expect("Upload stalled while events were unread");

    let mut results = 0;
    let mut closed = false;
    while let Some(event) = next_event(&mut stream).await {
        match event.unwrap() {
            RecognizeEvent::Results(_) => results += 1,
            RecognizeEvent::Closed { .. } => closed = true,
            _ => {}
        }
    }
    assert_eq!(results, CHUNKS);
    assert!(closed);

    let captured = wait_for(&mock, |c| c.closed_by_client).await;
    assert_eq!(captured.binary_frames, CHUNKS);
    assert_eq!(captured.audio.len(), CHUNKS * 320);
}

#[tokio::test]
async fn test_send_after_finish_fails() {
    let mock = WatsonWebSocketMock::start(transcribe(&[])).await;
    let stt = SpeechToText::new(mock_config(mock.url())).unwrap();

    let mut stream = stt
        .recognize_stream(RecognizeStreamParams::new(CONTENT_TYPE))
        .await
        .unwrap();
    stream.finish().await.unwrap();

    assert!(matches!(
        stream.send_audio(vec![0u8; 10]).await,
        Err(WatsonError::StreamClosed)
    ));
    assert!(matches!(stream.finish().await, Err(WatsonError::StreamClosed)));
}

// =============================================================================
// Authentication and URL options
// =============================================================================

#[tokio::test]
async fn test_token_and_opt_out_in_query() {
    let mock = WatsonWebSocketMock::start(transcribe(&[])).await;

    let mut config = ServiceConfig::new(mock.url()).with_token("my-token");
    config.learning_opt_out = true;
    let stt = SpeechToText::new(config).unwrap();

    let params = RecognizeStreamParams {
        options: RecognitionOptions {
            customization_id: Some("cust-1".into()),
            ..Default::default()
        },
        ..RecognizeStreamParams::new(CONTENT_TYPE)
    };
    let mut stream = stt.recognize_stream(params).await.unwrap();
    assert!(matches!(next_event(&mut stream).await, Some(Ok(RecognizeEvent::Listening))));

    let captured = mock.captured();
    assert_eq!(
        captured.uri,
        "/speech-to-text/api/v1/recognize?customization_id=cust-1&watson-token=my-token&x-watson-learning-opt-out=true"
    );
    assert!(captured.authorization.is_none());
}

#[tokio::test]
async fn test_handshake_rejected() {
    let mock = WatsonWebSocketMock::start(MockBehavior::RejectHandshake(401)).await;
    let stt = SpeechToText::new(mock_config(mock.url())).unwrap();

    let err = stt
        .recognize_stream(RecognizeStreamParams::new(CONTENT_TYPE))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), Some(401));
    assert!(err.to_string().contains("Unauthorized"));
}

// =============================================================================
// Failures after connecting
// =============================================================================

#[tokio::test]
async fn test_error_frame_before_listening() {
    let mock = WatsonWebSocketMock::start(MockBehavior::RejectStart {
        error: "Model en-US_FooModel not found".into(),
        code: 404,
    })
    .await;
    let stt = SpeechToText::new(mock_config(mock.url())).unwrap();

    let mut stream = stt
        .recognize_stream(RecognizeStreamParams::new(CONTENT_TYPE))
        .await
        .unwrap();

    match next_event(&mut stream).await {
        Some(Err(WatsonError::Service { code, error, .. })) => {
            assert_eq!(code, 404);
            assert_eq!(error, "Model en-US_FooModel not found");
        }
        other => panic!("Expected service error, got {other:?}"),
    }
    assert!(next_event(&mut stream).await.is_none());
    assert!(!stream.is_listening());
}

#[tokio::test]
async fn test_listening_timeout() {
    let mock = WatsonWebSocketMock::start(MockBehavior::NeverListen).await;
    let stt = SpeechToText::new(mock_config(mock.url())).unwrap();

    let params = RecognizeStreamParams {
        listening_timeout: Some(Duration::from_millis(200)),
        ..RecognizeStreamParams::new(CONTENT_TYPE)
    };
    let mut stream = stt.recognize_stream(params).await.unwrap();

    match next_event(&mut stream).await {
        Some(Err(WatsonError::Timeout(_))) => {}
        other => panic!("Expected Timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_drop_closes_connection() {
    let mock = WatsonWebSocketMock::start(transcribe(&["unused"])).await;
    let stt = SpeechToText::new(mock_config(mock.url())).unwrap();

    let mut stream = stt
        .recognize_stream(RecognizeStreamParams::new(CONTENT_TYPE))
        .await
        .unwrap();
    assert!(matches!(next_event(&mut stream).await, Some(Ok(RecognizeEvent::Listening))));
    drop(stream);

    let captured = wait_for(&mock, |c| c.closed_by_client).await;
    assert!(captured.stop_received);
    assert!(captured.closed_by_client);
}

#[tokio::test]
async fn test_missing_content_type() {
    let stt = SpeechToText::new(mock_config("http://127.0.0.1:9")).unwrap();
    let err = stt
        .recognize_stream(RecognizeStreamParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, WatsonError::MissingParameters(_)));
}
