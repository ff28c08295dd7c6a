use anyhow::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use test_utils::png_fixture;
use tokio::sync::mpsc;

use super::Candidate;
use super::CandidateContent;
use super::ContentPartsBlob;
use super::Gemini;
use super::GenerateContentResponse;
use super::Prediction;
use super::ResponsePart;
use crate::domain::models::Backend;
use crate::domain::models::BackendError;
use crate::domain::models::BackendPrompt;
use crate::domain::models::BackendResponse;
use crate::domain::models::ChatMessage;

impl Gemini {
    fn with_url(url: String) -> Gemini {
        return Gemini {
            url,
            token: "abc".to_string(),
            timeout: "200".to_string(),
        };
    }

    fn without_token(url: String) -> Gemini {
        return Gemini {
            url,
            token: "".to_string(),
            timeout: "200".to_string(),
        };
    }
}

fn text_response(text: &str) -> Result<String> {
    let body = serde_json::to_string(&GenerateContentResponse {
        candidates: vec![Candidate {
            content: CandidateContent {
                parts: vec![ResponsePart {
                    text: Some(text.to_string()),
                    inline_data: None,
                }],
            },
        }],
        predictions: vec![],
    })?;

    return Ok(body);
}

#[tokio::test]
async fn it_successfully_health_checks() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1beta/models?key=abc")
        .with_status(200)
        .create_async()
        .await;

    let backend = Gemini::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_ok());
    mock.assert_async().await;
}

#[tokio::test]
async fn it_fails_health_checks() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v1beta/models?key=abc")
        .with_status(500)
        .create_async()
        .await;

    let backend = Gemini::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn it_fails_health_checks_without_token() {
    let backend = Gemini::without_token("http://localhost:1".to_string());
    let err = backend.health_check().await.unwrap_err();

    assert!(!backend.has_credential());
    assert!(BackendError::is_missing_credential_err(&err));
}

#[tokio::test]
async fn it_gets_completions() -> Result<()> {
    let body = [
        "[{",
        "\"candidates\": [{",
        "\"content\": {",
        "\"parts\": [{",
        "\"text\": \"Hello \"",
        "}]",
        "}",
        "}]",
        "},",
        "{",
        "\"candidates\": [{",
        "\"content\": {",
        "\"parts\": [{",
        "\"text\": \"World\"",
        "}]",
        "}",
        "}]",
        "}]",
    ]
    .join("\n");

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock(
            "POST",
            "/v1beta/models/chat-1:streamGenerateContent?key=abc",
        )
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"systemInstruction":{"parts":[{"text":"Be helpful"}]},"contents":[{"role":"model","parts":[{"text":"Hello"}]},{"role":"user","parts":[{"text":"Say hi"}]}]}"#.to_string(),
        ))
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let prompt = BackendPrompt::new(
        "Be helpful",
        &[ChatMessage::assistant("Hello"), ChatMessage::user("Say hi")],
    );
    let (tx, mut rx) = mpsc::unbounded_channel::<BackendResponse>();

    let backend = Gemini::with_url(server.url());
    let res = backend.get_completion("models/chat-1", prompt, &tx).await?;

    mock.assert_async().await;
    assert_eq!(res, "Hello World");

    assert_eq!(
        rx.recv().await,
        Some(BackendResponse {
            text: "Hello ".to_string(),
            done: false
        })
    );
    assert_eq!(
        rx.recv().await,
        Some(BackendResponse {
            text: "World".to_string(),
            done: false
        })
    );
    assert_eq!(
        rx.recv().await,
        Some(BackendResponse {
            text: "".to_string(),
            done: true
        })
    );

    return Ok(());
}

#[tokio::test]
async fn it_maps_429_to_rate_limited() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/text-1:generateContent?key=abc")
        .with_status(429)
        .with_body(r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#)
        .create_async()
        .await;

    let backend = Gemini::with_url(server.url());
    let err = backend
        .generate_text("models/text-1", "Hello")
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(BackendError::is_rate_limit_err(&err));
    insta::assert_snapshot!(err.to_string(), @"Rate limited by the backend: Quota exceeded");
}

#[tokio::test]
async fn it_maps_resource_exhausted_status_to_rate_limited() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/text-1:generateContent?key=abc")
        .with_status(503)
        .with_body(r#"{"error":{"code":503,"message":"Try later","status":"RESOURCE_EXHAUSTED"}}"#)
        .create_async()
        .await;

    let backend = Gemini::with_url(server.url());
    let err = backend
        .generate_text("models/text-1", "Hello")
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(BackendError::is_rate_limit_err(&err));
}

#[tokio::test]
async fn it_maps_other_failures_to_api_errors() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/text-1:generateContent?key=abc")
        .with_status(400)
        .with_body(r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#)
        .create_async()
        .await;

    let backend = Gemini::with_url(server.url());
    let err = backend
        .generate_text("models/text-1", "Hello")
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(!BackendError::is_rate_limit_err(&err));
    insta::assert_snapshot!(err.to_string(), @"Backend returned 400: API key not valid");
}

#[tokio::test]
async fn it_generates_text() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/text-1:generateContent?key=abc")
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"contents":[{"role":"user","parts":[{"text":"Plan visuals"}]}]}"#.to_string(),
        ))
        .with_status(200)
        .with_body(text_response("{\"visuals\": []}")?)
        .create_async()
        .await;

    let backend = Gemini::with_url(server.url());
    let res = backend.generate_text("models/text-1", "Plan visuals").await?;

    mock.assert_async().await;
    assert_eq!(res, "{\"visuals\": []}");

    return Ok(());
}

#[tokio::test]
async fn it_refuses_to_generate_without_token() {
    let backend = Gemini::without_token("http://localhost:1".to_string());
    let err = backend
        .generate_image("models/image-1", "A bakery")
        .await
        .unwrap_err();

    assert!(BackendError::is_missing_credential_err(&err));
}

#[tokio::test]
async fn it_generates_images_from_inline_data() -> Result<()> {
    let png = png_fixture(2, 2);
    let body = serde_json::to_string(&GenerateContentResponse {
        candidates: vec![Candidate {
            content: CandidateContent {
                parts: vec![
                    ResponsePart {
                        text: Some("Here you go".to_string()),
                        inline_data: None,
                    },
                    ResponsePart {
                        text: None,
                        inline_data: Some(ContentPartsBlob {
                            mime_type: "image/png".to_string(),
                            data: STANDARD.encode(&png),
                        }),
                    },
                ],
            },
        }],
        predictions: vec![],
    })?;

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/image-1:generateContent?key=abc")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let backend = Gemini::with_url(server.url());
    let res = backend.generate_image("models/image-1", "A bakery").await?;

    mock.assert_async().await;
    assert_eq!(res, Some(png));

    return Ok(());
}

#[tokio::test]
async fn it_generates_images_from_predictions() -> Result<()> {
    let png = png_fixture(3, 1);
    let body = serde_json::to_string(&GenerateContentResponse {
        candidates: vec![],
        predictions: vec![Prediction {
            bytes_base64_encoded: Some(STANDARD.encode(&png)),
        }],
    })?;

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/image-1:generateContent?key=abc")
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let backend = Gemini::with_url(server.url());
    let res = backend.generate_image("models/image-1", "A bakery").await?;

    mock.assert_async().await;
    assert_eq!(res, Some(png));

    return Ok(());
}

#[tokio::test]
async fn it_returns_none_without_image_data() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1beta/models/image-1:generateContent?key=abc")
        .with_status(200)
        .with_body(text_response("I cannot draw that")?)
        .create_async()
        .await;

    let backend = Gemini::with_url(server.url());
    let res = backend.generate_image("models/image-1", "A bakery").await?;

    mock.assert_async().await;
    assert_eq!(res, None);

    return Ok(());
}
