//! HTTP clients for the retrieval and translation services.
//!
//! All three services are JSON `POST` endpoints under one base URL:
//! `/search`, `/answer` and `/translate`. The request timeout from
//! `[services]` applies to every call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

use rovassist_core::config::ServicesConfig;
use rovassist_core::types::{
    AnswerRequest, AnswerResponse, Lang, SearchRequest, SearchResponse, TranslateRequest,
    TranslateResponse,
};
use rovassist_dialog::collaborator::{
    AnswerCollaborator, SearchCollaborator, TranslateCollaborator,
};
use rovassist_dialog::error::CollaboratorError;

/// Client for all three services.
#[derive(Debug, Clone)]
pub struct HttpServices {
    client: Client,
    base_url: String,
}

impl HttpServices {
    pub fn new(config: &ServicesConfig) -> Result<Self, CollaboratorError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| CollaboratorError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, CollaboratorError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), "Service returned an error status");
            return Err(CollaboratorError::Status(status.as_u16()));
        }
        response.json::<Resp>().await.map_err(map_reqwest_error)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> CollaboratorError {
    if err.is_timeout() {
        CollaboratorError::Timeout
    } else if err.is_decode() {
        CollaboratorError::InvalidResponse(err.to_string())
    } else {
        CollaboratorError::Transport(err.to_string())
    }
}

#[async_trait]
impl SearchCollaborator for HttpServices {
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, CollaboratorError> {
        self.post("/search", request).await
    }
}

#[async_trait]
impl AnswerCollaborator for HttpServices {
    async fn answer(&self, request: &AnswerRequest) -> Result<AnswerResponse, CollaboratorError> {
        self.post("/answer", request).await
    }
}

#[async_trait]
impl TranslateCollaborator for HttpServices {
    async fn translate(
        &self,
        text: &str,
        target: Lang,
    ) -> Result<Option<String>, CollaboratorError> {
        let request = TranslateRequest {
            text: text.to_string(),
            target,
        };
        let response: TranslateResponse = self.post("/translate", &request).await?;
        Ok(response.translated)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use rovassist_core::types::{Answer, Candidate, Mode};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn services(base_url: String, timeout_ms: u64) -> HttpServices {
        HttpServices::new(&ServicesConfig {
            base_url,
            timeout_ms,
        })
        .unwrap()
    }

    fn search_request() -> SearchRequest {
        SearchRequest {
            query: "T4 manual".into(),
            model: Some("Titan 4".into()),
            mode: Mode::FileAndSummary,
            want_summary: true,
        }
    }

    #[tokio::test]
    async fn test_search_round_trip() {
        let router = Router::new().route(
            "/search",
            post(|Json(req): Json<SearchRequest>| async move {
                Json(SearchResponse {
                    candidates: vec![Candidate {
                        path: "manuals/titan_4.pdf".into(),
                        title: format!("{} manual", req.model.unwrap_or_default()),
                        tags: vec![req.mode.to_string()],
                        summary: None,
                        summary_available: req.want_summary,
                    }],
                })
            }),
        );
        let svc = services(serve(router).await, 2_000);

        let resp = svc.search(&search_request()).await.unwrap();
        assert_eq!(resp.candidates.len(), 1);
        assert_eq!(resp.candidates[0].title, "Titan 4 manual");
        assert_eq!(resp.candidates[0].tags, vec!["file+summary"]);
        assert!(resp.has_summary());
    }

    #[tokio::test]
    async fn test_answer_round_trip() {
        let router = Router::new().route(
            "/answer",
            post(|Json(req): Json<AnswerRequest>| async move {
                Json(AnswerResponse {
                    answer: Some(Answer {
                        text: format!("{} units for {}", req.units.len(), req.model),
                        ..Answer::default()
                    }),
                })
            }),
        );
        let svc = services(serve(router).await, 2_000);
        let resp = svc
            .answer(&AnswerRequest {
                query: "T4 torque".into(),
                model: "Titan 4".into(),
                units: vec!["Nm".into(), "ft-lb".into()],
            })
            .await
            .unwrap();
        assert_eq!(resp.answer.unwrap().text, "2 units for Titan 4");
    }

    #[tokio::test]
    async fn test_translate_null_is_none() {
        let router = Router::new().route(
            "/translate",
            post(|Json(req): Json<TranslateRequest>| async move {
                let translated = match req.target {
                    Lang::Pt => Some(format!("[pt] {}", req.text)),
                    Lang::En => None,
                };
                Json(TranslateResponse { translated })
            }),
        );
        let svc = services(serve(router).await, 2_000);
        assert_eq!(
            svc.translate("Ground", Lang::Pt).await.unwrap().as_deref(),
            Some("[pt] Ground")
        );
        assert_eq!(svc.translate("terra", Lang::En).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_error_status_mapped() {
        let router = Router::new().route(
            "/search",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let svc = services(serve(router).await, 2_000);
        let err = svc.search(&search_request()).await.unwrap_err();
        assert_eq!(err, CollaboratorError::Status(503));
    }

    #[tokio::test]
    async fn test_invalid_body_mapped() {
        let router = Router::new().route("/answer", post(|| async { "not json" }));
        let svc = services(serve(router).await, 2_000);
        let err = svc
            .answer(&AnswerRequest {
                query: "q".into(),
                model: "Titan 4".into(),
                units: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_timeout_mapped() {
        let router = Router::new().route(
            "/search",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Json(SearchResponse::default())
            }),
        );
        let svc = services(serve(router).await, 50);
        let err = svc.search(&search_request()).await.unwrap_err();
        assert_eq!(err, CollaboratorError::Timeout);
    }

    #[tokio::test]
    async fn test_unreachable_is_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let svc = services(format!("http://{}/", addr), 2_000);
        assert_eq!(svc.base_url(), format!("http://{}", addr));
        let err = svc.search(&search_request()).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Transport(_)));
    }
}
