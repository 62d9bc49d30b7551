// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::models::{
    AggregateReadyResponse, CiphertextUpload, CiphertextsResponse, ContextUpload, PingResponse,
    PlaintextResponse, PlaintextUpload, PublicContextResponse, StatusResponse, StoredResponse,
};
use crate::{AggregatorError, AppData, PlaintextAggregate};
use actix_web::{web, HttpResponse};
use tracing::{info, warn};

type HandlerResult = Result<HttpResponse, AggregatorError>;

const INDEX_HTML: &str = r#"<!doctype html>
<html>
  <head><title>heagg aggregator</title></head>
  <body>
    <h2>Encrypted aggregation service is live</h2>
    <p>Endpoints:</p>
    <ul>
      <li>PUT /context, POST /init_public_context</li>
      <li><a href="/get_public_context">GET /get_public_context</a>, <a href="/get_context">GET /get_context</a></li>
      <li>POST /cipher, POST /upload_enc</li>
      <li>POST /aggregate_enc</li>
      <li><a href="/get_agg_cipher">GET /get_agg_cipher</a></li>
      <li>POST /plain_aggregate, POST /post_decrypted</li>
      <li><a href="/get_plain_aggregate">GET /get_plain_aggregate</a></li>
      <li><a href="/ping">GET /ping</a></li>
    </ul>
  </body>
</html>
"#;

pub fn setup_routes(config: &mut web::ServiceConfig) {
    config
        .route("/", web::get().to(index))
        .route("/ping", web::get().to(ping))
        .route("/context", web::put().to(put_context))
        .route("/init_public_context", web::post().to(put_context))
        .route("/get_public_context", web::get().to(get_public_context))
        .route("/get_context", web::get().to(get_public_context))
        .route("/cipher", web::post().to(post_cipher))
        .route("/upload_enc", web::post().to(post_cipher))
        .route("/aggregate_enc", web::post().to(aggregate_enc))
        .route("/get_agg_cipher", web::get().to(get_agg_cipher))
        .route("/plain_aggregate", web::post().to(post_plain_aggregate))
        .route("/post_decrypted", web::post().to(post_plain_aggregate))
        .route("/get_plain_aggregate", web::get().to(get_plain_aggregate));
}

fn status(status: &str) -> StatusResponse {
    StatusResponse {
        status: status.to_string(),
    }
}

async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

async fn ping() -> HttpResponse {
    HttpResponse::Ok().json(PingResponse {
        status: "ok".to_string(),
        message: "Aggregator is running!".to_string(),
    })
}

/// Store the public context. A later upload replaces an earlier one.
async fn put_context(data: web::Data<AppData>, body: web::Json<ContextUpload>) -> HandlerResult {
    let ContextUpload { context } = body.into_inner();
    if context.is_empty() {
        return Err(AggregatorError::BadRequest("missing context".to_string()));
    }

    let len = context.len();
    if data.set_public_context(context).await? {
        warn!("Replaced the stored public context");
    }
    info!(bytes = len, "Stored public context");

    Ok(HttpResponse::Ok().json(status("public_context_saved")))
}

async fn get_public_context(data: web::Data<AppData>) -> HandlerResult {
    let context = data
        .store()
        .public_context()
        .await
        .ok_or(AggregatorError::NoContext)?;
    Ok(HttpResponse::Ok().json(PublicContextResponse {
        status: "ok".to_string(),
        context,
    }))
}

async fn post_cipher(data: web::Data<AppData>, body: web::Json<CiphertextUpload>) -> HandlerResult {
    let CiphertextUpload {
        ciphertext,
        client_id,
    } = body.into_inner();
    if ciphertext.is_empty() {
        return Err(AggregatorError::BadRequest(
            "missing ciphertext".to_string(),
        ));
    }

    let len = ciphertext.len();
    let (stored, had_context) = data
        .store()
        .push_ciphertext(ciphertext, client_id.clone())
        .await;
    if !had_context {
        warn!("Ciphertext stored before any public context was uploaded");
    }
    info!(bytes = len, stored, client_id = ?client_id, "Stored ciphertext");

    Ok(HttpResponse::Ok().json(StoredResponse {
        status: "ok".to_string(),
        stored,
    }))
}

/// Summation happens at the keyholder. This only reports whether there is anything to sum.
async fn aggregate_enc(data: web::Data<AppData>) -> HandlerResult {
    let num_ciphertexts = data.store().ciphertext_count().await;
    if num_ciphertexts == 0 {
        return Err(AggregatorError::NoCiphertexts);
    }
    Ok(HttpResponse::Ok().json(AggregateReadyResponse {
        status: "agg_ready".to_string(),
        num_ciphertexts,
    }))
}

async fn get_agg_cipher(data: web::Data<AppData>) -> HandlerResult {
    let (context, ciphertexts) = data.store().snapshot().await;
    Ok(HttpResponse::Ok().json(CiphertextsResponse {
        status: "ok".to_string(),
        context,
        ciphertexts: ciphertexts.into_iter().map(|c| c.bytes).collect(),
    }))
}

async fn post_plain_aggregate(
    data: web::Data<AppData>,
    body: web::Json<PlaintextUpload>,
) -> HandlerResult {
    let PlaintextUpload {
        plaintext_aggregate,
        contributions,
    } = body.into_inner();

    data.store()
        .set_plaintext(PlaintextAggregate {
            value: plaintext_aggregate,
            contributions,
        })
        .await;
    info!(value = plaintext_aggregate, contributions = ?contributions, "Stored plaintext aggregate");

    Ok(HttpResponse::Ok().json(status("plaintext_stored")))
}

async fn get_plain_aggregate(data: web::Data<AppData>) -> HandlerResult {
    let aggregate = data
        .store()
        .plaintext()
        .await
        .ok_or(AggregatorError::NoPlaintext)?;
    Ok(HttpResponse::Ok().json(PlaintextResponse {
        status: "ok".to_string(),
        plaintext_aggregate: aggregate.value,
        contributions: aggregate.contributions,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{json_config, AggregatorStore, PublicContextWriter};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    macro_rules! service {
        ($data:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($data))
                    .app_data(json_config(1024))
                    .configure(setup_routes),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn plaintext_is_404_until_posted() {
        let app = service!(AppData::default());

        let req = test::TestRequest::get().uri("/get_plain_aggregate").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "no_plaintext");

        let req = test::TestRequest::post()
            .uri("/plain_aggregate")
            .set_json(json!({"plaintext_aggregate": 15.0, "contributions": 2}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"status": "plaintext_stored"}));

        let req = test::TestRequest::post()
            .uri("/post_decrypted")
            .set_json(json!({"plaintext_aggregate": 2.5}))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/get_plain_aggregate").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"status": "ok", "plaintext_aggregate": 2.5}));
    }

    #[actix_web::test]
    async fn ciphertexts_come_back_in_upload_order() {
        let app = service!(AppData::default());

        let req = test::TestRequest::get().uri("/get_agg_cipher").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body,
            json!({"status": "ok", "context": null, "ciphertexts": []})
        );

        for (uri, blob, stored) in [("/cipher", "AQID", 1), ("/upload_enc", "BAUG", 2)] {
            let req = test::TestRequest::post()
                .uri(uri)
                .set_json(json!({"ciphertext": blob, "client_id": "c"}))
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body, json!({"status": "ok", "stored": stored}));
        }

        let req = test::TestRequest::get().uri("/get_agg_cipher").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["ciphertexts"], json!(["AQID", "BAUG"]));
    }

    #[actix_web::test]
    async fn context_round_trip_and_aliases() {
        let app = service!(AppData::default());

        for uri in ["/get_public_context", "/get_context"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        }

        let req = test::TestRequest::put()
            .uri("/context")
            .set_json(json!({"context": "AAAA"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"status": "public_context_saved"}));

        let req = test::TestRequest::post()
            .uri("/init_public_context")
            .set_json(json!({"context": "/w=="}))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/get_context").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"status": "ok", "context": "/w=="}));

        let req = test::TestRequest::get().uri("/get_agg_cipher").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["context"], "/w==");
    }

    #[actix_web::test]
    async fn aggregate_enc_needs_ciphertexts() {
        let app = service!(AppData::default());

        let req = test::TestRequest::post().uri("/aggregate_enc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "no_ciphertexts");

        let req = test::TestRequest::post()
            .uri("/cipher")
            .set_json(json!({"ciphertext": "AQID"}))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post().uri("/aggregate_enc").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"status": "agg_ready", "num_ciphertexts": 1}));
    }

    #[actix_web::test]
    async fn bad_requests_are_400_and_the_service_keeps_serving() {
        let app = service!(AppData::default());

        let bad = [
            test::TestRequest::post()
                .uri("/cipher")
                .set_json(json!({"client_id": "no blob"})),
            test::TestRequest::post()
                .uri("/cipher")
                .set_json(json!({"ciphertext": "%%%"})),
            test::TestRequest::post()
                .uri("/cipher")
                .set_json(json!({"ciphertext": ""})),
            test::TestRequest::put()
                .uri("/context")
                .insert_header(("content-type", "application/json"))
                .set_payload("{not json"),
            test::TestRequest::post()
                .uri("/cipher")
                .set_json(json!({"ciphertext": "A".repeat(2048)})),
            test::TestRequest::post()
                .uri("/plain_aggregate")
                .set_json(json!({"plaintext_aggregate": "fifteen"})),
        ];
        for req in bad {
            let resp = test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["status"], "error");
            assert!(body["msg"].is_string());
        }

        let req = test::TestRequest::get().uri("/ping").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn stored_contexts_are_mirrored_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("public_context.ctx");
        let data = AppData::new(
            AggregatorStore::new(),
            Some(PublicContextWriter::new(&path)),
        );
        let app = service!(data);

        let req = test::TestRequest::put()
            .uri("/context")
            .set_json(json!({"context": "AQID"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
    }
}
