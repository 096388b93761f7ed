use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use teamatch_core::{new_user_id, Catalog, FeedbackRecord, FeedbackSink, Query, TriState};
use teamatch_similarity::{CutoffPolicy, Outcome, Recommendation, RecommendOptions, Recommender};
use tracing::{debug, info, warn};

/// Shared, read-only state of every worker
#[derive(Clone)]
pub struct AppState {
    catalog: Arc<Catalog>,
    feedback: Arc<dyn FeedbackSink>,
    /// Defaults a request may override
    options: RecommendOptions,
}

impl AppState {
    pub fn new(catalog: Arc<Catalog>, feedback: Arc<dyn FeedbackSink>, options: RecommendOptions) -> Self {
        Self {
            catalog,
            feedback,
            options,
        }
    }
}

#[derive(Deserialize)]
struct RecommendRequest {
    user_id: Option<String>,
    category: Option<String>,
    base_type: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    /// attribute name -> "Yes" / "No"
    #[serde(default)]
    preferences: BTreeMap<String, String>,
    mode: Option<String>,
    threshold: Option<f32>,
    top_n: Option<usize>,
}

#[derive(Serialize)]
struct RecommendResponse {
    user_id: String,
    status: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    candidates: usize,
    recommendations: Vec<Recommendation>,
}

#[derive(Deserialize)]
struct FeedbackRequest {
    user_id: String,
    category: Option<String>,
    base_type: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    ratings: Vec<RatingEntry>,
}

#[derive(Deserialize)]
struct RatingEntry {
    item: String,
    rating: Option<u8>,
    #[serde(default)]
    purchased: bool,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: AppState, port: u16) -> std::io::Result<()> {
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(state.clone()))
                .configure(configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register every route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/catalog/options", web::get().to(catalog_options))
        .route("/recommend", web::post().to(recommend))
        .route("/feedback", web::post().to(submit_feedback))
        .route("/feedback/export", web::get().to(export_feedback));
}

fn bad_request(message: impl ToString) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": message.to_string()
    }))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn catalog_options(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.catalog.options()))
}

fn resolve_options(base: &RecommendOptions, req: &RecommendRequest) -> Result<RecommendOptions, String> {
    let mut options = *base;
    match req.mode.as_deref() {
        None => {}
        Some("threshold") => {
            let current = match base.policy {
                CutoffPolicy::Threshold { threshold } => threshold,
                CutoffPolicy::TopN => teamatch_similarity::DEFAULT_THRESHOLD,
            };
            options.policy = CutoffPolicy::Threshold { threshold: current };
        }
        Some("top_n") => options.policy = CutoffPolicy::TopN,
        Some(other) => return Err(format!("Unknown mode: {}", other)),
    }
    if let Some(threshold) = req.threshold {
        match options.policy {
            CutoffPolicy::Threshold { .. } => options.policy = CutoffPolicy::Threshold { threshold },
            CutoffPolicy::TopN => return Err("threshold cannot be combined with top_n mode".to_string()),
        }
    }
    if let Some(top_n) = req.top_n {
        options.top_n = top_n;
    }
    options.validate().map_err(|e| e.to_string())?;
    Ok(options)
}

async fn recommend(
    state: web::Data<AppState>,
    body: web::Json<RecommendRequest>,
) -> ActixResult<HttpResponse> {
    let req = body.into_inner();
    let options = match resolve_options(&state.options, &req) {
        Ok(options) => options,
        Err(e) => return Ok(bad_request(e)),
    };

    let user_id = non_blank(req.user_id).unwrap_or_else(new_user_id);
    let category = non_blank(req.category);
    let base_type = non_blank(req.base_type);

    let mut query = Query::new().with_tags(req.tags.iter().cloned());
    if let Some(category) = &category {
        query = query.with_category(category.clone());
    }
    if let Some(base_type) = &base_type {
        query = query.with_base_type(base_type.clone());
    }
    for (name, value) in &req.preferences {
        let Some(value) = TriState::recognize(value) else {
            return Ok(bad_request(format!(
                "Preference {:?} must be Yes, No or Unknown, got {:?}",
                name, value
            )));
        };
        query = query.with_preference(name.clone(), value);
    }

    let result = Recommender::new(options).recommend(&state.catalog, &query);
    debug!(
        "user {} -> {:?} ({} items)",
        user_id,
        result.outcome,
        result.len()
    );

    let selected_tags: Vec<String> = query.selected_tags.iter().cloned().collect();
    let records = FeedbackRecord::for_recommendations(
        &user_id,
        category.as_deref(),
        base_type.as_deref(),
        &selected_tags,
        result.items.iter().map(|r| r.menu_name.as_str()),
    );
    if let Err(e) = state.feedback.record_all(records) {
        warn!("Failed to record recommendations for {}: {}", user_id, e);
    }

    let message = match result.outcome {
        Outcome::Matched => None,
        Outcome::NoQualifyingMatch => Some("No matching drinks found. Try different tags."),
        Outcome::EmptyCandidateSet => Some("No drinks match these filters. Try different filters."),
    };

    Ok(HttpResponse::Ok().json(RecommendResponse {
        user_id,
        status: result.outcome,
        message,
        candidates: result.candidates,
        recommendations: result.items,
    }))
}

async fn submit_feedback(
    state: web::Data<AppState>,
    body: web::Json<FeedbackRequest>,
) -> ActixResult<HttpResponse> {
    let req = body.into_inner();
    let category = non_blank(req.category);
    let base_type = non_blank(req.base_type);

    let mut records = Vec::with_capacity(req.ratings.len());
    for entry in req.ratings {
        let mut record = FeedbackRecord::new(req.user_id.clone(), entry.item)
            .with_context(category.clone(), base_type.clone(), req.tags.clone())
            .with_purchased(entry.purchased);
        if let Some(rating) = entry.rating {
            record = match record.with_rating(rating) {
                Ok(record) => record,
                Err(e) => return Ok(bad_request(e)),
            };
        }
        records.push(record);
    }

    match state.feedback.record_all(records) {
        Ok(recorded) => {
            info!("Recorded {} feedback entries for {}", recorded, req.user_id);
            Ok(HttpResponse::Ok().json(serde_json::json!({ "recorded": recorded })))
        }
        Err(e) => Ok(HttpResponse::InternalServerError().json(serde_json::json!({
            "error": e.to_string()
        }))),
    }
}

async fn export_feedback(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let mut out = Vec::new();
    match state.feedback.export_csv(&mut out) {
        Ok(()) => Ok(HttpResponse::Ok().content_type("text/csv").body(out)),
        Err(e) => Ok(HttpResponse::NotImplemented().json(serde_json::json!({
            "error": e.to_string()
        }))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test};
    use serde_json::{json, Value};
    use teamatch_core::{CatalogItem, MemoryFeedbackSink};

    fn state(sink: Arc<MemoryFeedbackSink>) -> AppState {
        let catalog = Catalog::new(vec![
            CatalogItem::new("Mango Tea", "Fruit Tea", "Fruit Tea", "mango, fruity")
                .with_attribute("Contains Caffeine", TriState::Yes),
            CatalogItem::new("Thai Milk Tea", "Milk Tea", "Milk Tea", "creamy, sweet")
                .with_attribute("Contains Caffeine", TriState::Yes),
        ]);
        AppState::new(Arc::new(catalog), sink, RecommendOptions::default())
    }

    #[actix_web::test]
    async fn test_recommend_records_feedback() {
        let sink = Arc::new(MemoryFeedbackSink::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(sink.clone())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/recommend")
            .set_json(json!({"user_id": "u1", "base_type": "Fruit Tea", "tags": ["mango"]}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "matched");
        assert_eq!(body["user_id"], "u1");
        assert_eq!(body["recommendations"][0]["menu_name"], "Mango Tea");
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.records()[0].base_type.as_deref(), Some("Fruit Tea"));
    }

    #[actix_web::test]
    async fn test_recommend_reasons() {
        let sink = Arc::new(MemoryFeedbackSink::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(sink.clone())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/recommend")
            .set_json(json!({"tags": ["chocolate"]}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "no_qualifying_match");
        assert_eq!(body["message"], "No matching drinks found. Try different tags.");
        assert_eq!(body["user_id"].as_str().unwrap().len(), 8);

        let req = test::TestRequest::post()
            .uri("/recommend")
            .set_json(json!({"tags": ["mango"], "preferences": {"Contains Caffeine": "No"}}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "empty_candidate_set");
        assert!(sink.is_empty());
    }

    #[actix_web::test]
    async fn test_recommend_top_n_mode() {
        let sink = Arc::new(MemoryFeedbackSink::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(sink)))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/recommend")
            .set_json(json!({"tags": ["chocolate"], "mode": "top_n", "top_n": 1}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "matched");
        assert_eq!(body["recommendations"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::post()
            .uri("/recommend")
            .set_json(json!({"tags": ["mango"], "mode": "sideways"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_recommend_rejects_unknown_preference_value() {
        let sink = Arc::new(MemoryFeedbackSink::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(sink.clone())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/recommend")
            .set_json(json!({"tags": ["mango"], "preferences": {"Contains Caffeine": "nope"}}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(sink.is_empty());

        let req = test::TestRequest::post()
            .uri("/recommend")
            .set_json(json!({"tags": ["mango"], "preferences": {"Contains Caffeine": "Unknown"}}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "matched");
    }

    #[actix_web::test]
    async fn test_feedback_and_export() {
        let sink = Arc::new(MemoryFeedbackSink::new());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(sink.clone())))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/feedback")
            .set_json(json!({
                "user_id": "u7",
                "tags": ["mango"],
                "ratings": [{"item": "Mango Tea", "rating": 5, "purchased": true}]
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["recorded"], 1);
        assert_eq!(sink.records()[0].rating, Some(5));

        let req = test::TestRequest::post()
            .uri("/feedback")
            .set_json(json!({"user_id": "u7", "ratings": [{"item": "Mango Tea", "rating": 9}]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/feedback/export").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().nth(1).unwrap().starts_with("u7,,,mango,Mango Tea,5,Yes,"));
    }

    #[actix_web::test]
    async fn test_catalog_options() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state(Arc::new(MemoryFeedbackSink::new()))))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/catalog/options").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["categories"], json!(["Fruit Tea", "Milk Tea"]));
        assert_eq!(body["attributes"], json!(["Contains Caffeine"]));
    }
}
