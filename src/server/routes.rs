use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use crate::attributes::{self, AttributeBag};
use crate::engine::{self, GraphEngine};
use crate::server::AppState;
use crate::{Class, Edge, EdgeCriteria, Error, ErrorKind, Node};

#[derive(Deserialize)]
pub struct CreateClassRequest {
    pub identificador: Option<String>,
    pub atributos: Option<Value>,
}

#[derive(Deserialize)]
pub struct CreateNodeRequest {
    #[serde(rename = "classeId")]
    pub classe_id: Option<String>,
    pub identificador: Option<String>,
    pub atributos: Option<Value>,
}

#[derive(Deserialize)]
pub struct UpdateNodeRequest {
    pub identificador: Option<String>,
    pub atributos: Option<Value>,
}

#[derive(Deserialize)]
pub struct CreateEdgeRequest {
    #[serde(rename = "origemId")]
    pub origem_id: Option<String>,
    #[serde(rename = "destinoId")]
    pub destino_id: Option<String>,
    pub tipo: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct UpdateNodeResponse {
    pub message: String,
    pub ativo: Node,
}

/// Error surfaced to HTTP clients as `{"error": "..."}`
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::InvalidArgument(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Duplicates stay 400 for compatibility with existing clients
        let status = match self.0.kind() {
            ErrorKind::InvalidArgument | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::warn!(status = status.as_u16(), "Request rejected: {}", self.0);
        }

        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// A field counts as missing when absent, null or empty
fn field(value: Option<String>) -> String {
    value.unwrap_or_default()
}

/// Attributes must be present; when present they must be an object
fn attributes_field(value: Option<Value>, missing: &str) -> ApiResult<AttributeBag> {
    match value {
        None | Some(Value::Null) => Err(Error::InvalidArgument(missing.to_string()).into()),
        other => Ok(attributes::require_object(other, engine::ATTRIBUTES_NOT_OBJECT)?),
    }
}

// ========== Classes ==========

pub async fn create_class(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateClassRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Class>)> {
    let Json(req) = body?;
    let identifier = field(req.identificador);
    if identifier.is_empty() {
        return Err(Error::InvalidArgument(engine::MISSING_CLASS_FIELDS.to_string()).into());
    }
    let attributes = attributes_field(req.atributos, engine::MISSING_CLASS_FIELDS)?;

    let store = state.store.lock().await;
    let class = GraphEngine::new(&store).define_class(&identifier, attributes)?;
    Ok((StatusCode::CREATED, Json(class)))
}

pub async fn list_classes(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Class>>> {
    let store = state.store.lock().await;
    Ok(Json(GraphEngine::new(&store).list_classes()?))
}

pub async fn list_nodes_of_class(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> ApiResult<Json<Vec<Node>>> {
    let store = state.store.lock().await;
    Ok(Json(GraphEngine::new(&store).list_nodes_of_class(&identifier)?))
}

pub async fn get_class_attributes(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> ApiResult<Json<AttributeBag>> {
    let store = state.store.lock().await;
    Ok(Json(GraphEngine::new(&store).class_attributes(&identifier)?))
}

pub async fn delete_class(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let store = state.store.lock().await;
    GraphEngine::new(&store).remove_class(&identifier)?;
    Ok(Json(MessageResponse {
        message: format!(
            "Classe '{}', seus ativos associados e vínculos relacionados foram excluídos com sucesso.",
            identifier
        ),
    }))
}

// ========== Nodes ==========

pub async fn create_node(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateNodeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Node>)> {
    let Json(req) = body?;
    let class_id = field(req.classe_id);
    let identifier = field(req.identificador);
    if class_id.is_empty() || identifier.is_empty() {
        return Err(Error::InvalidArgument(engine::MISSING_NODE_FIELDS.to_string()).into());
    }
    let attributes = attributes_field(req.atributos, engine::MISSING_NODE_FIELDS)?;

    let store = state.store.lock().await;
    let node = GraphEngine::new(&store).create_node(&class_id, &identifier, attributes)?;
    Ok((StatusCode::CREATED, Json(node)))
}

pub async fn get_node(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> ApiResult<Json<Node>> {
    let store = state.store.lock().await;
    Ok(Json(GraphEngine::new(&store).get_node(&identifier)?))
}

pub async fn update_node(
    State(state): State<Arc<AppState>>,
    body: Result<Json<UpdateNodeRequest>, JsonRejection>,
) -> ApiResult<Json<UpdateNodeResponse>> {
    let Json(req) = body?;
    let identifier = field(req.identificador);
    if identifier.is_empty() {
        return Err(Error::InvalidArgument(engine::MISSING_NODE_ID.to_string()).into());
    }
    let attributes = attributes::require_object(req.atributos, engine::ATTRIBUTES_NOT_OBJECT)?;

    let store = state.store.lock().await;
    let node = GraphEngine::new(&store).update_node(&identifier, attributes)?;
    Ok(Json(UpdateNodeResponse {
        message: format!("Ativo '{}' atualizado com sucesso.", identifier),
        ativo: node,
    }))
}

pub async fn delete_node(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let store = state.store.lock().await;
    GraphEngine::new(&store).remove_node(&identifier)?;
    Ok(Json(MessageResponse {
        message: format!(
            "Ativo '{}' e seus vínculos associados foram excluídos com sucesso.",
            identifier
        ),
    }))
}

// ========== Edges ==========

pub async fn create_edge(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateEdgeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Edge>)> {
    let Json(req) = body?;
    let source = field(req.origem_id);
    let destination = field(req.destino_id);
    let kind = field(req.tipo);
    if source.is_empty() || destination.is_empty() || kind.is_empty() {
        return Err(Error::InvalidArgument(engine::MISSING_EDGE_FIELDS.to_string()).into());
    }

    let store = state.store.lock().await;
    let edge = GraphEngine::new(&store).create_edge(&source, &destination, &kind)?;
    Ok((StatusCode::CREATED, Json(edge)))
}

pub async fn list_edges(
    State(state): State<Arc<AppState>>,
    Path(identifier): Path<String>,
) -> ApiResult<Json<Vec<Edge>>> {
    let store = state.store.lock().await;
    Ok(Json(GraphEngine::new(&store).list_edges_touching(&identifier)?))
}

pub async fn delete_edges(
    State(state): State<Arc<AppState>>,
    body: Result<Json<EdgeCriteria>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    // A bodiless DELETE carries no criteria
    let criteria = match body {
        Ok(Json(criteria)) => criteria,
        Err(JsonRejection::MissingJsonContentType(_)) => EdgeCriteria::default(),
        Err(rejection) => return Err(rejection.into()),
    };

    let store = state.store.lock().await;
    let removed = GraphEngine::new(&store).remove_edges(&criteria)?;
    Ok(Json(MessageResponse {
        message: format!("{} vínculo(s) excluído(s) com sucesso.", removed),
    }))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<crate::storage::DbStats>> {
    let store = state.store.lock().await;
    Ok(Json(GraphEngine::new(&store).stats()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::router;
    use crate::storage::SqliteStore;
    use axum::{body::Body, http::Request, Router};
    use serde_json::json;
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(SqliteStore::open_in_memory().unwrap()))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn seeded() -> Router {
        let app = app();
        let (status, _) = send(
            &app,
            "POST",
            "/create_class",
            Some(json!({"identificador": "Clientes", "atributos": {"nome": "string", "idade": "int"}})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        app
    }

    async fn create_node(app: &Router, id: &str) {
        let (status, _) = send(
            app,
            "POST",
            "/create_ativo",
            Some(json!({"classeId": "Clientes", "identificador": id, "atributos": {"nome": id}})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_create_and_list_classes() {
        let app = seeded().await;

        let (status, body) = send(
            &app,
            "POST",
            "/create_class",
            Some(json!({"identificador": "Produtos", "atributos": {"descricao": "string", "preco": "float"}})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["identificador"], "Produtos");

        let (status, body) = send(&app, "GET", "/get_class", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_classes_empty_is_ok() {
        let app = app();

        let (status, body) = send(&app, "GET", "/get_class", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_create_class_rejections() {
        let app = seeded().await;

        let (status, body) = send(
            &app,
            "POST",
            "/create_class",
            Some(json!({"identificador": "Clientes", "atributos": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Clientes"));

        let (status, _) = send(&app, "POST", "/create_class", Some(json!({"atributos": {}}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            "POST",
            "/create_class",
            Some(json!({"identificador": "Lista", "atributos": ["nome"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], engine::ATTRIBUTES_NOT_OBJECT);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = seeded().await;

        let request = Request::builder()
            .method("POST")
            .uri("/create_ativo")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, "POST", "/create_vinculo", Some(json!({"origemId": 5}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_class_attributes() {
        let app = seeded().await;

        let (status, body) = send(&app, "GET", "/get_class_attributes/Clientes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"nome": "string", "idade": "int"}));

        let (status, body) = send(&app, "GET", "/get_class_attributes/Nada", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Classe não encontrada.");
    }

    #[tokio::test]
    async fn test_delete_class() {
        let app = seeded().await;

        let (status, body) = send(&app, "DELETE", "/delete_class/Clientes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().contains("Classe"));

        let (status, _) = send(&app, "DELETE", "/delete_class/Clientes", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_node() {
        let app = seeded().await;

        let (status, body) = send(
            &app,
            "POST",
            "/create_ativo",
            Some(json!({"classeId": "Clientes", "identificador": "Joao123", "atributos": {"nome": "João", "idade": 25}})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["identificador"], "Joao123");
        assert_eq!(body["classeId"], "Clientes");

        let (status, body) = send(&app, "GET", "/get_ativo/Joao123", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["atributos"]["idade"], 25);
    }

    #[tokio::test]
    async fn test_create_node_errors() {
        let app = seeded().await;

        let (status, body) = send(
            &app,
            "POST",
            "/create_ativo",
            Some(json!({"classeId": "Inexistente", "identificador": "Teste123", "atributos": {"nome": "Teste"}})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("Classe não encontrada"));

        let (status, body) = send(
            &app,
            "POST",
            "/create_ativo",
            Some(json!({"classeId": "Clientes", "identificador": "", "atributos": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], engine::MISSING_NODE_FIELDS);

        let (status, body) = send(
            &app,
            "POST",
            "/create_ativo",
            Some(json!({"classeId": "Clientes", "identificador": "X"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], engine::MISSING_NODE_FIELDS);
    }

    #[tokio::test]
    async fn test_list_nodes_of_class() {
        let app = seeded().await;

        let (status, body) = send(&app, "GET", "/get_class/Clientes", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Nenhum ativo encontrado para esta classe.");

        let (status, body) = send(&app, "GET", "/get_class/Nada", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Classe não encontrada.");

        create_node(&app, "Maria123").await;
        let (status, body) = send(&app, "GET", "/get_class/Clientes", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["identificador"], "Maria123");
    }

    #[tokio::test]
    async fn test_update_node() {
        let app = seeded().await;
        create_node(&app, "Joao123").await;

        let (status, body) = send(
            &app,
            "PUT",
            "/update_ativo",
            Some(json!({"identificador": "Joao123", "atributos": {"idade": 26}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Ativo 'Joao123' atualizado com sucesso.");
        assert_eq!(body["ativo"]["atributos"], json!({"idade": 26}));

        let (status, body) = send(&app, "PUT", "/update_ativo", Some(json!({"atributos": {}}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], engine::MISSING_NODE_ID);

        let (status, body) = send(
            &app,
            "PUT",
            "/update_ativo",
            Some(json!({"identificador": "Joao123", "atributos": "texto"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], engine::ATTRIBUTES_NOT_OBJECT);

        let (status, _) = send(
            &app,
            "PUT",
            "/update_ativo",
            Some(json!({"identificador": "Fantasma", "atributos": {}})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_node() {
        let app = seeded().await;
        create_node(&app, "Carlos456").await;

        let (status, body) = send(&app, "DELETE", "/delete_ativo/Carlos456", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().contains("Ativo"));

        let (status, body) = send(&app, "DELETE", "/delete_ativo/Carlos456", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Ativo não encontrado.");
    }

    #[tokio::test]
    async fn test_edges() {
        let app = seeded().await;
        create_node(&app, "Ativo1").await;
        create_node(&app, "Ativo2").await;

        let (status, body) = send(
            &app,
            "POST",
            "/create_vinculo",
            Some(json!({"origemId": "Ativo1", "destinoId": "Ativo2", "tipo": "Relacionado"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["tipo"], "Relacionado");

        let (status, body) = send(&app, "GET", "/get_vinculos/Ativo1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["tipo"], "Relacionado");

        let (status, body) = send(
            &app,
            "DELETE",
            "/delete_vinculos",
            Some(json!({"origemId": "Ativo1", "tipo": "Relacionado"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "1 vínculo(s) excluído(s) com sucesso.");
    }

    #[tokio::test]
    async fn test_edge_errors() {
        let app = seeded().await;
        create_node(&app, "SemRelacionamento").await;

        let (status, body) = send(
            &app,
            "POST",
            "/create_vinculo",
            Some(json!({"origemId": "Inexistente1", "destinoId": "Inexistente2", "tipo": "Relacionado"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("Ativo de origem não encontrado"));

        let (status, body) = send(
            &app,
            "POST",
            "/create_vinculo",
            Some(json!({"origemId": "SemRelacionamento", "destinoId": "Inexistente2", "tipo": "Relacionado"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Ativo de destino não encontrado.");

        let (status, body) = send(
            &app,
            "POST",
            "/create_vinculo",
            Some(json!({"origemId": "SemRelacionamento", "destinoId": "SemRelacionamento"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], engine::MISSING_EDGE_FIELDS);

        let (status, body) = send(&app, "GET", "/get_vinculos/SemRelacionamento", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("Nenhum vínculo encontrado para este ativo"));

        let (status, body) = send(&app, "GET", "/get_vinculos/Fantasma", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Ativo não encontrado.");

        let (status, body) = send(
            &app,
            "DELETE",
            "/delete_vinculos",
            Some(json!({"origemId": "", "tipo": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Informe ao menos um dos critérios"));

        let (status, body) = send(&app, "DELETE", "/delete_vinculos", Some(json!({"tipo": "Nenhum"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Nenhum vínculo encontrado com os critérios fornecidos.");
    }

    #[tokio::test]
    async fn test_delete_edges_without_body_asks_for_criteria() {
        let app = seeded().await;

        let (status, body) = send(&app, "DELETE", "/delete_vinculos", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], engine::MISSING_CRITERIA);
    }

    #[tokio::test]
    async fn test_blank_edge_fields_rejected_without_store() {
        let state = AppState::new(SqliteStore::open_in_memory().unwrap());
        let app = router(state.clone());
        let _held = state.store.lock().await;

        let pending = send(
            &app,
            "POST",
            "/create_vinculo",
            Some(json!({"origemId": "Ativo1", "destinoId": "", "tipo": "Relacionado"})),
        );
        let (status, body) = tokio::time::timeout(std::time::Duration::from_secs(5), pending)
            .await
            .expect("blank fields must be rejected before the store is locked");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], engine::MISSING_EDGE_FIELDS);
    }

    #[tokio::test]
    async fn test_node_deletion_scenario() {
        let app = seeded().await;
        create_node(&app, "Joao123").await;
        create_node(&app, "Maria123").await;

        let (status, _) = send(
            &app,
            "POST",
            "/create_vinculo",
            Some(json!({"origemId": "Joao123", "destinoId": "Maria123", "tipo": "Relacionado"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(&app, "DELETE", "/delete_ativo/Joao123", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, "GET", "/get_vinculos/Maria123", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, "GET", "/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"classes": 1, "nodes": 1, "edges": 0}));
    }
}
