// handlers/docs.rs - OpenAPI documents and browsable viewers (public)

use axum::response::{Html, IntoResponse, Json, Response};

use crate::api::openapi::{ApiVersion, TITLE};

fn schema_json(version: ApiVersion) -> Response {
    Json(version.document()).into_response()
}

fn swagger_ui(version: ApiVersion) -> Html<String> {
    Html(format!(
        r##"<!DOCTYPE html>
<html>
<head>
  <title>{title}</title>
  <meta charset="utf-8"/>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    window.ui = SwaggerUIBundle({{
      url: "{schema}",
      dom_id: "#swagger-ui",
      persistAuthorization: true
    }});
  </script>
</body>
</html>"##,
        title = TITLE,
        schema = version.schema_path()
    ))
}

fn redoc(version: ApiVersion) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>{title}</title>
  <meta charset="utf-8"/>
</head>
<body>
  <redoc spec-url="{schema}"></redoc>
  <script src="https://cdn.jsdelivr.net/npm/redoc@2/bundles/redoc.standalone.js"></script>
</body>
</html>"#,
        title = TITLE,
        schema = version.schema_path()
    ))
}

pub async fn v1_schema() -> Response {
    schema_json(ApiVersion::V1)
}

pub async fn v1_swagger_ui() -> Html<String> {
    swagger_ui(ApiVersion::V1)
}

pub async fn v1_redoc() -> Html<String> {
    redoc(ApiVersion::V1)
}

pub async fn v2_schema() -> Response {
    schema_json(ApiVersion::V2)
}

pub async fn v2_swagger_ui() -> Html<String> {
    swagger_ui(ApiVersion::V2)
}

pub async fn v2_redoc() -> Html<String> {
    redoc(ApiVersion::V2)
}
