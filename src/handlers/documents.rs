// src/handlers/documents.rs

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::{
    common::{db_utils::parse_id, error::ApiError, extract::QueryParams},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermReportsExport, PermSalesRead, RequirePermission},
    },
    services::document_service::{ExportedFile, ReportQuery},
};

fn attachment(file: ExportedFile) -> Response {
    // Configura os Headers para o navegador baixar o arquivo
    let headers = [
        (header::CONTENT_TYPE, file.content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.file_name),
        ),
    ];
    (headers, file.bytes).into_response()
}

// GET /api/reports/export/pdf
#[utoipa::path(
    get,
    path = "/api/reports/export/pdf",
    tag = "Relatórios",
    params(ReportQuery),
    responses(
        (status = 200, description = "Relatório em PDF", content_type = "application/pdf", body = Vec<u8>),
        (status = 400, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermReportsExport>,
    QueryParams(query): QueryParams<ReportQuery>,
) -> Result<Response, ApiError> {
    let file = app_state
        .document_service
        .export_pdf(&query)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(attachment(file))
}

// GET /api/reports/export/excel
#[utoipa::path(
    get,
    path = "/api/reports/export/excel",
    tag = "Relatórios",
    params(ReportQuery),
    responses(
        (status = 200, description = "Relatório em Excel (.xlsx)",
            content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", body = Vec<u8>),
        (status = 400, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_excel(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermReportsExport>,
    QueryParams(query): QueryParams<ReportQuery>,
) -> Result<Response, ApiError> {
    let file = app_state
        .document_service
        .export_excel(&query)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(attachment(file))
}

// GET /api/sales/{id}/pdf
#[utoipa::path(
    get,
    path = "/api/sales/{id}/pdf",
    tag = "Vendas",
    params(("id" = String, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Comprovante da venda com QR code", content_type = "application/pdf", body = Vec<u8>),
        (status = 404, description = "Venda não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn sale_receipt_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermSalesRead>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id).map_err(|e| e.to_api_error(&locale))?;
    let sale = app_state
        .operation_service
        .get_sale(id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let bytes = app_state
        .document_service
        .render_sale_receipt(&sale)
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(attachment(ExportedFile {
        bytes,
        content_type: "application/pdf",
        file_name: format!("venda_{}.pdf", id),
    }))
}
