// src/services/document_service.rs

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use rust_xlsxwriter::{Format, Workbook};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{operations_repo::PeriodFilter, InventoryRepository, OperationsRepository},
    models::{
        inventory::ProductReportRow,
        operations::{PurchaseReportRow, SaleDetail, SaleReportRow},
        status::SaleStatus,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Sales,
    Purchases,
    Products,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// sales | purchases | products
    #[param(inline)]
    pub kind: ReportKind,
    /// Data inicial (inclusiva)
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,
    /// Data final (inclusiva)
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
    /// Cliente (vendas), fornecedor (compras) ou categoria (produtos)
    pub entity_id: Option<Uuid>,
}

impl ReportQuery {
    /// Converte o período em instantes UTC; `from > to` é rejeitado.
    pub fn period(&self) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), AppError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(AppError::InvalidDateRange);
            }
        }
        let from = self.from.map(|d| d.and_time(NaiveTime::MIN).and_utc());
        let to = match self.to {
            Some(d) => Some(
                d.and_hms_micro_opt(23, 59, 59, 999_999)
                    .ok_or(AppError::InvalidDateRange)?
                    .and_utc(),
            ),
            None => None,
        };
        Ok((from, to))
    }

    fn file_stem(&self) -> &'static str {
        match self.kind {
            ReportKind::Sales => "relatorio_vendas",
            ReportKind::Purchases => "relatorio_compras",
            ReportKind::Products => "relatorio_produtos",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Money(Decimal),
}

impl Cell {
    fn display(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Integer(value) => value.to_string(),
            Cell::Money(value) => format!("R$ {:.2}", value),
        }
    }
}

/// Tabela intermediária: os dois formatos (PDF e Excel) saem dela.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub title: String,
    pub subtitle: Option<String>,
    pub headers: Vec<&'static str>,
    pub widths: Vec<usize>,
    pub rows: Vec<Vec<Cell>>,
    pub total: Option<Decimal>,
}

/// Arquivo pronto para download.
pub struct ExportedFile {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: String,
}

#[derive(Debug, Clone)]
pub struct ReportFonts {
    pub dir: PathBuf,
    pub family: String,
}

#[derive(Clone)]
pub struct DocumentService {
    repo: OperationsRepository,
    inventory_repo: InventoryRepository,
    fonts: ReportFonts,
}

impl DocumentService {
    pub fn new(
        repo: OperationsRepository,
        inventory_repo: InventoryRepository,
        fonts: ReportFonts,
    ) -> Self {
        Self {
            repo,
            inventory_repo,
            fonts,
        }
    }

    /// Busca os dados do relatório e monta a tabela.
    pub async fn build_report(&self, query: &ReportQuery) -> Result<ReportTable, AppError> {
        let (from, to) = query.period()?;
        let subtitle = period_label(query.from, query.to);
        let filter = PeriodFilter {
            from,
            to,
            party_id: query.entity_id,
        };

        let table = match query.kind {
            ReportKind::Sales => sales_table(&self.repo.sales_report(filter).await?, subtitle),
            ReportKind::Purchases => {
                purchases_table(&self.repo.purchases_report(filter).await?, subtitle)
            }
            ReportKind::Products => {
                products_table(&self.inventory_repo.product_report(query.entity_id).await?)
            }
        };
        Ok(table)
    }

    pub async fn export_pdf(&self, query: &ReportQuery) -> Result<ExportedFile, AppError> {
        let table = self.build_report(query).await?;
        let bytes = self.render_pdf(&table)?;
        tracing::info!(kind = ?query.kind, rows = table.rows.len(), "relatório PDF gerado");
        Ok(ExportedFile {
            bytes,
            content_type: "application/pdf",
            file_name: format!("{}.pdf", query.file_stem()),
        })
    }

    pub async fn export_excel(&self, query: &ReportQuery) -> Result<ExportedFile, AppError> {
        let table = self.build_report(query).await?;
        let bytes = render_excel(&table)?;
        tracing::info!(kind = ?query.kind, rows = table.rows.len(), "relatório Excel gerado");
        Ok(ExportedFile {
            bytes,
            content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            file_name: format!("{}.xlsx", query.file_stem()),
        })
    }

    fn load_document(&self, title: &str) -> Result<genpdf::Document, AppError> {
        // Carrega a fonte da pasta configurada
        let font_family = genpdf::fonts::from_files(&self.fonts.dir, &self.fonts.family, None)
            .map_err(|e| {
                anyhow::anyhow!(
                    "Fonte '{}' não encontrada em {}: {}",
                    self.fonts.family,
                    self.fonts.dir.display(),
                    e
                )
            })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(title);
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);
        Ok(doc)
    }

    pub fn render_pdf(&self, table: &ReportTable) -> Result<Vec<u8>, AppError> {
        let mut doc = self.load_document(&table.title)?;

        doc.push(
            elements::Paragraph::new(table.title.as_str())
                .styled(style::Style::new().bold().with_font_size(16)),
        );
        if let Some(subtitle) = &table.subtitle {
            doc.push(
                elements::Paragraph::new(subtitle.as_str())
                    .styled(style::Style::new().with_font_size(10)),
            );
        }
        doc.push(elements::Break::new(1.5));

        let mut layout = elements::TableLayout::new(table.widths.clone());
        layout.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let style_bold = style::Style::new().bold();
        let mut header = layout.row();
        for title in &table.headers {
            header.push_element(elements::Paragraph::new(*title).styled(style_bold));
        }
        header.push().map_err(pdf_error)?;

        for row in &table.rows {
            let mut line = layout.row();
            for cell in row {
                line.push_element(elements::Paragraph::new(cell.display()));
            }
            line.push().map_err(pdf_error)?;
        }
        doc.push(layout);

        if let Some(total) = table.total {
            doc.push(elements::Break::new(1.5));
            let mut total_paragraph =
                elements::Paragraph::new(format!("TOTAL GERAL: R$ {:.2}", total));
            total_paragraph.set_alignment(genpdf::Alignment::Right);
            doc.push(total_paragraph.styled(style::Style::new().bold().with_font_size(12)));
        }

        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;
        Ok(buffer)
    }

    /// Comprovante da venda com QR code do ID.
    pub fn render_sale_receipt(&self, sale: &SaleDetail) -> Result<Vec<u8>, AppError> {
        let mut doc = self.load_document(&format!("Venda {}", sale.header.id))?;

        doc.push(
            elements::Paragraph::new("COMPROVANTE DE VENDA")
                .styled(style::Style::new().bold().with_font_size(16)),
        );
        doc.push(elements::Break::new(1));
        doc.push(elements::Paragraph::new(format!("Venda: {}", sale.header.id)));
        doc.push(elements::Paragraph::new(format!(
            "Data: {}",
            sale.header.sale_date.format("%d/%m/%Y %H:%M")
        )));
        doc.push(elements::Paragraph::new(format!("Cliente: {}", sale.customer_name)));
        doc.push(elements::Paragraph::new(format!(
            "Status: {}",
            sale.header.status.label_pt()
        )));
        doc.push(elements::Break::new(1.5));

        // Pesos das colunas: Produto (4), Qtd (1), Unitário (2), Total (2)
        let mut table = elements::TableLayout::new(vec![4, 1, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let style_bold = style::Style::new().bold();
        table
            .row()
            .element(elements::Paragraph::new("Produto").styled(style_bold))
            .element(elements::Paragraph::new("Qtd").styled(style_bold))
            .element(elements::Paragraph::new("Unitário").styled(style_bold))
            .element(elements::Paragraph::new("Total").styled(style_bold))
            .push()
            .map_err(pdf_error)?;

        for item in &sale.items {
            table
                .row()
                .element(elements::Paragraph::new(item.product_name.as_str()))
                .element(elements::Paragraph::new(item.quantity.to_string()))
                .element(elements::Paragraph::new(format!("R$ {:.2}", item.unit_price)))
                .element(elements::Paragraph::new(format!("R$ {:.2}", item.line_total)))
                .push()
                .map_err(pdf_error)?;
        }
        doc.push(table);
        doc.push(elements::Break::new(1.5));

        let mut total_paragraph =
            elements::Paragraph::new(format!("TOTAL: R$ {:.2}", sale.header.total));
        total_paragraph.set_alignment(genpdf::Alignment::Right);
        doc.push(total_paragraph.styled(style::Style::new().bold().with_font_size(12)));
        doc.push(elements::Break::new(2));

        // QR code com o ID da venda, para conferência no balcão
        let code = QrCode::new(sale.header.id.to_string().as_bytes())
            .map_err(|e| anyhow::anyhow!("Falha ao gerar QR code: {}", e))?;
        let image_buffer = code.render::<Luma<u8>>().build();
        let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);
        let pdf_image = elements::Image::from_dynamic_image(dynamic_image)
            .map_err(pdf_error)?
            .with_scale(genpdf::Scale::new(0.5, 0.5));
        doc.push(pdf_image);

        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;
        tracing::info!(sale_id = %sale.header.id, "comprovante de venda gerado");
        Ok(buffer)
    }
}

fn pdf_error(e: genpdf::error::Error) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("Falha ao gerar PDF: {}", e))
}

fn excel_error(e: rust_xlsxwriter::XlsxError) -> AppError {
    AppError::InternalServerError(anyhow::anyhow!("Falha ao gerar planilha: {}", e))
}

/// Planilha com cabeçalho em negrito e células numéricas de verdade.
pub fn render_excel(table: &ReportTable) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let money = Format::new().set_num_format("#,##0.00");

    let sheet = workbook.add_worksheet();
    sheet.set_name("Relatório").map_err(excel_error)?;

    sheet
        .write_string_with_format(0, 0, table.title.as_str(), &bold)
        .map_err(excel_error)?;
    if let Some(subtitle) = &table.subtitle {
        sheet.write_string(1, 0, subtitle.as_str()).map_err(excel_error)?;
    }

    let header_row: u32 = 3;
    for (col, title) in table.headers.iter().enumerate() {
        let col = col as u16;
        sheet
            .write_string_with_format(header_row, col, *title, &bold)
            .map_err(excel_error)?;
        sheet.set_column_width(col, 20).map_err(excel_error)?;
    }

    let mut row_idx = header_row + 1;
    for row in &table.rows {
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(text) => {
                    sheet.write_string(row_idx, col, text.as_str()).map_err(excel_error)?;
                }
                Cell::Integer(value) => {
                    sheet.write_number(row_idx, col, *value as f64).map_err(excel_error)?;
                }
                Cell::Money(value) => {
                    let amount = value.to_f64().unwrap_or_default();
                    sheet
                        .write_number_with_format(row_idx, col, amount, &money)
                        .map_err(excel_error)?;
                }
            }
        }
        row_idx += 1;
    }

    if let Some(total) = table.total {
        let last_col = table.headers.len().saturating_sub(1) as u16;
        sheet
            .write_string_with_format(row_idx + 1, 0, "TOTAL GERAL", &bold)
            .map_err(excel_error)?;
        sheet
            .write_number_with_format(
                row_idx + 1,
                last_col,
                total.to_f64().unwrap_or_default(),
                &money.clone().set_bold(),
            )
            .map_err(excel_error)?;
    }

    workbook.save_to_buffer().map_err(excel_error)
}

fn period_label(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Option<String> {
    let fmt = |d: NaiveDate| d.format("%d/%m/%Y").to_string();
    match (from, to) {
        (Some(from), Some(to)) => Some(format!("Período: {} a {}", fmt(from), fmt(to))),
        (Some(from), None) => Some(format!("A partir de {}", fmt(from))),
        (None, Some(to)) => Some(format!("Até {}", fmt(to))),
        (None, None) => None,
    }
}

pub fn sales_table(rows: &[SaleReportRow], subtitle: Option<String>) -> ReportTable {
    ReportTable {
        title: "Relatório de Vendas".into(),
        subtitle,
        headers: vec!["Data", "Cliente", "Status", "Itens", "Total"],
        widths: vec![2, 4, 2, 1, 2],
        rows: rows
            .iter()
            .map(|r| {
                vec![
                    Cell::Text(r.sale_date.format("%d/%m/%Y").to_string()),
                    Cell::Text(r.customer_name.clone()),
                    Cell::Text(r.status.label_pt().to_string()),
                    Cell::Integer(r.items_count),
                    Cell::Money(r.total),
                ]
            })
            .collect(),
        // canceladas não entram no total
        total: Some(
            rows.iter()
                .filter(|r| r.status != SaleStatus::Cancelled)
                .map(|r| r.total)
                .sum(),
        ),
    }
}

pub fn purchases_table(rows: &[PurchaseReportRow], subtitle: Option<String>) -> ReportTable {
    ReportTable {
        title: "Relatório de Compras".into(),
        subtitle,
        headers: vec!["Data", "Fornecedor", "Status", "Itens", "Total"],
        widths: vec![2, 4, 2, 1, 2],
        rows: rows
            .iter()
            .map(|r| {
                vec![
                    Cell::Text(r.purchase_date.format("%d/%m/%Y").to_string()),
                    Cell::Text(r.provider_name.clone()),
                    Cell::Text(if r.status.is_active() { "Ativa" } else { "Inativa" }.to_string()),
                    Cell::Integer(r.items_count),
                    Cell::Money(r.total),
                ]
            })
            .collect(),
        // só compras ativas contam
        total: Some(
            rows.iter()
                .filter(|r| r.status.is_active())
                .map(|r| r.total)
                .sum(),
        ),
    }
}

pub fn products_table(rows: &[ProductReportRow]) -> ReportTable {
    ReportTable {
        title: "Relatório de Estoque".into(),
        subtitle: None,
        headers: vec!["Produto", "Categoria", "Preço", "Estoque", "Validade", "Status"],
        widths: vec![4, 3, 2, 1, 2, 1],
        rows: rows
            .iter()
            .map(|r| {
                vec![
                    Cell::Text(r.name.clone()),
                    Cell::Text(r.category_name.clone()),
                    Cell::Money(r.price),
                    Cell::Integer(i64::from(r.stock)),
                    Cell::Text(
                        r.expiration_date
                            .map(|d| d.format("%d/%m/%Y").to_string())
                            .unwrap_or_else(|| "-".into()),
                    ),
                    Cell::Text(if r.status.is_active() { "Ativo" } else { "Inativo" }.to_string()),
                ]
            })
            .collect(),
        total: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::status::EntityStatus;

    fn sale_row(customer: &str, status: SaleStatus, total: i64) -> SaleReportRow {
        SaleReportRow {
            sale_date: Utc::now(),
            customer_name: customer.into(),
            status,
            items_count: 2,
            total: Decimal::new(total, 2),
        }
    }

    fn query(from: Option<NaiveDate>, to: Option<NaiveDate>) -> ReportQuery {
        ReportQuery {
            kind: ReportKind::Sales,
            from,
            to,
            entity_id: None,
        }
    }

    #[test]
    fn inverted_period_is_rejected() {
        let from = NaiveDate::from_ymd_opt(2025, 5, 10);
        let to = NaiveDate::from_ymd_opt(2025, 5, 1);
        assert!(matches!(query(from, to).period(), Err(AppError::InvalidDateRange)));
    }

    #[test]
    fn period_includes_the_whole_last_day() {
        let day = NaiveDate::from_ymd_opt(2025, 5, 10);
        let (from, to) = query(day, day).period().unwrap();
        let (from, to) = (from.unwrap(), to.unwrap());
        assert!(from < to);
        assert_eq!(to.date_naive(), day.unwrap());
        assert_eq!(from.date_naive(), day.unwrap());
    }

    #[test]
    fn sales_total_ignores_cancelled_sales() {
        let table = sales_table(
            &[
                sale_row("Ana", SaleStatus::Completed, 1000),
                sale_row("Bruno", SaleStatus::Cancelled, 5000),
                sale_row("Carla", SaleStatus::Pending, 250),
            ],
            None,
        );
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.total, Some(Decimal::new(1250, 2)));
        assert_eq!(table.rows[1][2], Cell::Text("Cancelada".into()));
        assert_eq!(table.headers.len(), table.rows[0].len());
    }

    #[test]
    fn product_table_marks_missing_expiration() {
        let table = products_table(&[ProductReportRow {
            name: "Sabão".into(),
            category_name: "Limpeza".into(),
            price: Decimal::new(399, 2),
            stock: 12,
            expiration_date: None,
            status: EntityStatus::Active,
        }]);
        assert_eq!(table.rows[0][4], Cell::Text("-".into()));
        assert_eq!(table.rows[0][3], Cell::Integer(12));
        assert_eq!(table.total, None);
        assert_eq!(table.widths.len(), table.headers.len());
    }

    #[test]
    fn excel_export_is_a_valid_xlsx_container() {
        let table = sales_table(
            &[sale_row("Ana", SaleStatus::Completed, 1990)],
            Some("Maio".into()),
        );
        let bytes = render_excel(&table).unwrap();
        // xlsx é um zip
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn money_cells_are_formatted_in_reais() {
        assert_eq!(Cell::Money(Decimal::new(1234, 2)).display(), "R$ 12.34");
    }
}
