// src/services/document_service.rs
//
// Exportação de relatórios em PDF. O conteúdo (textos, totais, linhas da tabela) é
// montado por funções puras; `render` só cuida do layout com genpdf.

use chrono::NaiveDate;
use genpdf::{elements, style, Alignment, Element};
use sqlx::PgPool;

use crate::{
    common::{clock::format_date_br, error::AppError, money::format_brl},
    db::{ClientRepository, InstallmentRepository, SaleRepository},
    models::{
        installment::{InstallmentStatus, InstallmentWithClient},
        report::ReportQuery,
        sale::{PaymentType, SaleWithClient},
    },
    services::status::effective_status,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ReportContent {
    pub title: String,
    pub filename: String,
    pub filter_line: String,
    pub summary: Vec<String>,
    pub columns: Vec<(&'static str, usize)>,
    pub rows: Vec<Vec<String>>,
}

/// "Gerado em: 10/03/2024 | Período: 01/03/2024 a Fim | Cliente: João Silva"
pub fn filter_line(today: NaiveDate, filters: &ReportQuery, client_name: Option<&str>) -> String {
    let mut line = format!("Gerado em: {}", format_date_br(today));

    if filters.start_date.is_some() || filters.end_date.is_some() {
        let start = filters.start_date.map(format_date_br).unwrap_or_else(|| "Início".to_string());
        let end = filters.end_date.map(format_date_br).unwrap_or_else(|| "Fim".to_string());
        line.push_str(&format!(" | Período: {} a {}", start, end));
    }
    if let Some(name) = client_name {
        line.push_str(&format!(" | Cliente: {}", name));
    }
    line
}

pub fn sales_report(
    sales: &[SaleWithClient],
    filters: &ReportQuery,
    client_name: Option<&str>,
    today: NaiveDate,
) -> ReportContent {
    let revenue: i64 = sales.iter().map(|s| s.sale.total).sum();
    let cash = sales.iter().filter(|s| s.sale.payment_type == PaymentType::Cash).count();
    let installment = sales.len() - cash;

    let rows = sales
        .iter()
        .map(|s| {
            let payment = match s.sale.payment_type {
                PaymentType::Cash => "À Vista".to_string(),
                PaymentType::Installment => format!("{}x", s.sale.installment_count),
            };
            vec![
                format_date_br(s.sale.date),
                s.client_name.clone(),
                payment,
                format_brl(s.sale.total),
            ]
        })
        .collect();

    ReportContent {
        title: "Relatório de Vendas".to_string(),
        filename: format!("relatorio_vendas_{}.pdf", today.format("%Y%m%d")),
        filter_line: filter_line(today, filters, client_name),
        summary: vec![
            format!("Total de Vendas: {}", sales.len()),
            format!("Receita Total: {}", format_brl(revenue)),
            format!("À Vista: {} | Parcelado: {}", cash, installment),
        ],
        columns: vec![("Data", 2), ("Cliente", 4), ("Pagamento", 2), ("Valor", 2)],
        rows,
    }
}

/// Relatório de parcelas; o status exibido é o efetivo na data de geração.
pub fn installments_report(
    installments: &[InstallmentWithClient],
    filters: &ReportQuery,
    client_name: Option<&str>,
    today: NaiveDate,
) -> ReportContent {
    let mut total = 0;
    let mut buckets = [(0usize, 0i64); 3];
    let mut rows = Vec::with_capacity(installments.len());

    for row in installments {
        let i = &row.installment;
        let status = effective_status(i, today);
        let bucket = match status {
            InstallmentStatus::Paid => 0,
            InstallmentStatus::Pending => 1,
            InstallmentStatus::Overdue => 2,
        };
        buckets[bucket].0 += 1;
        buckets[bucket].1 += i.amount;
        total += i.amount;

        rows.push(vec![
            format_date_br(i.due_date),
            row.client_name.clone(),
            format!("Parcela {}", i.number),
            format_brl(i.amount),
            status.label_pt().to_string(),
        ]);
    }

    let [(paid_count, paid), (pending_count, pending), (overdue_count, overdue)] = buckets;

    ReportContent {
        title: "Relatório de Pagamentos".to_string(),
        filename: format!("relatorio_pagamentos_{}.pdf", today.format("%Y%m%d")),
        filter_line: filter_line(today, filters, client_name),
        summary: vec![
            format!("Total de Parcelas: {}", installments.len()),
            format!("Valor Total: {}", format_brl(total)),
            format!(
                "Pagos: {} ({}) | Pendentes: {} ({}) | Atrasados: {} ({})",
                paid_count,
                format_brl(paid),
                pending_count,
                format_brl(pending),
                overdue_count,
                format_brl(overdue)
            ),
        ],
        columns: vec![("Vencimento", 2), ("Cliente", 4), ("Parcela", 2), ("Valor", 2), ("Status", 2)],
        rows,
    }
}

#[derive(Clone)]
pub struct DocumentService {
    sale_repo: SaleRepository,
    installment_repo: InstallmentRepository,
    client_repo: ClientRepository,
    fonts_dir: String,
    font_family: String,
}

impl DocumentService {
    pub fn new(
        sale_repo: SaleRepository,
        installment_repo: InstallmentRepository,
        client_repo: ClientRepository,
        fonts_dir: String,
        font_family: String,
    ) -> Self {
        Self { sale_repo, installment_repo, client_repo, fonts_dir, font_family }
    }

    async fn client_name(&self, pool: &PgPool, user_id: i64, filters: &ReportQuery) -> Result<Option<String>, AppError> {
        let Some(client_id) = filters.client_id else {
            return Ok(None);
        };
        let client = self
            .client_repo
            .find_by_id(pool, user_id, client_id)
            .await?
            .ok_or(AppError::ClientNotFound)?;
        Ok(Some(client.name))
    }

    /// Sem banco configurado o relatório sai vazio.
    pub async fn sales_content(
        &self,
        pool: Option<&PgPool>,
        user_id: i64,
        filters: &ReportQuery,
        today: NaiveDate,
    ) -> Result<ReportContent, AppError> {
        let (sales, client_name) = match pool {
            Some(pool) => {
                let client_name = self.client_name(pool, user_id, filters).await?;
                let sales = self
                    .sale_repo
                    .list_with_client(pool, user_id, filters.client_id, filters.start_date, filters.end_date)
                    .await?;
                (sales, client_name)
            }
            None => (Vec::new(), None),
        };
        Ok(sales_report(&sales, filters, client_name.as_deref(), today))
    }

    pub async fn installments_content(
        &self,
        pool: Option<&PgPool>,
        user_id: i64,
        filters: &ReportQuery,
        today: NaiveDate,
    ) -> Result<ReportContent, AppError> {
        let (installments, client_name) = match pool {
            Some(pool) => {
                let client_name = self.client_name(pool, user_id, filters).await?;
                let mut rows = self
                    .installment_repo
                    .list_with_client(pool, user_id, filters.client_id, filters.start_date, filters.end_date)
                    .await?;
                // No relatório o vencimento mais próximo vem primeiro
                rows.reverse();
                (rows, client_name)
            }
            None => (Vec::new(), None),
        };
        Ok(installments_report(&installments, filters, client_name.as_deref(), today))
    }

    /// Gera o PDF em memória
    pub fn render(&self, content: &ReportContent) -> Result<Vec<u8>, AppError> {
        // Carrega a fonte da pasta configurada (padrão './fonts')
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, &self.font_family, None).map_err(|_| {
            AppError::FontNotFound(format!("Fonte {} não encontrada na pasta {}", self.font_family, self.fonts_dir))
        })?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(content.title.clone());

        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        decorator.set_header(|page| {
            let mut number = elements::Paragraph::new(format!("Página {}", page));
            number.set_alignment(Alignment::Right);
            number.styled(style::Style::new().with_font_size(8))
        });
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO ---
        let mut title = elements::Paragraph::new(content.title.clone());
        title.set_alignment(Alignment::Center);
        doc.push(title.styled(style::Style::new().bold().with_font_size(18)));
        doc.push(elements::Break::new(1));

        doc.push(
            elements::Paragraph::new(content.filter_line.clone())
                .styled(style::Style::new().with_font_size(9).with_color(style::Color::Greyscale(100))),
        );
        doc.push(elements::Break::new(1));

        // --- RESUMO ---
        for line in &content.summary {
            doc.push(elements::Paragraph::new(line.clone()).styled(style::Style::new().with_font_size(11)));
        }
        doc.push(elements::Break::new(1.5));

        // --- TABELA ---
        let weights = content.columns.iter().map(|(_, weight)| *weight).collect();
        let mut table = elements::TableLayout::new(weights);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let style_bold = style::Style::new().bold();
        let mut header = table.row();
        for (name, _) in &content.columns {
            header.push_element(elements::Paragraph::new(*name).styled(style_bold).padded(1));
        }
        header.push().map_err(|e| AppError::ReportError(e.to_string()))?;

        for cells in &content.rows {
            let mut row = table.row();
            for cell in cells {
                row.push_element(elements::Paragraph::new(cell.clone()).padded(1));
            }
            row.push().map_err(|e| AppError::ReportError(e.to_string()))?;
        }

        if content.rows.is_empty() {
            doc.push(elements::Paragraph::new("Nenhum registro encontrado para os filtros informados."));
        } else {
            doc.push(table);
        }

        // Renderiza para Buffer (Memória)
        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(|e| AppError::ReportError(e.to_string()))?;

        Ok(buffer)
    }
}
